// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Policy header parsing

use std::fmt;

use super::error::{RedactionError, Result};

/// One parsed policy token: `Scope` or `Scope.Field`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Policy {
    pub scope: String,
    pub field: Option<String>,
}

/// What a policy removes once the reserved scope is taken into account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyTarget<'a> {
    /// A key directly under the envelope's data object
    RootField(&'a str),
    /// `field` under every key declared with type `scope`
    Typed { scope: &'a str, field: &'a str },
}

impl Policy {
    /// Parse a single token. The token is trimmed and must split on `.` into
    /// one or two non-empty segments.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(RedactionError::malformed_token(token, "empty policy token"));
        }

        let segments: Vec<&str> = token.split('.').map(str::trim).collect();
        if segments.len() > 2 {
            return Err(RedactionError::malformed_token(
                token,
                format!(
                    "expected 1 or 2 dot-separated segments, found {}",
                    segments.len()
                ),
            ));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(RedactionError::malformed_token(token, "empty segment"));
        }

        Ok(Self {
            scope: segments[0].to_string(),
            field: segments.get(1).map(|s| s.to_string()),
        })
    }

    /// Resolve the token shape against the reserved root scope (`Query`).
    pub fn target(&self, query_scope: &str) -> PolicyTarget<'_> {
        match &self.field {
            None => PolicyTarget::RootField(&self.scope),
            Some(field) if self.scope == query_scope => PolicyTarget::RootField(field),
            Some(field) => PolicyTarget::Typed {
                scope: &self.scope,
                field,
            },
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}", self.scope, field),
            None => f.write_str(&self.scope),
        }
    }
}

/// Split a raw policy header on `,` and parse every token.
///
/// Fails on the first malformed token; nothing is returned partially.
pub fn parse_policies(header: &str) -> Result<Vec<Policy>> {
    if header.trim().is_empty() {
        return Err(RedactionError::NoPolicies);
    }
    header.split(',').map(Policy::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_segments() {
        let policy = Policy::parse(" Customer.ssn ").unwrap();
        assert_eq!(policy.scope, "Customer");
        assert_eq!(policy.field.as_deref(), Some("ssn"));
        assert_eq!(policy.to_string(), "Customer.ssn");
    }

    #[test]
    fn test_single_segment_is_root_field() {
        let policy = Policy::parse("secret").unwrap();
        assert_eq!(policy.field, None);
        assert_eq!(policy.target("Query"), PolicyTarget::RootField("secret"));
    }

    #[test]
    fn test_query_scope_is_root_field() {
        let policy = Policy::parse("Query.users").unwrap();
        assert_eq!(policy.target("Query"), PolicyTarget::RootField("users"));
    }

    #[test]
    fn test_typed_target() {
        let policy = Policy::parse("Customer.ssn").unwrap();
        assert_eq!(
            policy.target("Query"),
            PolicyTarget::Typed {
                scope: "Customer",
                field: "ssn"
            }
        );
    }

    #[test]
    fn test_three_segments_rejected() {
        let err = Policy::parse("A.B.C").unwrap_err();
        match err {
            RedactionError::MalformedPolicyToken { token, .. } => assert_eq!(token, "A.B.C"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_segments_rejected() {
        assert!(Policy::parse("Customer.").is_err());
        assert!(Policy::parse(".ssn").is_err());
        assert!(Policy::parse("   ").is_err());
    }

    #[test]
    fn test_parse_header() {
        let policies = parse_policies("Customer.ssn, Query.secret ,email").unwrap();
        assert_eq!(policies.len(), 3);
        assert_eq!(policies[1].to_string(), "Query.secret");
        assert_eq!(policies[2].to_string(), "email");
    }

    #[test]
    fn test_empty_header() {
        assert!(matches!(parse_policies(""), Err(RedactionError::NoPolicies)));
        assert!(matches!(parse_policies("  "), Err(RedactionError::NoPolicies)));
    }

    #[test]
    fn test_empty_token_in_header() {
        assert!(matches!(
            parse_policies("Customer.ssn,,Order.total"),
            Err(RedactionError::MalformedPolicyToken { .. })
        ));
    }
}
