// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Resolves a type-scoped policy to the JSON keys that hold that type

use tracing::debug;

use super::config::AmbiguityStrategy;
use super::error::{RedactionError, Result};
use super::type_index::TypeIndex;

/// Conventional JSON key for a type name: `Customer` -> `customer`,
/// `LineItem` -> `lineItem`.
pub fn conventional_key(type_name: &str) -> String {
    let mut chars = type_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Candidate parent keys for a policy scope, after the ambiguity strategy
/// has been applied. Never empty on success.
///
/// When no field is declared with the scope's type but the scope itself is a
/// declared type, `conventional_fallback` allows its conventional key.
pub fn resolve_candidates(
    scope: &str,
    index: &TypeIndex,
    strategy: AmbiguityStrategy,
    conventional_fallback: bool,
) -> Result<Vec<String>> {
    let mut candidates: Vec<String> = index
        .candidate_keys(scope)
        .into_iter()
        .map(str::to_string)
        .collect();
    if candidates.is_empty() && conventional_fallback && index.fields(scope).is_some() {
        candidates.push(conventional_key(scope));
    }
    if candidates.is_empty() {
        return Err(RedactionError::NoCandidateKeys {
            scope: scope.to_string(),
        });
    }

    if candidates.len() > 1 {
        match strategy {
            AmbiguityStrategy::MatchAll => {}
            AmbiguityStrategy::FirstSorted => candidates.truncate(1),
            AmbiguityStrategy::Reject => {
                return Err(RedactionError::AmbiguousScope {
                    scope: scope.to_string(),
                    candidates,
                });
            }
        }
    }

    debug!(scope, ?candidates, strategy = strategy.as_str(), "resolved candidate keys");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> TypeIndex {
        let mut index = TypeIndex::new();
        index.insert_type("Order", [("buyer", "Customer"), ("seller", "Customer")]);
        index.insert_type("Query", [("me", "User")]);
        index.insert_type("LineItem", [("sku", "String")]);
        index
    }

    #[test]
    fn test_no_candidates() {
        let err =
            resolve_candidates("UnknownType", &index(), AmbiguityStrategy::MatchAll, true)
                .unwrap_err();
        assert!(matches!(err, RedactionError::NoCandidateKeys { scope } if scope == "UnknownType"));
    }

    #[test]
    fn test_match_all_keeps_every_candidate() {
        let keys =
            resolve_candidates("Customer", &index(), AmbiguityStrategy::MatchAll, true).unwrap();
        assert_eq!(keys, vec!["buyer", "seller"]);
    }

    #[test]
    fn test_first_sorted() {
        let keys =
            resolve_candidates("Customer", &index(), AmbiguityStrategy::FirstSorted, true).unwrap();
        assert_eq!(keys, vec!["buyer"]);
    }

    #[test]
    fn test_reject_on_ambiguity() {
        let err =
            resolve_candidates("Customer", &index(), AmbiguityStrategy::Reject, true).unwrap_err();
        match err {
            RedactionError::AmbiguousScope { candidates, .. } => {
                assert_eq!(candidates, vec!["buyer", "seller"])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_conventional_fallback() {
        let keys =
            resolve_candidates("LineItem", &index(), AmbiguityStrategy::MatchAll, true).unwrap();
        assert_eq!(keys, vec!["lineItem"]);

        assert!(matches!(
            resolve_candidates("LineItem", &index(), AmbiguityStrategy::MatchAll, false),
            Err(RedactionError::NoCandidateKeys { .. })
        ));
    }

    #[test]
    fn test_conventional_key() {
        assert_eq!(conventional_key("Customer"), "customer");
        assert_eq!(conventional_key("LineItem"), "lineItem");
        assert_eq!(conventional_key(""), "");
    }

    #[test]
    fn test_reject_allows_single_candidate() {
        let keys = resolve_candidates("User", &index(), AmbiguityStrategy::Reject, true).unwrap();
        assert_eq!(keys, vec!["me"]);
    }
}
