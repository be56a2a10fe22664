// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Error types for the redaction engine and its collaborators

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by policy parsing, resolution, schema loading and the
/// response envelope. None of these are fatal to the host process.
#[derive(Debug, Error)]
pub enum RedactionError {
    /// The request carried no policy header at all
    #[error("Missing Policies header")]
    MissingPolicyHeader,

    /// The request body was empty or whitespace
    #[error("Request body cannot be empty")]
    EmptyRequestBody,

    /// Schema source is not well-formed SDL
    #[error("Error parsing schema: {0}")]
    SchemaSyntax(#[from] graphql_parser::schema::ParseError),

    /// Schema parsed but refers to missing or misused types
    #[error("Error validating schema: {message} (line {line}, column {column})")]
    SchemaInvalid {
        line: usize,
        column: usize,
        message: String,
    },

    /// Schema file could not be read
    #[error("Error reading schema from {}: {source}", path.display())]
    SchemaIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Header was present but held no tokens
    #[error("no valid policies provided")]
    NoPolicies,

    /// A policy token had zero, empty or more than two segments
    #[error("invalid policy format '{token}': {reason}")]
    MalformedPolicyToken { token: String, reason: String },

    /// No field in the type index is declared with the policy's scope
    #[error("no matching keys found for policy: {scope}")]
    NoCandidateKeys { scope: String },

    /// More than one candidate key under the `reject` ambiguity strategy
    #[error("ambiguous policy scope {scope}: candidate keys {}", candidates.join(", "))]
    AmbiguousScope {
        scope: String,
        candidates: Vec<String>,
    },

    /// A root-field policy named a key that is not in the data object
    #[error("key '{key}' not found in data")]
    KeyNotFoundInData { key: String },

    /// The envelope's data entry is missing or not an object
    #[error("data field is not a valid map")]
    DataNotAnObject,

    #[error("Error parsing JSON body: {0}")]
    JsonDecode(#[source] serde_json::Error),

    #[error("Error encoding response: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

impl RedactionError {
    /// Create a malformed-token error
    pub fn malformed_token(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPolicyToken {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Create a schema validation error at a 1-based line/column
    pub fn schema_invalid(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::SchemaInvalid {
            line,
            column,
            message: message.into(),
        }
    }

    /// HTTP status code the response envelope reports for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SchemaSyntax(_)
            | Self::SchemaInvalid { .. }
            | Self::SchemaIo { .. }
            | Self::JsonEncode(_) => 500,
            _ => 400,
        }
    }

    /// Whether the error was raised while applying policies, as opposed to
    /// validating the request or loading the schema.
    pub fn is_policy_error(&self) -> bool {
        matches!(
            self,
            Self::NoPolicies
                | Self::MalformedPolicyToken { .. }
                | Self::NoCandidateKeys { .. }
                | Self::AmbiguousScope { .. }
                | Self::KeyNotFoundInData { .. }
                | Self::DataNotAnObject
        )
    }
}

/// Result type alias for redaction operations
pub type Result<T> = std::result::Result<T, RedactionError>;
