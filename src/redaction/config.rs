// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Configuration types for the redaction engine

#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3::types::PyDict;
use serde::{Deserialize, Serialize};

/// How a type-scoped policy treats more than one candidate key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityStrategy {
    #[default]
    MatchAll, // Any candidate key may be the parent segment
    FirstSorted, // Only the lexicographically first candidate
    Reject,      // Fail the request with AmbiguousScope
}

impl AmbiguityStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmbiguityStrategy::MatchAll => "match_all",
            AmbiguityStrategy::FirstSorted => "first_sorted",
            AmbiguityStrategy::Reject => "reject",
        }
    }

    /// Parse a strategy name, falling back to the default on unknown input
    pub fn from_name(name: &str) -> Self {
        match name {
            "first_sorted" => AmbiguityStrategy::FirstSorted,
            "reject" => AmbiguityStrategy::Reject,
            _ => AmbiguityStrategy::MatchAll,
        }
    }
}

/// Configuration for the redaction engine and response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Reserved scope meaning "top-level field of the data object"
    pub query_scope: String,
    /// Envelope key holding the redactable subtree
    pub data_key: String,

    pub ambiguity: AmbiguityStrategy,
    /// Accept the conventional key (`Customer` -> `customer`) for a declared
    /// type that no field refers to
    pub conventional_key_fallback: bool,

    // Envelope behaviour
    pub include_type_index: bool,
    pub log_deletions: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            query_scope: "Query".to_string(),
            data_key: "data".to_string(),
            ambiguity: AmbiguityStrategy::MatchAll,
            conventional_key_fallback: true,
            include_type_index: false,
            log_deletions: true,
        }
    }
}

#[cfg(feature = "python")]
impl RedactionConfig {
    /// Extract configuration from Python dict
    pub fn from_py_dict(dict: &Bound<'_, PyDict>) -> PyResult<Self> {
        let mut config = Self::default();

        macro_rules! extract_field {
            ($field:ident) => {
                if let Some(value) = dict.get_item(stringify!($field))? {
                    config.$field = value.extract()?;
                }
            };
        }

        extract_field!(query_scope);
        extract_field!(data_key);
        extract_field!(conventional_key_fallback);
        extract_field!(include_type_index);
        extract_field!(log_deletions);

        if let Some(value) = dict.get_item("ambiguity")? {
            let name: String = value.extract()?;
            config.ambiguity = AmbiguityStrategy::from_name(&name);
        }

        Ok(config)
    }
}
