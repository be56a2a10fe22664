// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Declared type name -> (field name -> declared field type)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Field table of a single declared type
pub type FieldTable = BTreeMap<String, String>;

/// Read-only view of the schema that the engine consults when resolving
/// type-scoped policies.
///
/// Serializes as a plain nested JSON object, e.g.
/// `{"Customer": {"id": "ID", "ssn": "String"}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeIndex {
    types: BTreeMap<String, FieldTable>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or merge into) a declared type. Types without fields are not
    /// indexed.
    pub fn insert_type<I, K, V>(&mut self, type_name: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields: FieldTable = fields
            .into_iter()
            .map(|(name, ty)| (name.into(), ty.into()))
            .collect();
        if fields.is_empty() {
            return;
        }
        self.types
            .entry(type_name.into())
            .or_default()
            .extend(fields);
    }

    pub fn fields(&self, type_name: &str) -> Option<&FieldTable> {
        self.types.get(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Every field name, across all declared types, whose declared type is
    /// `scope` once list and non-null wrappers are stripped. Sorted and free
    /// of duplicates.
    pub fn candidate_keys(&self, scope: &str) -> Vec<&str> {
        let keys: BTreeSet<&str> = self
            .types
            .values()
            .flat_map(|fields| fields.iter())
            .filter(|(_, declared)| named_type(declared) == scope)
            .map(|(name, _)| name.as_str())
            .collect();
        keys.into_iter().collect()
    }
}

/// Strip list and non-null wrappers: `[Order!]!` -> `Order`.
pub fn named_type(declared: &str) -> &str {
    declared.trim_matches(|c: char| matches!(c, '[' | ']' | '!'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TypeIndex {
        let mut index = TypeIndex::new();
        index.insert_type("Customer", [("id", "ID"), ("ssn", "String")]);
        index.insert_type("Order", [("customer", "Customer"), ("total", "Float")]);
        index.insert_type("Invoice", [("customer", "Customer"), ("payer", "Customer")]);
        index
    }

    #[test]
    fn test_candidate_keys_sorted_and_deduplicated() {
        let index = sample();
        assert_eq!(index.candidate_keys("Customer"), vec!["customer", "payer"]);
        assert!(index.candidate_keys("Unknown").is_empty());
    }

    #[test]
    fn test_wrapped_types_match_named_type() {
        let mut index = TypeIndex::new();
        index.insert_type(
            "Query",
            [("customer", "Customer!"), ("orders", "[Order!]!"), ("order", "Order")],
        );
        assert_eq!(index.candidate_keys("Customer"), vec!["customer"]);
        assert_eq!(index.candidate_keys("Order"), vec!["order", "orders"]);
        assert!(index.candidate_keys("Customer!").is_empty());
    }

    #[test]
    fn test_named_type() {
        assert_eq!(named_type("[Order!]!"), "Order");
        assert_eq!(named_type("String"), "String");
    }

    #[test]
    fn test_empty_types_skipped() {
        let mut index = TypeIndex::new();
        index.insert_type("Empty", Vec::<(String, String)>::new());
        assert!(index.is_empty());
        assert!(index.fields("Empty").is_none());
    }

    #[test]
    fn test_json_shape() {
        let index: TypeIndex =
            serde_json::from_str(r#"{"Customer": {"id": "ID", "ssn": "String"}}"#).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.fields("Customer").and_then(|f| f.get("ssn")).map(String::as_str),
            Some("String")
        );
        assert_eq!(index.type_names().collect::<Vec<_>>(), vec!["Customer"]);
    }
}
