// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Path matching, deletion and the per-request redaction driver

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::config::RedactionConfig;
use super::error::{RedactionError, Result};
use super::paths::{collect_paths, KeyPath, Segment};
use super::policy::{Policy, PolicyTarget};
use super::resolver::resolve_candidates;
use super::type_index::TypeIndex;

/// Why a single matched path could not be deleted. These never abort a
/// policy pass; they are logged and the path is skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("segment '{0}' does not resolve")]
    Unresolved(String),

    #[error("array elements are never removed: '{0}'")]
    NotAField(String),

    #[error("parent is not an object")]
    ParentNotObject,

    #[error("key '{0}' is not present")]
    Missing(String),
}

/// Result of a successful redaction pass
#[derive(Debug, Clone, PartialEq)]
pub struct Redaction {
    pub document: Value,
    /// Every path removed, in policy order
    pub removed: Vec<KeyPath>,
}

/// True when `path` ends in `field` directly under one of `candidates`,
/// comparing segments with their array indices stripped.
///
/// Paths shorter than two segments never match.
pub fn path_matches<S: AsRef<str>>(path: &KeyPath, field: &str, candidates: &[S]) -> bool {
    match (path.last(), path.parent()) {
        (Some(last), Some(parent)) => {
            if last.canonical() != field {
                return false;
            }
            let parent = parent.canonical();
            candidates
                .iter()
                .any(|candidate| candidate.as_ref() == parent)
        }
        _ => false,
    }
}

fn step_mut<'v>(value: &'v mut Value, segment: &Segment) -> Option<&'v mut Value> {
    match segment {
        Segment::Field(key) => value.as_object_mut()?.get_mut(key),
        Segment::Element(key, index) => value
            .as_object_mut()?
            .get_mut(key)?
            .as_array_mut()?
            .get_mut(*index),
        Segment::Index(index) => value.as_array_mut()?.get_mut(*index),
    }
}

/// Remove the key addressed by `path` from its immediate parent object.
///
/// Arrays are never shortened: a path ending in an array element is refused.
pub fn remove_path(
    document: &mut Value,
    path: &KeyPath,
) -> std::result::Result<Value, PathError> {
    let (last, parents) = path.segments().split_last().ok_or(PathError::Empty)?;

    let mut current = document;
    for segment in parents {
        current = step_mut(current, segment)
            .ok_or_else(|| PathError::Unresolved(segment.to_string()))?;
    }

    let key = match last {
        Segment::Field(key) => key,
        Segment::Element(..) | Segment::Index(_) => {
            return Err(PathError::NotAField(last.to_string()))
        }
    };

    match current {
        Value::Object(fields) => fields
            .remove(key)
            .ok_or_else(|| PathError::Missing(key.clone())),
        Value::Array(_) | Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => {
            Err(PathError::ParentNotObject)
        }
    }
}

/// Applies parsed policies to one document against a borrowed type index.
pub struct Redactor<'a> {
    index: &'a TypeIndex,
    config: &'a RedactionConfig,
}

impl<'a> Redactor<'a> {
    pub fn new(index: &'a TypeIndex, config: &'a RedactionConfig) -> Self {
        Self { index, config }
    }

    /// Apply `policies` strictly in order.
    ///
    /// The document is taken by value: on error it is dropped, so a partially
    /// redacted document can never reach the caller.
    pub fn redact(&self, mut document: Value, policies: &[Policy]) -> Result<Redaction> {
        let mut removed = Vec::new();
        for policy in policies {
            let paths = self.apply_policy(&mut document, policy)?;
            debug!(policy = %policy, removed = paths.len(), "policy applied");
            removed.extend(paths);
        }
        Ok(Redaction { document, removed })
    }

    /// Apply a single policy in place and return the removed paths.
    ///
    /// Root-field policies fail hard when the key is absent. Type-scoped
    /// policies skip (and log) individual paths that cannot be deleted.
    pub fn apply_policy(&self, document: &mut Value, policy: &Policy) -> Result<Vec<KeyPath>> {
        match policy.target(&self.config.query_scope) {
            PolicyTarget::RootField(key) => Ok(vec![self.remove_root_field(document, key)?]),
            PolicyTarget::Typed { scope, field } => {
                let matched = self.plan_typed(document, scope, field)?;
                Ok(self.remove_matched(document, policy, matched))
            }
        }
    }

    /// Paths a single policy would remove from `document` as it is now,
    /// without touching it.
    pub fn plan(&self, document: &Value, policy: &Policy) -> Result<Vec<KeyPath>> {
        match policy.target(&self.config.query_scope) {
            PolicyTarget::RootField(key) => {
                let data = self.data_object(document)?;
                if !data.contains_key(key) {
                    return Err(RedactionError::KeyNotFoundInData {
                        key: key.to_string(),
                    });
                }
                Ok(vec![self.root_path(key)])
            }
            PolicyTarget::Typed { scope, field } => self.plan_typed(document, scope, field),
        }
    }

    /// Paths a whole policy list would remove, in order, without touching
    /// the document.
    ///
    /// Each policy sees the result of the ones before it, so this fails
    /// exactly when [`Redactor::redact`] would.
    pub fn plan_all(&self, document: &Value, policies: &[Policy]) -> Result<Vec<KeyPath>> {
        let mut working = document.clone();
        let mut planned = Vec::new();
        for policy in policies {
            planned.extend(self.apply_policy(&mut working, policy)?);
        }
        Ok(planned)
    }

    fn plan_typed(&self, document: &Value, scope: &str, field: &str) -> Result<Vec<KeyPath>> {
        let candidates = resolve_candidates(
            scope,
            self.index,
            self.config.ambiguity,
            self.config.conventional_key_fallback,
        )?;
        Ok(collect_paths(document)
            .filter(|path| path_matches(path, field, &candidates))
            .collect())
    }

    fn remove_matched(
        &self,
        document: &mut Value,
        policy: &Policy,
        matched: Vec<KeyPath>,
    ) -> Vec<KeyPath> {
        let mut removed = Vec::with_capacity(matched.len());
        for path in matched {
            match remove_path(document, &path) {
                Ok(_) => {
                    if self.config.log_deletions {
                        debug!(policy = %policy, path = %path, "removed field");
                    }
                    removed.push(path);
                }
                Err(reason) => {
                    warn!(policy = %policy, path = %path, %reason, "skipping deletion");
                }
            }
        }
        removed
    }

    fn remove_root_field(&self, document: &mut Value, key: &str) -> Result<KeyPath> {
        let data = document
            .get_mut(&self.config.data_key)
            .and_then(Value::as_object_mut)
            .ok_or(RedactionError::DataNotAnObject)?;
        if data.remove(key).is_none() {
            return Err(RedactionError::KeyNotFoundInData {
                key: key.to_string(),
            });
        }
        let path = self.root_path(key);
        if self.config.log_deletions {
            debug!(path = %path, "removed root field");
        }
        Ok(path)
    }

    fn data_object<'v>(&self, document: &'v Value) -> Result<&'v serde_json::Map<String, Value>> {
        document
            .get(&self.config.data_key)
            .and_then(Value::as_object)
            .ok_or(RedactionError::DataNotAnObject)
    }

    fn root_path(&self, key: &str) -> KeyPath {
        KeyPath::new()
            .child(Segment::Field(self.config.data_key.clone()))
            .child(Segment::Field(key.to_string()))
    }
}
