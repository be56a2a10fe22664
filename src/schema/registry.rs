// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Process-wide cached type index with explicit reload

use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use super::sdl::parse_schema;
use crate::redaction::error::{RedactionError, Result};
use crate::redaction::type_index::TypeIndex;

/// Holds the current type index. Readers take a cheap [`Arc`] snapshot and
/// keep it for the duration of one request; reloads swap the whole index
/// atomically and never disturb snapshots already handed out.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    current: RwLock<Arc<TypeIndex>>,
}

impl SchemaRegistry {
    pub fn new(index: TypeIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// Build a registry from SDL source.
    pub fn from_sdl(source: &str) -> Result<Self> {
        Ok(Self::new(parse_schema(source)?))
    }

    /// Build a registry from an SDL file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(load_path(path.as_ref())?))
    }

    /// The index in effect right now.
    pub fn snapshot(&self) -> Arc<TypeIndex> {
        // the guarded value is a plain Arc swap, so a poisoned lock still holds a valid index
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install a new index.
    pub fn replace(&self, index: TypeIndex) {
        let types = index.len();
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(index);
        info!(types, "schema index replaced");
    }

    /// Re-parse SDL and install it. On failure the previous index stays.
    pub fn reload_sdl(&self, source: &str) -> Result<()> {
        match parse_schema(source) {
            Ok(index) => {
                self.replace(index);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "schema reload rejected, keeping previous index");
                Err(e)
            }
        }
    }

    /// Re-read an SDL file and install it. On failure the previous index stays.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match load_path(path) {
            Ok(index) => {
                self.replace(index);
                Ok(())
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "schema reload rejected, keeping previous index"
                );
                Err(e)
            }
        }
    }
}

fn load_path(path: &Path) -> Result<TypeIndex> {
    let source = fs::read_to_string(path).map_err(|source| RedactionError::SchemaIo {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema(&source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::process;

    #[test]
    fn test_snapshot_survives_reload() {
        let registry = SchemaRegistry::from_sdl("type Customer { ssn: String }").unwrap();
        let before = registry.snapshot();

        registry
            .reload_sdl("type Customer { ssn: String, id: ID }")
            .unwrap();

        assert_eq!(before.fields("Customer").map(|f| f.len()), Some(1));
        assert_eq!(registry.snapshot().fields("Customer").map(|f| f.len()), Some(2));
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let registry = SchemaRegistry::from_sdl("type Customer { ssn: String }").unwrap();
        assert!(registry.reload_sdl("type Customer { ssn: Nope }").is_err());
        assert!(registry.snapshot().fields("Customer").is_some());
    }

    #[test]
    fn test_default_is_empty() {
        assert!(SchemaRegistry::default().snapshot().is_empty());
    }

    #[test]
    fn test_from_path() {
        let path =
            env::temp_dir().join(format!("schema_redact_registry_{}.graphql", process::id()));
        fs::write(&path, "type Order { total: Float }").unwrap();

        let registry = SchemaRegistry::from_path(&path).unwrap();
        assert!(registry.snapshot().fields("Order").is_some());

        fs::write(&path, "type Invoice { total: Float }").unwrap();
        registry.reload_from_path(&path).unwrap();
        assert!(registry.snapshot().fields("Invoice").is_some());

        fs::remove_file(&path).unwrap();
        assert!(matches!(
            registry.reload_from_path(&path),
            Err(RedactionError::SchemaIo { .. })
        ));
        assert!(registry.snapshot().fields("Invoice").is_some());
    }
}
