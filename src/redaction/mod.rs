// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Schema-aware field redaction engine
//
// Removes fields from a JSON response according to policy tokens that name
// either a top-level data field (`Query.secret`) or a field of a declared
// schema type (`Customer.ssn`). Type-scoped policies are resolved through the
// schema's type index and matched against every key path of the document,
// ignoring array indices.

pub mod config;
pub mod engine;
pub mod error;
pub mod paths;
pub mod policy;
pub mod resolver;
pub mod type_index;

pub use config::{AmbiguityStrategy, RedactionConfig};
pub use engine::{path_matches, remove_path, PathError, Redaction, Redactor};
pub use error::{RedactionError, Result};
pub use paths::{canonicalize, collect_paths, KeyPath, KeyPaths, Segment};
pub use policy::{parse_policies, Policy, PolicyTarget};
pub use resolver::{conventional_key, resolve_candidates};
pub use type_index::TypeIndex;
