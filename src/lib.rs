// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Schema-aware JSON field redaction for GraphQL-style responses
// Optional PyO3 extension module behind the `python` feature

// Allow non-local definitions for PyO3 macros (known issue with PyO3 0.20.x)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod handler;
pub mod redaction;
pub mod schema;

#[cfg(feature = "python")]
mod bindings;

#[cfg(feature = "python")]
pub use bindings::RedactionEngineRust;

pub use handler::{handle_redaction, Response};
pub use redaction::{
    parse_policies, Policy, Redaction, RedactionConfig, RedactionError, Redactor, TypeIndex,
};
pub use schema::{parse_schema, SchemaRegistry};

/// Python module: schema_redact
///
/// Removes fields from JSON responses according to policy headers resolved
/// against a GraphQL schema.
///
/// # Examples
///
/// ```python
/// from schema_redact import RedactionEngineRust
///
/// engine = RedactionEngineRust(open("schema.graphql").read())
///
/// # Remove every `ssn` under a key declared as `Customer`
/// redacted = engine.redact(body, "Customer.ssn, Query.internal")
/// ```
#[cfg(feature = "python")]
#[pyo3::pymodule]
fn schema_redact(m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
    use pyo3::prelude::*;

    m.add_class::<RedactionEngineRust>()?;

    // Module metadata
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add(
        "__doc__",
        "Schema-aware JSON field redaction for GraphQL-style responses",
    )?;

    Ok(())
}
