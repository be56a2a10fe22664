// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// PyO3 bindings for the redaction engine

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde_json::Value;

use crate::handler::handle_redaction;
use crate::redaction::{collect_paths, parse_policies, RedactionConfig, RedactionError, Redactor};
use crate::schema::SchemaRegistry;

fn to_py_err(err: RedactionError) -> PyErr {
    PyErr::new::<PyValueError, _>(err.to_string())
}

fn decode(body: &str) -> PyResult<Value> {
    serde_json::from_str(body).map_err(|e| to_py_err(RedactionError::JsonDecode(e)))
}

/// Redaction engine exposed to Python
///
/// # Example (Python)
/// ```python
/// from schema_redact import RedactionEngineRust
///
/// schema = "type Customer { id: ID, ssn: String } type Query { customer: Customer }"
/// engine = RedactionEngineRust(schema, {"ambiguity": "reject"})
///
/// body = '{"data": {"customer": {"id": "1", "ssn": "123-45"}}}'
/// print(engine.redact(body, "Customer.ssn"))
/// # {"data":{"customer":{"id":"1"}}}
///
/// status, envelope = engine.handle("Query.missing", body)
/// print(status)  # 400
/// ```
#[pyclass]
pub struct RedactionEngineRust {
    registry: SchemaRegistry,
    config: RedactionConfig,
}

#[pymethods]
impl RedactionEngineRust {
    /// Create an engine from GraphQL SDL
    ///
    /// # Configuration Keys
    /// * `query_scope` (str): reserved root scope (default: "Query")
    /// * `data_key` (str): envelope key holding the data (default: "data")
    /// * `ambiguity` (str): "match_all", "first_sorted" or "reject"
    /// * `conventional_key_fallback` (bool): use `customer` for scope `Customer`
    ///   when no field declares that type (default: true)
    /// * `include_type_index` (bool): echo the type index as `allfield`
    /// * `log_deletions` (bool): emit a debug event per removed path
    #[new]
    #[pyo3(signature = (schema, config_dict=None))]
    pub fn new(schema: &str, config_dict: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let config = match config_dict {
            Some(dict) => RedactionConfig::from_py_dict(dict).map_err(|e| {
                PyErr::new::<PyValueError, _>(format!("Invalid config: {}", e))
            })?,
            None => RedactionConfig::default(),
        };
        let registry = SchemaRegistry::from_sdl(schema).map_err(to_py_err)?;
        Ok(Self { registry, config })
    }

    /// Apply a policy header to a JSON document and return the redacted JSON.
    ///
    /// Raises `ValueError` on the first failing policy.
    pub fn redact(&self, body: &str, policies: &str) -> PyResult<String> {
        let policies = parse_policies(policies).map_err(to_py_err)?;
        let document = decode(body)?;
        let index = self.registry.snapshot();
        let redaction = Redactor::new(&index, &self.config)
            .redact(document, &policies)
            .map_err(to_py_err)?;
        serde_json::to_string(&redaction.document)
            .map_err(|e| to_py_err(RedactionError::JsonEncode(e)))
    }

    /// Paths `redact` would remove, in order, without modifying anything
    pub fn plan(&self, body: &str, policies: &str) -> PyResult<Vec<String>> {
        let policies = parse_policies(policies).map_err(to_py_err)?;
        let document = decode(body)?;
        let index = self.registry.snapshot();
        let planned = Redactor::new(&index, &self.config)
            .plan_all(&document, &policies)
            .map_err(to_py_err)?;
        Ok(planned.iter().map(ToString::to_string).collect())
    }

    /// Full request handling: returns `(status, envelope_json)`
    #[pyo3(signature = (policies, body))]
    pub fn handle(&self, policies: Option<&str>, body: &str) -> (u16, String) {
        handle_redaction(policies, body, &self.registry, &self.config).into_json_string()
    }

    /// Swap in a new schema; the old one stays on error
    pub fn reload_schema(&self, schema: &str) -> PyResult<()> {
        self.registry.reload_sdl(schema).map_err(to_py_err)
    }

    /// Every key path of a JSON document
    #[staticmethod]
    pub fn collect_paths(body: &str) -> PyResult<Vec<String>> {
        let document = decode(body)?;
        Ok(collect_paths(&document).map(|p| p.to_string()).collect())
    }
}
