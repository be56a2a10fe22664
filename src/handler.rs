// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Request handling and response envelopes for the redaction endpoint
//
// Transport-agnostic: the caller extracts the policy header and body from
// whatever server it runs in and writes `Response::status` and the encoded
// body back out.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::redaction::config::RedactionConfig;
use crate::redaction::engine::Redactor;
use crate::redaction::error::{RedactionError, Result};
use crate::redaction::policy::parse_policies;
use crate::redaction::type_index::TypeIndex;
use crate::schema::SchemaRegistry;

const SUCCESS_MESSAGE: &str = "Successfully parsed JSON";

/// Status code and JSON envelope for one request
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    fn success(data: Value, index: Option<&TypeIndex>) -> Result<Self> {
        let mut body = json!({
            "status": "success",
            "data": data,
            "message": SUCCESS_MESSAGE,
        });
        if let Some(index) = index {
            body["allfield"] = serde_json::to_value(index).map_err(RedactionError::JsonEncode)?;
        }
        Ok(Self { status: 200, body })
    }

    /// Error envelope. Policy failures are prefixed the same way for every
    /// policy kind so clients can tell them apart from request errors.
    pub fn error(err: &RedactionError) -> Self {
        let message = if err.is_policy_error() {
            format!("Error processing policy: {}", err)
        } else {
            err.to_string()
        };
        Self {
            status: err.status_code(),
            body: json!({ "status": "error", "message": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Serialize the body. An encoding failure turns into a 500 error
    /// envelope, which always encodes.
    pub fn into_json_string(self) -> (u16, String) {
        match serde_json::to_string(&self.body) {
            Ok(body) => (self.status, body),
            Err(e) => {
                let fallback = Self::error(&RedactionError::JsonEncode(e));
                let body = fallback.body.to_string();
                (fallback.status, body)
            }
        }
    }
}

/// Redact a request body according to its policy header.
///
/// Checks run in a fixed order: header present, body non-blank, policies
/// well-formed, body decodes, then redaction. The first failure wins and no
/// redacted data is ever returned alongside an error.
pub fn handle_redaction(
    policies: Option<&str>,
    body: &str,
    registry: &SchemaRegistry,
    config: &RedactionConfig,
) -> Response {
    let index = registry.snapshot();
    match redact_body(policies, body, &index, config) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, status = e.status_code(), "redaction request failed");
            Response::error(&e)
        }
    }
}

fn redact_body(
    policies: Option<&str>,
    body: &str,
    index: &TypeIndex,
    config: &RedactionConfig,
) -> Result<Response> {
    let header = policies.ok_or(RedactionError::MissingPolicyHeader)?;
    if body.trim().is_empty() {
        return Err(RedactionError::EmptyRequestBody);
    }
    let policies = parse_policies(header)?;
    let document: Value = serde_json::from_str(body).map_err(RedactionError::JsonDecode)?;

    let redaction = Redactor::new(index, config).redact(document, &policies)?;
    debug!(
        policies = policies.len(),
        removed = redaction.removed.len(),
        "redaction request complete"
    );

    let mut document = redaction.document;
    let data = document
        .get_mut(&config.data_key)
        .map(Value::take)
        .unwrap_or(Value::Null);
    Response::success(data, config.include_type_index.then_some(index))
}
