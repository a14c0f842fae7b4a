//! Shared test utilities for unit tests

use gltf_audit_shared::{Issue, IssueCode};
use serde_json::Value;

use crate::document::Document;

// ============================================================================
// Document Builders
// ============================================================================

/// Parse a test document from a `json!` literal.
pub fn document(json: Value) -> Document {
    Document::from_value(json).expect("test document should parse")
}

/// Little-endian bytes of `values`.
pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

/// Little-endian bytes of `values`.
pub fn u16_bytes(values: &[u16]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

// ============================================================================
// Assertions
// ============================================================================

/// Codes of `issues`, in emission order.
pub fn codes(issues: &[Issue]) -> Vec<IssueCode> {
    issues.iter().map(|issue| issue.code).collect()
}
