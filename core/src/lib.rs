//! gltf-audit core - glTF conformance checks
//!
//! Read-only analysis of a parsed glTF document and its resolved buffers,
//! producing a flat list of [`Issue`]s.
//!
//! # Architecture
//!
//! - [`document`] - serde model of the JSON scene graph plus [`BufferSet`]
//! - [`accessor`] - binary accessor engine (layout, decoding, min/max)
//! - [`semantic`] - attribute rules (normals, tangents, skinning, animation)
//! - [`references`] - index range checks
//! - [`extensions`] - known extension registry
//! - [`hierarchy`] - node loops, parents, skin ancestry
//! - [`usage`] - reachability and unused objects
//! - [`Validator`] - runs all of the above in order

pub mod accessor;
pub mod document;
pub mod extensions;
pub mod hierarchy;
pub mod references;
pub mod semantic;
#[cfg(test)]
pub mod test_utils;
pub mod usage;
pub mod validator;

pub use document::{BufferSet, Document, DocumentError};
pub use extensions::KnownExtension;
pub use usage::{ObjectRef, UsageReport, track_usage};
pub use validator::{Validator, validate};

// Re-export the output contract
pub use gltf_audit_shared::{Issue, IssueCode, Report, ReportConfig, Severity, ValidationOptions};
