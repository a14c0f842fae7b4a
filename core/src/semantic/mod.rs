//! Semantic attribute checks
//!
//! Numeric rules that depend on how an accessor is used: vertex attributes,
//! primitive indices, skinning streams, animation samplers and inverse bind
//! matrices. Each checker reads already-decoded accessor data and only
//! appends issues; an accessor whose data is unavailable is skipped.

pub mod animation;
pub mod indices;
pub mod skinning;
pub mod vectors;

use gltf_audit_shared::Issue;

use crate::accessor::AccessorData;
use crate::document::Document;

/// Decoded data of accessor `index`, if any.
pub(crate) fn decoded(data: &[Option<AccessorData>], index: usize) -> Option<&AccessorData> {
    data.get(index).and_then(Option::as_ref)
}

/// Run every semantic checker.
pub fn check_semantics(doc: &Document, data: &[Option<AccessorData>], sink: &mut Vec<Issue>) {
    vectors::check_normals(doc, data, sink);
    vectors::check_tangents(doc, data, sink);
    indices::check_indices(doc, data, sink);
    skinning::check_joints_and_weights(doc, data, sink);
    skinning::check_inverse_bind_matrices(doc, data, sink);
    animation::check_inputs(doc, data, sink);
    animation::check_rotation_outputs(doc, data, sink);
}
