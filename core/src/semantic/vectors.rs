//! NORMAL and TANGENT unit-length rules

use glam::{DVec3, DVec4};
use gltf_audit_shared::{Issue, IssueCode};
use hashbrown::HashSet;

use super::decoded;
use crate::accessor::{AccessorData, ComponentType, ElementType};
use crate::document::Document;

/// Allowed deviation of a vector length from 1.0.
pub const UNIT_LENGTH_THRESHOLD: f64 = 1e-4;

/// Accessor indices bound to `semantic` on any mesh primitive, deduplicated.
fn attribute_accessors(doc: &Document, semantic: &str) -> Vec<usize> {
    let mut seen = HashSet::new();
    let mut accessors = Vec::new();
    for mesh in &doc.meshes {
        for primitive in &mesh.primitives {
            if let Some(&accessor) = primitive.attributes.get(semantic) {
                if seen.insert(accessor) {
                    accessors.push(accessor);
                }
            }
        }
    }
    accessors.sort_unstable();
    accessors
}

pub fn check_normals(doc: &Document, data: &[Option<AccessorData>], sink: &mut Vec<Issue>) {
    for index in attribute_accessors(doc, "NORMAL") {
        let Some(normals) = decoded(data, index) else {
            continue;
        };
        if normals.is(ComponentType::Float, ElementType::Vec3) {
            check_normal_data(index, normals, sink);
        }
    }
}

pub(crate) fn check_normal_data(index: usize, normals: &AccessorData, sink: &mut Vec<Issue>) {
    for e in 0..normals.count() {
        let v = DVec3::from_slice(normals.element(e));
        let length = v.length();
        if (length - 1.0).abs() > UNIT_LENGTH_THRESHOLD {
            let first = e * 3;
            sink.push(
                Issue::new(
                    IssueCode::AccessorNonUnit,
                    format!("/accessors/{index}"),
                    format!(
                        "Accessor element at indices {first}..{} is not of unit length: {length}.",
                        first + 2
                    ),
                )
                .with_offset(first),
            );
        }
    }
}

pub fn check_tangents(doc: &Document, data: &[Option<AccessorData>], sink: &mut Vec<Issue>) {
    for index in attribute_accessors(doc, "TANGENT") {
        let Some(tangents) = decoded(data, index) else {
            continue;
        };
        if !tangents.is(ComponentType::Float, ElementType::Vec4) {
            continue;
        }
        for e in 0..tangents.count() {
            let t = DVec4::from_slice(tangents.element(e));
            let first = e * 4;
            let length = t.truncate().length();
            if (length - 1.0).abs() > UNIT_LENGTH_THRESHOLD {
                sink.push(
                    Issue::new(
                        IssueCode::AccessorNonUnit,
                        format!("/accessors/{index}"),
                        format!(
                            "Accessor element at indices {first}..{} is not of unit length: {length}.",
                            first + 2
                        ),
                    )
                    .with_offset(first),
                );
            }
            if (t.w.abs() - 1.0).abs() > UNIT_LENGTH_THRESHOLD {
                sink.push(
                    Issue::new(
                        IssueCode::AccessorInvalidSign,
                        format!("/accessors/{index}"),
                        format!(
                            "Accessor element at index {} has invalid w component: {}. Must be 1.0 or -1.0.",
                            first + 3,
                            t.w
                        ),
                    )
                    .with_offset(first + 3),
                );
            }
        }
    }
}
