//! Primitive index rules

use gltf_audit_shared::{Issue, IssueCode};
use std::collections::BTreeSet;

use super::decoded;
use crate::accessor::{AccessorData, ElementType};
use crate::document::{Document, Primitive};

/// Vertex count of a primitive: POSITION's count, else the smallest
/// attribute count.
fn vertex_count(doc: &Document, primitive: &Primitive) -> Option<usize> {
    if let Some(position) = primitive
        .attributes
        .get("POSITION")
        .and_then(|&a| doc.accessors.get(a))
    {
        return Some(position.count);
    }
    primitive
        .attributes
        .values()
        .filter_map(|&a| doc.accessors.get(a))
        .map(|a| a.count)
        .min()
}

pub fn check_indices(doc: &Document, data: &[Option<AccessorData>], sink: &mut Vec<Issue>) {
    // (indices accessor, vertex count)
    let mut targets = BTreeSet::new();
    for mesh in &doc.meshes {
        for primitive in &mesh.primitives {
            let vertices = vertex_count(doc, primitive);
            if let (Some(index), Some(vertices)) = (primitive.indices, vertices) {
                targets.insert((index, vertices));
            }
        }
    }
    for (index, vertices) in targets {
        let Some(indices) = decoded(data, index) else {
            continue;
        };
        if indices.element != ElementType::Scalar {
            continue;
        }
        let Some(restart) = indices.component.unsigned_max() else {
            continue;
        };
        check_index_data(index, indices, vertices, restart, sink);
    }
}

fn check_index_data(
    index: usize,
    indices: &AccessorData,
    vertices: usize,
    restart: u64,
    sink: &mut Vec<Issue>,
) {
    for (i, &value) in indices.values.iter().enumerate() {
        let value = value as u64;
        if value == restart {
            sink.push(
                Issue::new(
                    IssueCode::AccessorIndexPrimitiveRestart,
                    format!("/accessors/{index}"),
                    format!("Indices accessor contains primitive restart value {value} at index {i}."),
                )
                .with_offset(i),
            );
        } else if value >= vertices as u64 {
            let message = match vertices.checked_sub(1) {
                Some(last) => format!(
                    "Indices accessor element at index {i} has vertex index {value} that exceeds the last vertex index ({last})."
                ),
                None => format!(
                    "Indices accessor element at index {i} has vertex index {value} but the primitive has no vertices."
                ),
            };
            sink.push(
                Issue::new(IssueCode::AccessorIndexOob, format!("/accessors/{index}"), message)
                    .with_offset(i),
            );
        }
    }
}
