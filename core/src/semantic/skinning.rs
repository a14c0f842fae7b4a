//! Skinning rules: JOINTS_n / WEIGHTS_n streams and inverse bind matrices

use gltf_audit_shared::{Issue, IssueCode};
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::collections::BTreeSet;

use super::decoded;
use crate::accessor::{AccessorData, ComponentType, ElementType};
use crate::document::Document;

/// Weights below this magnitude count as zero.
pub const ZERO_WEIGHT_THRESHOLD: f64 = 1e-6;
/// Allowed deviation of a vertex's weight sum from 1.0.
pub const WEIGHT_SUM_THRESHOLD: f64 = 1e-4;

/// Flat indices of an inverse bind matrix that must read (0, 0, 0, 1).
const IBM_FIXED_ELEMENTS: [(usize, f64); 4] = [(3, 0.0), (7, 0.0), (11, 0.0), (15, 1.0)];

/// JOINTS_n and WEIGHTS_n accessors of one primitive as (set, accessor).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SkinningStreams {
    joints: Vec<(u32, usize)>,
    weights: Vec<(u32, usize)>,
}

/// Skins that may deform each mesh, from nodes referencing both.
fn mesh_skins(doc: &Document) -> Vec<BTreeSet<usize>> {
    let mut skins = vec![BTreeSet::new(); doc.meshes.len()];
    for node in &doc.nodes {
        if let (Some(mesh), Some(skin)) = (node.mesh, node.skin) {
            if mesh < skins.len() && skin < doc.skins.len() {
                skins[mesh].insert(skin);
            }
        }
    }
    skins
}

/// Distinct stream sets with the union of skins applying to them, in mesh order.
fn collect_groups(doc: &Document) -> Vec<(SkinningStreams, BTreeSet<usize>)> {
    let skins = mesh_skins(doc);
    let mut groups: Vec<(SkinningStreams, BTreeSet<usize>)> = Vec::new();
    let mut lookup: HashMap<SkinningStreams, usize> = HashMap::new();

    for (mesh_index, mesh) in doc.meshes.iter().enumerate() {
        for primitive in &mesh.primitives {
            let streams = SkinningStreams {
                joints: primitive.attribute_sets("JOINTS"),
                weights: primitive.attribute_sets("WEIGHTS"),
            };
            if streams.joints.is_empty() && streams.weights.is_empty() {
                continue;
            }
            let slot = match lookup.get(&streams) {
                Some(&slot) => slot,
                None => {
                    groups.push((streams.clone(), BTreeSet::new()));
                    lookup.insert(streams, groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[slot].1.extend(skins[mesh_index].iter().copied());
        }
    }
    groups
}

fn is_joints(data: &AccessorData) -> bool {
    data.element == ElementType::Vec4
        && matches!(
            data.component,
            ComponentType::UnsignedByte | ComponentType::UnsignedShort
        )
}

fn is_weights(data: &AccessorData) -> bool {
    data.element == ElementType::Vec4
        && (data.component == ComponentType::Float
            || (data.normalized
                && matches!(
                    data.component,
                    ComponentType::UnsignedByte | ComponentType::UnsignedShort
                )))
}

pub fn check_joints_and_weights(
    doc: &Document,
    data: &[Option<AccessorData>],
    sink: &mut Vec<Issue>,
) {
    let mut found = Vec::new();
    for (streams, skins) in collect_groups(doc) {
        check_group(doc, data, &streams, &skins, &mut found);
    }
    // Groups follow mesh order; findings go out by accessor.
    found.sort_by_key(|&(accessor, _)| accessor);
    sink.extend(found.into_iter().map(|(_, issue)| issue));
}

fn check_group(
    doc: &Document,
    data: &[Option<AccessorData>],
    streams: &SkinningStreams,
    skins: &BTreeSet<usize>,
    sink: &mut Vec<(usize, Issue)>,
) {
    let joints: Vec<(u32, usize, &AccessorData)> = streams
        .joints
        .iter()
        .filter_map(|&(set, index)| {
            let d = decoded(data, index)?;
            is_joints(d).then_some((set, index, d))
        })
        .collect();
    let weights: Vec<(u32, usize, &AccessorData)> = streams
        .weights
        .iter()
        .filter_map(|&(set, index)| {
            let d = decoded(data, index)?;
            is_weights(d).then_some((set, index, d))
        })
        .collect();

    for &(_, index, w) in &weights {
        for flat in 0..w.values.len() {
            let value = w.normalized_value(flat);
            if value < 0.0 {
                sink.push((
                    index,
                    Issue::new(
                        IssueCode::AccessorWeightsNegative,
                        format!("/accessors/{index}"),
                        format!("Weights accessor element at index {flat} has negative value {value}."),
                    )
                    .with_offset(flat),
                ));
            }
        }
    }

    // Most restrictive skin first.
    let mut limits: Vec<(usize, usize)> = skins
        .iter()
        .filter_map(|&s| doc.skins.get(s).map(|skin| (s, skin.joints.len())))
        .collect();
    limits.sort_by_key(|&(skin, len)| (len, skin));

    let vertex_count = joints
        .iter()
        .chain(weights.iter())
        .map(|(_, _, d)| d.count())
        .min()
        .unwrap_or(0);
    let mut zero_weight_reported = vec![false; joints.len()];

    for vertex in 0..vertex_count {
        let mut seen: SmallVec<[u32; 8]> = SmallVec::new();

        for (slot, &(set, index, j)) in joints.iter().enumerate() {
            let paired = weights
                .iter()
                .find(|(weight_set, _, _)| *weight_set == set)
                .map(|&(_, _, w)| w);

            for c in 0..4 {
                let flat = vertex * 4 + c;
                let joint = j.values[flat] as u32;

                if let Some(&(skin, len)) = limits.iter().find(|&&(_, len)| joint as usize >= len) {
                    let limit = match len.checked_sub(1) {
                        Some(last) => format!("maximum valid index is {last}"),
                        None => "skin has no joints".to_string(),
                    };
                    sink.push((
                        index,
                        Issue::new(
                            IssueCode::AccessorJointsIndexOob,
                            format!("/accessors/{index}"),
                            format!(
                                "Joints accessor element at index {flat} references non-existing joint {joint} of skin {skin} ({limit})."
                            ),
                        )
                        .with_offset(flat),
                    ));
                }

                if joint == 0 {
                    continue;
                }

                if seen.contains(&joint) {
                    sink.push((
                        index,
                        Issue::new(
                            IssueCode::AccessorJointsIndexDuplicate,
                            format!("/accessors/{index}"),
                            format!(
                                "Joints accessor element at index {flat} contains a duplicate joint index {joint} for the same vertex."
                            ),
                        )
                        .with_offset(flat),
                    ));
                } else {
                    seen.push(joint);
                }

                if zero_weight_reported[slot] {
                    continue;
                }
                if let Some(w) = paired {
                    if w.normalized_value(flat).abs() < ZERO_WEIGHT_THRESHOLD {
                        zero_weight_reported[slot] = true;
                        sink.push((
                            index,
                            Issue::new(
                                IssueCode::AccessorJointsUsedZeroWeight,
                                format!("/accessors/{index}"),
                                format!(
                                    "Joints accessor element at index {flat} references joint {joint} with zero weight."
                                ),
                            )
                            .with_offset(flat),
                        ));
                    }
                }
            }
        }

        let Some(&(_, first_weights, _)) = weights.first() else {
            continue;
        };
        let sum: f64 = weights
            .iter()
            .map(|(_, _, w)| (0..4).map(|c| w.normalized_value(vertex * 4 + c)).sum::<f64>())
            .sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_THRESHOLD {
            let first = vertex * 4;
            sink.push((
                first_weights,
                Issue::new(
                    IssueCode::AccessorWeightsNonNormalized,
                    format!("/accessors/{first_weights}"),
                    format!(
                        "Weights accessor elements (at indices {first}..{}) have non-normalized sum: {sum}.",
                        first + 3
                    ),
                )
                .with_offset(first),
            ));
        }
    }
}

pub fn check_inverse_bind_matrices(
    doc: &Document,
    data: &[Option<AccessorData>],
    sink: &mut Vec<Issue>,
) {
    let targets: BTreeSet<usize> = doc
        .skins
        .iter()
        .filter_map(|skin| skin.inverse_bind_matrices)
        .collect();
    for index in targets {
        let Some(matrices) = decoded(data, index) else {
            continue;
        };
        if !matrices.is(ComponentType::Float, ElementType::Mat4) {
            continue;
        }
        for m in 0..matrices.count() {
            let matrix = matrices.element(m);
            for (k, expected) in IBM_FIXED_ELEMENTS {
                let value = matrix[k];
                if value != expected {
                    let flat = m * 16 + k;
                    sink.push(
                        Issue::new(
                            IssueCode::AccessorInvalidIbm,
                            format!("/accessors/{index}"),
                            format!(
                                "Matrix element at index {flat} (component index {k}) contains invalid value: {value}."
                            ),
                        )
                        .with_offset(flat),
                    );
                }
            }
        }
    }
}
