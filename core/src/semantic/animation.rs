//! Animation sampler input/output rules

use glam::DQuat;
use gltf_audit_shared::{Issue, IssueCode};
use std::collections::BTreeSet;

use super::decoded;
use crate::accessor::{AccessorData, ComponentType, ElementType};
use crate::document::Document;

/// Allowed deviation of a rotation quaternion's length from 1.0.
pub const QUATERNION_LENGTH_THRESHOLD: f64 = 0.01;

pub fn check_inputs(doc: &Document, data: &[Option<AccessorData>], sink: &mut Vec<Issue>) {
    let targets: BTreeSet<usize> = doc
        .animations
        .iter()
        .flat_map(|animation| animation.samplers.iter().map(|sampler| sampler.input))
        .collect();
    for index in targets {
        let Some(input) = decoded(data, index) else {
            continue;
        };
        if input.is(ComponentType::Float, ElementType::Scalar) {
            check_input_data(index, input, sink);
        }
    }
}

fn check_input_data(index: usize, input: &AccessorData, sink: &mut Vec<Issue>) {
    let mut previous: Option<f64> = None;
    for (i, &value) in input.values.iter().enumerate() {
        if value < 0.0 {
            sink.push(
                Issue::new(
                    IssueCode::AccessorAnimationInputNegative,
                    format!("/accessors/{index}"),
                    format!("Animation input accessor element at index {i} is negative: {value}."),
                )
                .with_offset(i),
            );
        }
        // Negative times were already reported; treat them as zero for ordering.
        let time = value.max(0.0);
        if let Some(previous) = previous {
            if time <= previous {
                sink.push(
                    Issue::new(
                        IssueCode::AccessorAnimationInputNonIncreasing,
                        format!("/accessors/{index}"),
                        format!(
                            "Animation input accessor element at index {i} is less than or equal to previous: {value} <= {previous}."
                        ),
                    )
                    .with_offset(i),
                );
            }
        }
        previous = Some(time);
    }
}

pub fn check_rotation_outputs(
    doc: &Document,
    data: &[Option<AccessorData>],
    sink: &mut Vec<Issue>,
) {
    // (output accessor, cubic spline)
    let mut targets = BTreeSet::new();
    for animation in &doc.animations {
        for channel in &animation.channels {
            if channel.target.path != "rotation" {
                continue;
            }
            if let Some(sampler) = channel.sampler.and_then(|s| animation.samplers.get(s)) {
                targets.insert((sampler.output, sampler.is_cubic_spline()));
            }
        }
    }
    for (index, cubic) in targets {
        let Some(output) = decoded(data, index) else {
            continue;
        };
        if output.is(ComponentType::Float, ElementType::Vec4) {
            check_rotation_data(index, output, cubic, sink);
        }
    }
}

fn check_rotation_data(index: usize, output: &AccessorData, cubic: bool, sink: &mut Vec<Issue>) {
    for e in 0..output.count() {
        // Cubic spline output is (in-tangent, value, out-tangent) triples.
        if cubic && e % 3 != 1 {
            continue;
        }
        let length = DQuat::from_slice(output.element(e)).length();
        if (length - 1.0).abs() > QUATERNION_LENGTH_THRESHOLD {
            let first = e * 4;
            sink.push(
                Issue::new(
                    IssueCode::AccessorNonUnit,
                    format!("/accessors/{index}"),
                    format!(
                        "Accessor element at indices {first}..{} is not of unit length: {length}.",
                        first + 3
                    ),
                )
                .with_offset(first),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{codes, document};
    use serde_json::json;

    fn float_data(element: ElementType, values: &[f64]) -> Option<AccessorData> {
        Some(AccessorData {
            component: ComponentType::Float,
            element,
            normalized: false,
            values: values.to_vec(),
        })
    }

    fn animated(interpolation: &str) -> Document {
        document(json!({
            "nodes": [{}],
            "animations": [{
                "channels": [{ "sampler": 0, "target": { "node": 0, "path": "rotation" } }],
                "samplers": [{ "input": 0, "output": 1, "interpolation": interpolation }]
            }],
            "accessors": [
                { "componentType": 5126, "type": "SCALAR", "count": 3 },
                { "componentType": 5126, "type": "VEC4", "count": 3 }
            ]
        }))
    }

    #[test]
    fn test_input_negative_and_non_increasing() {
        let doc = animated("LINEAR");
        let data = vec![float_data(ElementType::Scalar, &[-1.0, 0.0, 0.5]), None];
        let mut sink = Vec::new();
        check_inputs(&doc, &data, &mut sink);
        assert_eq!(
            codes(&sink),
            [
                IssueCode::AccessorAnimationInputNegative,
                IssueCode::AccessorAnimationInputNonIncreasing,
            ]
        );
        assert_eq!(sink[0].offset, Some(0));
        assert_eq!(sink[1].offset, Some(1));
    }

    #[test]
    fn test_inputs_checked_in_accessor_order() {
        let doc = document(json!({
            "animations": [
                { "samplers": [{ "input": 1, "output": 2 }] },
                { "samplers": [{ "input": 0, "output": 2 }] }
            ],
            "accessors": [
                { "componentType": 5126, "type": "SCALAR", "count": 1 },
                { "componentType": 5126, "type": "SCALAR", "count": 1 },
                { "componentType": 5126, "type": "VEC4", "count": 1 }
            ]
        }));
        let data = vec![
            float_data(ElementType::Scalar, &[-2.0]),
            float_data(ElementType::Scalar, &[-1.0]),
            None,
        ];
        let mut sink = Vec::new();
        check_inputs(&doc, &data, &mut sink);
        let pointers: Vec<_> = sink.iter().map(|i| i.pointer.as_str()).collect();
        assert_eq!(pointers, ["/accessors/0", "/accessors/1"]);
    }

    #[test]
    fn test_increasing_input_is_clean() {
        let doc = animated("LINEAR");
        let data = vec![float_data(ElementType::Scalar, &[0.0, 0.25, 1.0]), None];
        let mut sink = Vec::new();
        check_inputs(&doc, &data, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_rotation_output_unit_length() {
        let doc = animated("LINEAR");
        let data = vec![
            None,
            float_data(
                ElementType::Vec4,
                &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 1.005],
            ),
        ];
        let mut sink = Vec::new();
        check_rotation_outputs(&doc, &data, &mut sink);
        assert_eq!(codes(&sink), [IssueCode::AccessorNonUnit]);
        assert_eq!(sink[0].offset, Some(4));
    }

    #[test]
    fn test_cubic_spline_skips_tangents() {
        let doc = animated("CUBICSPLINE");
        let data = vec![
            None,
            float_data(
                ElementType::Vec4,
                &[0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            ),
        ];
        let mut sink = Vec::new();
        check_rotation_outputs(&doc, &data, &mut sink);
        assert!(sink.is_empty());
    }
}
