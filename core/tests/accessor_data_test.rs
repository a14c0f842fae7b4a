//! Accessor data checks through the full validator.

mod common;

use common::{BinBuilder, validate, with_code};
use gltf_audit::IssueCode;
use serde_json::json;

#[test]
fn test_zero_normal_is_not_unit_length() {
    let mut bin = BinBuilder::default();
    let view = bin.f32_view(&[0.0, 0.0, 0.0]);
    let (doc, buffers) = bin.finish(json!({
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "NORMAL": 0 } }] }],
        "accessors": [{ "bufferView": view, "componentType": 5126, "type": "VEC3", "count": 1 }]
    }));

    let issues = validate(&doc, &buffers);
    let non_unit = with_code(&issues, IssueCode::AccessorNonUnit);
    assert_eq!(non_unit.len(), 1);
    assert_eq!(non_unit[0].pointer, "/accessors/0");
    assert!(non_unit[0].message.contains("indices 0..2"));
}

#[test]
fn test_declared_bounds_checked_per_component() {
    let mut bin = BinBuilder::default();
    let view = bin.f32_view(&[0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
    let (doc, buffers) = bin.finish(json!({
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [{
            "bufferView": view, "componentType": 5126, "type": "VEC3", "count": 2,
            "min": [0.0, 0.0, 0.0], "max": [1.0, 0.5, 0.0]
        }]
    }));

    let issues = validate(&doc, &buffers);
    let pointers: Vec<_> = issues.iter().map(|i| (i.code, i.pointer.as_str())).collect();
    assert_eq!(
        pointers,
        [
            (IssueCode::AccessorElementOutOfMaxBound, "/accessors/0/max/1"),
            (IssueCode::AccessorMaxMismatch, "/accessors/0/max/1"),
        ]
    );
}

#[test]
fn test_accessor_past_view_end() {
    let mut bin = BinBuilder::default();
    let view = bin.f32_view(&[0.0; 5]);
    let (doc, buffers) = bin.finish(json!({
        "accessors": [
            { "bufferView": view, "componentType": 5126, "type": "VEC3", "count": 2 },
            { "bufferView": view, "byteOffset": 2, "componentType": 5126, "type": "SCALAR", "count": 1 }
        ]
    }));

    let issues = validate(&doc, &buffers);
    assert_eq!(with_code(&issues, IssueCode::AccessorTooLong).len(), 1);
    assert_eq!(with_code(&issues, IssueCode::AccessorOffsetAlignment)[0].pointer, "/accessors/1/byteOffset");
}

#[test]
fn test_weights_negative_and_sum() {
    let mut bin = BinBuilder::default();
    let joints = bin.u8_view(&[0, 1, 0, 0, 0, 1, 0, 0]);
    let weights = bin.f32_view(&[1.0, 0.0, 0.0, 0.0, 0.75, -0.5, 0.0, 0.0]);
    let (doc, buffers) = bin.finish(json!({
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [{ "mesh": 0, "skin": 0 }, {}],
        "skins": [{ "joints": [1] }],
        "meshes": [{ "primitives": [{ "attributes": { "JOINTS_0": 0, "WEIGHTS_0": 1 } }] }],
        "accessors": [
            { "bufferView": joints, "componentType": 5121, "type": "VEC4", "count": 2 },
            { "bufferView": weights, "componentType": 5126, "type": "VEC4", "count": 2 }
        ]
    }));

    let issues = validate(&doc, &buffers);
    let negative = with_code(&issues, IssueCode::AccessorWeightsNegative);
    assert_eq!(negative.len(), 1);
    assert_eq!(negative[0].offset, Some(5));
    let sums = with_code(&issues, IssueCode::AccessorWeightsNonNormalized);
    assert_eq!(sums.len(), 1);
    assert!(sums[0].message.contains("indices 4..7"));
    // Joint 1 is out of range for a one-joint skin.
    let oob = with_code(&issues, IssueCode::AccessorJointsIndexOob);
    assert_eq!(oob.len(), 2);
    assert!(oob[0].message.contains("maximum valid index is 0"));
}

#[test]
fn test_joint_index_past_skin() {
    let mut bin = BinBuilder::default();
    let joints = bin.u8_view(&[5, 0, 0, 0]);
    let weights = bin.f32_view(&[1.0, 0.0, 0.0, 0.0]);
    let (doc, buffers) = bin.finish(json!({
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "skin": 0, "children": [1] }, {}],
        "skins": [{ "joints": [0, 1] }],
        "meshes": [{ "primitives": [{ "attributes": { "JOINTS_0": 0, "WEIGHTS_0": 1 } }] }],
        "accessors": [
            { "bufferView": joints, "componentType": 5121, "type": "VEC4", "count": 1 },
            { "bufferView": weights, "componentType": 5126, "type": "VEC4", "count": 1 }
        ]
    }));

    let issues = validate(&doc, &buffers);
    let oob = with_code(&issues, IssueCode::AccessorJointsIndexOob);
    assert_eq!(oob.len(), 1);
    assert_eq!(oob[0].offset, Some(0));
    assert!(oob[0].message.contains("maximum valid index is 1"));
}

#[test]
fn test_byte_matrix_is_tightly_packed() {
    let mut bin = BinBuilder::default();
    let view = bin.u8_view(&[1, 2, 3, 4]);
    let (doc, buffers) = bin.finish(json!({
        "accessors": [{ "bufferView": view, "componentType": 5121, "type": "MAT2", "count": 1 }]
    }));

    let issues = validate(&doc, &buffers);
    assert!(with_code(&issues, IssueCode::AccessorTooLong).is_empty(), "{issues:?}");
}

#[test]
fn test_float_matrix_with_byte_offset() {
    let mut bin = BinBuilder::default();
    let view = bin.f32_view(&[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    let (doc, buffers) = bin.finish(json!({
        "accessors": [
            { "bufferView": view, "byteOffset": 16, "componentType": 5126, "type": "MAT2", "count": 1 },
            { "bufferView": view, "byteOffset": 2, "componentType": 5126, "type": "MAT2", "count": 1 }
        ]
    }));

    let issues = validate(&doc, &buffers);
    let total = with_code(&issues, IssueCode::AccessorTotalOffsetAlignment);
    assert_eq!(total.len(), 1);
    assert_eq!(total[0].pointer, "/accessors/1/byteOffset");
    assert_eq!(with_code(&issues, IssueCode::AccessorOffsetAlignment).len(), 1);
    assert!(with_code(&issues, IssueCode::AccessorTooLong).is_empty());
}

#[test]
fn test_integer_matrix_offset_needs_component_alignment_only() {
    let mut bin = BinBuilder::default();
    let view = bin.u8_view(&[0; 12]);
    let (doc, buffers) = bin.finish(json!({
        "accessors": [{ "bufferView": view, "byteOffset": 2, "componentType": 5123, "type": "MAT2", "count": 1 }]
    }));

    let issues = validate(&doc, &buffers);
    assert!(with_code(&issues, IssueCode::AccessorTotalOffsetAlignment).is_empty(), "{issues:?}");
    assert!(with_code(&issues, IssueCode::AccessorOffsetAlignment).is_empty());
}

#[test]
fn test_huge_sparse_accessor_without_view() {
    let mut bin = BinBuilder::default();
    let indices = bin.u8_view(&[7, 0]);
    let values = bin.f32_view(&[1.0]);
    let (doc, buffers) = bin.finish(json!({
        "accessors": [{
            "componentType": 5126, "type": "SCALAR", "count": 2305843009213693952u64,
            "sparse": {
                "count": 1,
                "indices": { "bufferView": indices, "componentType": 5123 },
                "values": { "bufferView": values }
            }
        }]
    }));

    let issues = validate(&doc, &buffers);
    assert!(with_code(&issues, IssueCode::AccessorSparseIndexOob).is_empty());
    assert!(with_code(&issues, IssueCode::AccessorTooLong).is_empty());
}

#[test]
fn test_joint_findings_in_accessor_order() {
    let mut bin = BinBuilder::default();
    let low = bin.u8_view(&[4, 0, 0, 0]);
    let high = bin.u8_view(&[3, 0, 0, 0]);
    let (doc, buffers) = bin.finish(json!({
        "scenes": [{ "nodes": [0, 1, 2] }],
        "nodes": [{ "mesh": 0, "skin": 0 }, { "mesh": 1, "skin": 0 }, {}],
        "skins": [{ "joints": [2] }],
        "meshes": [
            { "primitives": [{ "attributes": { "JOINTS_0": 1 } }] },
            { "primitives": [{ "attributes": { "JOINTS_0": 0 } }] }
        ],
        "accessors": [
            { "bufferView": low, "componentType": 5121, "type": "VEC4", "count": 1 },
            { "bufferView": high, "componentType": 5121, "type": "VEC4", "count": 1 }
        ]
    }));

    let issues = validate(&doc, &buffers);
    let pointers: Vec<_> = with_code(&issues, IssueCode::AccessorJointsIndexOob)
        .iter()
        .map(|i| i.pointer.as_str())
        .collect();
    assert_eq!(pointers, ["/accessors/0", "/accessors/1"]);
}
