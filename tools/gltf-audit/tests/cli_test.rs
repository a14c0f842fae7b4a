//! Integration tests for loading assets from disk.

use gltf_audit::{IssueCode, Report, Validator};
use gltf_audit_cli::{OutputFormat, load_gltf, render};
use gltf_audit_shared::ReportOptions;
use serde_json::json;
use std::fs;
use tempfile::tempdir;

fn write_asset(dir: &std::path::Path, normal: [f32; 3]) -> std::path::PathBuf {
    let gltf = json!({
        "asset": { "version": "2.0" },
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "NORMAL": 0 } }] }],
        "accessors": [{ "bufferView": 0, "componentType": 5126, "type": "VEC3", "count": 1 }],
        "bufferViews": [{ "buffer": 0, "byteLength": 12 }],
        "buffers": [{ "byteLength": 12, "uri": "normals.bin" }]
    });
    fs::write(dir.join("normals.bin"), bytemuck::cast_slice::<f32, u8>(&normal)).unwrap();
    let path = dir.join("scene.gltf");
    fs::write(&path, serde_json::to_vec(&gltf).unwrap()).unwrap();
    path
}

#[test]
fn test_load_resolves_relative_buffer() {
    let dir = tempdir().unwrap();
    let path = write_asset(dir.path(), [0.0, 0.0, 0.0]);

    let asset = load_gltf(&path).unwrap();
    assert!(asset.unresolved.is_empty());
    assert_eq!(asset.buffers.get(0).map(<[u8]>::len), Some(12));

    let issues = Validator::new(&asset.document, &asset.buffers).validate();
    let report = Report::build(issues, &ReportOptions::default());
    assert!(report.has_errors());
    assert_eq!(report.issues[0].code, IssueCode::AccessorNonUnit);
    assert!(report.issues[0].message.contains("indices 0..2"));
}

#[test]
fn test_missing_buffer_is_skipped() {
    let dir = tempdir().unwrap();
    let path = write_asset(dir.path(), [0.0, 1.0, 0.0]);
    fs::remove_file(dir.path().join("normals.bin")).unwrap();

    let asset = load_gltf(&path).unwrap();
    assert_eq!(asset.unresolved, [0]);

    let issues = Validator::new(&asset.document, &asset.buffers).validate();
    let report = Report::build(issues, &ReportOptions::default());
    assert!(!report.has_errors());
    let text = render(&report, OutputFormat::Text).unwrap();
    assert!(text.ends_with("Errors: 0, Warnings: 0, Infos: 0, Hints: 0\n"));
}

#[test]
fn test_invalid_json_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.gltf");
    fs::write(&path, "{ nope").unwrap();
    let err = load_gltf(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse glTF JSON"));
}
