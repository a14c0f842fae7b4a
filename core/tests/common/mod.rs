//! Helpers for building test documents with a single binary buffer.

#![allow(dead_code)]

use gltf_audit::{BufferSet, Document, Issue, IssueCode, Validator};
use serde_json::{Value, json};

/// Accumulates a binary buffer plus the views pointing into it.
#[derive(Default)]
pub struct BinBuilder {
    pub bytes: Vec<u8>,
    pub views: Vec<Value>,
}

impl BinBuilder {
    /// Append `data` as a new 4-byte aligned buffer view and return its index.
    pub fn view(&mut self, data: &[u8]) -> usize {
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(data);
        self.views.push(json!({ "buffer": 0, "byteOffset": offset, "byteLength": data.len() }));
        self.views.len() - 1
    }

    pub fn f32_view(&mut self, values: &[f32]) -> usize {
        self.view(bytemuck::cast_slice(values))
    }

    pub fn u8_view(&mut self, values: &[u8]) -> usize {
        self.view(values)
    }

    /// Merge buffers/bufferViews into `gltf` and parse it.
    pub fn finish(self, mut gltf: Value) -> (Document, BufferSet) {
        gltf["buffers"] = json!([{ "byteLength": self.bytes.len() }]);
        gltf["bufferViews"] = Value::Array(self.views);
        let document = Document::from_value(gltf).expect("test document should parse");
        let buffers = [self.bytes].into_iter().collect();
        (document, buffers)
    }
}

pub fn validate(document: &Document, buffers: &BufferSet) -> Vec<Issue> {
    Validator::new(document, buffers).validate()
}

pub fn with_code(issues: &[Issue], code: IssueCode) -> Vec<&Issue> {
    issues.iter().filter(|issue| issue.code == code).collect()
}
