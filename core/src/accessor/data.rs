//! Accessor data decoding
//!
//! Materializes every component of an accessor (base data plus sparse
//! substitution) and checks the decoded values against declared bounds.

use gltf_audit_shared::{Issue, IssueCode};

use super::component::{ComponentType, ElementType};
use super::layout::{AccessorLayout, SparseLayout};
use crate::document::{Accessor, BufferSet};

/// Decoded components of one accessor, element-major.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorData {
    pub component: ComponentType,
    pub element: ElementType,
    pub normalized: bool,
    pub values: Vec<f64>,
}

impl AccessorData {
    pub fn components(&self) -> usize {
        self.element.component_count()
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.values.len() / self.components()
    }

    pub fn element(&self, index: usize) -> &[f64] {
        let n = self.components();
        &self.values[index * n..(index + 1) * n]
    }

    /// Component value with `normalized` applied.
    pub fn normalized_value(&self, flat: usize) -> f64 {
        let raw = self.values[flat];
        if self.normalized {
            self.component.normalize(raw)
        } else {
            raw
        }
    }

    pub fn is(&self, component: ComponentType, element: ElementType) -> bool {
        self.component == component && self.element == element
    }
}

/// Upper bound on components materialized for one accessor.
pub const MAX_DECODED_COMPONENTS: usize = 1 << 24;

fn component_len(count: usize, n: usize) -> Option<usize> {
    count
        .checked_mul(n)
        .filter(|&len| len <= MAX_DECODED_COMPONENTS)
}

fn read_stream(layout: &AccessorLayout, bytes: &[u8]) -> Option<Vec<f64>> {
    let end = layout.offset.checked_add(layout.byte_len())?;
    if end > bytes.len() {
        return None;
    }
    let n = layout.element.component_count();
    // A zero or short byteStride lets `count` outgrow the bytes backing it.
    let mut values = Vec::with_capacity(component_len(layout.count, n)?);
    for element in 0..layout.count {
        for component in 0..n {
            values.push(layout.component.read(bytes, layout.component_at(element, component)));
        }
    }
    Some(values)
}

/// Decode all components of an accessor.
///
/// `layout` is `None` when the accessor has no buffer view (the base data is
/// then all zeros) or when its layout failed validation. Returns `None` when
/// the data cannot be decoded.
pub fn decode(
    index: usize,
    accessor: &Accessor,
    layout: Option<&AccessorLayout>,
    sparse: Option<&SparseLayout>,
    buffers: &BufferSet,
    sink: &mut Vec<Issue>,
) -> Option<AccessorData> {
    let component = accessor.component()?;
    let element = accessor.element()?;
    let n = element.component_count();

    let mut values = match (accessor.buffer_view, layout) {
        (Some(_), Some(layout)) => {
            let Some(bytes) = buffers.get(layout.buffer) else {
                tracing::debug!("accessor {index}: buffer {} unresolved", layout.buffer);
                return None;
            };
            let Some(values) = read_stream(layout, bytes) else {
                tracing::warn!("accessor {index}: data not decodable, skipping data checks");
                return None;
            };
            Some(values)
        }
        (Some(_), None) => return None,
        (None, _) if accessor.sparse.is_some() => {
            let zeros = component_len(accessor.count, n).map(|len| vec![0.0; len]);
            if zeros.is_none() {
                tracing::warn!(
                    count = accessor.count,
                    "accessor {index}: too many elements to decode, checking sparse indices only"
                );
            }
            zeros
        }
        (None, _) => return None,
    };

    if accessor.sparse.is_some() {
        let sparse = sparse?;
        let index_bytes = buffers.get(sparse.indices.buffer)?;
        let value_bytes = buffers.get(sparse.values.buffer)?;
        let indices = read_stream(&sparse.indices, index_bytes)?;
        let replacements = read_stream(&sparse.values, value_bytes)?;
        let pointer = format!("/accessors/{index}/sparse");

        let mut previous: Option<f64> = None;
        for (k, &target) in indices.iter().enumerate() {
            if previous.is_some_and(|p| target <= p) {
                sink.push(
                    Issue::new(
                        IssueCode::AccessorSparseIndicesNonIncreasing,
                        pointer.clone(),
                        format!("Accessor sparse indices element at index {k} is less than or equal to previous: {target}."),
                    )
                    .with_offset(k),
                );
            }
            previous = Some(target);

            let target = target as usize;
            if target >= accessor.count {
                sink.push(
                    Issue::new(
                        IssueCode::AccessorSparseIndexOob,
                        pointer.clone(),
                        format!(
                            "Accessor sparse indices element at index {k} is greater than or equal to the number of accessor elements: {target} >= {}.",
                            accessor.count
                        ),
                    )
                    .with_offset(k),
                );
                continue;
            }
            if let Some(values) = values.as_mut() {
                values[target * n..(target + 1) * n]
                    .copy_from_slice(&replacements[k * n..(k + 1) * n]);
            }
        }
    }

    Some(AccessorData {
        component,
        element,
        normalized: accessor.normalized,
        values: values?,
    })
}

/// Declared bound value compared at the accessor's own precision.
fn declared(component: ComponentType, value: f64) -> f64 {
    if component.is_float() {
        value as f32 as f64
    } else {
        value
    }
}

/// Invalid floats and declared min/max against decoded values.
pub fn check_values(index: usize, accessor: &Accessor, data: &AccessorData, sink: &mut Vec<Issue>) {
    let n = data.components();
    let pointer = format!("/accessors/{index}");
    let min = accessor.min.as_ref().filter(|m| m.len() == n);
    let max = accessor.max.as_ref().filter(|m| m.len() == n);

    let mut actual_min = vec![f64::INFINITY; n];
    let mut actual_max = vec![f64::NEG_INFINITY; n];
    let mut below = vec![0usize; n];
    let mut above = vec![0usize; n];

    for (flat, &value) in data.values.iter().enumerate() {
        let c = flat % n;
        if !value.is_finite() {
            sink.push(
                Issue::new(
                    IssueCode::AccessorInvalidFloat,
                    pointer.clone(),
                    format!("Accessor element at index {flat} is NaN or Infinity."),
                )
                .with_offset(flat),
            );
            continue;
        }
        actual_min[c] = actual_min[c].min(value);
        actual_max[c] = actual_max[c].max(value);
        if let Some(min) = min {
            if value < declared(data.component, min[c]) {
                below[c] += 1;
            }
        }
        if let Some(max) = max {
            if value > declared(data.component, max[c]) {
                above[c] += 1;
            }
        }
    }

    if let Some(min) = min {
        for c in 0..n {
            let expected = declared(data.component, min[c]);
            if below[c] > 0 {
                sink.push(Issue::new(
                    IssueCode::AccessorElementOutOfMinBound,
                    format!("{pointer}/min/{c}"),
                    format!(
                        "Accessor contains {} element(s) less than declared minimum value {expected}.",
                        below[c]
                    ),
                ));
            }
            if actual_min[c].is_finite() && actual_min[c] != expected {
                sink.push(Issue::new(
                    IssueCode::AccessorMinMismatch,
                    format!("{pointer}/min/{c}"),
                    format!(
                        "Declared minimum value for this component ({expected}) does not match actual minimum ({}).",
                        actual_min[c]
                    ),
                ));
            }
        }
    }

    if let Some(max) = max {
        for c in 0..n {
            let expected = declared(data.component, max[c]);
            if above[c] > 0 {
                sink.push(Issue::new(
                    IssueCode::AccessorElementOutOfMaxBound,
                    format!("{pointer}/max/{c}"),
                    format!(
                        "Accessor contains {} element(s) greater than declared maximum value {expected}.",
                        above[c]
                    ),
                ));
            }
            if actual_max[c].is_finite() && actual_max[c] != expected {
                sink.push(Issue::new(
                    IssueCode::AccessorMaxMismatch,
                    format!("{pointer}/max/{c}"),
                    format!(
                        "Declared maximum value for this component ({expected}) does not match actual maximum ({}).",
                        actual_max[c]
                    ),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::layout::{check_accessor, check_sparse};
    use crate::test_utils::{codes, document, f32_bytes, u16_bytes};
    use serde_json::json;

    #[test]
    fn test_decode_strided_float() {
        // Two VEC2 elements 12 bytes apart, 4 bytes of padding each.
        let doc = document(json!({
            "buffers": [{ "byteLength": 24 }],
            "bufferViews": [{ "buffer": 0, "byteLength": 24, "byteStride": 12 }],
            "accessors": [{ "bufferView": 0, "componentType": 5126, "type": "VEC2", "count": 2 }]
        }));
        let buffers: BufferSet = [f32_bytes(&[1.0, 2.0, 99.0, 3.0, 4.0, 99.0])]
            .into_iter()
            .collect();
        let mut sink = Vec::new();
        let layout = check_accessor(&doc, 0, &doc.accessors[0], &mut sink);
        let data =
            decode(0, &doc.accessors[0], layout.as_ref(), None, &buffers, &mut sink).unwrap();
        assert_eq!(data.values, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(data.count(), 2);
        assert_eq!(data.element(1), [3.0, 4.0]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_decode_byte_matrix() {
        // Two MAT2 of unsigned bytes, packed back to back.
        let doc = document(json!({
            "buffers": [{ "byteLength": 8 }],
            "bufferViews": [{ "buffer": 0, "byteLength": 8 }],
            "accessors": [{ "bufferView": 0, "componentType": 5121, "type": "MAT2", "count": 2 }]
        }));
        let buffers: BufferSet = [vec![1, 2, 3, 4, 5, 6, 7, 8]].into_iter().collect();
        let mut sink = Vec::new();
        let layout = check_accessor(&doc, 0, &doc.accessors[0], &mut sink);
        let data =
            decode(0, &doc.accessors[0], layout.as_ref(), None, &buffers, &mut sink).unwrap();
        assert_eq!(data.element(1), [5.0, 6.0, 7.0, 8.0]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_zero_stride_does_not_inflate_decode() {
        let doc = document(json!({
            "buffers": [{ "byteLength": 4 }],
            "bufferViews": [{ "buffer": 0, "byteLength": 4, "byteStride": 0 }],
            "accessors": [{
                "bufferView": 0, "componentType": 5126, "type": "SCALAR",
                "count": 2305843009213693952u64
            }]
        }));
        let buffers: BufferSet = [f32_bytes(&[1.0])].into_iter().collect();
        let mut sink = Vec::new();
        let layout = check_accessor(&doc, 0, &doc.accessors[0], &mut sink);
        assert!(decode(0, &doc.accessors[0], layout.as_ref(), None, &buffers, &mut sink).is_none());
    }

    #[test]
    fn test_huge_sparse_only_accessor_checks_indices() {
        let mut bin = Vec::new();
        bin.extend_from_slice(&u16_bytes(&[4, 2]));
        bin.extend_from_slice(&f32_bytes(&[1.0, 2.0]));
        let doc = document(json!({
            "buffers": [{ "byteLength": 12 }],
            "bufferViews": [
                { "buffer": 0, "byteLength": 4 },
                { "buffer": 0, "byteOffset": 4, "byteLength": 8 }
            ],
            "accessors": [{
                "componentType": 5126, "type": "SCALAR", "count": 2305843009213693952u64,
                "sparse": {
                    "count": 2,
                    "indices": { "bufferView": 0, "componentType": 5123 },
                    "values": { "bufferView": 1 }
                }
            }]
        }));
        let buffers: BufferSet = [bin].into_iter().collect();
        let mut sink = Vec::new();
        let sparse = check_sparse(&doc, 0, &doc.accessors[0], &mut sink);
        let data = decode(0, &doc.accessors[0], None, sparse.as_ref(), &buffers, &mut sink);
        assert!(data.is_none());
        assert_eq!(codes(&sink), [IssueCode::AccessorSparseIndicesNonIncreasing]);
        assert_eq!(sink[0].offset, Some(1));
    }

    #[test]
    fn test_sparse_substitution_and_index_rules() {
        let mut bin = Vec::new();
        bin.extend_from_slice(&u16_bytes(&[3, 1, 9, 0]));
        bin.extend_from_slice(&f32_bytes(&[7.0, 8.0, 9.0]));
        let doc = document(json!({
            "buffers": [{ "byteLength": 20 }],
            "bufferViews": [
                { "buffer": 0, "byteLength": 8 },
                { "buffer": 0, "byteOffset": 8, "byteLength": 12 }
            ],
            "accessors": [{
                "componentType": 5126, "type": "SCALAR", "count": 4,
                "sparse": {
                    "count": 3,
                    "indices": { "bufferView": 0, "componentType": 5123 },
                    "values": { "bufferView": 1 }
                }
            }]
        }));
        let buffers: BufferSet = [bin].into_iter().collect();
        let mut sink = Vec::new();
        let sparse = check_sparse(&doc, 0, &doc.accessors[0], &mut sink);
        let data =
            decode(0, &doc.accessors[0], None, sparse.as_ref(), &buffers, &mut sink).unwrap();

        assert_eq!(data.values, [0.0, 8.0, 0.0, 7.0]);
        assert_eq!(
            codes(&sink),
            [
                IssueCode::AccessorSparseIndicesNonIncreasing,
                IssueCode::AccessorSparseIndexOob,
            ]
        );
        assert_eq!(sink[0].offset, Some(1));
        assert_eq!(sink[1].offset, Some(2));
    }

    fn float_data(element: ElementType, values: &[f64]) -> AccessorData {
        AccessorData {
            component: ComponentType::Float,
            element,
            normalized: false,
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_min_max_mismatch_names_component() {
        let doc = document(json!({
            "accessors": [{
                "componentType": 5126, "type": "VEC2", "count": 2,
                "min": [0.0, 0.0], "max": [1.0, 5.0]
            }]
        }));
        let data = float_data(ElementType::Vec2, &[0.0, 0.0, 1.0, 2.0]);
        let mut sink = Vec::new();
        check_values(0, &doc.accessors[0], &data, &mut sink);
        assert_eq!(codes(&sink), [IssueCode::AccessorMaxMismatch]);
        assert_eq!(sink[0].pointer, "/accessors/0/max/1");
    }

    #[test]
    fn test_out_of_bound_elements_counted() {
        let doc = document(json!({
            "accessors": [{
                "componentType": 5126, "type": "SCALAR", "count": 3,
                "min": [1.0], "max": [2.0]
            }]
        }));
        let data = float_data(ElementType::Scalar, &[-1.0, 0.0, 2.0]);
        let mut sink = Vec::new();
        check_values(0, &doc.accessors[0], &data, &mut sink);
        assert_eq!(
            codes(&sink),
            [IssueCode::AccessorElementOutOfMinBound, IssueCode::AccessorMinMismatch]
        );
        assert!(sink[0].message.contains("2 element(s)"));
    }

    #[test]
    fn test_float_bounds_use_single_precision() {
        let doc = document(json!({
            "accessors": [{ "componentType": 5126, "type": "SCALAR", "count": 1, "min": [0.1], "max": [0.1] }]
        }));
        let data = float_data(ElementType::Scalar, &[0.1f32 as f64]);
        let mut sink = Vec::new();
        check_values(0, &doc.accessors[0], &data, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_invalid_float_excluded_from_bounds() {
        let doc = document(json!({
            "accessors": [{ "componentType": 5126, "type": "SCALAR", "count": 2, "min": [1.0], "max": [1.0] }]
        }));
        let data = float_data(ElementType::Scalar, &[f64::NAN, 1.0]);
        let mut sink = Vec::new();
        check_values(0, &doc.accessors[0], &data, &mut sink);
        assert_eq!(codes(&sink), [IssueCode::AccessorInvalidFloat]);
        assert_eq!(sink[0].offset, Some(0));
    }
}
