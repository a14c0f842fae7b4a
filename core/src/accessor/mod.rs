//! Binary accessor data engine
//!
//! - [`component`] - little-endian component reader and type metadata
//! - [`layout`] - buffer view / accessor bounds and alignment checks
//! - [`data`] - full decoding (with sparse substitution) and min/max checks

pub mod component;
pub mod data;
pub mod layout;

pub use component::{ComponentType, ElementType, GL_DOUBLE};
pub use data::AccessorData;
pub use layout::{AccessorLayout, SparseLayout, element_size};

use gltf_audit_shared::Issue;

use crate::document::{BufferSet, Document};

/// Run layout checks for every accessor and, when `decode_data` is set,
/// decode and range-check its values.
///
/// The returned vector is indexed like `Document::accessors`; a slot is
/// `None` when the accessor's data could not be decoded.
pub fn check_accessors(
    doc: &Document,
    buffers: &BufferSet,
    decode_data: bool,
    sink: &mut Vec<Issue>,
) -> Vec<Option<AccessorData>> {
    let mut decoded = Vec::with_capacity(doc.accessors.len());
    for (index, accessor) in doc.accessors.iter().enumerate() {
        let layout = layout::check_accessor(doc, index, accessor, sink);
        let sparse = layout::check_sparse(doc, index, accessor, sink);
        if !decode_data {
            decoded.push(None);
            continue;
        }
        let data = data::decode(index, accessor, layout.as_ref(), sparse.as_ref(), buffers, sink);
        if let Some(data) = &data {
            data::check_values(index, accessor, data, sink);
        }
        decoded.push(data);
    }
    decoded
}
