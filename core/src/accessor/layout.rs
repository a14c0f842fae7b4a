//! Bounds and alignment checks
//!
//! Validates that buffer views fit their buffers and that an accessor's
//! declared shape fits its buffer view with correctly aligned offsets. A
//! successful check yields the absolute byte layout used by the decoder.

use gltf_audit_shared::{Issue, IssueCode};

use super::component::{ComponentType, ElementType};
use crate::document::{Accessor, BufferSet, Document};

/// Float matrices get 4-byte aligned columns; every other layout is tightly packed.
fn has_padded_columns(component: ComponentType, element: ElementType) -> bool {
    element.is_matrix() && component.is_float()
}

/// Size of one element in bytes.
///
/// Columns of a float matrix start on 4-byte boundaries, so each column is
/// padded up to a multiple of 4 before the columns are summed.
pub fn element_size(component: ComponentType, element: ElementType) -> usize {
    if has_padded_columns(component, element) {
        let rows = element.column_len();
        (component.size() * rows).next_multiple_of(4) * rows
    } else {
        component.size() * element.component_count()
    }
}

/// Byte offset of component `index` inside one element, honouring column padding.
pub fn component_offset(component: ComponentType, element: ElementType, index: usize) -> usize {
    if has_padded_columns(component, element) {
        let rows = element.column_len();
        let column = (component.size() * rows).next_multiple_of(4);
        (index / rows) * column + (index % rows) * component.size()
    } else {
        index * component.size()
    }
}

/// Bytes spanned by `count` elements laid out `stride` apart.
pub fn span(count: usize, stride: usize, element_size: usize) -> Option<usize> {
    if count == 0 {
        return Some(0);
    }
    stride.checked_mul(count - 1)?.checked_add(element_size)
}

/// Absolute placement of accessor elements inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorLayout {
    pub buffer: usize,
    pub component: ComponentType,
    pub element: ElementType,
    /// Offset of element 0 from the start of the buffer
    pub offset: usize,
    pub stride: usize,
    pub count: usize,
}

impl AccessorLayout {
    pub fn element_size(&self) -> usize {
        element_size(self.component, self.element)
    }

    /// Bytes from the first to the end of the last element.
    pub fn byte_len(&self) -> usize {
        span(self.count, self.stride, self.element_size()).unwrap_or(usize::MAX)
    }

    /// Buffer offset of component `component` of element `element`.
    pub fn component_at(&self, element: usize, component: usize) -> usize {
        self.offset
            + element * self.stride
            + component_offset(self.component, self.element, component)
    }
}

/// Placement of a sparse accessor's index and value streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseLayout {
    pub indices: AccessorLayout,
    pub values: AccessorLayout,
}

/// Declared buffer lengths against resolved data.
pub fn check_buffers(doc: &Document, buffers: &BufferSet, sink: &mut Vec<Issue>) {
    for (index, buffer) in doc.buffers.iter().enumerate() {
        let Some(data) = buffers.get(index) else {
            continue;
        };
        if data.len() < buffer.byte_length {
            sink.push(Issue::new(
                IssueCode::BufferDataTooShort,
                format!("/buffers/{index}"),
                format!(
                    "Resolved buffer data length {} is less than declared byteLength {}.",
                    data.len(),
                    buffer.byte_length
                ),
            ));
        }
    }
}

/// Buffer view containment and stride limits.
pub fn check_buffer_views(doc: &Document, sink: &mut Vec<Issue>) {
    for (index, view) in doc.buffer_views.iter().enumerate() {
        if let Some(buffer) = doc.buffers.get(view.buffer) {
            let end = view.byte_offset.checked_add(view.byte_length);
            if end.is_none_or(|end| end > buffer.byte_length) {
                sink.push(Issue::new(
                    IssueCode::BufferViewTooLong,
                    format!("/bufferViews/{index}/byteLength"),
                    format!(
                        "BufferView does not fit buffer ({}) byteLength ({}).",
                        view.buffer, buffer.byte_length
                    ),
                ));
            }
        }

        if let Some(stride) = view.byte_stride {
            if stride > view.byte_length {
                sink.push(Issue::new(
                    IssueCode::BufferViewTooBigByteStride,
                    format!("/bufferViews/{index}/byteStride"),
                    format!(
                        "Buffer view's byteStride ({stride}) is greater than byteLength ({}).",
                        view.byte_length
                    ),
                ));
            }
        }
    }
}

/// True when the view exists and lies inside its (existing) buffer.
fn view_fits_buffer(doc: &Document, view_index: usize) -> bool {
    let Some(view) = doc.buffer_views.get(view_index) else {
        return false;
    };
    let Some(buffer) = doc.buffers.get(view.buffer) else {
        return false;
    };
    view.byte_offset
        .checked_add(view.byte_length)
        .is_some_and(|end| end <= buffer.byte_length)
}

/// Run the layout rules for one accessor.
///
/// Returns the layout when the accessor's bytes are known to lie inside its
/// buffer view and buffer; alignment violations are reported but do not
/// prevent decoding.
pub fn check_accessor(
    doc: &Document,
    index: usize,
    accessor: &Accessor,
    sink: &mut Vec<Issue>,
) -> Option<AccessorLayout> {
    let component = accessor.component()?;
    let element = accessor.element()?;
    let size = element_size(component, element);
    let pointer = format!("/accessors/{index}");

    if accessor.offset() % component.size() != 0 {
        sink.push(Issue::new(
            IssueCode::AccessorOffsetAlignment,
            format!("{pointer}/byteOffset"),
            format!(
                "Offset {} is not a multiple of componentType length {}.",
                accessor.offset(),
                component.size()
            ),
        ));
    }

    let view_index = accessor.buffer_view?;
    let view = doc.buffer_views.get(view_index)?;

    let total = view.byte_offset.saturating_add(accessor.offset());
    if total % component.size() != 0 {
        sink.push(Issue::new(
            IssueCode::AccessorTotalOffsetAlignment,
            format!("{pointer}/byteOffset"),
            format!(
                "Accessor's total byteOffset {total} isn't a multiple of componentType length {}.",
                component.size()
            ),
        ));
    } else if has_padded_columns(component, element)
        && accessor.byte_offset.is_some()
        && total % 4 != 0
    {
        sink.push(Issue::new(
            IssueCode::AccessorTotalOffsetAlignment,
            format!("{pointer}/byteOffset"),
            format!("Matrix accessor's total byteOffset {total} isn't a multiple of 4."),
        ));
    }

    if let Some(stride) = view.byte_stride {
        if stride < size {
            sink.push(Issue::new(
                IssueCode::AccessorSmallBytestride,
                format!("{pointer}/bufferView"),
                format!(
                    "Referenced bufferView's byteStride value {stride} is less than accessor element's length {size}."
                ),
            ));
        }
    }

    let stride = view.byte_stride.unwrap_or(size);
    let length = span(accessor.count, stride, size);
    let fits = length
        .and_then(|len| len.checked_add(accessor.offset()))
        .is_some_and(|end| end <= view.byte_length);
    if !fits {
        sink.push(Issue::new(
            IssueCode::AccessorTooLong,
            pointer,
            format!(
                "Accessor (offset: {}, length: {}) does not fit referenced bufferView [{view_index}] length {}.",
                accessor.offset(),
                length.map_or_else(|| "overflow".to_string(), |l| l.to_string()),
                view.byte_length
            ),
        ));
        return None;
    }

    if !view_fits_buffer(doc, view_index) {
        return None;
    }

    Some(AccessorLayout {
        buffer: view.buffer,
        component,
        element,
        offset: total,
        stride,
        count: accessor.count,
    })
}

/// Containment of the sparse index and value streams of one accessor.
pub fn check_sparse(
    doc: &Document,
    index: usize,
    accessor: &Accessor,
    sink: &mut Vec<Issue>,
) -> Option<SparseLayout> {
    let sparse = accessor.sparse.as_ref()?;
    let component = accessor.component()?;
    let element = accessor.element()?;
    let index_component = ComponentType::from_gl(sparse.indices.component_type)
        .filter(|c| c.is_unsigned_int())?;

    let indices = sparse_stream(
        doc,
        &format!("/accessors/{index}/sparse/indices"),
        sparse.indices.buffer_view,
        sparse.indices.byte_offset,
        index_component,
        ElementType::Scalar,
        sparse.count,
        sink,
    );
    let values = sparse_stream(
        doc,
        &format!("/accessors/{index}/sparse/values"),
        sparse.values.buffer_view,
        sparse.values.byte_offset,
        component,
        element,
        sparse.count,
        sink,
    );

    Some(SparseLayout {
        indices: indices?,
        values: values?,
    })
}

#[allow(clippy::too_many_arguments)]
fn sparse_stream(
    doc: &Document,
    pointer: &str,
    view_index: usize,
    byte_offset: usize,
    component: ComponentType,
    element: ElementType,
    count: usize,
    sink: &mut Vec<Issue>,
) -> Option<AccessorLayout> {
    let view = doc.buffer_views.get(view_index)?;
    let size = element_size(component, element);
    let length = span(count, size, size);
    let fits = length
        .and_then(|len| len.checked_add(byte_offset))
        .is_some_and(|end| end <= view.byte_length);
    if !fits {
        sink.push(Issue::new(
            IssueCode::AccessorTooLong,
            pointer,
            format!(
                "Sparse data (offset: {byte_offset}, count: {count}) does not fit referenced bufferView [{view_index}] length {}.",
                view.byte_length
            ),
        ));
        return None;
    }
    if !view_fits_buffer(doc, view_index) {
        return None;
    }
    Some(AccessorLayout {
        buffer: view.buffer,
        component,
        element,
        offset: view.byte_offset + byte_offset,
        stride: size,
        count,
    })
}
