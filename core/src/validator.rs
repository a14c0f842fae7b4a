//! Validation driver
//!
//! Runs every phase over one immutable document and collects the findings in
//! phase order. No phase aborts another: a document with broken references
//! still gets its accessor data and hierarchy checked wherever possible.

use gltf_audit_shared::{Issue, ValidationOptions};

use crate::accessor;
use crate::document::{BufferSet, Document};
use crate::{extensions, hierarchy, references, semantic, usage};

pub struct Validator<'a> {
    document: &'a Document,
    buffers: &'a BufferSet,
    options: ValidationOptions,
}

impl<'a> Validator<'a> {
    pub fn new(document: &'a Document, buffers: &'a BufferSet) -> Self {
        Self {
            document,
            buffers,
            options: ValidationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Run all phases and return the issues in emission order.
    pub fn validate(&self) -> Vec<Issue> {
        let doc = self.document;
        let mut sink = Vec::new();

        tracing::debug!("resolving references");
        references::check_references(doc, &mut sink);

        tracing::debug!(declared = doc.extensions_used.len(), "checking extensions");
        extensions::check_extensions(doc, &mut sink);

        tracing::debug!(buffers = doc.buffers.len(), views = doc.buffer_views.len(), "checking buffers");
        accessor::layout::check_buffers(doc, self.buffers, &mut sink);
        accessor::layout::check_buffer_views(doc, &mut sink);

        tracing::debug!(accessors = doc.accessors.len(), "checking accessors");
        let data = accessor::check_accessors(
            doc,
            self.buffers,
            self.options.validate_accessor_data,
            &mut sink,
        );

        if self.options.validate_accessor_data {
            tracing::debug!("checking attribute semantics");
            semantic::check_semantics(doc, &data, &mut sink);
        }

        hierarchy::check_hierarchy(doc, &mut sink);

        tracing::debug!("tracking usage");
        usage::report_unused(doc, &self.options, &mut sink);

        tracing::debug!(issues = sink.len(), "validation finished");
        sink
    }
}

/// Validate `document` with default options.
pub fn validate(document: &Document, buffers: &BufferSet) -> Vec<Issue> {
    Validator::new(document, buffers).validate()
}
