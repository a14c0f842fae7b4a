//! Usage tracking
//!
//! Computes which objects are reachable from the scene roots (plus the few
//! objects that count as used by mere existence of a reference) and reports
//! the rest as possibly unused.

use gltf_audit_shared::{Issue, IssueCode, ValidationOptions};
use hashbrown::HashSet;
use std::fmt;

use crate::document::Document;
use crate::extensions::{
    KHR_LIGHTS_PUNCTUAL, lights, material_extension_textures, node_light,
    texture_extension_sources,
};

/// Identity of an addressable document object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectRef {
    Accessor(usize),
    Animation(usize),
    AnimationSampler { animation: usize, sampler: usize },
    Buffer(usize),
    BufferView(usize),
    Camera(usize),
    Image(usize),
    Material(usize),
    Mesh(usize),
    Node(usize),
    Sampler(usize),
    Scene(usize),
    Skin(usize),
    Texture(usize),
    Light(usize),
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Accessor(i) => write!(f, "/accessors/{i}"),
            Self::Animation(i) => write!(f, "/animations/{i}"),
            Self::AnimationSampler { animation, sampler } => {
                write!(f, "/animations/{animation}/samplers/{sampler}")
            }
            Self::Buffer(i) => write!(f, "/buffers/{i}"),
            Self::BufferView(i) => write!(f, "/bufferViews/{i}"),
            Self::Camera(i) => write!(f, "/cameras/{i}"),
            Self::Image(i) => write!(f, "/images/{i}"),
            Self::Material(i) => write!(f, "/materials/{i}"),
            Self::Mesh(i) => write!(f, "/meshes/{i}"),
            Self::Node(i) => write!(f, "/nodes/{i}"),
            Self::Sampler(i) => write!(f, "/samplers/{i}"),
            Self::Scene(i) => write!(f, "/scenes/{i}"),
            Self::Skin(i) => write!(f, "/skins/{i}"),
            Self::Texture(i) => write!(f, "/textures/{i}"),
            Self::Light(i) => write!(f, "/extensions/{KHR_LIGHTS_PUNCTUAL}/lights/{i}"),
        }
    }
}

/// Result of one usage pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageReport {
    pub used: HashSet<ObjectRef>,
    /// Unused objects, per collection in ascending index order.
    pub unused: Vec<ObjectRef>,
}

impl UsageReport {
    pub fn is_used(&self, object: ObjectRef) -> bool {
        self.used.contains(&object)
    }
}

/// Accumulates the used set; out-of-range indices are never marked.
struct Marker<'a> {
    doc: &'a Document,
    used: HashSet<ObjectRef>,
}

impl<'a> Marker<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            used: HashSet::new(),
        }
    }

    fn mark(&mut self, object: ObjectRef, len: usize, index: usize) -> bool {
        index < len && self.used.insert(object)
    }

    fn node(&mut self, index: usize) -> bool {
        self.mark(ObjectRef::Node(index), self.doc.nodes.len(), index)
    }

    /// Mark `roots` and every node below them.
    fn descend(&mut self, roots: &[usize]) {
        let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            if !self.node(index) {
                continue;
            }
            stack.extend(self.doc.nodes[index].children.iter().rev().copied());
        }
    }

    fn accessor(&mut self, index: usize) {
        let doc = self.doc;
        if !self.mark(ObjectRef::Accessor(index), doc.accessors.len(), index) {
            return;
        }
        let accessor = &doc.accessors[index];
        if let Some(view) = accessor.buffer_view {
            self.buffer_view(view);
        }
        if let Some(sparse) = &accessor.sparse {
            self.buffer_view(sparse.indices.buffer_view);
            self.buffer_view(sparse.values.buffer_view);
        }
    }

    fn buffer_view(&mut self, index: usize) {
        let doc = self.doc;
        if self.mark(ObjectRef::BufferView(index), doc.buffer_views.len(), index) {
            let buffer = doc.buffer_views[index].buffer;
            self.mark(ObjectRef::Buffer(buffer), doc.buffers.len(), buffer);
        }
    }

    fn mesh(&mut self, index: usize) {
        let doc = self.doc;
        if !self.mark(ObjectRef::Mesh(index), doc.meshes.len(), index) {
            return;
        }
        for primitive in &doc.meshes[index].primitives {
            for &accessor in primitive.attributes.values() {
                self.accessor(accessor);
            }
            if let Some(indices) = primitive.indices {
                self.accessor(indices);
            }
            for target in &primitive.targets {
                for &accessor in target.values() {
                    self.accessor(accessor);
                }
            }
            if let Some(material) = primitive.material {
                self.material(material);
            }
        }
    }

    fn skin(&mut self, index: usize) {
        let doc = self.doc;
        if !self.mark(ObjectRef::Skin(index), doc.skins.len(), index) {
            return;
        }
        if let Some(ibm) = doc.skins[index].inverse_bind_matrices {
            self.accessor(ibm);
        }
    }

    fn material(&mut self, index: usize) {
        let doc = self.doc;
        if !self.mark(ObjectRef::Material(index), doc.materials.len(), index) {
            return;
        }
        let material = &doc.materials[index];
        for (_, info) in material.texture_slots() {
            self.texture(info.index);
        }
        for (_, texture) in material_extension_textures(material) {
            self.texture(texture);
        }
    }

    fn texture(&mut self, index: usize) {
        let doc = self.doc;
        if !self.mark(ObjectRef::Texture(index), doc.textures.len(), index) {
            return;
        }
        let texture = &doc.textures[index];
        if let Some(sampler) = texture.sampler {
            self.mark(ObjectRef::Sampler(sampler), doc.samplers.len(), sampler);
        }
        if let Some(source) = texture.source {
            self.image(source);
        }
        for (_, source) in texture_extension_sources(texture) {
            self.image(source);
        }
    }

    fn image(&mut self, index: usize) {
        let doc = self.doc;
        if self.mark(ObjectRef::Image(index), doc.images.len(), index) {
            if let Some(view) = doc.images[index].buffer_view {
                self.buffer_view(view);
            }
        }
    }
}

/// Compute the used set and the unused-object list for `doc`.
pub fn track_usage(doc: &Document) -> UsageReport {
    let mut marker = Marker::new(doc);

    // Scene roots and their subtrees.
    for (s, scene) in doc.scenes.iter().enumerate() {
        marker.used.insert(ObjectRef::Scene(s));
        marker.descend(&scene.nodes);
    }
    if let Some(scene) = doc.scene.and_then(|s| doc.scenes.get(s)) {
        marker.descend(&scene.nodes);
    }

    // Animations are always used; channel targets count as used nodes.
    for (a, animation) in doc.animations.iter().enumerate() {
        marker.used.insert(ObjectRef::Animation(a));
        for channel in &animation.channels {
            if let Some(node) = channel.target.node {
                marker.node(node);
            }
            let Some(s) = channel.sampler else {
                continue;
            };
            let Some(sampler) = animation.samplers.get(s) else {
                continue;
            };
            marker.used.insert(ObjectRef::AnimationSampler {
                animation: a,
                sampler: s,
            });
            marker.accessor(sampler.input);
            marker.accessor(sampler.output);
        }
    }

    for (n, node) in doc.nodes.iter().enumerate() {
        if marker.used.contains(&ObjectRef::Node(n)) {
            if let Some(mesh) = node.mesh {
                marker.mesh(mesh);
            }
            if let Some(skin) = node.skin {
                marker.skin(skin);
            }
        }
    }

    // Cameras and lights count as used by any referencing node.
    let light_count = lights(doc).len();
    for node in &doc.nodes {
        if let Some(camera) = node.camera {
            marker.mark(ObjectRef::Camera(camera), doc.cameras.len(), camera);
        }
        if let Some(light) = node_light(node) {
            marker.mark(ObjectRef::Light(light), light_count, light);
        }
    }

    let used = marker.used;
    let unused = unused_objects(doc, &used);
    tracing::debug!(used = used.len(), unused = unused.len(), "usage tracked");
    UsageReport { used, unused }
}

fn unused_objects(doc: &Document, used: &HashSet<ObjectRef>) -> Vec<ObjectRef> {
    // Accessors and buffers referenced from anywhere are never reported.
    let mut referenced_accessors = HashSet::new();
    for mesh in &doc.meshes {
        for primitive in &mesh.primitives {
            referenced_accessors.extend(primitive.attributes.values().copied());
            referenced_accessors.extend(primitive.indices);
            for target in &primitive.targets {
                referenced_accessors.extend(target.values().copied());
            }
        }
    }
    for skin in &doc.skins {
        referenced_accessors.extend(skin.inverse_bind_matrices);
    }
    for animation in &doc.animations {
        for sampler in &animation.samplers {
            referenced_accessors.insert(sampler.input);
            referenced_accessors.insert(sampler.output);
        }
    }
    let referenced_buffers: HashSet<usize> = doc.buffer_views.iter().map(|v| v.buffer).collect();
    let joints: HashSet<usize> = doc.skins.iter().flat_map(|s| s.joints.iter().copied()).collect();

    let mut unused = Vec::new();
    let mut collect = |len: usize, object: fn(usize) -> ObjectRef, keep: &dyn Fn(usize) -> bool| {
        unused.extend(
            (0..len)
                .filter(|&i| !used.contains(&object(i)) && !keep(i))
                .map(object),
        );
    };

    collect(doc.accessors.len(), ObjectRef::Accessor, &|i| {
        referenced_accessors.contains(&i)
    });
    collect(doc.buffers.len(), ObjectRef::Buffer, &|i| referenced_buffers.contains(&i));
    collect(doc.buffer_views.len(), ObjectRef::BufferView, &|_| false);
    collect(doc.cameras.len(), ObjectRef::Camera, &|_| false);
    collect(doc.images.len(), ObjectRef::Image, &|_| false);
    collect(doc.materials.len(), ObjectRef::Material, &|_| false);
    collect(doc.meshes.len(), ObjectRef::Mesh, &|_| false);
    collect(doc.nodes.len(), ObjectRef::Node, &|i| joints.contains(&i));
    collect(doc.samplers.len(), ObjectRef::Sampler, &|_| false);
    collect(doc.skins.len(), ObjectRef::Skin, &|_| false);
    collect(doc.textures.len(), ObjectRef::Texture, &|_| false);
    collect(lights(doc).len(), ObjectRef::Light, &|_| false);

    for (a, animation) in doc.animations.iter().enumerate() {
        for s in 0..animation.samplers.len() {
            let object = ObjectRef::AnimationSampler {
                animation: a,
                sampler: s,
            };
            if !used.contains(&object) {
                unused.push(object);
            }
        }
    }
    unused
}

/// Emit `UNUSED_OBJECT` for everything [`track_usage`] left unmarked.
pub fn report_unused(doc: &Document, options: &ValidationOptions, sink: &mut Vec<Issue>) {
    for object in track_usage(doc).unused {
        let pointer = match object {
            ObjectRef::AnimationSampler { animation, .. } if options.legacy_sampler_pointer => {
                legacy_sampler_pointer(doc, animation).unwrap_or_else(|| object.to_string())
            }
            _ => object.to_string(),
        };
        sink.push(Issue::new(
            IssueCode::UnusedObject,
            pointer,
            "This object may be unused.",
        ));
    }
}

/// Pointer of the first channel in `animation` lacking a `sampler` property.
fn legacy_sampler_pointer(doc: &Document, animation: usize) -> Option<String> {
    let channels = &doc.animations.get(animation)?.channels;
    let c = channels.iter().position(|channel| channel.sampler.is_none())?;
    Some(format!("/animations/{animation}/channels/{c}/sampler"))
}
