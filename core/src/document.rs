//! Parsed glTF document model
//!
//! A read-only, index-based view of the JSON scene graph. Objects reference
//! each other by array index only; nothing here resolves or validates those
//! indices. Fields the core never inspects are not modelled.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::accessor::{ComponentType, ElementType};

/// Raw extension bag of a glTF object, keyed by extension name.
pub type Extensions = Map<String, Value>;

/// Failure to parse a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to parse glTF JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub extensions_used: Vec<String>,
    pub extensions_required: Vec<String>,
    pub accessors: Vec<Accessor>,
    pub animations: Vec<Animation>,
    pub buffers: Vec<Buffer>,
    pub buffer_views: Vec<BufferView>,
    pub cameras: Vec<Camera>,
    pub images: Vec<Image>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub nodes: Vec<Node>,
    pub samplers: Vec<Sampler>,
    pub scene: Option<usize>,
    pub scenes: Vec<Scene>,
    pub skins: Vec<Skin>,
    pub textures: Vec<Texture>,
    pub extensions: Extensions,
}

impl Document {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub buffer_view: Option<usize>,
    /// Kept optional: the matrix column alignment rule depends on whether
    /// the offset was written explicitly.
    pub byte_offset: Option<usize>,
    pub component_type: u32,
    #[serde(rename = "type")]
    pub element_type: String,
    pub count: usize,
    #[serde(default)]
    pub normalized: bool,
    pub min: Option<Vec<f64>>,
    pub max: Option<Vec<f64>>,
    pub sparse: Option<Sparse>,
    pub name: Option<String>,
}

impl Accessor {
    pub fn component(&self) -> Option<ComponentType> {
        ComponentType::from_gl(self.component_type)
    }

    pub fn element(&self) -> Option<ElementType> {
        ElementType::from_name(&self.element_type)
    }

    pub fn offset(&self) -> usize {
        self.byte_offset.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sparse {
    pub count: usize,
    pub indices: SparseIndices,
    pub values: SparseValues,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseIndices {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseValues {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Animation {
    pub channels: Vec<Channel>,
    pub samplers: Vec<AnimationSampler>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub sampler: Option<usize>,
    pub target: ChannelTarget,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelTarget {
    pub node: Option<usize>,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSampler {
    pub input: usize,
    pub output: usize,
    pub interpolation: Option<String>,
}

impl AnimationSampler {
    pub fn is_cubic_spline(&self) -> bool {
        self.interpolation.as_deref() == Some("CUBICSPLINE")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub byte_length: usize,
    pub uri: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
    pub target: Option<u32>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Camera {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Image {
    pub uri: Option<String>,
    pub buffer_view: Option<usize>,
    pub mime_type: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Material {
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    pub normal_texture: Option<TextureInfo>,
    pub occlusion_texture: Option<TextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub name: Option<String>,
    pub extensions: Extensions,
}

impl Material {
    /// Core texture slots with their pointer suffix relative to the material.
    pub fn texture_slots(&self) -> Vec<(&'static str, &TextureInfo)> {
        let mut slots = Vec::new();
        if let Some(pbr) = &self.pbr_metallic_roughness {
            if let Some(info) = &pbr.base_color_texture {
                slots.push(("pbrMetallicRoughness/baseColorTexture", info));
            }
            if let Some(info) = &pbr.metallic_roughness_texture {
                slots.push(("pbrMetallicRoughness/metallicRoughnessTexture", info));
            }
        }
        if let Some(info) = &self.normal_texture {
            slots.push(("normalTexture", info));
        }
        if let Some(info) = &self.occlusion_texture {
            slots.push(("occlusionTexture", info));
        }
        if let Some(info) = &self.emissive_texture {
            slots.push(("emissiveTexture", info));
        }
        slots
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PbrMetallicRoughness {
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_roughness_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: usize,
    #[serde(default)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
    pub weights: Vec<f64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Primitive {
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    pub mode: Option<u32>,
    pub targets: Vec<BTreeMap<String, usize>>,
    pub extensions: Extensions,
}

impl Primitive {
    /// Attributes named `{prefix}_{n}`, ordered by set number `n`.
    pub fn attribute_sets(&self, prefix: &str) -> Vec<(u32, usize)> {
        let mut sets: Vec<(u32, usize)> = self
            .attributes
            .iter()
            .filter_map(|(name, &accessor)| {
                let set = name.strip_prefix(prefix)?.strip_prefix('_')?;
                set.parse().ok().map(|n| (n, accessor))
            })
            .collect();
        sets.sort_unstable();
        sets
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    pub camera: Option<usize>,
    pub children: Vec<usize>,
    pub skin: Option<usize>,
    pub matrix: Option<[f64; 16]>,
    pub mesh: Option<usize>,
    pub rotation: Option<[f64; 4]>,
    pub scale: Option<[f64; 3]>,
    pub translation: Option<[f64; 3]>,
    pub weights: Vec<f64>,
    pub name: Option<String>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sampler {
    pub mag_filter: Option<u32>,
    pub min_filter: Option<u32>,
    pub wrap_s: Option<u32>,
    pub wrap_t: Option<u32>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scene {
    pub nodes: Vec<usize>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skin {
    pub inverse_bind_matrices: Option<usize>,
    pub skeleton: Option<usize>,
    pub joints: Vec<usize>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Texture {
    pub sampler: Option<usize>,
    pub source: Option<usize>,
    pub name: Option<String>,
    pub extensions: Extensions,
}

/// Resolved binary payloads, indexed like `Document::buffers`.
///
/// Filled by whoever fetches external resources; a `None` slot means the
/// buffer could not be resolved and its data-level checks are skipped.
#[derive(Debug, Clone, Default)]
pub struct BufferSet {
    data: Vec<Option<Vec<u8>>>,
}

impl BufferSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the bytes of buffer `index`.
    pub fn insert(&mut self, index: usize, bytes: Vec<u8>) {
        if self.data.len() <= index {
            self.data.resize(index + 1, None);
        }
        self.data[index] = Some(bytes);
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.data.get(index).and_then(|d| d.as_deref())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(Option::is_none)
    }
}

impl FromIterator<Vec<u8>> for BufferSet {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(Some).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_document() {
        let doc = Document::from_value(json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "children": [1] }, {}],
            "accessors": [{ "componentType": 5126, "type": "VEC3", "count": 2 }]
        }))
        .unwrap();
        assert_eq!(doc.nodes[0].children, [1]);
        assert_eq!(doc.accessors[0].component(), Some(ComponentType::Float));
        assert_eq!(doc.accessors[0].element(), Some(ElementType::Vec3));
        assert_eq!(doc.accessors[0].byte_offset, None);
        assert_eq!(doc.accessors[0].offset(), 0);
        assert!(doc.scene.is_none());
    }

    #[test]
    fn test_parse_error() {
        let err = Document::from_slice(b"{ not json").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse glTF JSON"));
    }

    #[test]
    fn test_attribute_sets_sorted() {
        let prim: Primitive = serde_json::from_value(json!({
            "attributes": { "JOINTS_1": 4, "JOINTS_0": 3, "JOINTS_X": 9, "WEIGHTS_0": 5 }
        }))
        .unwrap();
        assert_eq!(prim.attribute_sets("JOINTS"), [(0, 3), (1, 4)]);
        assert_eq!(prim.attribute_sets("WEIGHTS"), [(0, 5)]);
    }

    #[test]
    fn test_buffer_set() {
        let mut buffers = BufferSet::new();
        assert!(buffers.is_empty());
        buffers.insert(2, vec![1, 2, 3]);
        assert_eq!(buffers.len(), 3);
        assert_eq!(buffers.get(0), None);
        assert_eq!(buffers.get(2), Some(&[1u8, 2, 3][..]));
        assert_eq!(buffers.get(7), None);
    }
}
