//! Extension registry
//!
//! Known extensions form a closed set. Each one carries its own validation
//! (cross references into the core document plus a few value rules), looked
//! up by name from a static table; unknown names pass through untouched
//! apart from the declaration checks.

use gltf_audit_shared::{Issue, IssueCode};
use serde_json::Value;
use std::f64::consts::FRAC_PI_4;
use std::fmt;

use crate::document::{Document, Extensions, Material, Node, Texture};
use crate::references::resolve;

pub const KHR_LIGHTS_PUNCTUAL: &str = "KHR_lights_punctual";

/// Default `outerConeAngle` of a spot light.
const DEFAULT_OUTER_CONE_ANGLE: f64 = FRAC_PI_4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownExtension {
    LightsPunctual,
    MaterialsAnisotropy,
    MaterialsClearcoat,
    MaterialsDiffuseTransmission,
    MaterialsDispersion,
    MaterialsEmissiveStrength,
    MaterialsIor,
    MaterialsIridescence,
    MaterialsPbrSpecularGlossiness,
    MaterialsSheen,
    MaterialsSpecular,
    MaterialsTransmission,
    MaterialsUnlit,
    MaterialsVolume,
    MeshQuantization,
    TextureBasisu,
    TextureTransform,
    TextureAvif,
    TextureWebp,
    TextureDds,
}

impl KnownExtension {
    pub const ALL: &'static [KnownExtension] = &[
        Self::LightsPunctual,
        Self::MaterialsAnisotropy,
        Self::MaterialsClearcoat,
        Self::MaterialsDiffuseTransmission,
        Self::MaterialsDispersion,
        Self::MaterialsEmissiveStrength,
        Self::MaterialsIor,
        Self::MaterialsIridescence,
        Self::MaterialsPbrSpecularGlossiness,
        Self::MaterialsSheen,
        Self::MaterialsSpecular,
        Self::MaterialsTransmission,
        Self::MaterialsUnlit,
        Self::MaterialsVolume,
        Self::MeshQuantization,
        Self::TextureBasisu,
        Self::TextureTransform,
        Self::TextureAvif,
        Self::TextureWebp,
        Self::TextureDds,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::LightsPunctual => KHR_LIGHTS_PUNCTUAL,
            Self::MaterialsAnisotropy => "KHR_materials_anisotropy",
            Self::MaterialsClearcoat => "KHR_materials_clearcoat",
            Self::MaterialsDiffuseTransmission => "KHR_materials_diffuse_transmission",
            Self::MaterialsDispersion => "KHR_materials_dispersion",
            Self::MaterialsEmissiveStrength => "KHR_materials_emissive_strength",
            Self::MaterialsIor => "KHR_materials_ior",
            Self::MaterialsIridescence => "KHR_materials_iridescence",
            Self::MaterialsPbrSpecularGlossiness => "KHR_materials_pbrSpecularGlossiness",
            Self::MaterialsSheen => "KHR_materials_sheen",
            Self::MaterialsSpecular => "KHR_materials_specular",
            Self::MaterialsTransmission => "KHR_materials_transmission",
            Self::MaterialsUnlit => "KHR_materials_unlit",
            Self::MaterialsVolume => "KHR_materials_volume",
            Self::MeshQuantization => "KHR_mesh_quantization",
            Self::TextureBasisu => "KHR_texture_basisu",
            Self::TextureTransform => "KHR_texture_transform",
            Self::TextureAvif => "EXT_texture_avif",
            Self::TextureWebp => "EXT_texture_webp",
            Self::TextureDds => "MSFT_texture_dds",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ext| ext.name() == name)
    }

    /// Texture-info properties this extension adds to a material.
    pub fn material_texture_slots(self) -> &'static [&'static str] {
        match self {
            Self::MaterialsAnisotropy => &["anisotropyTexture"],
            Self::MaterialsClearcoat => &[
                "clearcoatTexture",
                "clearcoatRoughnessTexture",
                "clearcoatNormalTexture",
            ],
            Self::MaterialsDiffuseTransmission => &[
                "diffuseTransmissionTexture",
                "diffuseTransmissionColorTexture",
            ],
            Self::MaterialsIridescence => &["iridescenceTexture", "iridescenceThicknessTexture"],
            Self::MaterialsPbrSpecularGlossiness => {
                &["diffuseTexture", "specularGlossinessTexture"]
            }
            Self::MaterialsSheen => &["sheenColorTexture", "sheenRoughnessTexture"],
            Self::MaterialsSpecular => &["specularTexture", "specularColorTexture"],
            Self::MaterialsTransmission => &["transmissionTexture"],
            Self::MaterialsVolume => &["thicknessTexture"],
            _ => &[],
        }
    }

    /// Whether the extension supplies an alternate image `source` on a texture.
    pub fn is_texture_source(self) -> bool {
        matches!(
            self,
            Self::TextureBasisu | Self::TextureAvif | Self::TextureWebp | Self::TextureDds
        )
    }

    /// Extension-specific checks against `doc`.
    pub fn validate(self, doc: &Document, sink: &mut Vec<Issue>) {
        match self {
            Self::LightsPunctual => validate_lights(doc, sink),
            ext if !ext.material_texture_slots().is_empty() => {
                validate_material_textures(ext, doc, sink)
            }
            ext if ext.is_texture_source() => validate_texture_source(ext, doc, sink),
            _ => {}
        }
    }
}

impl fmt::Display for KnownExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn as_index(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|v| usize::try_from(v).ok())
}

/// Light referenced by a node through `KHR_lights_punctual`.
pub fn node_light(node: &Node) -> Option<usize> {
    node.extensions
        .get(KHR_LIGHTS_PUNCTUAL)
        .and_then(|ext| ext.get("light"))
        .and_then(as_index)
}

/// Lights declared in the document-level `KHR_lights_punctual` extension.
pub fn lights(doc: &Document) -> &[Value] {
    doc.extensions
        .get(KHR_LIGHTS_PUNCTUAL)
        .and_then(|ext| ext.get("lights"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Texture references made by known material extensions, as
/// (pointer suffix relative to the material, texture index).
pub fn material_extension_textures(material: &Material) -> Vec<(String, usize)> {
    let mut textures = Vec::new();
    for (name, payload) in &material.extensions {
        let Some(ext) = KnownExtension::from_name(name) else {
            continue;
        };
        for slot in ext.material_texture_slots() {
            let index = payload
                .get(*slot)
                .and_then(|info| info.get("index"))
                .and_then(as_index);
            if let Some(index) = index {
                textures.push((format!("extensions/{name}/{slot}"), index));
            }
        }
    }
    textures
}

/// Image sources supplied by known texture extensions.
pub fn texture_extension_sources(texture: &Texture) -> Vec<(KnownExtension, usize)> {
    texture
        .extensions
        .iter()
        .filter_map(|(name, payload)| {
            let ext = KnownExtension::from_name(name).filter(|e| e.is_texture_source())?;
            Some((ext, as_index(payload.get("source")?)?))
        })
        .collect()
}

fn validate_lights(doc: &Document, sink: &mut Vec<Issue>) {
    let lights = lights(doc);

    for (n, node) in doc.nodes.iter().enumerate() {
        if let Some(light) = node_light(node) {
            resolve(sink, light, lights.len(), || {
                format!("/nodes/{n}/extensions/{KHR_LIGHTS_PUNCTUAL}/light")
            });
        }
    }

    for (l, light) in lights.iter().enumerate() {
        if light.get("type").and_then(Value::as_str) != Some("spot") {
            continue;
        }
        let Some(spot) = light.get("spot") else {
            continue;
        };
        let inner = spot.get("innerConeAngle").and_then(Value::as_f64).unwrap_or(0.0);
        let outer = spot
            .get("outerConeAngle")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_OUTER_CONE_ANGLE);
        if outer <= inner {
            sink.push(Issue::new(
                IssueCode::KhrLightsPunctualLightSpotAngles,
                format!("/extensions/{KHR_LIGHTS_PUNCTUAL}/lights/{l}/spot"),
                format!("outerConeAngle ({outer}) is less than or equal to innerConeAngle ({inner})."),
            ));
        }
    }
}

fn validate_material_textures(ext: KnownExtension, doc: &Document, sink: &mut Vec<Issue>) {
    for (m, material) in doc.materials.iter().enumerate() {
        let Some(payload) = material.extensions.get(ext.name()) else {
            continue;
        };
        for slot in ext.material_texture_slots() {
            let Some(index) = payload
                .get(*slot)
                .and_then(|info| info.get("index"))
                .and_then(as_index)
            else {
                continue;
            };
            resolve(sink, index, doc.textures.len(), || {
                format!("/materials/{m}/extensions/{ext}/{slot}/index")
            });
        }
    }
}

fn validate_texture_source(ext: KnownExtension, doc: &Document, sink: &mut Vec<Issue>) {
    for (t, texture) in doc.textures.iter().enumerate() {
        let Some(source) = texture
            .extensions
            .get(ext.name())
            .and_then(|payload| payload.get("source"))
            .and_then(as_index)
        else {
            continue;
        };
        resolve(sink, source, doc.images.len(), || {
            format!("/textures/{t}/extensions/{ext}/source")
        });
    }
}

/// Extension bags of the document, each with the pointer of its owner.
fn extension_bags(doc: &Document) -> Vec<(String, &Extensions)> {
    let mut bags = vec![(String::new(), &doc.extensions)];
    for (m, material) in doc.materials.iter().enumerate() {
        bags.push((format!("/materials/{m}"), &material.extensions));
        for (slot, info) in material.texture_slots() {
            bags.push((format!("/materials/{m}/{slot}"), &info.extensions));
        }
    }
    for (m, mesh) in doc.meshes.iter().enumerate() {
        for (p, primitive) in mesh.primitives.iter().enumerate() {
            bags.push((format!("/meshes/{m}/primitives/{p}"), &primitive.extensions));
        }
    }
    for (n, node) in doc.nodes.iter().enumerate() {
        bags.push((format!("/nodes/{n}"), &node.extensions));
    }
    for (t, texture) in doc.textures.iter().enumerate() {
        bags.push((format!("/textures/{t}"), &texture.extensions));
    }
    bags
}

/// Declaration checks followed by every known extension's own validation.
pub fn check_extensions(doc: &Document, sink: &mut Vec<Issue>) {
    for (i, name) in doc.extensions_used.iter().enumerate() {
        if KnownExtension::from_name(name).is_none() {
            sink.push(Issue::new(
                IssueCode::UnsupportedExtension,
                format!("/extensionsUsed/{i}"),
                format!("Cannot validate an extension as it is not supported by the validator: '{name}'."),
            ));
        }
    }

    for (owner, bag) in extension_bags(doc) {
        for name in bag.keys() {
            if !doc.extensions_used.iter().any(|used| used == name) {
                sink.push(Issue::new(
                    IssueCode::UndeclaredExtension,
                    format!("{owner}/extensions/{name}"),
                    "Extension was not declared in extensionsUsed.",
                ));
            }
        }
    }

    for ext in KnownExtension::ALL {
        ext.validate(doc, sink);
    }
}
