//! Index reference resolution
//!
//! Every cross-object index in the document is range-checked against the
//! collection it points into. Out-of-range indices are reported as
//! `UNRESOLVED_REFERENCE`; later phases simply skip them.

use gltf_audit_shared::{Issue, IssueCode};

use crate::document::Document;

/// Report `index` when it does not address an element of a collection of `len`.
pub(crate) fn resolve(
    sink: &mut Vec<Issue>,
    index: usize,
    len: usize,
    pointer: impl FnOnce() -> String,
) -> bool {
    if index < len {
        return true;
    }
    sink.push(Issue::new(
        IssueCode::UnresolvedReference,
        pointer(),
        format!("Unresolved reference: {index}."),
    ));
    false
}

pub fn check_references(doc: &Document, sink: &mut Vec<Issue>) {
    let accessors = doc.accessors.len();
    let nodes = doc.nodes.len();

    if let Some(scene) = doc.scene {
        resolve(sink, scene, doc.scenes.len(), || "/scene".to_string());
    }

    for (a, accessor) in doc.accessors.iter().enumerate() {
        if let Some(view) = accessor.buffer_view {
            resolve(sink, view, doc.buffer_views.len(), || {
                format!("/accessors/{a}/bufferView")
            });
        }
        if let Some(sparse) = &accessor.sparse {
            resolve(sink, sparse.indices.buffer_view, doc.buffer_views.len(), || {
                format!("/accessors/{a}/sparse/indices/bufferView")
            });
            resolve(sink, sparse.values.buffer_view, doc.buffer_views.len(), || {
                format!("/accessors/{a}/sparse/values/bufferView")
            });
        }
    }

    for (a, animation) in doc.animations.iter().enumerate() {
        for (c, channel) in animation.channels.iter().enumerate() {
            if let Some(sampler) = channel.sampler {
                resolve(sink, sampler, animation.samplers.len(), || {
                    format!("/animations/{a}/channels/{c}/sampler")
                });
            }
            if let Some(node) = channel.target.node {
                resolve(sink, node, nodes, || {
                    format!("/animations/{a}/channels/{c}/target/node")
                });
            }
        }
        for (s, sampler) in animation.samplers.iter().enumerate() {
            resolve(sink, sampler.input, accessors, || {
                format!("/animations/{a}/samplers/{s}/input")
            });
            resolve(sink, sampler.output, accessors, || {
                format!("/animations/{a}/samplers/{s}/output")
            });
        }
    }

    for (v, view) in doc.buffer_views.iter().enumerate() {
        resolve(sink, view.buffer, doc.buffers.len(), || {
            format!("/bufferViews/{v}/buffer")
        });
    }

    for (i, image) in doc.images.iter().enumerate() {
        if let Some(view) = image.buffer_view {
            resolve(sink, view, doc.buffer_views.len(), || {
                format!("/images/{i}/bufferView")
            });
        }
    }

    for (m, material) in doc.materials.iter().enumerate() {
        for (slot, info) in material.texture_slots() {
            resolve(sink, info.index, doc.textures.len(), || {
                format!("/materials/{m}/{slot}/index")
            });
        }
    }

    for (m, mesh) in doc.meshes.iter().enumerate() {
        for (p, primitive) in mesh.primitives.iter().enumerate() {
            let base = || format!("/meshes/{m}/primitives/{p}");
            for (semantic, &accessor) in &primitive.attributes {
                resolve(sink, accessor, accessors, || {
                    format!("{}/attributes/{semantic}", base())
                });
            }
            if let Some(indices) = primitive.indices {
                resolve(sink, indices, accessors, || format!("{}/indices", base()));
            }
            if let Some(material) = primitive.material {
                resolve(sink, material, doc.materials.len(), || {
                    format!("{}/material", base())
                });
            }
            for (t, target) in primitive.targets.iter().enumerate() {
                for (semantic, &accessor) in target {
                    resolve(sink, accessor, accessors, || {
                        format!("{}/targets/{t}/{semantic}", base())
                    });
                }
            }
        }
    }

    for (n, node) in doc.nodes.iter().enumerate() {
        if let Some(camera) = node.camera {
            resolve(sink, camera, doc.cameras.len(), || format!("/nodes/{n}/camera"));
        }
        for (j, &child) in node.children.iter().enumerate() {
            resolve(sink, child, nodes, || format!("/nodes/{n}/children/{j}"));
        }
        if let Some(mesh) = node.mesh {
            resolve(sink, mesh, doc.meshes.len(), || format!("/nodes/{n}/mesh"));
        }
        if let Some(skin) = node.skin {
            resolve(sink, skin, doc.skins.len(), || format!("/nodes/{n}/skin"));
        }
    }

    for (s, scene) in doc.scenes.iter().enumerate() {
        for (j, &node) in scene.nodes.iter().enumerate() {
            resolve(sink, node, nodes, || format!("/scenes/{s}/nodes/{j}"));
        }
    }

    for (s, skin) in doc.skins.iter().enumerate() {
        if let Some(ibm) = skin.inverse_bind_matrices {
            resolve(sink, ibm, accessors, || {
                format!("/skins/{s}/inverseBindMatrices")
            });
        }
        if let Some(skeleton) = skin.skeleton {
            resolve(sink, skeleton, nodes, || format!("/skins/{s}/skeleton"));
        }
        for (j, &joint) in skin.joints.iter().enumerate() {
            resolve(sink, joint, nodes, || format!("/skins/{s}/joints/{j}"));
        }
    }

    for (t, texture) in doc.textures.iter().enumerate() {
        if let Some(sampler) = texture.sampler {
            resolve(sink, sampler, doc.samplers.len(), || {
                format!("/textures/{t}/sampler")
            });
        }
        if let Some(source) = texture.source {
            resolve(sink, source, doc.images.len(), || format!("/textures/{t}/source"));
        }
    }
}
