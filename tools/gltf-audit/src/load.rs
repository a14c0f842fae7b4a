//! Loading a `.gltf` file and its external buffers

use anyhow::{Context, Result};
use gltf_audit::{BufferSet, Document};
use std::path::{Path, PathBuf};

/// A parsed document with whatever buffers could be resolved.
#[derive(Debug)]
pub struct LoadedAsset {
    pub document: Document,
    pub buffers: BufferSet,
    /// Buffers whose bytes could not be loaded
    pub unresolved: Vec<usize>,
}

/// Local file path for a buffer `uri`, relative to `base`.
///
/// Returns `None` for embedded (`data:`) and remote URIs, which are not fetched.
pub fn resolve_uri(base: &Path, uri: &str) -> Option<PathBuf> {
    if uri.starts_with("data:") || uri.contains("://") {
        return None;
    }
    Some(base.join(percent_decode(uri)))
}

/// Decode `%XX` escapes; malformed escapes are kept as written.
fn percent_decode(uri: &str) -> String {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| uri.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse `path` and read every buffer referenced by a relative uri.
///
/// Missing buffer files are logged and left unresolved so their data checks
/// are skipped; only an unreadable or unparsable document is an error.
pub fn load_gltf(path: &Path) -> Result<LoadedAsset> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let document =
        Document::from_slice(&bytes).with_context(|| format!("Failed to parse {:?}", path))?;
    let base = path.parent().unwrap_or(Path::new("."));

    let mut buffers = BufferSet::new();
    let mut unresolved = Vec::new();
    for (index, buffer) in document.buffers.iter().enumerate() {
        let Some(uri) = &buffer.uri else {
            tracing::warn!("buffer {index} has no uri (GLB binary chunk), skipping");
            unresolved.push(index);
            continue;
        };
        let Some(file) = resolve_uri(base, uri) else {
            tracing::warn!("buffer {index}: uri is not a relative file path, skipping");
            unresolved.push(index);
            continue;
        };
        match std::fs::read(&file) {
            Ok(data) => {
                tracing::debug!("buffer {index}: loaded {} bytes from {:?}", data.len(), file);
                buffers.insert(index, data);
            }
            Err(err) => {
                tracing::warn!("buffer {index}: failed to read {:?}: {err}", file);
                unresolved.push(index);
            }
        }
    }

    Ok(LoadedAsset {
        document,
        buffers,
        unresolved,
    })
}
