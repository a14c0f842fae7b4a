//! gltf-audit library
//!
//! File loading and report rendering used by the `gltf-audit` binary.

pub mod load;
pub mod output;

pub use load::{LoadedAsset, load_gltf};
pub use output::{OutputFormat, render};
