//! Impasto painting core - material channel routing for PBR brush strokes
//!
//! This crate provides the pieces that turn one painted dab into coherent
//! updates across several material channels:
//! - [`channel_matrix::ChannelMatrix`] - which channels a brush affects, and how strongly
//! - [`material_group::MaterialGroup`] - a group node owning one raster per channel
//! - [`router::DabRouter`] - height, roughness, metallic and normal passes per dab
//! - [`node`] - minimal layer arena the material group lives in
//! - [`raster`] - pixel storage with an injected [`color_space::ColorSpace`]
//! - [`document`] - attributed-tree documents for brush settings
//! - [`editor`] - listener-based editing model for a matrix

pub mod channel_matrix;
pub mod color_space;
pub mod constants;
pub mod dab;
pub mod document;
pub mod editor;
pub mod material_group;
pub mod node;
pub mod raster;
pub mod router;
pub mod types;

pub use channel_matrix::*;
pub use color_space::*;
pub use constants::*;
pub use dab::*;
pub use document::*;
pub use editor::*;
pub use material_group::*;
pub use node::*;
pub use raster::*;
pub use router::*;
pub use types::*;
