//! Editable facades over the source document's material graph.
//!
//! - [`Model`] owns the document and builds the facades
//! - [`Material`] fans every edit out to the renderer materials it stands for
//! - [`PbrMetallicRoughness`] holds the metallic-roughness factors and slots
//! - [`TextureInfo`] is one texture slot of a material
//! - [`Texture`], [`Sampler`] and [`Image`] are read-only views of a slot's texture
//!
//! Every facade implements [`FacadeElement`].

pub mod material;
pub mod model;
pub mod pbr;
pub mod texture;
pub mod texture_info;

pub use crate::data_structures::element::{ElementId, FacadeElement};
pub use material::{
    ConsistencyViolation, DEFAULT_ALPHA_CUTOFF, DEFAULT_EMISSIVE_FACTOR, Material,
    OPAQUE_ALPHA_TEST,
};
pub use model::Model;
pub use pbr::PbrMetallicRoughness;
pub use texture::{Image, Sampler, Texture, TextureRef};
pub use texture_info::TextureInfo;
