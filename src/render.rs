//! Renderer-facing capabilities.
//!
//! The facades never talk to a concrete renderer. Every renderer-native
//! material they drive implements [`MaterialTarget`], and native textures are
//! shared through [`TextureHandle`]. The headless adapter in
//! [`resources::native`](crate::resources::native) is the reference
//! implementation; a GPU renderer plugs in by implementing the same trait.
//!
//! # Key types
//!
//! - [`MaterialTarget`] is the mutation surface of one native material
//! - [`MapSlot`] names a texture property on a native material
//! - [`Encoding`] is the color-space tag stamped on native textures
//! - [`Side`] is the face-culling mode
//!

use std::{cell::RefCell, rc::Rc};

use crate::{data_structures::document::TextureUsage, resources::native::NativeTexture};

/// A native texture shared by every material that samples it. Identity is
/// pointer identity (`Rc::ptr_eq`).
pub type TextureHandle = Rc<RefCell<NativeTexture>>;

/// A native material shared between the facade and the renderer.
pub type SharedMaterial = Rc<RefCell<dyn MaterialTarget>>;

/// Texture properties of a native PBR material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapSlot {
    Base,
    Metalness,
    Roughness,
    Normal,
    Occlusion,
    Emissive,
}

impl MapSlot {
    pub const ALL: [MapSlot; 6] = [
        MapSlot::Base,
        MapSlot::Metalness,
        MapSlot::Roughness,
        MapSlot::Normal,
        MapSlot::Occlusion,
        MapSlot::Emissive,
    ];

    /// Every native property a texture of `usage` is written to. glTF packs
    /// metalness and roughness into one texture, so that usage feeds two maps.
    pub fn for_usage(usage: TextureUsage) -> &'static [MapSlot] {
        match usage {
            TextureUsage::Base => &[MapSlot::Base],
            TextureUsage::Metallic => &[MapSlot::Metalness, MapSlot::Roughness],
            TextureUsage::Normal => &[MapSlot::Normal],
            TextureUsage::Occlusion => &[MapSlot::Occlusion],
            TextureUsage::Emissive => &[MapSlot::Emissive],
        }
    }

    /// The property read back when inspecting which texture a native
    /// material holds for `usage`.
    pub fn primary(usage: TextureUsage) -> MapSlot {
        Self::for_usage(usage)[0]
    }
}

/// Color-space tag of a native texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// sRGB color data, converted to linear when sampled.
    ColorManaged,
    /// Raw data such as normals, occlusion or metalness/roughness.
    #[default]
    Linear,
}

impl Encoding {
    pub fn for_usage(usage: TextureUsage) -> Self {
        match usage {
            TextureUsage::Base | TextureUsage::Emissive => Encoding::ColorManaged,
            TextureUsage::Metallic | TextureUsage::Normal | TextureUsage::Occlusion => {
                Encoding::Linear
            }
        }
    }

    pub fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            Encoding::ColorManaged => wgpu::TextureFormat::Rgba8UnormSrgb,
            Encoding::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// Which faces of a primitive are rasterized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    #[default]
    Front,
    Double,
}

impl Side {
    /// The cull mode a pipeline needs for this side.
    pub fn cull_mode(self) -> Option<wgpu::Face> {
        match self {
            Side::Front => Some(wgpu::Face::Back),
            Side::Double => None,
        }
    }
}

/// Mutation surface of one renderer-native material.
///
/// Setters may fail (a disposed resource, a lost device); the facades log
/// the failure and carry on with the remaining targets. Reads are limited to
/// state the facades themselves write or inspect while being constructed.
pub trait MaterialTarget {
    fn map(&self, slot: MapSlot) -> Option<TextureHandle>;

    fn set_map(&mut self, slot: MapSlot, texture: Option<TextureHandle>) -> anyhow::Result<()>;

    fn set_color(&mut self, rgb: [f32; 3]) -> anyhow::Result<()>;

    fn set_opacity(&mut self, opacity: f32) -> anyhow::Result<()>;

    fn set_metalness(&mut self, metalness: f32) -> anyhow::Result<()>;

    fn set_roughness(&mut self, roughness: f32) -> anyhow::Result<()>;

    fn set_emissive(&mut self, rgb: [f32; 3]) -> anyhow::Result<()>;

    /// Alpha-test threshold. `0.0` disables alpha testing.
    fn alpha_test(&self) -> f32;

    fn set_alpha_test(&mut self, threshold: f32) -> anyhow::Result<()>;

    fn transparent(&self) -> bool;

    fn set_transparent(&mut self, transparent: bool) -> anyhow::Result<()>;

    fn set_depth_write(&mut self, depth_write: bool) -> anyhow::Result<()>;

    fn set_side(&mut self, side: Side) -> anyhow::Result<()>;

    /// Flag the material for re-upload/re-compile before the next draw.
    fn mark_needs_update(&mut self);
}
