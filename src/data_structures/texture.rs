//! GPU copies of native textures.
//!
//! This module provides [`GpuTexture`], the wgpu texture, view and sampler a
//! renderer binds for one native texture. The texture format is derived from
//! the native texture's [`Encoding`], so a slot change that re-tags a texture
//! also changes the format of its next upload.

use anyhow::*;
use gltf::json::texture::{
    CLAMP_TO_EDGE, LINEAR, LINEAR_MIPMAP_LINEAR, LINEAR_MIPMAP_NEAREST, MIRRORED_REPEAT, MagFilter,
    MinFilter, NEAREST, NEAREST_MIPMAP_LINEAR, NEAREST_MIPMAP_NEAREST, WrappingMode,
};
use image::GenericImageView;

use crate::{data_structures::document::SamplerDef, render::Encoding};

/// A GPU texture with its view and sampler.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    /// The encoding the texture was uploaded with.
    pub encoding: Encoding,
}

impl GpuTexture {
    /// Upload a decoded image.
    ///
    /// # Arguments
    ///
    /// * `img` is the decoded image, converted to RGBA8 before upload
    /// * `label` is used as a debug label for the GPU resource
    /// * `encoding` picks between `Rgba8UnormSrgb` (color-managed) and `Rgba8Unorm` (linear)
    /// * `sampler` describes filtering and wrapping, usually taken from the document sampler
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        encoding: Encoding,
        sampler: &wgpu::SamplerDescriptor<'_>,
    ) -> Result<Self> {
        let dimensions = img.dimensions();
        if dimensions.0 == 0 || dimensions.1 == 0 {
            bail!("cannot upload an empty image ({:?})", label);
        }
        let rgba = img.to_rgba8();

        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = encoding.texture_format();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(sampler);

        Ok(Self {
            texture,
            view,
            sampler,
            encoding,
        })
    }
}

/// Repeat-wrapping, linear-filtering sampler used when a texture names no
/// document sampler.
pub fn default_sampler_descriptor() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    }
}

/// Magnification filter stored in a document sampler.
pub fn decode_mag_filter(raw: u32) -> Option<MagFilter> {
    match raw {
        NEAREST => Some(MagFilter::Nearest),
        LINEAR => Some(MagFilter::Linear),
        _ => None,
    }
}

/// Minification filter stored in a document sampler.
pub fn decode_min_filter(raw: u32) -> Option<MinFilter> {
    match raw {
        NEAREST => Some(MinFilter::Nearest),
        LINEAR => Some(MinFilter::Linear),
        NEAREST_MIPMAP_NEAREST => Some(MinFilter::NearestMipmapNearest),
        LINEAR_MIPMAP_NEAREST => Some(MinFilter::LinearMipmapNearest),
        NEAREST_MIPMAP_LINEAR => Some(MinFilter::NearestMipmapLinear),
        LINEAR_MIPMAP_LINEAR => Some(MinFilter::LinearMipmapLinear),
        _ => None,
    }
}

/// Wrapping mode stored in a document sampler. Unknown values fall back to
/// glTF's default, `REPEAT`.
pub fn decode_wrap(raw: Option<u32>) -> WrappingMode {
    match raw {
        Some(CLAMP_TO_EDGE) => WrappingMode::ClampToEdge,
        Some(MIRRORED_REPEAT) => WrappingMode::MirroredRepeat,
        _ => WrappingMode::Repeat,
    }
}

fn address_mode(wrap: WrappingMode) -> wgpu::AddressMode {
    match wrap {
        WrappingMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrappingMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        WrappingMode::Repeat => wgpu::AddressMode::Repeat,
    }
}

/// Translate a document sampler into the descriptor used for GPU upload.
/// Filters the document leaves open default to linear.
pub fn sampler_descriptor(sampler: Option<&SamplerDef>) -> wgpu::SamplerDescriptor<'static> {
    let Some(sampler) = sampler else {
        return default_sampler_descriptor();
    };
    let mag_filter = match sampler.mag_filter.and_then(decode_mag_filter) {
        Some(MagFilter::Nearest) => wgpu::FilterMode::Nearest,
        Some(MagFilter::Linear) | None => wgpu::FilterMode::Linear,
    };
    let (min_filter, mipmap_filter) = match sampler.min_filter.and_then(decode_min_filter) {
        Some(MinFilter::Nearest) | Some(MinFilter::NearestMipmapNearest) => {
            (wgpu::FilterMode::Nearest, wgpu::MipmapFilterMode::Nearest)
        }
        Some(MinFilter::LinearMipmapNearest) => {
            (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Nearest)
        }
        Some(MinFilter::NearestMipmapLinear) => {
            (wgpu::FilterMode::Nearest, wgpu::MipmapFilterMode::Linear)
        }
        Some(MinFilter::Linear) | Some(MinFilter::LinearMipmapLinear) | None => {
            (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Linear)
        }
    };
    let address_mode_u = address_mode(decode_wrap(sampler.wrap_s));
    let address_mode_v = address_mode(decode_wrap(sampler.wrap_t));
    wgpu::SamplerDescriptor {
        label: None,
        address_mode_u,
        address_mode_v,
        address_mode_w: address_mode_u,
        mag_filter,
        min_filter,
        mipmap_filter,
        ..Default::default()
    }
}
