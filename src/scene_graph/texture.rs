//! Read-only views over a texture reference: [`Texture`], [`Sampler`] and
//! [`Image`].
//!
//! These views never mutate anything. A texture changes only when the
//! [`TextureInfo`](super::TextureInfo) slot holding it receives a new
//! texture, and then the existing views are re-pointed in place so their ids
//! stay valid for whoever holds them.

use gltf::json::texture::{MagFilter, MinFilter, WrappingMode};
use serde_json::Value;

use crate::{
    data_structures::{
        document::{ImageDef, SamplerDef},
        element::{
            ElementCore, FacadeElement, IdSequence, OnUpdate, SharedDocument, base_json, fragment,
        },
        texture::{decode_mag_filter, decode_min_filter, decode_wrap, sampler_descriptor},
    },
    render::TextureHandle,
};

/// What a texture slot points at: a document texture, the renderer's native
/// texture, or both.
#[derive(Clone, Debug, Default)]
pub struct TextureRef {
    pub index: Option<usize>,
    pub native: Option<TextureHandle>,
}

impl TextureRef {
    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.native.is_none()
    }
}

impl From<&Texture> for TextureRef {
    fn from(texture: &Texture) -> Self {
        texture.to_ref()
    }
}

#[derive(Debug)]
pub struct Texture {
    core: ElementCore,
    index: Option<usize>,
    native: Option<TextureHandle>,
    sampler: Sampler,
    source: Image,
}

impl Texture {
    pub(crate) fn new(
        ids: &IdSequence,
        document: SharedDocument,
        on_update: OnUpdate,
        reference: TextureRef,
    ) -> Self {
        let (sampler, source) = Self::lookup(&document, reference.index);
        Self {
            core: ElementCore::new(ids, document.clone(), on_update.clone()),
            index: reference.index,
            native: reference.native,
            sampler: Sampler {
                core: ElementCore::new(ids, document.clone(), on_update.clone()),
                index: sampler,
            },
            source: Image {
                core: ElementCore::new(ids, document, on_update),
                index: source,
            },
        }
    }

    /// Point this view (and its sampler and image views) at another texture
    /// without changing any ids.
    pub(crate) fn repoint(&mut self, reference: TextureRef) {
        let (sampler, source) = Self::lookup(self.core.document(), reference.index);
        self.index = reference.index;
        self.native = reference.native;
        self.sampler.index = sampler;
        self.source.index = source;
    }

    fn lookup(document: &SharedDocument, index: Option<usize>) -> (Option<usize>, Option<usize>) {
        let document = document.borrow();
        index
            .and_then(|index| document.textures.get(index))
            .map_or((None, None), |texture| (texture.sampler, texture.source))
    }

    /// Document texture index, `None` for renderer-only textures.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn native(&self) -> Option<&TextureHandle> {
        self.native.as_ref()
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn source(&self) -> &Image {
        &self.source
    }

    pub fn to_ref(&self) -> TextureRef {
        TextureRef {
            index: self.index,
            native: self.native.clone(),
        }
    }
}

impl FacadeElement for Texture {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn name(&self) -> Option<String> {
        let document = self.core.document().borrow();
        self.index
            .and_then(|index| document.textures.get(index))
            .and_then(|texture| texture.name.clone())
    }

    fn source_object(&self) -> Option<Value> {
        let document = self.core.document().borrow();
        fragment(self.index.and_then(|index| document.textures.get(index)))
    }

    fn to_json(&self) -> Value {
        let mut json = base_json(self);
        json["sampler"] = self.sampler.to_json();
        json["source"] = self.source.to_json();
        json
    }
}

/// Filtering and wrapping of a texture, as declared in the document.
#[derive(Debug)]
pub struct Sampler {
    core: ElementCore,
    index: Option<usize>,
}

impl Sampler {
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn min_filter(&self) -> Option<MinFilter> {
        self.read(|sampler| sampler.min_filter.and_then(decode_min_filter))
    }

    pub fn mag_filter(&self) -> Option<MagFilter> {
        self.read(|sampler| sampler.mag_filter.and_then(decode_mag_filter))
    }

    pub fn wrap_s(&self) -> WrappingMode {
        self.read(|sampler| Some(decode_wrap(sampler.wrap_s)))
            .unwrap_or(WrappingMode::Repeat)
    }

    pub fn wrap_t(&self) -> WrappingMode {
        self.read(|sampler| Some(decode_wrap(sampler.wrap_t)))
            .unwrap_or(WrappingMode::Repeat)
    }

    /// Descriptor a renderer creates its sampler from.
    pub fn descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        let document = self.core.document().borrow();
        sampler_descriptor(self.index.and_then(|index| document.samplers.get(index)))
    }

    fn read<T>(&self, read: impl FnOnce(&SamplerDef) -> Option<T>) -> Option<T> {
        let document = self.core.document().borrow();
        self.index
            .and_then(|index| document.samplers.get(index))
            .and_then(read)
    }
}

impl FacadeElement for Sampler {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn name(&self) -> Option<String> {
        self.read(|sampler| sampler.name.clone())
    }

    fn source_object(&self) -> Option<Value> {
        let document = self.core.document().borrow();
        fragment(self.index.and_then(|index| document.samplers.get(index)))
    }
}

/// The image a texture samples.
#[derive(Debug)]
pub struct Image {
    core: ElementCore,
    index: Option<usize>,
}

impl Image {
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn uri(&self) -> Option<String> {
        self.read(|image| image.uri.clone())
    }

    pub fn mime_type(&self) -> Option<String> {
        self.read(|image| image.mime_type.clone())
    }

    fn read<T>(&self, read: impl FnOnce(&ImageDef) -> Option<T>) -> Option<T> {
        let document = self.core.document().borrow();
        self.index
            .and_then(|index| document.images.get(index))
            .and_then(read)
    }
}

impl FacadeElement for Image {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn name(&self) -> Option<String> {
        self.read(|image| image.name.clone())
    }

    fn source_object(&self) -> Option<Value> {
        let document = self.core.document().borrow();
        fragment(self.index.and_then(|index| document.images.get(index)))
    }

    fn to_json(&self) -> Value {
        let mut json = base_json(self);
        if let Some(uri) = self.uri() {
            json["uri"] = Value::from(uri);
        }
        json
    }
}
