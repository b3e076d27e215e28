use std::rc::Rc;

use serde_json::Value;

use crate::{
    data_structures::{
        correlated::CorrelatedSet,
        document::{PbrDef, TextureUsage},
        element::{
            ElementCore, FacadeElement, IdSequence, OnUpdate, SharedDocument, base_json, fragment,
        },
    },
    render::MaterialTarget,
    scene_graph::{texture::TextureRef, texture_info::TextureInfo},
};

pub const DEFAULT_BASE_COLOR_FACTOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
pub const DEFAULT_METALLIC_FACTOR: f32 = 1.0;
pub const DEFAULT_ROUGHNESS_FACTOR: f32 = 1.0;

/// The metallic-roughness block of a material: base color, metallic and
/// roughness factors plus the base color and metallic-roughness slots.
#[derive(Debug)]
pub struct PbrMetallicRoughness {
    core: ElementCore,
    material: usize,
    correlated: Option<Rc<CorrelatedSet<dyn MaterialTarget>>>,
    base_color_texture: TextureInfo,
    metallic_roughness_texture: TextureInfo,
}

impl PbrMetallicRoughness {
    /// Expects the material's PBR block to exist in the document already.
    pub(crate) fn new(
        ids: &IdSequence,
        document: SharedDocument,
        on_update: OnUpdate,
        material: usize,
        correlated: Option<Rc<CorrelatedSet<dyn MaterialTarget>>>,
        base_color: Option<TextureRef>,
        metallic_roughness: Option<TextureRef>,
    ) -> Self {
        let core = ElementCore::new(ids, document.clone(), on_update.clone());
        let base_color_texture = TextureInfo::new(
            ids,
            document.clone(),
            on_update.clone(),
            material,
            TextureUsage::Base,
            correlated.clone(),
            base_color,
        );
        let metallic_roughness_texture = TextureInfo::new(
            ids,
            document,
            on_update,
            material,
            TextureUsage::Metallic,
            correlated.clone(),
            metallic_roughness,
        );
        Self {
            core,
            material,
            correlated,
            base_color_texture,
            metallic_roughness_texture,
        }
    }

    fn read<T>(&self, read: impl FnOnce(&PbrDef) -> Option<T>) -> Option<T> {
        let document = self.core.document().borrow();
        document
            .materials
            .get(self.material)
            .and_then(|material| material.pbr_metallic_roughness.as_ref())
            .and_then(read)
    }

    fn write(&self, write: impl FnOnce(&mut PbrDef)) {
        let mut document = self.core.document().borrow_mut();
        if let Some(material) = document.materials.get_mut(self.material) {
            write(material.pbr_mut());
        }
    }

    pub fn base_color_factor(&self) -> [f32; 4] {
        self.read(|pbr| pbr.base_color_factor)
            .unwrap_or(DEFAULT_BASE_COLOR_FACTOR)
    }

    pub fn metallic_factor(&self) -> f32 {
        self.read(|pbr| pbr.metallic_factor)
            .unwrap_or(DEFAULT_METALLIC_FACTOR)
    }

    pub fn roughness_factor(&self) -> f32 {
        self.read(|pbr| pbr.roughness_factor)
            .unwrap_or(DEFAULT_ROUGHNESS_FACTOR)
    }

    pub fn base_color_texture(&self) -> &TextureInfo {
        &self.base_color_texture
    }

    pub fn base_color_texture_mut(&mut self) -> &mut TextureInfo {
        &mut self.base_color_texture
    }

    pub fn metallic_roughness_texture(&self) -> &TextureInfo {
        &self.metallic_roughness_texture
    }

    pub fn metallic_roughness_texture_mut(&mut self) -> &mut TextureInfo {
        &mut self.metallic_roughness_texture
    }

    /// Set the base color. The renderer receives `rgb` as color and the
    /// alpha channel as opacity.
    pub fn set_base_color_factor(&mut self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        if let Some(correlated) = &self.correlated {
            correlated.apply("set_base_color_factor", |target| {
                target.set_color([r, g, b])?;
                target.set_opacity(a)
            });
        }
        self.write(|pbr| pbr.base_color_factor = Some(rgba));
        self.core.notify();
    }

    pub fn set_metallic_factor(&mut self, value: f32) {
        if let Some(correlated) = &self.correlated {
            correlated.apply("set_metallic_factor", |target| target.set_metalness(value));
        }
        self.write(|pbr| pbr.metallic_factor = Some(value));
        self.core.notify();
    }

    pub fn set_roughness_factor(&mut self, value: f32) {
        if let Some(correlated) = &self.correlated {
            correlated.apply("set_roughness_factor", |target| target.set_roughness(value));
        }
        self.write(|pbr| pbr.roughness_factor = Some(value));
        self.core.notify();
    }
}

impl FacadeElement for PbrMetallicRoughness {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn name(&self) -> Option<String> {
        None
    }

    fn source_object(&self) -> Option<Value> {
        let document = self.core.document().borrow();
        fragment(
            document
                .materials
                .get(self.material)
                .and_then(|material| material.pbr_metallic_roughness.as_ref()),
        )
    }

    fn to_json(&self) -> Value {
        let mut json = base_json(self);
        json["baseColorTexture"] = self.base_color_texture.to_json();
        json["metallicRoughnessTexture"] = self.metallic_roughness_texture.to_json();
        json
    }
}
