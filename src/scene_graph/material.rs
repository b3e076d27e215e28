//! The material facade.
//!
//! A [`Material`] stands for one entry of the document's `materials` array
//! and for every renderer material instantiated from it. Each setter writes
//! the new value to all correlated instances, records it in the document and
//! fires the update callback exactly once.
//!
//! Construction reconciles the document with what the renderer actually
//! holds. A texture slot that the document declares but no renderer instance
//! carries is rewritten to `index: -1`, and instances that disagree on a
//! slot's texture are reported as a [`ConsistencyViolation`].

use std::rc::Rc;

use serde_json::Value;

use crate::{
    data_structures::{
        correlated::CorrelatedSet,
        document::{AlphaMode, MaterialDef, NO_TEXTURE, TextureUsage},
        element::{
            ElementCore, FacadeElement, IdSequence, OnUpdate, SharedDocument, base_json, fragment,
        },
    },
    render::{MapSlot, MaterialTarget, SharedMaterial, Side, TextureHandle},
    scene_graph::{pbr::PbrMetallicRoughness, texture::TextureRef, texture_info::TextureInfo},
};

/// Cutoff used when a material switches to `MASK` without a stored cutoff.
pub const DEFAULT_ALPHA_CUTOFF: f32 = 0.5;

/// Alpha-test threshold forced onto renderer materials that render fully
/// opaque when a cutoff is set, so they never discard visible texels.
pub const OPAQUE_ALPHA_TEST: f32 = 1e-4;

pub const DEFAULT_EMISSIVE_FACTOR: [f32; 3] = [0.0, 0.0, 0.0];

/// Correlated renderer materials holding different textures for one slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsistencyViolation {
    pub usage: TextureUsage,
    /// How many of the correlated instances hold a texture in the slot.
    pub assigned: usize,
    /// How many distinct textures were found.
    pub distinct: usize,
    pub total: usize,
}

#[derive(Debug)]
pub struct Material {
    core: ElementCore,
    index: usize,
    correlated: Option<Rc<CorrelatedSet<dyn MaterialTarget>>>,
    pbr_metallic_roughness: PbrMetallicRoughness,
    normal_texture: TextureInfo,
    occlusion_texture: TextureInfo,
    emissive_texture: TextureInfo,
    violations: Vec<ConsistencyViolation>,
}

impl Material {
    /// Build the facade for document material `index`.
    ///
    /// `correlated` lists the renderer instances of this material; an empty
    /// list yields a document-only facade. `textures` maps document texture
    /// indices to native textures and is used to find out which document
    /// texture a renderer map corresponds to.
    pub(crate) fn new(
        ids: &IdSequence,
        document: SharedDocument,
        on_update: OnUpdate,
        index: usize,
        correlated: Vec<SharedMaterial>,
        textures: &[Option<TextureHandle>],
    ) -> Self {
        let core = ElementCore::new(ids, document.clone(), on_update.clone());
        let correlated = CorrelatedSet::new(correlated).map(Rc::new);

        let mut violations = Vec::new();
        let mut slots: Vec<Option<TextureRef>> = Vec::with_capacity(TextureUsage::ALL.len());
        {
            let mut document = document.borrow_mut();
            match document.materials.get_mut(index) {
                Some(def) => {
                    def.pbr_mut();
                    for usage in TextureUsage::ALL {
                        let slot = match &correlated {
                            Some(correlated) => Self::reconcile_slot(
                                index,
                                def,
                                usage,
                                correlated,
                                textures,
                                &mut violations,
                            ),
                            None => Self::document_slot(def, usage, textures),
                        };
                        slots.push(slot);
                    }
                }
                None => log::error!("Material {} is missing from the document.", index),
            }
        }

        Self::assemble(ids, core, index, correlated, slots, violations)
    }

    fn assemble(
        ids: &IdSequence,
        core: ElementCore,
        index: usize,
        correlated: Option<Rc<CorrelatedSet<dyn MaterialTarget>>>,
        slots: Vec<Option<TextureRef>>,
        violations: Vec<ConsistencyViolation>,
    ) -> Self {
        let mut slots = slots.into_iter();
        let mut next = || slots.next().flatten();
        let (base, metallic, normal, occlusion, emissive) = (next(), next(), next(), next(), next());

        let document = core.document().clone();
        let on_update = core.on_update().clone();
        let slot = |usage: TextureUsage, texture: Option<TextureRef>| {
            TextureInfo::new(
                ids,
                document.clone(),
                on_update.clone(),
                index,
                usage,
                correlated.clone(),
                texture,
            )
        };
        let pbr_metallic_roughness = PbrMetallicRoughness::new(
            ids,
            document.clone(),
            on_update.clone(),
            index,
            correlated.clone(),
            base,
            metallic,
        );
        let normal_texture = slot(TextureUsage::Normal, normal);
        let occlusion_texture = slot(TextureUsage::Occlusion, occlusion);
        let emissive_texture = slot(TextureUsage::Emissive, emissive);

        Self {
            core,
            index,
            correlated,
            pbr_metallic_roughness,
            normal_texture,
            occlusion_texture,
            emissive_texture,
            violations,
        }
    }

    /// The slot as the renderer holds it. The first instance's map is the
    /// representative when instances disagree. If the first instance holds
    /// no map while a later one does, the facade slot is empty but the
    /// document keeps its declared texture.
    fn reconcile_slot(
        index: usize,
        def: &mut MaterialDef,
        usage: TextureUsage,
        correlated: &CorrelatedSet<dyn MaterialTarget>,
        textures: &[Option<TextureHandle>],
        violations: &mut Vec<ConsistencyViolation>,
    ) -> Option<TextureRef> {
        let maps = correlated.read(|target| target.map(MapSlot::primary(usage)));

        let mut distinct: Vec<&TextureHandle> = Vec::new();
        for map in maps.iter().flatten() {
            if !distinct.iter().any(|seen| Rc::ptr_eq(*seen, map)) {
                distinct.push(map);
            }
        }
        let assigned = maps.iter().filter(|map| map.is_some()).count();
        if distinct.len() > 1 || (assigned > 0 && assigned < maps.len()) {
            log::warn!(
                "Material {} ({}): {} of {} renderer instances hold {} distinct textures in {}. Using the first instance.",
                index,
                def.name.as_deref().unwrap_or("unnamed"),
                assigned,
                maps.len(),
                distinct.len(),
                usage.member_name()
            );
            violations.push(ConsistencyViolation {
                usage,
                assigned,
                distinct: distinct.len(),
                total: maps.len(),
            });
        }

        if assigned == 0 {
            if let Some(info) = def.slot_mut(usage).as_mut() {
                if info.index != NO_TEXTURE {
                    log::debug!(
                        "Material {}: no renderer instance holds {} {}, clearing it.",
                        index,
                        usage.member_name(),
                        info.index
                    );
                    info.index = NO_TEXTURE;
                }
            }
            return None;
        }

        let Some(native) = maps.into_iter().next().flatten() else {
            log::warn!(
                "Material {}: the first renderer instance holds no {}, the facade slot stays empty while the document keeps it.",
                index,
                usage.member_name()
            );
            return None;
        };
        let pooled = textures.iter().position(|texture| {
            texture
                .as_ref()
                .is_some_and(|texture| Rc::ptr_eq(texture, &native))
        });
        let index = pooled.or_else(|| def.slot(usage).and_then(|info| info.texture_index()));
        Some(TextureRef {
            index,
            native: Some(native),
        })
    }

    fn document_slot(
        def: &MaterialDef,
        usage: TextureUsage,
        textures: &[Option<TextureHandle>],
    ) -> Option<TextureRef> {
        let index = def.slot(usage)?.texture_index()?;
        Some(TextureRef {
            index: Some(index),
            native: textures.get(index).cloned().flatten(),
        })
    }

    fn read<T>(&self, read: impl FnOnce(&MaterialDef) -> Option<T>) -> Option<T> {
        let document = self.core.document().borrow();
        document.materials.get(self.index).and_then(read)
    }

    fn write(&self, write: impl FnOnce(&mut MaterialDef)) {
        let mut document = self.core.document().borrow_mut();
        if let Some(material) = document.materials.get_mut(self.index) {
            write(material);
        }
    }

    /// Index of the material in the document.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Renderer instances this facade writes to. Empty for document-only
    /// facades.
    pub fn correlated_objects(&self) -> Vec<SharedMaterial> {
        self.correlated
            .as_ref()
            .map(|correlated| correlated.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_document_only(&self) -> bool {
        self.correlated.is_none()
    }

    /// Slots whose renderer instances disagreed when the facade was built.
    pub fn consistency_violations(&self) -> &[ConsistencyViolation] {
        &self.violations
    }

    pub fn pbr_metallic_roughness(&self) -> &PbrMetallicRoughness {
        &self.pbr_metallic_roughness
    }

    pub fn pbr_metallic_roughness_mut(&mut self) -> &mut PbrMetallicRoughness {
        &mut self.pbr_metallic_roughness
    }

    pub fn normal_texture(&self) -> &TextureInfo {
        &self.normal_texture
    }

    pub fn normal_texture_mut(&mut self) -> &mut TextureInfo {
        &mut self.normal_texture
    }

    pub fn occlusion_texture(&self) -> &TextureInfo {
        &self.occlusion_texture
    }

    pub fn occlusion_texture_mut(&mut self) -> &mut TextureInfo {
        &mut self.occlusion_texture
    }

    pub fn emissive_texture(&self) -> &TextureInfo {
        &self.emissive_texture
    }

    pub fn emissive_texture_mut(&mut self) -> &mut TextureInfo {
        &mut self.emissive_texture
    }

    /// The slot for `usage`, wherever it lives.
    pub fn texture_info(&self, usage: TextureUsage) -> &TextureInfo {
        match usage {
            TextureUsage::Base => self.pbr_metallic_roughness.base_color_texture(),
            TextureUsage::Metallic => self.pbr_metallic_roughness.metallic_roughness_texture(),
            TextureUsage::Normal => &self.normal_texture,
            TextureUsage::Occlusion => &self.occlusion_texture,
            TextureUsage::Emissive => &self.emissive_texture,
        }
    }

    pub fn texture_info_mut(&mut self, usage: TextureUsage) -> &mut TextureInfo {
        match usage {
            TextureUsage::Base => self.pbr_metallic_roughness.base_color_texture_mut(),
            TextureUsage::Metallic => self.pbr_metallic_roughness.metallic_roughness_texture_mut(),
            TextureUsage::Normal => &mut self.normal_texture,
            TextureUsage::Occlusion => &mut self.occlusion_texture,
            TextureUsage::Emissive => &mut self.emissive_texture,
        }
    }

    pub fn emissive_factor(&self) -> [f32; 3] {
        self.read(|material| material.emissive_factor)
            .unwrap_or(DEFAULT_EMISSIVE_FACTOR)
    }

    pub fn alpha_mode(&self) -> AlphaMode {
        self.read(|material| material.alpha_mode)
            .unwrap_or_default()
    }

    /// The stored cutoff, or [`DEFAULT_ALPHA_CUTOFF`] if none was ever set.
    pub fn alpha_cutoff(&self) -> f32 {
        self.read(|material| material.alpha_cutoff)
            .unwrap_or(DEFAULT_ALPHA_CUTOFF)
    }

    pub fn double_sided(&self) -> bool {
        self.read(|material| material.double_sided)
            .unwrap_or(false)
    }

    pub fn set_emissive_factor(&mut self, rgb: [f32; 3]) {
        if let Some(correlated) = &self.correlated {
            correlated.apply("set_emissive_factor", |target| target.set_emissive(rgb));
        }
        self.write(|material| material.emissive_factor = Some(rgb));
        self.core.notify();
    }

    /// Store `value` as the cutoff.
    ///
    /// In `MASK` mode every renderer instance alpha-tests at `value`. In the
    /// other modes, instances that currently render fully opaque get
    /// [`OPAQUE_ALPHA_TEST`] instead and the rest are left alone.
    pub fn set_alpha_cutoff(&mut self, value: f32) {
        self.apply_alpha_cutoff(value);
        self.core.notify();
    }

    fn apply_alpha_cutoff(&self, value: f32) {
        let mode = self.alpha_mode();
        if let Some(correlated) = &self.correlated {
            correlated.apply("set_alpha_cutoff", |target| {
                if mode == AlphaMode::Mask {
                    target.set_alpha_test(value)?;
                } else if target.alpha_test() == 0.0 && !target.transparent() {
                    target.set_alpha_test(OPAQUE_ALPHA_TEST)?;
                }
                target.mark_needs_update();
                Ok(())
            });
        }
        self.write(|material| material.alpha_cutoff = Some(value));
    }

    /// Switch the rendering policy. `MASK` re-applies the stored cutoff
    /// within the same call, so the callback still fires once. The other
    /// modes turn the alpha test off; the cutoff stays in the document.
    pub fn set_alpha_mode(&mut self, mode: AlphaMode) {
        self.write(|material| material.alpha_mode = Some(mode));
        let blend = mode == AlphaMode::Blend;
        if let Some(correlated) = &self.correlated {
            correlated.apply("set_alpha_mode", |target| {
                target.set_transparent(blend)?;
                target.set_depth_write(!blend)?;
                if mode != AlphaMode::Mask {
                    target.set_alpha_test(0.0)?;
                }
                target.mark_needs_update();
                Ok(())
            });
        }
        if mode == AlphaMode::Mask {
            self.apply_alpha_cutoff(self.alpha_cutoff());
        }
        self.core.notify();
    }

    pub fn set_double_sided(&mut self, double_sided: bool) {
        let side = if double_sided { Side::Double } else { Side::Front };
        if let Some(correlated) = &self.correlated {
            correlated.apply("set_double_sided", |target| {
                target.set_side(side)?;
                target.mark_needs_update();
                Ok(())
            });
        }
        self.write(|material| material.double_sided = Some(double_sided));
        self.core.notify();
    }
}

impl FacadeElement for Material {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn name(&self) -> Option<String> {
        self.read(|material| material.name.clone())
    }

    fn source_object(&self) -> Option<Value> {
        let document = self.core.document().borrow();
        fragment(document.materials.get(self.index))
    }

    fn to_json(&self) -> Value {
        let mut json = base_json(self);
        json["pbrMetallicRoughness"] = self.pbr_metallic_roughness.to_json();
        json["normalTexture"] = self.normal_texture.to_json();
        json["occlusionTexture"] = self.occlusion_texture.to_json();
        json["emissiveTexture"] = self.emissive_texture.to_json();
        json
    }
}
