//! A texture slot of a material.
//!
//! The slot's [`TextureUsage`] decides which native map properties are
//! written and which [`Encoding`] a texture gets when it is placed here.

use std::rc::Rc;

use serde_json::Value;

use crate::{
    data_structures::{
        correlated::CorrelatedSet,
        document::{NO_TEXTURE, TextureInfoDef, TextureUsage},
        element::{
            ElementCore, FacadeElement, IdSequence, OnUpdate, SharedDocument, base_json, fragment,
        },
    },
    render::{Encoding, MapSlot, MaterialTarget},
    scene_graph::texture::{Texture, TextureRef},
};

#[derive(Debug)]
pub struct TextureInfo {
    core: ElementCore,
    ids: IdSequence,
    material: usize,
    usage: TextureUsage,
    correlated: Option<Rc<CorrelatedSet<dyn MaterialTarget>>>,
    texture: Option<Texture>,
}

impl TextureInfo {
    pub(crate) fn new(
        ids: &IdSequence,
        document: SharedDocument,
        on_update: OnUpdate,
        material: usize,
        usage: TextureUsage,
        correlated: Option<Rc<CorrelatedSet<dyn MaterialTarget>>>,
        texture: Option<TextureRef>,
    ) -> Self {
        let core = ElementCore::new(ids, document.clone(), on_update.clone());
        let texture = texture
            .filter(|reference| !reference.is_empty())
            .map(|reference| Texture::new(ids, document, on_update, reference));
        Self {
            core,
            ids: ids.clone(),
            material,
            usage,
            correlated,
            texture,
        }
    }

    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /// Place `texture` in this slot, or clear it with `None`.
    ///
    /// Every correlated material gets the native texture (or none) on each
    /// map property of this usage and is flagged for update. The native
    /// texture is re-tagged with the usage's encoding, the document slot is
    /// rewritten and the update callback fires once.
    pub fn set_texture(&mut self, texture: Option<TextureRef>) {
        let texture = texture.filter(|reference| !reference.is_empty());
        let usage = self.usage;
        let native = texture.as_ref().and_then(|reference| reference.native.clone());

        if let Some(correlated) = &self.correlated {
            correlated.apply("set_texture", |target| {
                for &slot in MapSlot::for_usage(usage) {
                    target.set_map(slot, native.clone())?;
                }
                target.mark_needs_update();
                Ok(())
            });
        }

        if let Some(native) = &native {
            match native.try_borrow_mut() {
                Ok(mut native) => native.set_encoding(Encoding::for_usage(usage)),
                Err(e) => log::warn!(
                    "Unable to tag texture for {}: {}",
                    usage.member_name(),
                    e
                ),
            }
        }

        {
            let mut document = self.core.document().borrow_mut();
            match document.materials.get_mut(self.material) {
                Some(material) => {
                    let slot = material.slot_mut(usage);
                    let index = texture
                        .as_ref()
                        .and_then(|reference| reference.index)
                        .map_or(NO_TEXTURE, |index| index as i64);
                    if let Some(info) = slot.as_mut() {
                        info.index = index;
                    } else if texture.is_some() {
                        *slot = Some(TextureInfoDef::new(index));
                    }
                }
                None => log::error!(
                    "Material {} is missing from the document, {} not recorded.",
                    self.material,
                    usage.member_name()
                ),
            }
        }

        match (texture, self.texture.as_mut()) {
            (Some(reference), Some(existing)) => existing.repoint(reference),
            (Some(reference), None) => {
                self.texture = Some(Texture::new(
                    &self.ids,
                    self.core.document().clone(),
                    self.core.on_update().clone(),
                    reference,
                ))
            }
            (None, _) => self.texture = None,
        }

        self.core.notify();
    }
}

impl FacadeElement for TextureInfo {
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
                .and_then(|material| material.slot(self.usage)),
        )
    }

    fn to_json(&self) -> Value {
        let mut json = base_json(self);
        if let Some(texture) = &self.texture {
            json["texture"] = texture.to_json();
        }
        json
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::data_structures::document::SourceDocument;

    #[test]
    fn a_missing_material_is_logged_not_indexed() {
        let document: SharedDocument = Rc::new(RefCell::new(SourceDocument::default()));
        let ids = IdSequence::new();
        let mut slot = TextureInfo::new(
            &ids,
            document.clone(),
            Rc::new(|| {}),
            3,
            TextureUsage::Normal,
            None,
            None,
        );

        slot.set_texture(Some(TextureRef {
            index: Some(0),
            native: None,
        }));

        assert!(document.borrow().materials.is_empty());
        assert_eq!(slot.texture().and_then(|texture| texture.index()), Some(0));
    }
}
