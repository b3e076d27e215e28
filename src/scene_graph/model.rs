use std::{
    cell::{Ref, RefCell},
    rc::Rc,
    sync::Arc,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;

use crate::{
    data_structures::{
        document::{ImageDef, SourceDocument, TextureDef},
        element::{FacadeElement, IdSequence, OnUpdate, SharedDocument},
    },
    error::FacadeError,
    render::TextureHandle,
    resources::native::{Correlations, NativeScene, NativeTexture},
    scene_graph::{material::Material, texture::TextureRef},
};

/// Entry point of the facade layer for one loaded document.
///
/// A model owns the source document and one [`Material`] per document
/// material. All of its facades draw ids from one sequence. Loading another
/// document means building another model.
pub struct Model {
    document: SharedDocument,
    on_update: OnUpdate,
    materials: Vec<Material>,
    textures: Vec<Option<TextureHandle>>,
}

impl Model {
    /// Facade `document`, correlated with the renderer objects of `scene`.
    /// Without a scene every facade is document-only.
    pub fn new(document: SourceDocument, scene: Option<&NativeScene>, on_update: OnUpdate) -> Self {
        let correlations = scene.map(NativeScene::correlations).unwrap_or_default();
        Self::with_correlations(document, correlations, on_update)
    }

    /// Facade `document` over renderer objects of any [`MaterialTarget`]
    /// implementation.
    ///
    /// [`MaterialTarget`]: crate::render::MaterialTarget
    pub fn with_correlations(
        document: SourceDocument,
        correlations: Correlations,
        on_update: OnUpdate,
    ) -> Self {
        let Correlations {
            mut materials,
            mut textures,
        } = correlations;
        let ids = IdSequence::new();
        let count = document.materials.len();
        textures.resize(document.textures.len(), None);
        let document: SharedDocument = Rc::new(RefCell::new(document));

        let materials = (0..count)
            .map(|index| {
                Material::new(
                    &ids,
                    document.clone(),
                    on_update.clone(),
                    index,
                    materials.remove(&index).unwrap_or_default(),
                    &textures,
                )
            })
            .collect();
        log::info!("Built facades for {} materials.", count);

        Self {
            document,
            on_update,
            materials,
            textures,
        }
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material(&self, index: usize) -> Result<&Material, FacadeError> {
        let len = self.materials.len();
        self.materials
            .get(index)
            .ok_or_else(|| FacadeError::out_of_range("material", index, len))
    }

    pub fn material_mut(&mut self, index: usize) -> Result<&mut Material, FacadeError> {
        let len = self.materials.len();
        self.materials
            .get_mut(index)
            .ok_or_else(|| FacadeError::out_of_range("material", index, len))
    }

    /// The first material whose document name is `name`.
    pub fn material_by_name(&mut self, name: &str) -> Result<&mut Material, FacadeError> {
        self.materials
            .iter_mut()
            .find(|material| material.name().as_deref() == Some(name))
            .ok_or_else(|| FacadeError::UnknownMaterial(name.to_string()))
    }

    /// A reference to document texture `index`, ready for
    /// [`TextureInfo::set_texture`](super::TextureInfo::set_texture).
    pub fn texture(&self, index: usize) -> Result<TextureRef, FacadeError> {
        let len = self.document.borrow().textures.len();
        if index >= len {
            return Err(FacadeError::out_of_range("texture", index, len));
        }
        Ok(TextureRef {
            index: Some(index),
            native: self.textures.get(index).cloned().flatten(),
        })
    }

    /// Add `image` to the document as a new texture, with a native texture to
    /// go with it. The pixels are embedded as a PNG `data:` URI so an export
    /// carries them.
    pub fn create_texture(
        &mut self,
        name: &str,
        image: image::DynamicImage,
    ) -> Result<TextureRef, FacadeError> {
        let mut png = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;
        let index = {
            let mut document = self.document.borrow_mut();
            document.images.push(ImageDef {
                name: Some(name.to_string()),
                uri: Some(format!("data:image/png;base64,{}", STANDARD.encode(&png))),
                mime_type: Some("image/png".to_string()),
                ..Default::default()
            });
            let source = document.images.len() - 1;
            document.textures.push(TextureDef {
                name: Some(name.to_string()),
                source: Some(source),
                ..Default::default()
            });
            document.textures.len() - 1
        };
        let native = NativeTexture::new(Some(name.to_string()), Some(Arc::new(image))).into_handle();
        self.textures.resize(index, None);
        self.textures.push(Some(native.clone()));
        log::debug!("Created texture {} ({}).", index, name);
        (self.on_update)();
        Ok(TextureRef {
            index: Some(index),
            native: Some(native),
        })
    }

    /// The source document with every edit applied so far.
    pub fn document(&self) -> Ref<'_, SourceDocument> {
        self.document.borrow()
    }

    /// Serialize the edited document.
    pub fn export(&self) -> Result<String, FacadeError> {
        self.document.borrow().to_json()
    }

    /// Summary of every facade, keyed the way the document names them.
    pub fn to_json(&self) -> Value {
        let materials: Vec<Value> = self.materials.iter().map(Material::to_json).collect();
        serde_json::json!({ "materials": materials })
    }
}
