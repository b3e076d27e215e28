//! Headless renderer adapter.
//!
//! [`NativeMaterial`] and [`NativeTexture`] are CPU-side mirrors of what a PBR
//! renderer keeps per material and per texture. They implement the
//! [`MaterialTarget`] capability the facades drive, track a dirty version so
//! GPU copies are only rebuilt when something changed, and can upload their
//! textures through [`GpuTexture`]. [`instantiate`] builds them from a
//! [`SourceDocument`] the way a renderer would: one shared texture per
//! document texture, one material instance per mesh primitive.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    rc::Rc,
    sync::Arc,
};

use anyhow::bail;

use crate::{
    data_structures::{
        document::{AlphaMode, MaterialDef, SourceDocument, TextureUsage},
        texture::{GpuTexture, default_sampler_descriptor, sampler_descriptor},
    },
    render::{Encoding, MapSlot, MaterialTarget, SharedMaterial, Side, TextureHandle},
};

/// A texture as the renderer holds it.
#[derive(Debug)]
pub struct NativeTexture {
    name: Option<String>,
    image: Option<Arc<image::DynamicImage>>,
    encoding: Encoding,
    sampler: wgpu::SamplerDescriptor<'static>,
    gpu: Option<GpuTexture>,
    version: u64,
    uploaded_version: Option<u64>,
}

impl NativeTexture {
    pub fn new(name: Option<String>, image: Option<Arc<image::DynamicImage>>) -> Self {
        Self {
            name,
            image,
            encoding: Encoding::default(),
            sampler: default_sampler_descriptor(),
            gpu: None,
            version: 0,
            uploaded_version: None,
        }
    }

    /// Wrap into a shareable handle.
    pub fn into_handle(self) -> TextureHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn image(&self) -> Option<&Arc<image::DynamicImage>> {
        self.image.as_ref()
    }

    pub fn set_image(&mut self, image: Option<Arc<image::DynamicImage>>) {
        self.image = image;
        self.version += 1;
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Re-tag the color space. The next upload picks the matching format.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        if self.encoding != encoding {
            self.encoding = encoding;
            self.version += 1;
        }
    }

    pub fn sampler(&self) -> &wgpu::SamplerDescriptor<'static> {
        &self.sampler
    }

    pub fn set_sampler(&mut self, sampler: wgpu::SamplerDescriptor<'static>) {
        self.sampler = sampler;
        self.version += 1;
    }

    pub fn gpu(&self) -> Option<&GpuTexture> {
        self.gpu.as_ref()
    }

    pub fn needs_upload(&self) -> bool {
        self.image.is_some() && self.uploaded_version != Some(self.version)
    }

    /// Create or refresh the GPU copy. Textures without decoded image data
    /// have nothing to upload.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<()> {
        if !self.needs_upload() {
            return Ok(());
        }
        let Some(image) = self.image.clone() else {
            return Ok(());
        };
        let gpu = GpuTexture::from_image(
            device,
            queue,
            &image,
            self.name.as_deref(),
            self.encoding,
            &self.sampler,
        )?;
        self.gpu = Some(gpu);
        self.uploaded_version = Some(self.version);
        Ok(())
    }
}

/// A standard PBR material instance as the renderer holds it.
#[derive(Clone, Debug)]
pub struct NativeMaterial {
    /// Renderer-generated label. Facades never report it as a material name.
    pub label: String,
    maps: HashMap<MapSlot, TextureHandle>,
    color: [f32; 3],
    opacity: f32,
    metalness: f32,
    roughness: f32,
    emissive: [f32; 3],
    alpha_test: f32,
    transparent: bool,
    depth_write: bool,
    side: Side,
    version: u64,
    prepared_version: Option<u64>,
    disposed: bool,
}

impl Default for NativeMaterial {
    fn default() -> Self {
        Self {
            label: String::new(),
            maps: HashMap::new(),
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            metalness: 1.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            alpha_test: 0.0,
            transparent: false,
            depth_write: true,
            side: Side::Front,
            version: 0,
            prepared_version: None,
            disposed: false,
        }
    }
}

impl NativeMaterial {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Wrap into a shareable handle. The result coerces to [`SharedMaterial`].
    pub fn into_shared(self) -> Rc<RefCell<NativeMaterial>> {
        Rc::new(RefCell::new(self))
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn metalness(&self) -> f32 {
        self.metalness
    }

    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    pub fn emissive(&self) -> [f32; 3] {
        self.emissive
    }

    pub fn depth_write(&self) -> bool {
        self.depth_write
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Bumped by every `mark_needs_update`.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn needs_update(&self) -> bool {
        self.prepared_version != Some(self.version)
    }

    /// Release the material. Every later mutation fails.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.maps.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Upload every assigned map whose GPU copy is missing or stale.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<()> {
        if self.disposed {
            bail!("material {} was disposed", self.label);
        }
        for texture in self.maps.values() {
            texture.borrow_mut().upload(device, queue)?;
        }
        self.prepared_version = Some(self.version);
        Ok(())
    }

    fn ensure_live(&self) -> anyhow::Result<()> {
        if self.disposed {
            bail!("material {} was disposed", self.label);
        }
        Ok(())
    }
}

impl MaterialTarget for NativeMaterial {
    fn map(&self, slot: MapSlot) -> Option<TextureHandle> {
        self.maps.get(&slot).cloned()
    }

    fn set_map(&mut self, slot: MapSlot, texture: Option<TextureHandle>) -> anyhow::Result<()> {
        self.ensure_live()?;
        match texture {
            Some(texture) => {
                self.maps.insert(slot, texture);
            }
            None => {
                self.maps.remove(&slot);
            }
        }
        Ok(())
    }

    fn set_color(&mut self, rgb: [f32; 3]) -> anyhow::Result<()> {
        self.ensure_live()?;
        self.color = rgb;
        Ok(())
    }

    fn set_opacity(&mut self, opacity: f32) -> anyhow::Result<()> {
        self.ensure_live()?;
        self.opacity = opacity;
        Ok(())
    }

    fn set_metalness(&mut self, metalness: f32) -> anyhow::Result<()> {
        self.ensure_live()?;
        self.metalness = metalness;
        Ok(())
    }

    fn set_roughness(&mut self, roughness: f32) -> anyhow::Result<()> {
        self.ensure_live()?;
        self.roughness = roughness;
        Ok(())
    }

    fn set_emissive(&mut self, rgb: [f32; 3]) -> anyhow::Result<()> {
        self.ensure_live()?;
        self.emissive = rgb;
        Ok(())
    }

    fn alpha_test(&self) -> f32 {
        self.alpha_test
    }

    fn set_alpha_test(&mut self, threshold: f32) -> anyhow::Result<()> {
        self.ensure_live()?;
        self.alpha_test = threshold;
        Ok(())
    }

    fn transparent(&self) -> bool {
        self.transparent
    }

    fn set_transparent(&mut self, transparent: bool) -> anyhow::Result<()> {
        self.ensure_live()?;
        self.transparent = transparent;
        Ok(())
    }

    fn set_depth_write(&mut self, depth_write: bool) -> anyhow::Result<()> {
        self.ensure_live()?;
        self.depth_write = depth_write;
        Ok(())
    }

    fn set_side(&mut self, side: Side) -> anyhow::Result<()> {
        self.ensure_live()?;
        self.side = side;
        Ok(())
    }

    fn mark_needs_update(&mut self) {
        self.version += 1;
    }
}

/// Renderer objects correlated with document entries, keyed by index.
///
/// This is what a [`Model`](crate::scene_graph::Model) is built from. A
/// material index missing from `materials` yields a document-only facade.
#[derive(Clone, Default)]
pub struct Correlations {
    pub materials: BTreeMap<usize, Vec<SharedMaterial>>,
    /// Native texture per document texture index.
    pub textures: Vec<Option<TextureHandle>>,
}

/// Everything [`instantiate`] created, with concrete types kept for callers
/// that want to inspect or prepare them.
#[derive(Clone, Default)]
pub struct NativeScene {
    pub materials: BTreeMap<usize, Vec<Rc<RefCell<NativeMaterial>>>>,
    pub textures: Vec<Option<TextureHandle>>,
}

impl NativeScene {
    pub fn correlations(&self) -> Correlations {
        let materials = self
            .materials
            .iter()
            .map(|(&index, instances)| {
                let shared: Vec<SharedMaterial> = instances
                    .iter()
                    .map(|instance| instance.clone() as SharedMaterial)
                    .collect();
                (index, shared)
            })
            .collect();
        Correlations {
            materials,
            textures: self.textures.clone(),
        }
    }

    pub fn material_instances(&self, index: usize) -> &[Rc<RefCell<NativeMaterial>>] {
        self.materials.get(&index).map_or(&[], Vec::as_slice)
    }

    /// Upload every stale texture of every material instance.
    pub fn prepare(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<()> {
        for instance in self.materials.values().flatten() {
            let mut instance = instance.borrow_mut();
            if instance.is_disposed() || !instance.needs_update() {
                continue;
            }
            instance.prepare(device, queue)?;
        }
        Ok(())
    }
}

/// Build renderer objects for `document`.
///
/// `images` holds the decoded image for each document image index, `None`
/// where no data could be loaded. Materials no primitive references get no
/// instance.
pub fn instantiate(
    document: &SourceDocument,
    images: &[Option<Arc<image::DynamicImage>>],
) -> NativeScene {
    let textures: Vec<Option<TextureHandle>> = document
        .textures
        .iter()
        .map(|texture| {
            let image = texture
                .source
                .and_then(|source| images.get(source).cloned().flatten());
            let mut native = NativeTexture::new(texture.name.clone(), image);
            let sampler = texture
                .sampler
                .and_then(|sampler| document.samplers.get(sampler));
            native.set_sampler(sampler_descriptor(sampler));
            Some(native.into_handle())
        })
        .collect();

    let mut materials: BTreeMap<usize, Vec<Rc<RefCell<NativeMaterial>>>> = BTreeMap::new();
    for (primitive, index) in document.primitive_materials().enumerate() {
        let Some(def) = document.materials.get(index) else {
            log::warn!(
                "Primitive {} references material {} which does not exist ({} materials).",
                primitive,
                index,
                document.materials.len()
            );
            continue;
        };
        let instances = materials.entry(index).or_default();
        let label = format!(
            "{} #{}",
            def.name.as_deref().unwrap_or("material"),
            instances.len()
        );
        let native = material_from_def(label, def, &textures);
        instances.push(native.into_shared());
    }

    NativeScene { materials, textures }
}

fn material_from_def(
    label: String,
    def: &MaterialDef,
    textures: &[Option<TextureHandle>],
) -> NativeMaterial {
    let mut native = NativeMaterial::new(label);
    if let Some(pbr) = &def.pbr_metallic_roughness {
        let [r, g, b, a] = pbr.base_color_factor.unwrap_or([1.0; 4]);
        native.color = [r, g, b];
        native.opacity = a;
        native.metalness = pbr.metallic_factor.unwrap_or(1.0);
        native.roughness = pbr.roughness_factor.unwrap_or(1.0);
    }
    native.emissive = def.emissive_factor.unwrap_or([0.0; 3]);
    match def.alpha_mode.unwrap_or_default() {
        AlphaMode::Opaque => {}
        AlphaMode::Mask => native.alpha_test = def.alpha_cutoff.unwrap_or(0.5),
        AlphaMode::Blend => {
            native.transparent = true;
            native.depth_write = false;
        }
    }
    if def.double_sided.unwrap_or(false) {
        native.side = Side::Double;
    }
    for usage in TextureUsage::ALL {
        let Some(texture) = def
            .slot(usage)
            .and_then(|info| info.texture_index())
            .and_then(|index| textures.get(index).cloned().flatten())
        else {
            continue;
        };
        texture.borrow_mut().set_encoding(Encoding::for_usage(usage));
        for &slot in MapSlot::for_usage(usage) {
            native.maps.insert(slot, texture.clone());
        }
    }
    native
}
