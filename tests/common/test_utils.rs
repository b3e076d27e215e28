use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    io::Cursor,
    rc::Rc,
};

use scene_facade::{
    Model, OnUpdate, SourceDocument,
    render::{SharedMaterial, TextureHandle},
    resources::native::{Correlations, NativeMaterial, NativeScene, NativeTexture, instantiate},
};

/// Two materials drawn by three primitives: `paint` twice, `glass` once.
pub(crate) const PAINT_AND_GLASS: &str = r#"{
    "asset": {"version": "2.0"},
    "materials": [
        {
            "name": "paint",
            "pbrMetallicRoughness": {
                "baseColorTexture": {"index": 0},
                "metallicRoughnessTexture": {"index": 1}
            },
            "normalTexture": {"index": 1, "scale": 0.5},
            "occlusionTexture": {"index": 1, "strength": 0.8}
        },
        {
            "name": "glass",
            "alphaMode": "BLEND",
            "doubleSided": true
        }
    ],
    "textures": [
        {"name": "albedo", "sampler": 0, "source": 0},
        {"name": "packed", "source": 1}
    ],
    "images": [
        {"name": "albedo-image", "uri": "albedo.png"},
        {"name": "packed-image", "uri": "packed.png"}
    ],
    "samplers": [
        {"magFilter": 9728, "minFilter": 9987, "wrapS": 33071}
    ],
    "meshes": [
        {"name": "body", "primitives": [{"material": 0}, {"material": 0}]},
        {"name": "window", "primitives": [{"material": 1}]}
    ]
}"#;

/// A material without a PBR block, name or texture slots.
pub(crate) const BARE: &str = r#"{
    "asset": {"version": "2.0"},
    "materials": [{}],
    "meshes": [{"primitives": [{"material": 0}]}]
}"#;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Counts update callback invocations.
#[derive(Clone, Default)]
pub(crate) struct UpdateCounter(Rc<Cell<u32>>);

impl UpdateCounter {
    pub(crate) fn callback(&self) -> OnUpdate {
        let count = self.0.clone();
        Rc::new(move || count.set(count.get() + 1))
    }

    pub(crate) fn count(&self) -> u32 {
        self.0.get()
    }
}

pub(crate) fn document(json: &str) -> SourceDocument {
    SourceDocument::from_slice(json.as_bytes()).expect("fixture document is valid")
}

/// Instantiate `json` headlessly and build a model over it.
pub(crate) fn live_model(json: &str) -> (Model, NativeScene, UpdateCounter) {
    init_logger();
    let document = document(json);
    let scene = instantiate(&document, &[]);
    let counter = UpdateCounter::default();
    let model = Model::new(document, Some(&scene), counter.callback());
    (model, scene, counter)
}

pub(crate) fn document_only_model(json: &str) -> (Model, UpdateCounter) {
    init_logger();
    let counter = UpdateCounter::default();
    let model = Model::new(document(json), None, counter.callback());
    (model, counter)
}

pub(crate) fn native_texture(name: &str) -> TextureHandle {
    NativeTexture::new(Some(name.to_string()), None).into_handle()
}

/// Correlate material 0 with `instances` and texture index `i` with
/// `textures[i]`.
pub(crate) fn correlate(
    instances: &[Rc<RefCell<NativeMaterial>>],
    textures: Vec<Option<TextureHandle>>,
) -> Correlations {
    let shared: Vec<SharedMaterial> = instances
        .iter()
        .map(|instance| instance.clone() as SharedMaterial)
        .collect();
    Correlations {
        materials: BTreeMap::from([(0, shared)]),
        textures,
    }
}

pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("png encoding");
    bytes
}

/// Pack `json` and `bin` into a GLB container.
pub(crate) fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let length = 12 + 8 + json.len() + 8 + bin.len();

    let mut glb = Vec::with_capacity(length);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(length as u32).to_le_bytes());
    glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(&bin);
    glb
}
