use std::sync::Arc;

use anyhow::Context;
use data_url::DataUrl;

use crate::{
    data_structures::document::{ImageDef, SourceDocument},
    data_structures::element::OnUpdate,
    resources::native::{NativeScene, instantiate},
    scene_graph::Model,
};

/**
 * This module contains all logic for loading documents and images from external files
 * and for turning them into renderer objects.
 */
pub mod native;

/// Directory relative file names are resolved against.
pub const ASSET_ROOT: &str = "assets";

#[cfg(target_arch = "wasm32")]
fn format_url(root: &str, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window available")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, root.trim_matches('/')))?;
    Ok(base.join(file_name)?)
}

/// Read `file_name` from [`ASSET_ROOT`].
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    load_binary_from(ASSET_ROOT, file_name).await
}

/// Read `file_name` relative to `root`: a directory natively, a path below
/// the page origin on the web.
pub async fn load_binary_from(root: &str, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join(root).join(file_name);
        std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

/// Parse a `.gltf` or `.glb` file from [`ASSET_ROOT`].
pub async fn load_document(file_name: &str) -> anyhow::Result<SourceDocument> {
    let bytes = load_binary(file_name).await?;
    let document = SourceDocument::from_slice(&bytes)
        .with_context(|| format!("parsing {}", file_name))?;
    log::info!(
        "Loaded {}: {} materials, {} textures, {} images.",
        file_name,
        document.materials.len(),
        document.textures.len(),
        document.images.len()
    );
    Ok(document)
}

/// Decode every image of `document`, in image index order.
///
/// Relative URIs are read from `root` and `data:` URIs are decoded in place.
/// Embedded images come from the GLB binary chunk. An image that cannot be
/// loaded is logged and left as `None`, the texture using it then has no
/// pixel data.
pub async fn load_images(
    document: &SourceDocument,
    root: &str,
) -> Vec<Option<Arc<image::DynamicImage>>> {
    let loads = document
        .images
        .iter()
        .enumerate()
        .map(|(index, image)| async move {
            match load_image(document, root, image).await {
                Ok(decoded) => decoded.map(Arc::new),
                Err(e) => {
                    log::warn!("Image {} could not be loaded: {:#}", index, e);
                    None
                }
            }
        });
    futures::future::join_all(loads).await
}

async fn load_image(
    document: &SourceDocument,
    root: &str,
    image: &ImageDef,
) -> anyhow::Result<Option<image::DynamicImage>> {
    let mut mime_type = image.mime_type.clone();
    let bytes = if let Some(view) = image.buffer_view {
        document
            .buffer_view_bytes(view)
            .with_context(|| format!("buffer view {} is not in the binary chunk", view))?
            .to_vec()
    } else if let Some(uri) = &image.uri {
        if uri.starts_with("data:") {
            let url = DataUrl::process(uri)
                .map_err(|e| anyhow::anyhow!("malformed data URI: {:?}", e))?;
            if mime_type.is_none() {
                let mime = url.mime_type();
                mime_type = Some(format!("{}/{}", mime.type_, mime.subtype));
            }
            let (bytes, _) = url
                .decode_to_vec()
                .map_err(|e| anyhow::anyhow!("data URI is not valid base64: {:?}", e))?;
            log::debug!("Decoded data URI image {:?}: {} bytes", image.name, bytes.len());
            bytes
        } else {
            load_binary_from(root, uri).await?
        }
    } else {
        log::warn!("Image {:?} has neither a uri nor a buffer view.", image.name);
        return Ok(None);
    };
    Ok(Some(decode_image(&bytes, mime_type.as_deref())?))
}

/// Decode `bytes`, trusting the declared mime type when there is one.
pub fn decode_image(bytes: &[u8], mime_type: Option<&str>) -> anyhow::Result<image::DynamicImage> {
    let decoded = match mime_type.and_then(image::ImageFormat::from_mime_type) {
        Some(format) => image::load_from_memory_with_format(bytes, format)?,
        None => image::load_from_memory(bytes)?,
    };
    Ok(decoded)
}

/// Load `file_name` with its images, instantiate renderer objects for it and
/// build the facades on top.
///
/// The returned [`NativeScene`] is what a renderer draws and prepares; the
/// [`Model`] edits it.
pub async fn load_model(
    file_name: &str,
    on_update: OnUpdate,
) -> anyhow::Result<(Model, NativeScene)> {
    let document = load_document(file_name).await?;
    let root = match file_name.rfind('/') {
        Some(split) => format!("{}/{}", ASSET_ROOT, &file_name[..split]),
        None => ASSET_ROOT.to_string(),
    };
    let images = load_images(&document, &root).await;
    let scene = instantiate(&document, &images);
    let model = Model::new(document, Some(&scene), on_update);
    Ok((model, scene))
}
