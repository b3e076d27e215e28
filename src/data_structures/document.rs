//! The serializable source document.
//!
//! [`SourceDocument`] is the glTF JSON description of the asset being edited,
//! decoded into plain records that hold values and indices only. Facades
//! mutate these records in place so that re-serializing the document always
//! yields the current edits. Every record keeps members it does not model in
//! an `extra` map, which keeps the shape of the document intact across a
//! load/save cycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FacadeError;

/// Texture index written into a texture-info record that holds no texture.
pub const NO_TEXTURE: i64 = -1;

const GLB_MAGIC: &[u8; 4] = b"glTF";

/// The role a texture plays within a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureUsage {
    Base,
    Metallic,
    Normal,
    Occlusion,
    Emissive,
}

impl TextureUsage {
    pub const ALL: [TextureUsage; 5] = [
        TextureUsage::Base,
        TextureUsage::Metallic,
        TextureUsage::Normal,
        TextureUsage::Occlusion,
        TextureUsage::Emissive,
    ];

    /// The glTF member name of the slot, used in log output and JSON summaries.
    pub fn member_name(self) -> &'static str {
        match self {
            TextureUsage::Base => "baseColorTexture",
            TextureUsage::Metallic => "metallicRoughnessTexture",
            TextureUsage::Normal => "normalTexture",
            TextureUsage::Occlusion => "occlusionTexture",
            TextureUsage::Emissive => "emissiveTexture",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<TextureDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samplers: Vec<SamplerDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<MeshDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferViewDef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Binary chunk of a GLB container. Never serialized into the JSON.
    #[serde(skip)]
    bin: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbr_metallic_roughness: Option<PbrDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_texture: Option<TextureInfoDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occlusion_texture: Option<TextureInfoDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_texture: Option<TextureInfoDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_factor: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_mode: Option<AlphaMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_cutoff: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_sided: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MaterialDef {
    /// The texture-info record declared for `usage`, if any.
    pub fn slot(&self, usage: TextureUsage) -> Option<&TextureInfoDef> {
        match usage {
            TextureUsage::Base => self
                .pbr_metallic_roughness
                .as_ref()
                .and_then(|pbr| pbr.base_color_texture.as_ref()),
            TextureUsage::Metallic => self
                .pbr_metallic_roughness
                .as_ref()
                .and_then(|pbr| pbr.metallic_roughness_texture.as_ref()),
            TextureUsage::Normal => self.normal_texture.as_ref(),
            TextureUsage::Occlusion => self.occlusion_texture.as_ref(),
            TextureUsage::Emissive => self.emissive_texture.as_ref(),
        }
    }

    /// Mutable access to the record slot for `usage`. Base and metallic slots
    /// live in the PBR block, which is created on demand.
    pub fn slot_mut(&mut self, usage: TextureUsage) -> &mut Option<TextureInfoDef> {
        match usage {
            TextureUsage::Base => &mut self.pbr_mut().base_color_texture,
            TextureUsage::Metallic => &mut self.pbr_mut().metallic_roughness_texture,
            TextureUsage::Normal => &mut self.normal_texture,
            TextureUsage::Occlusion => &mut self.occlusion_texture,
            TextureUsage::Emissive => &mut self.emissive_texture,
        }
    }

    pub fn pbr_mut(&mut self) -> &mut PbrDef {
        self.pbr_metallic_roughness.get_or_insert_with(PbrDef::default)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color_factor: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metallic_factor: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness_factor: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<TextureInfoDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metallic_roughness_texture: Option<TextureInfoDef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A texture reference inside a material. `scale` only appears on normal
/// textures and `strength` only on occlusion textures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfoDef {
    pub index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tex_coord: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextureInfoDef {
    pub fn new(index: i64) -> Self {
        Self {
            index,
            tex_coord: None,
            scale: None,
            strength: None,
            extra: Map::new(),
        }
    }

    /// The referenced texture, or `None` for the [`NO_TEXTURE`] sentinel.
    pub fn texture_index(&self) -> Option<usize> {
        usize::try_from(self.index).ok()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filter and wrap values are the raw GL enums glTF stores.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplerDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag_filter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_filter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_s: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_t: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<PrimitiveDef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferViewDef {
    pub buffer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<usize>,
    pub byte_length: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SourceDocument {
    /// Parse either glTF JSON text or a binary GLB container.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FacadeError> {
        if bytes.starts_with(GLB_MAGIC) {
            let glb = gltf::Glb::from_slice(bytes)?;
            let mut document: SourceDocument = serde_json::from_slice(&glb.json)?;
            document.bin = glb.bin.map(|bin| bin.into_owned());
            Ok(document)
        } else {
            Ok(serde_json::from_slice(bytes)?)
        }
    }

    pub fn to_json(&self) -> Result<String, FacadeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, FacadeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The GLB binary chunk, if the document was read from a container.
    pub fn bin(&self) -> Option<&[u8]> {
        self.bin.as_deref()
    }

    /// Bytes of a buffer view that lives in the GLB binary chunk.
    ///
    /// Only buffer 0 can be resolved this way; external buffers are the
    /// business of whoever unpacks the container.
    pub fn buffer_view_bytes(&self, index: usize) -> Option<&[u8]> {
        let view = self.buffer_views.get(index)?;
        if view.buffer != 0 {
            return None;
        }
        let start = view.byte_offset.unwrap_or(0);
        let end = start.checked_add(view.byte_length)?;
        self.bin()?.get(start..end)
    }

    /// Indices of the materials referenced by mesh primitives, in draw order.
    /// A material used by several primitives appears once per primitive.
    pub fn primitive_materials(&self) -> impl Iterator<Item = usize> + '_ {
        self.meshes
            .iter()
            .flat_map(|mesh| mesh.primitives.iter())
            .filter_map(|primitive| primitive.material)
    }
}
