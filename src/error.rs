//! Errors surfaced to callers of the facade layer.
//!
//! Facades themselves trust the indices they were built with. Validation
//! happens one level up, in [`Model`](crate::scene_graph::Model) lookups and in
//! document parsing, and is reported through [`FacadeError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FacadeError {
    /// An index outside of a document collection was requested.
    #[error("{collection} index {index} is out of range (length {len})")]
    OutOfRange {
        collection: &'static str,
        index: usize,
        len: usize,
    },
    #[error("no material named {0:?}")]
    UnknownMaterial(String),
    #[error("malformed glTF JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed GLB container: {0}")]
    Glb(#[from] gltf::Error),
    #[error("image could not be encoded: {0}")]
    Image(#[from] image::ImageError),
}

impl FacadeError {
    pub(crate) fn out_of_range(collection: &'static str, index: usize, len: usize) -> Self {
        Self::OutOfRange {
            collection,
            index,
            len,
        }
    }
}
