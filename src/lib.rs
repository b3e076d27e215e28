//! scene-facade
//!
//! Editable, observable facades over the material graph of a glTF document.
//! One logical material of the document may be backed by several renderer
//! material instances; the facades apply every edit to all of them, keep the
//! source document in sync so edits can be saved, and notify the host through
//! an update callback so it can schedule a redraw.
//!
//! High-level modules
//! - `error`: caller-level errors
//! - `data_structures`: source document records, element ids, correlated fan-out, GPU textures
//! - `render`: the capability interface renderer materials implement
//! - `resources`: loading documents and images, and the headless renderer adapter
//! - `scene_graph`: the facades (`Model`, `Material`, `TextureInfo`, ...)
//!

pub mod data_structures;
pub mod error;
pub mod render;
pub mod resources;
pub mod scene_graph;

// Re-exports commonly used types for convenience in downstream code.
pub use data_structures::document::{AlphaMode, SourceDocument, TextureUsage};
pub use data_structures::element::OnUpdate;
pub use error::FacadeError;
pub use render::{Encoding, MapSlot, MaterialTarget, Side};
pub use scene_graph::{
    ConsistencyViolation, DEFAULT_ALPHA_CUTOFF, ElementId, FacadeElement, Image, Material, Model,
    OPAQUE_ALPHA_TEST, PbrMetallicRoughness, Sampler, Texture, TextureInfo, TextureRef,
};

/// Install the logger: `env_logger` natively, the browser console on wasm.
/// Safe to call more than once.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::debug!("Logger already initialized: {}", e);
        }
    }
}
