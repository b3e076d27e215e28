//! Core data types of the facade layer.
//!
//! - `document` holds the serializable source document and its records
//! - `element` provides element ids and the common facade surface
//! - `correlated` fans one mutation out to several renderer objects
//! - `texture` contains the GPU texture wrapper and sampler translation

pub mod correlated;
pub mod document;
pub mod element;
pub mod texture;
