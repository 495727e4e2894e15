//! Core functionality for specimen fixture generation.
//!
//! This crate provides the building blocks for declarative synthetic
//! test data: templates, field generators, weighted sampling,
//! type-checked collections, and the range cache.

pub mod cache;
pub mod collection;
pub mod data;
pub mod error;
pub mod gen;
pub mod sampler;
pub mod template;

// Re-export the main types
pub use cache::*;
pub use collection::*;
pub use data::*;
pub use error::*;
pub use gen::*;
pub use sampler::*;
pub use template::*;
