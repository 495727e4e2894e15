//! Specimen declarative fixture generation library.
//!
//! This is the main entry point for the specimen library, providing
//! a convenient API for generating synthetic test data in Rust.

pub use specimen_core::*;
