//! Error types for specimen fixture generation.

use crate::data::Kind;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for specimen operations.
#[derive(Error, Debug)]
pub enum SpecimenError {
    /// Field resolution re-entered a field still being resolved.
    #[error("circular dependency detected while resolving field '{field}'")]
    CircularDependency { field: String },

    /// Weight list and candidate list lengths differ.
    #[error("histogram has {weights} weights for {candidates} candidates")]
    HistogramMismatch { weights: usize, candidates: usize },

    /// A choice, cycle, or subset has nothing to draw from.
    #[error("cannot draw from an empty candidate list")]
    EmptyChoice,

    /// An appended element does not match the collection's descriptor.
    #[error("collection of {expected} cannot accept {found}")]
    KindMismatch { expected: Kind, found: Kind },

    /// A generator referenced a field the template never declared.
    #[error("unknown field '{field}' in template '{template}'")]
    UnknownField { field: String, template: String },

    /// A predicate query exhausted its retry budget.
    #[error("no element satisfied the predicate after {attempts} draws")]
    PredicateExhausted { attempts: usize },

    /// A file-backed generator could not read its source.
    #[error("failed to read fixture lines from {path:?}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for specimen operations.
pub type Result<T> = std::result::Result<T, SpecimenError>;
