//!
//! Defines error types for the shape transcoder.

/// Errors raised while flattening, normalizing, planning or reconstructing.
///
/// The first three variants are setup-time errors: they indicate a fuzz target
/// that was declared incorrectly and abort setup. `ShapeDesync` is raised per
/// invocation and fails only the trial being replayed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscodeError {
    /// A record field is not visible to the transcoder.
    #[error("Field `{field}` of record `{record}` is not exported")]
    UnsupportedField { record: String, field: String },
    /// Seeds, or a seed and the declared parameter types, disagree on structure.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    /// The test function does not take the context handle first.
    #[error("Invalid fuzz function signature: {0}")]
    InvalidSignature(String),
    /// A flat tuple and the shape metadata disagree about arity or leaf kinds.
    #[error("Shape desync: {0}")]
    ShapeDesync(String),
    /// A canonical shape could not be encoded or decoded.
    #[error("Canonical shape encoding failed: {0}")]
    Encoding(String),
}

impl TranscodeError {
    /// True for errors that may only occur while replaying a single input.
    pub fn is_per_invocation(&self) -> bool {
        matches!(self, TranscodeError::ShapeDesync(_))
    }
}
