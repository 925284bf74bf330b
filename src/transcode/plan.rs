//! Type-level planning of the flat scalar signature.

use crate::error::TranscodeError;
use crate::primitives::ShapeNode;
use crate::transcode::normalize::CanonicalShape;
use crate::transcode::reconstruct::Reconstructor;
use crate::types::{ScalarType, ScalarValue};

/// One declared parameter of a structured test function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// The per-run context handle (a [`Ticket`](crate::harness::Ticket)).
    Context,
    Value(ShapeNode),
}

/// One parameter of the flat, engine-facing signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlatParam {
    Context,
    Scalar(ScalarType),
}

/// A flat signature: the context handle at position 0, scalars after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatSignature(Vec<FlatParam>);

impl FlatSignature {
    pub(crate) fn with_scalars(scalars: impl IntoIterator<Item = ScalarType>) -> Self {
        FlatSignature(
            std::iter::once(FlatParam::Context)
                .chain(scalars.into_iter().map(FlatParam::Scalar))
                .collect(),
        )
    }

    pub fn params(&self) -> &[FlatParam] {
        &self.0
    }

    /// Scalar kinds after the context handle.
    pub fn scalar_types(&self) -> impl Iterator<Item = ScalarType> + '_ {
        self.0.iter().filter_map(|p| match p {
            FlatParam::Scalar(ty) => Some(*ty),
            FlatParam::Context => None,
        })
    }

    /// Number of scalar leaves a tuple for this signature carries.
    pub fn arity(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// True if `tuple` has exactly this signature's scalar kinds.
    pub fn accepts(&self, tuple: &[ScalarValue]) -> bool {
        tuple.len() == self.arity()
            && self.scalar_types().zip(tuple).all(|(ty, v)| v.scalar_type() == ty)
    }
}

/// Derives the flat scalar signature of a declared parameter list.
///
/// Sequence layers are stripped at any depth and records are flattened in
/// declared field order, so the result lists each distinct leaf position of
/// one element, without sequence lengths.
pub fn plan(declared: &[ParamType]) -> Result<FlatSignature, TranscodeError> {
    match declared.first() {
        None => {
            return Err(TranscodeError::InvalidSignature(
                "function takes no parameters; expected the context handle first".into(),
            ))
        }
        Some(ParamType::Value(shape)) => {
            return Err(TranscodeError::InvalidSignature(format!(
                "first parameter is {:?}, expected the context handle",
                shape
            )))
        }
        Some(ParamType::Context) => {}
    }

    let mut scalars = Vec::new();
    for (index, param) in declared.iter().enumerate().skip(1) {
        match param {
            ParamType::Context => {
                return Err(TranscodeError::InvalidSignature(format!(
                    "context handle at position {}; only position 0 may take it",
                    index
                )))
            }
            ParamType::Value(shape) => element_types(shape, &mut scalars)?,
        }
    }
    Ok(FlatSignature::with_scalars(scalars))
}

/// The exact signature the engine is configured with once sequence lengths
/// are known: each sequence contributes its element's leaves once per element.
pub fn expand(canonical: &CanonicalShape) -> Result<FlatSignature, TranscodeError> {
    Ok(Reconstructor::new(canonical.clone())?.signature())
}

fn element_types(shape: &ShapeNode, out: &mut Vec<ScalarType>) -> Result<(), TranscodeError> {
    match shape {
        ShapeNode::Sequence(element) => element_types(element, out)?,
        ShapeNode::Scalar(ty) => out.push(*ty),
        ShapeNode::Record { name, fields } => {
            for field in fields {
                if !field.exported {
                    return Err(TranscodeError::UnsupportedField {
                        record: name.clone(),
                        field: field.name.clone(),
                    });
                }
                element_types(&field.shape, out)?;
            }
        }
    }
    Ok(())
}
