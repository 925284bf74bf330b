//! Rebuilding structured arguments from flat engine tuples.
//!
//! A single cursor walks the flat tuple across all parameters, so sibling
//! parameters consume disjoint, contiguous ranges in declared order. Each
//! sequence occurrence takes the next span in pre-order (outer before inner)
//! and reconstructs as many elements as the span records.

use crate::error::TranscodeError;
use crate::primitives::{ArraySpan, Field, ShapeNode, StructuredValue};
use crate::transcode::normalize::CanonicalShape;
use crate::transcode::plan::FlatSignature;
use crate::types::{ScalarType, ScalarValue};

/// A reconstructed argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstructed {
    pub args: Vec<StructuredValue>,
    /// Number of flat values consumed. Always the full tuple on success.
    pub consumed: usize,
}

/// Immutable decoder for one target. Safe to share across worker threads.
#[derive(Debug, Clone)]
pub struct Reconstructor {
    shape: CanonicalShape,
    // Spans indexed by ordinal, i.e. in the order sequences are encountered.
    by_ordinal: Vec<ArraySpan>,
    layout: Vec<ScalarType>,
}

struct Cursor<'a> {
    flat: &'a [ScalarValue],
    pos: usize,
    next_span: usize,
}

impl Reconstructor {
    /// Validates that the spans of `shape` describe its parameters exactly
    /// and precomputes the flat leaf layout.
    pub fn new(shape: CanonicalShape) -> Result<Self, TranscodeError> {
        let count = shape.spans().len();
        let mut slots: Vec<Option<ArraySpan>> = vec![None; count];
        for span in shape.spans() {
            let slot = slots.get_mut(span.ordinal).ok_or_else(|| {
                TranscodeError::ShapeMismatch(format!(
                    "span ordinal {} out of range for {} spans",
                    span.ordinal, count
                ))
            })?;
            if slot.is_some() {
                return Err(TranscodeError::ShapeMismatch(format!(
                    "duplicate span ordinal {}",
                    span.ordinal
                )));
            }
            *slot = Some(*span);
        }
        let by_ordinal: Vec<ArraySpan> = slots.into_iter().flatten().collect();

        let mut reconstructor = Reconstructor { shape, by_ordinal, layout: Vec::new() };
        reconstructor.layout = reconstructor.compute_layout()?;
        Ok(reconstructor)
    }

    pub fn canonical(&self) -> &CanonicalShape {
        &self.shape
    }

    /// Number of flat values one reconstruction consumes.
    pub fn arity(&self) -> usize {
        self.layout.len()
    }

    /// The flat signature the engine must be configured with.
    pub fn signature(&self) -> FlatSignature {
        FlatSignature::with_scalars(self.layout.iter().copied())
    }

    /// Rebuilds the structured argument list from one flat tuple.
    pub fn reconstruct(&self, flat: &[ScalarValue]) -> Result<Reconstructed, TranscodeError> {
        let mut cursor = Cursor { flat, pos: 0, next_span: 0 };
        let args = self
            .shape
            .params()
            .iter()
            .map(|param| self.rebuild(param, &mut cursor))
            .collect::<Result<Vec<_>, _>>()?;

        if cursor.pos != flat.len() {
            return Err(TranscodeError::ShapeDesync(format!(
                "consumed {} of {} flat values",
                cursor.pos,
                flat.len()
            )));
        }
        if cursor.next_span != self.by_ordinal.len() {
            return Err(TranscodeError::ShapeDesync(format!(
                "consumed {} of {} spans",
                cursor.next_span,
                self.by_ordinal.len()
            )));
        }
        tracing::trace!(consumed = cursor.pos, params = args.len(), "reconstructed arguments");
        Ok(Reconstructed { args, consumed: cursor.pos })
    }

    fn rebuild(&self, node: &ShapeNode, cursor: &mut Cursor<'_>) -> Result<StructuredValue, TranscodeError> {
        match node {
            ShapeNode::Scalar(expected) => {
                let value = cursor.flat.get(cursor.pos).ok_or_else(|| {
                    TranscodeError::ShapeDesync(format!(
                        "flat tuple of {} values ended before leaf {}",
                        cursor.flat.len(),
                        cursor.pos
                    ))
                })?;
                if value.scalar_type() != *expected {
                    return Err(TranscodeError::ShapeDesync(format!(
                        "leaf {} is {:?}, expected {:?}",
                        cursor.pos,
                        value.scalar_type(),
                        expected
                    )));
                }
                cursor.pos += 1;
                Ok(StructuredValue::Scalar(value.clone()))
            }
            ShapeNode::Record { name, fields } => {
                let fields = fields
                    .iter()
                    .map(|field| {
                        Ok(Field {
                            name: field.name.clone(),
                            exported: field.exported,
                            value: self.rebuild(&field.shape, cursor)?,
                        })
                    })
                    .collect::<Result<Vec<_>, TranscodeError>>()?;
                Ok(StructuredValue::Record { name: name.clone(), fields })
            }
            ShapeNode::Sequence(element) => {
                let span = self.take_span(cursor.next_span, cursor.pos)?;
                cursor.next_span += 1;

                let mut items = Vec::with_capacity(span.elements.min(span.width()));
                for _ in 0..span.elements {
                    items.push(self.rebuild(element, cursor)?);
                }
                if last_leaf(cursor.pos) != span.end {
                    return Err(TranscodeError::ShapeDesync(format!(
                        "sequence span [{}, {}] ended at leaf {}",
                        span.start, span.end, cursor.pos
                    )));
                }
                Ok(StructuredValue::Sequence { element: (**element).clone(), items })
            }
        }
    }

    fn take_span(&self, ordinal: usize, pos: usize) -> Result<ArraySpan, TranscodeError> {
        let span = self.by_ordinal.get(ordinal).copied().ok_or_else(|| {
            TranscodeError::ShapeDesync(format!("no span recorded for sequence occurrence {}", ordinal))
        })?;
        if span.start != pos as isize {
            return Err(TranscodeError::ShapeDesync(format!(
                "sequence occurrence {} starts at leaf {}, span records {}",
                ordinal, pos, span.start
            )));
        }
        Ok(span)
    }

    // Walks the shape without values to find the kind of every leaf position.
    // Any disagreement here is a setup-time error, not a desync.
    fn compute_layout(&self) -> Result<Vec<ScalarType>, TranscodeError> {
        let mut layout = Vec::new();
        let mut next_span = 0;
        for param in self.shape.params() {
            self.layout_of(param, &mut next_span, &mut layout)?;
        }
        if next_span != self.by_ordinal.len() {
            return Err(TranscodeError::ShapeMismatch(format!(
                "{} spans recorded but parameters contain {} sequence occurrences",
                self.by_ordinal.len(),
                next_span
            )));
        }
        Ok(layout)
    }

    fn layout_of(
        &self,
        node: &ShapeNode,
        next_span: &mut usize,
        layout: &mut Vec<ScalarType>,
    ) -> Result<(), TranscodeError> {
        match node {
            ShapeNode::Scalar(ty) => layout.push(*ty),
            ShapeNode::Record { fields, .. } => {
                for field in fields {
                    self.layout_of(&field.shape, next_span, layout)?;
                }
            }
            ShapeNode::Sequence(element) => {
                let span = self
                    .take_span(*next_span, layout.len())
                    .map_err(|e| TranscodeError::ShapeMismatch(e.to_string()))?;
                *next_span += 1;
                let mismatch = || {
                    TranscodeError::ShapeMismatch(format!(
                        "sequence span [{}, {}] does not match its {} elements",
                        span.start, span.end, span.elements
                    ))
                };
                // Elements without leaves or sequences leave no trace in the layout.
                if element.fixed_width() != Some(0) {
                    for _ in 0..span.elements {
                        self.layout_of(element, next_span, layout)?;
                        if last_leaf(layout.len()) > span.end {
                            return Err(mismatch());
                        }
                    }
                }
                if last_leaf(layout.len()) != span.end {
                    return Err(mismatch());
                }
            }
        }
        Ok(())
    }
}

// Position of the last leaf written once `len` leaves exist; -1 when none.
fn last_leaf(len: usize) -> isize {
    len as isize - 1
}
