//! Value-level flattening.
//!
//! Walks a [`StructuredValue`] depth-first and emits its scalar leaves in
//! declared order, the [`ShapeNode`] the value was built from, and one
//! [`ArraySpan`] per sequence occurrence. Spans are emitted in pre-order, so
//! an outer sequence always precedes the sequences nested inside it and
//! `spans[i].ordinal == i`.

use crate::error::TranscodeError;
use crate::primitives::{ArraySpan, FieldShape, ShapeNode, StructuredValue};
use crate::types::ScalarValue;

/// The flattened form of a whole parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened {
    /// Scalar leaves of all parameters, concatenated in parameter order.
    pub leaves: Vec<ScalarValue>,
    /// One shape per parameter.
    pub shapes: Vec<ShapeNode>,
    /// Sequence spans, positions relative to `leaves`.
    pub spans: Vec<ArraySpan>,
}

/// Flattens a single value.
pub fn flatten(
    value: &StructuredValue,
) -> Result<(Vec<ScalarValue>, ShapeNode, Vec<ArraySpan>), TranscodeError> {
    let mut flattener = Flattener::default();
    let shape = flattener.visit(value)?;
    Ok((flattener.leaves, shape, flattener.spans))
}

/// Flattens a parameter list. Sibling parameters share one leaf cursor, so
/// span positions are relative to the concatenated tuple.
pub fn flatten_args(values: &[StructuredValue]) -> Result<Flattened, TranscodeError> {
    let mut flattener = Flattener::default();
    let shapes = values
        .iter()
        .map(|value| flattener.visit(value))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Flattened { leaves: flattener.leaves, shapes, spans: flattener.spans })
}

#[derive(Debug, Default)]
struct Flattener {
    leaves: Vec<ScalarValue>,
    spans: Vec<ArraySpan>,
}

impl Flattener {
    fn visit(&mut self, value: &StructuredValue) -> Result<ShapeNode, TranscodeError> {
        match value {
            StructuredValue::Scalar(leaf) => {
                self.leaves.push(leaf.clone());
                Ok(ShapeNode::Scalar(leaf.scalar_type()))
            }
            StructuredValue::Record { name, fields } => {
                let mut shapes = Vec::with_capacity(fields.len());
                for field in fields {
                    if !field.exported {
                        return Err(TranscodeError::UnsupportedField {
                            record: name.clone(),
                            field: field.name.clone(),
                        });
                    }
                    let shape = self.visit(&field.value)?;
                    shapes.push(FieldShape { name: field.name.clone(), exported: true, shape });
                }
                Ok(ShapeNode::Record { name: name.clone(), fields: shapes })
            }
            StructuredValue::Sequence { element, items } => {
                // Reserve the slot before visiting the items so nested spans land after it.
                let ordinal = self.spans.len();
                let start = self.leaves.len() as isize;
                self.spans.push(ArraySpan { start, end: start - 1, elements: items.len(), ordinal });

                for (index, item) in items.iter().enumerate() {
                    let shape = self.visit(item)?;
                    if &shape != element {
                        return Err(TranscodeError::ShapeMismatch(format!(
                            "sequence item {} has shape {:?}, expected element shape {:?}",
                            index, shape, element
                        )));
                    }
                }

                self.spans[ordinal].end = self.leaves.len() as isize - 1;
                Ok(ShapeNode::Sequence(Box::new(element.clone())))
            }
        }
    }
}
