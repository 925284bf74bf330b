use crate::types::{ScalarType, ScalarValue};

// --- Values -----------------------------------------------------------------

/// One named field of a record value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Field {
    pub name: String,
    /// Whether the transcoder may read and write this field.
    pub exported: bool,
    pub value: StructuredValue,
}

impl Field {
    /// An exported field.
    pub fn new(name: impl Into<String>, value: StructuredValue) -> Self {
        Field { name: name.into(), exported: true, value }
    }
}

/// A structured argument value: a scalar, a record or a sequence.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StructuredValue {
    Scalar(ScalarValue),
    /// Fixed arity, field order fixed by the declared type.
    Record { name: String, fields: Vec<Field> },
    /// Variable length. `element` is carried so that an empty sequence still has a type.
    Sequence { element: ShapeNode, items: Vec<StructuredValue> },
}

impl StructuredValue {
    pub fn scalar(v: impl Into<ScalarValue>) -> Self {
        StructuredValue::Scalar(v.into())
    }

    pub fn record(name: impl Into<String>, fields: Vec<Field>) -> Self {
        StructuredValue::Record { name: name.into(), fields }
    }

    pub fn sequence(element: ShapeNode, items: Vec<StructuredValue>) -> Self {
        StructuredValue::Sequence { element, items }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            StructuredValue::Scalar(_) => "scalar",
            StructuredValue::Record { .. } => "record",
            StructuredValue::Sequence { .. } => "sequence",
        }
    }
}

impl From<ScalarValue> for StructuredValue {
    fn from(v: ScalarValue) -> Self {
        StructuredValue::Scalar(v)
    }
}

// --- Shapes -----------------------------------------------------------------

/// Type-level description of one record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FieldShape {
    pub name: String,
    pub exported: bool,
    pub shape: ShapeNode,
}

impl FieldShape {
    pub fn new(name: impl Into<String>, shape: ShapeNode) -> Self {
        FieldShape { name: name.into(), exported: true, shape }
    }
}

/// Type-level description of how a value decomposes into scalar leaves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ShapeNode {
    Scalar(ScalarType),
    Record { name: String, fields: Vec<FieldShape> },
    Sequence(Box<ShapeNode>),
}

impl ShapeNode {
    pub fn sequence(element: ShapeNode) -> Self {
        ShapeNode::Sequence(Box::new(element))
    }

    pub fn record(name: impl Into<String>, fields: Vec<FieldShape>) -> Self {
        ShapeNode::Record { name: name.into(), fields }
    }

    /// True if a sequence occurs anywhere below (or at) this node.
    pub fn contains_sequence(&self) -> bool {
        match self {
            ShapeNode::Scalar(_) => false,
            ShapeNode::Record { fields, .. } => fields.iter().any(|f| f.shape.contains_sequence()),
            ShapeNode::Sequence(_) => true,
        }
    }

    /// Number of leaves every value of this shape flattens to, or `None`
    /// when the count depends on sequence lengths.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            ShapeNode::Scalar(_) => Some(1),
            ShapeNode::Record { fields, .. } => {
                fields.iter().map(|f| f.shape.fixed_width()).sum()
            }
            ShapeNode::Sequence(_) => None,
        }
    }
}

// --- Array spans ------------------------------------------------------------

/// Where one sequence occurrence lives in a flat leaf tuple.
///
/// `start` and `end` are inclusive positions in the flat tuple of the whole
/// parameter list (context handle excluded). A sequence that contributes no
/// leaves is recorded with `end == start - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ArraySpan {
    pub start: isize,
    pub end: isize,
    /// Number of elements in the occurrence. Zero marks an empty sequence.
    pub elements: usize,
    /// Pre-order index of the occurrence within its parameter list.
    pub ordinal: usize,
}

impl ArraySpan {
    /// True when the span covers no leaves (`end < start`).
    pub fn is_degenerate(&self) -> bool {
        self.end < self.start
    }

    /// Number of leaves covered.
    pub fn width(&self) -> usize {
        if self.is_degenerate() {
            0
        } else {
            self.end.abs_diff(self.start).saturating_add(1)
        }
    }

    /// True if `inner` lies entirely within `self`. Degenerate spans are
    /// contained by any span whose range includes their start position.
    pub fn contains(&self, inner: &ArraySpan) -> bool {
        if inner.is_degenerate() {
            return self.start <= inner.start && inner.start <= self.end.saturating_add(1);
        }
        self.start <= inner.start && inner.end <= self.end
    }
}
