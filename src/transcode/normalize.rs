//! Merging seed shapes into one canonical shape.
//!
//! Every seed registered for a target must have the same structure; only leaf
//! values and sequence lengths may differ. The spans of the most recent seed
//! are authoritative and replace whatever earlier seeds recorded.

use crate::error::TranscodeError;
use crate::primitives::{ArraySpan, ShapeNode};
use crate::transcode::flatten::Flattened;

/// Read-only shape description of a target's whole parameter list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanonicalShape {
    params: Vec<ShapeNode>,
    spans: Vec<ArraySpan>,
}

impl CanonicalShape {
    /// Sorts and validates `spans` against nothing but themselves; arity is
    /// checked when a `Reconstructor` is built from the result.
    pub fn new(params: Vec<ShapeNode>, mut spans: Vec<ArraySpan>) -> Result<Self, TranscodeError> {
        sort_spans(&mut spans);
        validate_nesting(&spans)?;
        Ok(CanonicalShape { params, spans })
    }

    /// Canonical shape for a target registered without seeds. Only possible
    /// when no parameter contains a sequence, since lengths come from seeds.
    pub fn from_declared(params: Vec<ShapeNode>) -> Result<Self, TranscodeError> {
        if let Some(index) = params.iter().position(ShapeNode::contains_sequence) {
            return Err(TranscodeError::ShapeMismatch(format!(
                "parameter {} contains a sequence but no seed describes its length",
                index
            )));
        }
        Ok(CanonicalShape { params, spans: Vec::new() })
    }

    pub fn params(&self) -> &[ShapeNode] {
        &self.params
    }

    /// Spans ordered by `start` ascending, then `end` descending.
    pub fn spans(&self) -> &[ArraySpan] {
        &self.spans
    }

    pub fn to_json(&self) -> Result<String, TranscodeError> {
        serde_json::to_string_pretty(self).map_err(|e| TranscodeError::Encoding(e.to_string()))
    }

    /// Parses a canonical shape, re-applying span ordering and nesting checks.
    pub fn from_json(json: &str) -> Result<Self, TranscodeError> {
        let raw: CanonicalShape =
            serde_json::from_str(json).map_err(|e| TranscodeError::Encoding(e.to_string()))?;
        Self::new(raw.params, raw.spans)
    }
}

/// Sorts spans by `start` ascending; ties widest-first (`end` descending) so
/// an outer sequence precedes the sequences it contains. Remaining ties are
/// broken by pre-order `ordinal`.
pub fn sort_spans(spans: &mut [ArraySpan]) {
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.end.cmp(&a.end))
            .then(a.ordinal.cmp(&b.ordinal))
    });
}

// Non-degenerate spans must form a laminar family once sorted.
fn validate_nesting(sorted: &[ArraySpan]) -> Result<(), TranscodeError> {
    let mut open: Vec<&ArraySpan> = Vec::new();
    for span in sorted.iter().filter(|s| !s.is_degenerate()) {
        while open.last().is_some_and(|top| top.end < span.start) {
            open.pop();
        }
        if let Some(top) = open.last() {
            if !top.contains(span) {
                return Err(TranscodeError::ShapeMismatch(format!(
                    "span [{}, {}] partially overlaps span [{}, {}]",
                    span.start, span.end, top.start, top.end
                )));
            }
        }
        open.push(span);
    }
    Ok(())
}

/// Describes the first structural difference between two shapes, if any.
pub fn describe_mismatch(expected: &ShapeNode, found: &ShapeNode, path: &str) -> Option<String> {
    match (expected, found) {
        (ShapeNode::Scalar(a), ShapeNode::Scalar(b)) if a == b => None,
        (ShapeNode::Sequence(a), ShapeNode::Sequence(b)) => {
            describe_mismatch(a, b, &format!("{}[]", path))
        }
        (
            ShapeNode::Record { name: a_name, fields: a_fields },
            ShapeNode::Record { name: b_name, fields: b_fields },
        ) => {
            if a_name != b_name {
                return Some(format!("{}: record `{}` where `{}` was expected", path, b_name, a_name));
            }
            if a_fields.len() != b_fields.len() {
                return Some(format!(
                    "{}: record `{}` has {} fields, expected {}",
                    path,
                    a_name,
                    b_fields.len(),
                    a_fields.len()
                ));
            }
            a_fields.iter().zip(b_fields).find_map(|(a, b)| {
                let field_path = format!("{}.{}", path, a.name);
                if a.name != b.name || a.exported != b.exported {
                    Some(format!("{}: field `{}` where `{}` was expected", field_path, b.name, a.name))
                } else {
                    describe_mismatch(&a.shape, &b.shape, &field_path)
                }
            })
        }
        _ => Some(format!("{}: found {:?}, expected {:?}", path, found, expected)),
    }
}

/// Compares two parameter lists and reports the first difference.
pub fn describe_params_mismatch(expected: &[ShapeNode], found: &[ShapeNode]) -> Option<String> {
    if expected.len() != found.len() {
        return Some(format!("{} parameters, expected {}", found.len(), expected.len()));
    }
    expected
        .iter()
        .zip(found)
        .enumerate()
        .find_map(|(i, (a, b))| describe_mismatch(a, b, &format!("parameter {}", i)))
}

#[derive(Debug, Clone)]
struct SeedSummary {
    leaves: usize,
    spans: Vec<ArraySpan>,
}

/// Collects seed shapes, then yields one immutable [`CanonicalShape`].
#[derive(Debug, Default)]
pub struct ShapeBuilder {
    params: Option<Vec<ShapeNode>>,
    seeds: Vec<SeedSummary>,
}

impl ShapeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one flattened seed.
    pub fn register(&mut self, seed: &Flattened) -> Result<(), TranscodeError> {
        match &self.params {
            Some(params) => {
                if let Some(detail) = describe_params_mismatch(params, &seed.shapes) {
                    return Err(TranscodeError::ShapeMismatch(format!(
                        "seed {} disagrees with earlier seeds: {}",
                        self.seeds.len(),
                        detail
                    )));
                }
            }
            None => self.params = Some(seed.shapes.clone()),
        }

        if let Some(previous) = self.seeds.last() {
            if previous.spans != seed.spans {
                tracing::warn!(
                    seed = self.seeds.len(),
                    superseded = previous.spans.len(),
                    spans = seed.spans.len(),
                    "sequence spans superseded by newer seed"
                );
            }
        }
        self.seeds.push(SeedSummary { leaves: seed.leaves.len(), spans: seed.spans.clone() });
        Ok(())
    }

    pub fn seeds(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Parameter shapes shared by all registered seeds.
    pub fn params(&self) -> Option<&[ShapeNode]> {
        self.params.as_deref()
    }

    /// Indices of seeds whose sequence lengths differ from the most recent
    /// seed. Their flat tuples will not fit the canonical signature.
    pub fn stale_seeds(&self) -> Vec<usize> {
        let Some(latest) = self.seeds.last() else {
            return Vec::new();
        };
        self.seeds
            .iter()
            .enumerate()
            .filter(|(_, seed)| seed.spans != latest.spans)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn finish(self) -> Result<CanonicalShape, TranscodeError> {
        let stale = self.stale_seeds();
        let (Some(params), Some(latest)) = (self.params, self.seeds.last()) else {
            return Err(TranscodeError::ShapeMismatch("no seeds registered".into()));
        };
        for index in stale {
            tracing::warn!(
                seed = index,
                leaves = self.seeds[index].leaves,
                expected = latest.leaves,
                "seed sequence lengths differ from the latest seed; it will desync on replay"
            );
        }
        let shape = CanonicalShape::new(params, latest.spans.clone())?;
        tracing::debug!(
            params = shape.params.len(),
            spans = shape.spans.len(),
            seeds = self.seeds.len(),
            "canonical shape ready"
        );
        Ok(shape)
    }
}
