//! Fuzz target setup: seed registration and adapter installation.

use std::sync::Arc;

use crate::error::TranscodeError;
use crate::harness::engine::{Adapter, Engine, Ticket};
use crate::primitives::{ShapeNode, StructuredValue};
use crate::shaped::ArgList;
use crate::transcode::normalize::describe_params_mismatch;
use crate::transcode::{flatten_args, plan, CanonicalShape, ParamType, Reconstructor, ShapeBuilder};
use crate::types::ScalarValue;

/// Setup options for one fuzz target.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Reject seeds whose sequence lengths differ from the most recent seed
    /// instead of letting them desync when the engine replays them.
    pub strict_seeds: bool,
}

/// A fuzz target over structured arguments, layered on a scalar-only engine.
///
/// Seeds are flattened and handed to the engine as they are added; `fuzz`
/// freezes the collected shape metadata and installs the adapter.
#[derive(Debug)]
pub struct FuzzTarget<E: Engine> {
    engine: E,
    builder: ShapeBuilder,
    config: TargetConfig,
}

impl<E: Engine> FuzzTarget<E> {
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, TargetConfig::default())
    }

    pub fn with_config(engine: E, config: TargetConfig) -> Self {
        FuzzTarget { engine, builder: ShapeBuilder::new(), config }
    }

    /// Registers a typed seed.
    pub fn add<A: ArgList>(&mut self, seed: A) -> Result<(), TranscodeError> {
        self.add_values(&seed.to_values())
    }

    /// Registers a seed given as structured values, one per parameter.
    pub fn add_values(&mut self, seed: &[StructuredValue]) -> Result<(), TranscodeError> {
        let flattened = flatten_args(seed)?;
        self.builder.register(&flattened)?;
        tracing::debug!(
            seed = self.builder.seeds() - 1,
            leaves = flattened.leaves.len(),
            spans = ?flattened.spans,
            "registered seed"
        );
        self.engine.add_seed(flattened.leaves);
        Ok(())
    }

    /// Installs a typed test function and runs the engine.
    pub fn fuzz<A, F>(self, f: F) -> Result<E::Report, TranscodeError>
    where
        A: ArgList + 'static,
        F: Fn(&mut Ticket, A) + Send + Sync + 'static,
    {
        let declared: Vec<ParamType> = std::iter::once(ParamType::Context)
            .chain(A::param_shapes().into_iter().map(ParamType::Value))
            .collect();
        self.install(&declared, move |ticket: &mut Ticket, args: Vec<StructuredValue>| {
            match A::from_values(args) {
                Ok(args) => f(ticket, args),
                Err(err) => ticket.fatal(err),
            }
        })
    }

    /// Installs a test function over untyped structured arguments.
    /// `declared` must start with [`ParamType::Context`].
    pub fn fuzz_values<F>(self, declared: &[ParamType], f: F) -> Result<E::Report, TranscodeError>
    where
        F: Fn(&mut Ticket, Vec<StructuredValue>) + Send + Sync + 'static,
    {
        self.install(declared, f)
    }

    fn install<F>(self, declared: &[ParamType], f: F) -> Result<E::Report, TranscodeError>
    where
        F: Fn(&mut Ticket, Vec<StructuredValue>) + Send + Sync + 'static,
    {
        let planned = plan(declared)?;
        let shapes: Vec<ShapeNode> = declared
            .iter()
            .filter_map(|p| match p {
                ParamType::Value(shape) => Some(shape.clone()),
                ParamType::Context => None,
            })
            .collect();

        let canonical = if self.builder.is_empty() {
            CanonicalShape::from_declared(shapes)?
        } else {
            let seeded = self.builder.params().unwrap_or_default();
            if let Some(detail) = describe_params_mismatch(&shapes, seeded) {
                return Err(TranscodeError::ShapeMismatch(format!(
                    "seeds disagree with the declared parameters: {}",
                    detail
                )));
            }
            let stale = self.builder.stale_seeds();
            if self.config.strict_seeds && !stale.is_empty() {
                return Err(TranscodeError::ShapeMismatch(format!(
                    "seeds {:?} have sequence lengths that differ from the latest seed",
                    stale
                )));
            }
            self.builder.finish()?
        };

        let reconstructor = Arc::new(Reconstructor::new(canonical)?);
        let signature = reconstructor.signature();
        tracing::debug!(
            element_leaves = planned.arity(),
            arity = signature.arity(),
            spans = reconstructor.canonical().spans().len(),
            "installing adapter"
        );

        let adapter: Adapter = Arc::new(move |ticket: &mut Ticket, flat: &[ScalarValue]| {
            match reconstructor.reconstruct(flat) {
                Ok(rebuilt) => f(ticket, rebuilt.args),
                Err(err) => {
                    tracing::warn!(run = ticket.run(), error = %err, "aborting trial");
                    ticket.fatal(err);
                }
            }
        });
        self.engine.run(signature, adapter)
    }
}
