//! Engine abstraction.
//!
//! An `Engine` is the scalar-only fuzzing collaborator: it stores flat seed
//! tuples, and once a target is installed it invokes the adapter with one flat
//! tuple per trial. Mutation, scheduling and corpus persistence are entirely
//! the engine's business.
//!
//! `SeedReplayEngine` replays seeds and queued inputs in order. It is what the
//! crate's own tests run against, and a template for binding a real engine.

use std::sync::Arc;

use crate::error::TranscodeError;
use crate::transcode::FlatSignature;
use crate::types::ScalarValue;

/// Per-trial context handle. Always the first parameter of a test function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ticket {
    run: u64,
    failures: Vec<String>,
    desync: Option<TranscodeError>,
}

impl Ticket {
    pub fn new(run: u64) -> Self {
        Ticket { run, failures: Vec::new(), desync: None }
    }

    /// Index of the trial this ticket belongs to.
    pub fn run(&self) -> u64 {
        self.run
    }

    /// Records a failed assertion. The trial continues.
    pub fn error(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
    }

    /// Records a transcoding failure. The adapter returns without calling the
    /// test function.
    pub fn fatal(&mut self, err: TranscodeError) {
        self.failures.push(err.to_string());
        self.desync = Some(err);
    }

    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn desync(&self) -> Option<&TranscodeError> {
        self.desync.as_ref()
    }
}

/// The scalar-typed callable installed into an engine.
pub type Adapter = Arc<dyn Fn(&mut Ticket, &[ScalarValue]) + Send + Sync>;

/// Trait implemented by scalar-only fuzz engines.
pub trait Engine {
    type Report;

    /// Stores one flat seed tuple.
    fn add_seed(&mut self, seed: Vec<ScalarValue>);

    /// Installs `adapter` under `signature` and drives it to completion.
    fn run(self, signature: FlatSignature, adapter: Adapter) -> Result<Self::Report, TranscodeError>;
}

/// Result of one adapter invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub run: u64,
    pub input: Vec<ScalarValue>,
    pub failures: Vec<String>,
    pub desync: Option<TranscodeError>,
}

impl TrialOutcome {
    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub signature: FlatSignature,
    pub outcomes: Vec<TrialOutcome>,
}

impl ReplayReport {
    pub fn runs(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TrialOutcome> {
        self.outcomes.iter().filter(|o| o.failed())
    }

    pub fn desyncs(&self) -> impl Iterator<Item = &TrialOutcome> {
        self.outcomes.iter().filter(|o| o.desync.is_some())
    }
}

/// Replays every seed, then every queued input, once each.
#[derive(Debug, Clone, Default)]
pub struct SeedReplayEngine {
    seeds: Vec<Vec<ScalarValue>>,
    inputs: Vec<Vec<ScalarValue>>,
}

impl SeedReplayEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an input as if the engine had produced it by mutation.
    pub fn with_input(mut self, input: Vec<ScalarValue>) -> Self {
        self.inputs.push(input);
        self
    }
}

impl Engine for SeedReplayEngine {
    type Report = ReplayReport;

    fn add_seed(&mut self, seed: Vec<ScalarValue>) {
        self.seeds.push(seed);
    }

    fn run(self, signature: FlatSignature, adapter: Adapter) -> Result<ReplayReport, TranscodeError> {
        tracing::debug!(
            seeds = self.seeds.len(),
            inputs = self.inputs.len(),
            arity = signature.arity(),
            "replaying corpus"
        );
        let outcomes = self
            .seeds
            .into_iter()
            .chain(self.inputs)
            .enumerate()
            .map(|(run, input)| {
                let mut ticket = Ticket::new(run as u64);
                adapter(&mut ticket, &input);
                TrialOutcome {
                    run: run as u64,
                    input,
                    failures: ticket.failures,
                    desync: ticket.desync,
                }
            })
            .collect();
        Ok(ReplayReport { signature, outcomes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarType;

    #[test]
    fn test_ticket_records_failures() {
        let mut ticket = Ticket::new(3);
        assert!(!ticket.failed());
        ticket.error("odd number");
        assert!(ticket.failed());
        assert!(ticket.desync().is_none());
        ticket.fatal(TranscodeError::ShapeDesync("short tuple".into()));
        assert_eq!(ticket.failures().len(), 2);
        assert_eq!(ticket.desync(), Some(&TranscodeError::ShapeDesync("short tuple".into())));
        assert_eq!(ticket.run(), 3);
    }

    #[test]
    fn test_replay_order_is_seeds_then_inputs() {
        let mut engine = SeedReplayEngine::new().with_input(vec![ScalarValue::I64(3)]);
        engine.add_seed(vec![ScalarValue::I64(1)]);
        engine.add_seed(vec![ScalarValue::I64(2)]);

        let adapter: Adapter = Arc::new(|ticket: &mut Ticket, flat: &[ScalarValue]| {
            if flat != [ScalarValue::I64(2)] {
                ticket.error(format!("run {} saw {:?}", ticket.run(), flat));
            }
        });
        let report = engine.run(FlatSignature::with_scalars([ScalarType::I64]), adapter).unwrap();

        assert_eq!(report.runs(), 3);
        let inputs: Vec<_> = report.outcomes.iter().map(|o| o.input.clone()).collect();
        assert_eq!(inputs, vec![vec![ScalarValue::I64(1)], vec![ScalarValue::I64(2)], vec![ScalarValue::I64(3)]]);
        let failed: Vec<u64> = report.failures().map(|o| o.run).collect();
        assert_eq!(failed, vec![0, 2]);
        assert_eq!(report.desyncs().count(), 0);
    }
}
