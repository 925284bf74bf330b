pub mod engine;
pub mod target;

// Re-export the primary types so callers can use `crate::harness::*`.
pub use engine::{Adapter, Engine, ReplayReport, SeedReplayEngine, Ticket, TrialOutcome};
pub use target::{FuzzTarget, TargetConfig};
