#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! fuzz-shape lets a scalar-only, corpus-driven fuzz engine drive test
//! functions whose parameters are records and variable-length sequences.
//!
//! Seed values are flattened into scalar tuples plus shape metadata; the
//! metadata of all seeds is merged into one canonical shape; and every flat
//! tuple the engine replays or mutates is reconstructed against it before the
//! real test function runs.
//!
//! ```
//! use fuzz_shape::harness::{FuzzTarget, SeedReplayEngine, Ticket};
//! use fuzz_shape::shaped_record;
//!
//! shaped_record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Pair {
//!         pub first: i64,
//!         pub second: String,
//!     }
//! }
//!
//! let mut target = FuzzTarget::new(SeedReplayEngine::new());
//! target.add((Pair { first: 1, second: "hallo".into() },)).unwrap();
//! let report = target
//!     .fuzz(|t: &mut Ticket, (pair,): (Pair,)| {
//!         if pair.second.is_empty() {
//!             t.error("empty text");
//!         }
//!     })
//!     .unwrap();
//! assert_eq!(report.failures().count(), 0);
//! ```

// Scalar leaf kinds and values.
pub mod types;

// Value trees, shape trees and array spans.
pub mod primitives;

// Re-export all core primitives for easier access at the crate root.
pub use primitives::*;

pub mod error;

// Rust type <-> shape binding, including the `shaped_record!` macro.
pub mod shaped;

// Flattener, normalizer, planner and reconstructor.
pub mod transcode;

// Engine boundary and fuzz target setup.
pub mod harness;

#[cfg(feature = "test-utils")]
pub mod testing;

pub use error::TranscodeError;
pub use shaped::{ArgList, Shaped};
pub use types::{ScalarType, ScalarValue};
