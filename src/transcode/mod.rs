//! The flatten/reconstruct transcoder.
//!
//! Seeds are flattened into scalar leaves plus shape metadata, the metadata
//! of all seeds is merged into one [`CanonicalShape`], and flat tuples coming
//! back from the engine are rebuilt into structured arguments against it.

pub mod flatten;
pub mod normalize;
pub mod plan;
pub mod reconstruct;


pub use flatten::{flatten, flatten_args, Flattened};
pub use normalize::{sort_spans, CanonicalShape, ShapeBuilder};
pub use plan::{expand, plan, FlatParam, FlatSignature, ParamType};
pub use reconstruct::{Reconstructed, Reconstructor};
