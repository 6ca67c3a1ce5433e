//! Ageing pipeline: date coercion, sheet flattening, ageing and slab annotation

pub mod dates;
pub mod slab;
pub mod transformer;

pub use slab::{Slab, SlabRule, SLAB_RULES};
pub use transformer::{AgeingTransformer, DateParseWarning, RunOutcome};
