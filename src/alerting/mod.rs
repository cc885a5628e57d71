//! Alert evaluation engine: threshold registry, evaluator, lifecycle manager
//! and the storage seam they share.

pub mod evaluator;
pub mod lifecycle;
#[cfg(feature = "test-util")]
mod memory;
pub mod store;
pub mod thresholds;

pub use evaluator::{EvaluationOutcome, evaluate_reading, evaluate_reading_at};
pub use lifecycle::AlertDetails;
#[cfg(feature = "test-util")]
pub use memory::InMemoryStore;
pub use store::{AlertFilter, AlertStore, SeaOrmStore};
