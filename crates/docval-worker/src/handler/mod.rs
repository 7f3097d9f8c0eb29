//! Event handlers.
//!
//! [`ValidationWorker`] consumes inbound deliveries one at a time and drives
//! each through the validation pipeline.

mod outcome;
mod pipeline;

pub use outcome::Outcome;
pub use pipeline::{VALIDATED_MARKER_PREFIX, VALIDATED_MARKER_TTL, ValidationWorker};
