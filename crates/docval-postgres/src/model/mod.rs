//! Database models for the `validator_events` table.

mod validator_event;

pub use validator_event::{NewValidatorEvent, ValidatorEvent};
