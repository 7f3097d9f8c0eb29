//! Repositories over the partition tables.

mod validator_event;

pub use validator_event::ValidatorEventRepository;
