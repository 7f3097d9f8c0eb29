use diesel::prelude::*;

use crate::schema::validator_events;

/// A stored document row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = validator_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ValidatorEvent {
    /// Document identifier
    pub key: String,
    /// Raw document bytes
    pub payload: Vec<u8>,
}

/// Data for inserting a document row.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = validator_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewValidatorEvent<'a> {
    /// Document identifier
    pub key: &'a str,
    /// Raw document bytes
    pub payload: &'a [u8],
}
