//! Structured logging vocabulary shared by every layer.
//!
//! Library code emits `tracing` events keyed by the constants in [`events`] and the
//! field names in [`fields`]. It never installs a global subscriber.

pub mod events;
pub mod fields;
