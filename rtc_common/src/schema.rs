//! Configuration record schemas.
//!
//! Each record deserializes with serde and carries a `validate()` for the
//! rules serde cannot express (ranges, identifier syntax, cross-field
//! constraints).

pub mod action;
pub mod i2c;
pub mod id;
pub mod period;
pub mod rx8025;
