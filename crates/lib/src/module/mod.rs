//! Module and dependency edge model.
//!
//! A module is a named, independently compiled source partition. Its
//! dependency edges carry a [`Scope`] that decides where each dependency is
//! visible: compile time, run time, tests, or downstream consumers.

mod types;

pub use types::*;
