//! Common types shared across FormPilot crates.

mod field;

pub use field::*;
