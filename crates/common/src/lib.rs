//! Shared vocabulary: input actions, axis types, sources and typed axis values.
//!
//! # Invariants
//! - Two input actions are equal iff their ids match.
//! - Every `AxisValue` maps to exactly one rule-seeding axis type.

pub mod types;

pub use types::{ActionId, AxisType, AxisValue, Handedness, InputAction, Pose, SourceId};

pub fn crate_info() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
