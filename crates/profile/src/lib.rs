//! Rule profiles: the persisted form of the action table and the six rule lists.
//!
//! # Invariants
//! - A profile compiles only if every rule references registered actions,
//!   passes rule validation and is not a duplicate.
//! - Schema version mismatches fail closed.

mod document;
mod store;

pub use document::{
    CompiledProfile, PROFILE_SCHEMA_VERSION, ProfileDocument, RuleRecord, RulesProfile,
    partition_name,
};
pub use store::{ProfileError, ProfileFormat};

pub fn crate_info() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"))
}
