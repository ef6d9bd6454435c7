//! Rule Authoring: per-session editing state for input action rules, undo/redo.
//!
//! # Invariants
//! - A rule is only added when its draft is valid and no equivalent rule exists.
//! - All authoring ops are reversible.
//! - Editing state lives in an explicit session value, never in globals.

pub mod editor;

pub use editor::{EditCommand, EditError, RuleEditor};

pub fn crate_info() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"))
}
