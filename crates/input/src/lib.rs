//! Input action rules: derive new actions from base-action values.
//!
//! A rule observes a base action and raises its rule action whenever the
//! observed value satisfies the rule's criteria.
//!
//! # Invariants
//! - Digital rule actions are raised and released strictly alternately per
//!   source, hand and action, starting with a raise.
//! - Continuous rule actions are re-raised on every update that satisfies the
//!   criteria and are never released.
//! - Criteria evaluation has no side effects.
//! - Only validated, non-duplicate rules reach the engine.

pub mod axis;
pub mod cache;
pub mod comparison;
pub mod criteria;
pub mod engine;
pub mod registry;
pub mod rule;
pub mod rule_set;

pub use axis::AxisKind;
pub use cache::{DigitalActionRaiseCache, RaiseCacheEntry};
pub use comparison::ComparisonOp;
pub use criteria::CriteriaEvaluator;
pub use engine::{ActionSink, RuleEngine, RuleEvent};
pub use registry::ActionRegistry;
pub use rule::{ActionRule, AnyRule, RuleError};
pub use rule_set::{RulePartition, RuleSet};

pub fn crate_info() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"))
}
