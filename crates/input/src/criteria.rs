use serde::{Deserialize, Serialize};

use crate::axis::AxisKind;
use crate::comparison::ComparisonOp;
use crate::rule::RuleError;

/// Decides whether a rule should raise for an observed base-action value.
///
/// Holds the reference value and, for single-axis criteria, the comparison
/// operator. Evaluation never mutates the evaluator; use
/// [`set_criteria`](Self::set_criteria) to change the reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriteriaEvaluator<T> {
    criteria: T,
    #[serde(default, skip_serializing_if = "ComparisonOp::is_equals")]
    comparison: ComparisonOp,
}

impl<T: AxisKind> CriteriaEvaluator<T> {
    /// Evaluator raising when the observed value equals `criteria`.
    pub fn new(criteria: T) -> Self {
        Self {
            criteria,
            comparison: ComparisonOp::Equals,
        }
    }

    /// Evaluator with an explicit comparison. Ordering comparisons are only
    /// accepted for single-axis criteria.
    pub fn compared(criteria: T, comparison: ComparisonOp) -> Result<Self, RuleError> {
        let evaluator = Self {
            criteria,
            comparison,
        };
        evaluator.validate()?;
        Ok(evaluator)
    }

    pub fn criteria(&self) -> T {
        self.criteria
    }

    pub fn comparison(&self) -> ComparisonOp {
        self.comparison
    }

    pub fn set_criteria(&mut self, criteria: T) {
        self.criteria = criteria;
    }

    pub fn should_raise(&self, observed: T) -> bool {
        T::compare(observed, self.criteria, self.comparison)
    }

    pub(crate) fn validate(&self) -> Result<(), RuleError> {
        if !T::ORDERED && !self.comparison.is_equals() {
            return Err(RuleError::UnsupportedComparison {
                axis: T::AXIS,
                comparison: self.comparison,
            });
        }
        Ok(())
    }
}

impl CriteriaEvaluator<f32> {
    pub fn with_comparison(criteria: f32, comparison: ComparisonOp) -> Self {
        Self {
            criteria,
            comparison,
        }
    }
}
