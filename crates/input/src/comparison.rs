use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rule::RuleError;

/// How an observed scalar is compared against a rule's reference value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ComparisonOp {
    #[default]
    Equals = 0,
    LessThan = 1,
    LessThanOrEquals = 2,
    GreaterThan = 3,
    GreaterThanOrEquals = 4,
}

impl ComparisonOp {
    pub const ALL: [ComparisonOp; 5] = [
        ComparisonOp::Equals,
        ComparisonOp::LessThan,
        ComparisonOp::LessThanOrEquals,
        ComparisonOp::GreaterThan,
        ComparisonOp::GreaterThanOrEquals,
    ];

    pub fn is_equals(&self) -> bool {
        *self == ComparisonOp::Equals
    }

    /// Compare `observed` against `reference`.
    ///
    /// Equality is exact IEEE equality, no epsilon is applied.
    pub fn evaluate(self, observed: f32, reference: f32) -> bool {
        match self {
            ComparisonOp::Equals => observed == reference,
            ComparisonOp::LessThan => observed < reference,
            ComparisonOp::LessThanOrEquals => observed <= reference,
            ComparisonOp::GreaterThan => observed > reference,
            ComparisonOp::GreaterThanOrEquals => observed >= reference,
        }
    }
}

impl TryFrom<i32> for ComparisonOp {
    type Error = RuleError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|op| *op as i32 == raw)
            .ok_or_else(|| {
                RuleError::InvalidConfiguration(format!("comparison {raw} is not supported"))
            })
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOp::Equals => "==",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEquals => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEquals => ">=",
        };
        f.write_str(s)
    }
}
