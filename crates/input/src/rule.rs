use actionrule_common::{ActionId, AxisType, AxisValue, InputAction, Pose};
use glam::{Quat, Vec2, Vec3};

use crate::axis::AxisKind;
use crate::comparison::ComparisonOp;
use crate::criteria::CriteriaEvaluator;

/// Errors from rule construction, validation and lookup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("rule for {0} raises its own base action")]
    SelfReferential(ActionId),
    #[error("action {action} has axis {axis} which cannot seed rules")]
    UnsupportedBaseAxis { action: ActionId, axis: AxisType },
    #[error("action {action} has axis {actual}, expected {expected}")]
    AxisMismatch {
        action: ActionId,
        expected: AxisType,
        actual: AxisType,
    },
    #[error("rule action {rule_action} ({rule_axis}) cannot be raised from a {base_axis} base")]
    IncompatibleRuleAction {
        base_axis: AxisType,
        rule_action: ActionId,
        rule_axis: AxisType,
    },
    #[error("comparison {comparison} is not supported on {axis} criteria")]
    UnsupportedComparison {
        axis: AxisType,
        comparison: ComparisonOp,
    },
    #[error("a rule raising {rule} from {base} with the same criteria already exists")]
    RuleExists { base: ActionId, rule: ActionId },
    #[error("no {axis} rule at index {index}")]
    IndexOutOfRange { axis: AxisType, index: usize },
    #[error("action {0} is not registered")]
    UnknownAction(ActionId),
    #[error("action {0} is already registered")]
    DuplicateAction(ActionId),
}

/// Binds a base action to a derived (rule) action through a criteria.
///
/// Immutable once built; only authoring tooling replaces rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRule<T> {
    base_action: InputAction,
    rule_action: InputAction,
    criteria: T,
    use_criteria_rule: bool,
    criteria_rule: CriteriaEvaluator<T>,
}

impl<T: AxisKind> ActionRule<T> {
    /// Rule raising `rule_action` whenever `base_action` equals `criteria`.
    pub fn new(
        base_action: InputAction,
        rule_action: InputAction,
        criteria: T,
    ) -> Result<Self, RuleError> {
        Self::from_parts(
            base_action,
            rule_action,
            criteria,
            false,
            CriteriaEvaluator::new(criteria),
        )
    }

    /// Rule delegating the raise decision to `criteria_rule`.
    pub fn with_criteria_rule(
        base_action: InputAction,
        rule_action: InputAction,
        criteria_rule: CriteriaEvaluator<T>,
    ) -> Result<Self, RuleError> {
        Self::from_parts(
            base_action,
            rule_action,
            criteria_rule.criteria(),
            true,
            criteria_rule,
        )
    }

    pub fn from_parts(
        base_action: InputAction,
        rule_action: InputAction,
        criteria: T,
        use_criteria_rule: bool,
        criteria_rule: CriteriaEvaluator<T>,
    ) -> Result<Self, RuleError> {
        let rule = Self {
            base_action,
            rule_action,
            criteria,
            use_criteria_rule,
            criteria_rule,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn base_action(&self) -> &InputAction {
        &self.base_action
    }

    pub fn rule_action(&self) -> &InputAction {
        &self.rule_action
    }

    pub fn criteria(&self) -> T {
        self.criteria
    }

    pub fn use_criteria_rule(&self) -> bool {
        self.use_criteria_rule
    }

    pub fn criteria_rule(&self) -> &CriteriaEvaluator<T> {
        &self.criteria_rule
    }

    /// Whether the rule action should be raised for an observed base value.
    pub fn should_raise(&self, observed: T) -> bool {
        if self.use_criteria_rule {
            self.criteria_rule.should_raise(observed)
        } else {
            observed == self.criteria
        }
    }

    /// Whether `other` would be rejected as a duplicate of this rule: same
    /// base and rule action, and the same effective criteria.
    pub fn same_definition(&self, other: &Self) -> bool {
        self.base_action == other.base_action
            && self.rule_action == other.rule_action
            && self.use_criteria_rule == other.use_criteria_rule
            && if self.use_criteria_rule {
                self.criteria_rule == other.criteria_rule
            } else {
                self.criteria == other.criteria
            }
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        let base_axis = self.base_action.axis_constraint;
        if !base_axis.can_seed_rules() {
            return Err(RuleError::UnsupportedBaseAxis {
                action: self.base_action.id,
                axis: base_axis,
            });
        }
        if base_axis != T::AXIS {
            return Err(RuleError::AxisMismatch {
                action: self.base_action.id,
                expected: T::AXIS,
                actual: base_axis,
            });
        }
        if self.base_action == self.rule_action {
            return Err(RuleError::SelfReferential(self.base_action.id));
        }
        if self.rule_action.id.is_none()
            || !self
                .rule_action
                .axis_constraint
                .is_compatible_rule_axis(base_axis)
        {
            return Err(RuleError::IncompatibleRuleAction {
                base_axis,
                rule_action: self.rule_action.id,
                rule_axis: self.rule_action.axis_constraint,
            });
        }
        self.criteria_rule.validate()
    }
}

/// A rule of any of the six axis kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyRule {
    Digital(ActionRule<bool>),
    SingleAxis(ActionRule<f32>),
    DualAxis(ActionRule<Vec2>),
    Position(ActionRule<Vec3>),
    Rotation(ActionRule<Quat>),
    Pose(ActionRule<Pose>),
}

macro_rules! with_rule {
    ($any:expr, $rule:ident => $body:expr) => {
        match $any {
            AnyRule::Digital($rule) => $body,
            AnyRule::SingleAxis($rule) => $body,
            AnyRule::DualAxis($rule) => $body,
            AnyRule::Position($rule) => $body,
            AnyRule::Rotation($rule) => $body,
            AnyRule::Pose($rule) => $body,
        }
    };
}

pub(crate) use with_rule;

impl AnyRule {
    /// Build a rule from untyped parts, dispatching on the base action's axis.
    ///
    /// `criteria_rule` and `comparison` configure the criteria evaluator; a
    /// comparison other than `Equals` is only valid for single-axis rules.
    pub fn from_parts(
        base_action: InputAction,
        rule_action: InputAction,
        criteria: AxisValue,
        use_criteria_rule: bool,
        criteria_rule: AxisValue,
        comparison: ComparisonOp,
    ) -> Result<Self, RuleError> {
        fn build<T: AxisKind>(
            base_action: InputAction,
            rule_action: InputAction,
            criteria: AxisValue,
            use_criteria_rule: bool,
            criteria_rule: AxisValue,
            comparison: ComparisonOp,
        ) -> Result<AnyRule, RuleError> {
            let base_id = base_action.id;
            let typed = |value: AxisValue| {
                T::from_value(&value).ok_or(RuleError::AxisMismatch {
                    action: base_id,
                    expected: T::AXIS,
                    actual: value.axis_type(),
                })
            };
            let criteria = typed(criteria)?;
            let evaluator = CriteriaEvaluator::compared(typed(criteria_rule)?, comparison)?;
            ActionRule::from_parts(
                base_action,
                rule_action,
                criteria,
                use_criteria_rule,
                evaluator,
            )
            .map(T::into_any)
        }

        let axis = base_action.axis_constraint;
        match axis {
            AxisType::Digital => build::<bool>(
                base_action,
                rule_action,
                criteria,
                use_criteria_rule,
                criteria_rule,
                comparison,
            ),
            AxisType::SingleAxis => build::<f32>(
                base_action,
                rule_action,
                criteria,
                use_criteria_rule,
                criteria_rule,
                comparison,
            ),
            AxisType::DualAxis => build::<Vec2>(
                base_action,
                rule_action,
                criteria,
                use_criteria_rule,
                criteria_rule,
                comparison,
            ),
            AxisType::ThreeDofPosition => build::<Vec3>(
                base_action,
                rule_action,
                criteria,
                use_criteria_rule,
                criteria_rule,
                comparison,
            ),
            AxisType::ThreeDofRotation => build::<Quat>(
                base_action,
                rule_action,
                criteria,
                use_criteria_rule,
                criteria_rule,
                comparison,
            ),
            AxisType::SixDof => build::<Pose>(
                base_action,
                rule_action,
                criteria,
                use_criteria_rule,
                criteria_rule,
                comparison,
            ),
            AxisType::None | AxisType::Raw => Err(RuleError::UnsupportedBaseAxis {
                action: base_action.id,
                axis,
            }),
        }
    }

    pub fn axis_type(&self) -> AxisType {
        match self {
            AnyRule::Digital(_) => AxisType::Digital,
            AnyRule::SingleAxis(_) => AxisType::SingleAxis,
            AnyRule::DualAxis(_) => AxisType::DualAxis,
            AnyRule::Position(_) => AxisType::ThreeDofPosition,
            AnyRule::Rotation(_) => AxisType::ThreeDofRotation,
            AnyRule::Pose(_) => AxisType::SixDof,
        }
    }

    pub fn base_action(&self) -> &InputAction {
        with_rule!(self, rule => rule.base_action())
    }

    pub fn rule_action(&self) -> &InputAction {
        with_rule!(self, rule => rule.rule_action())
    }

    pub fn use_criteria_rule(&self) -> bool {
        with_rule!(self, rule => rule.use_criteria_rule())
    }

    pub fn criteria(&self) -> AxisValue {
        with_rule!(self, rule => rule.criteria().into_value())
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        with_rule!(self, rule => rule.validate())
    }
}
