use actionrule_common::{AxisType, AxisValue, Pose};
use glam::{Quat, Vec2, Vec3};
use std::fmt;

use crate::comparison::ComparisonOp;
use crate::rule::{ActionRule, AnyRule};
use crate::rule_set::{RulePartition, RuleSet};

/// A value type that can seed action rules.
///
/// Implemented for the six typed axes: `bool` (Digital), `f32` (SingleAxis),
/// `Vec2` (DualAxis), `Vec3` (ThreeDofPosition), `Quat` (ThreeDofRotation)
/// and [`Pose`] (SixDof). Each kind owns one partition of a [`RuleSet`].
pub trait AxisKind: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const AXIS: AxisType;

    /// Whether comparisons other than `Equals` are meaningful for this kind.
    const ORDERED: bool = false;

    fn from_value(value: &AxisValue) -> Option<Self>;

    fn into_value(self) -> AxisValue;

    /// Exact structural comparison. Only scalar kinds honour ordering operators.
    fn compare(observed: Self, reference: Self, op: ComparisonOp) -> bool {
        op.is_equals() && observed == reference
    }

    fn partition(rules: &RuleSet) -> &RulePartition<Self>;

    fn partition_mut(rules: &mut RuleSet) -> &mut RulePartition<Self>;

    fn into_any(rule: ActionRule<Self>) -> AnyRule;
}

macro_rules! exact_axis_kind {
    ($ty:ty, $axis:ident, $variant:ident, $field:ident) => {
        impl AxisKind for $ty {
            const AXIS: AxisType = AxisType::$axis;

            fn from_value(value: &AxisValue) -> Option<Self> {
                match value {
                    AxisValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn into_value(self) -> AxisValue {
                AxisValue::$variant(self)
            }

            fn partition(rules: &RuleSet) -> &RulePartition<Self> {
                &rules.$field
            }

            fn partition_mut(rules: &mut RuleSet) -> &mut RulePartition<Self> {
                &mut rules.$field
            }

            fn into_any(rule: ActionRule<Self>) -> AnyRule {
                AnyRule::$variant(rule)
            }
        }
    };
}

exact_axis_kind!(bool, Digital, Digital, digital);
exact_axis_kind!(Vec2, DualAxis, DualAxis, dual_axis);
exact_axis_kind!(Vec3, ThreeDofPosition, Position, vector_axis);
exact_axis_kind!(Quat, ThreeDofRotation, Rotation, quaternion_axis);
exact_axis_kind!(Pose, SixDof, Pose, pose_axis);

impl AxisKind for f32 {
    const AXIS: AxisType = AxisType::SingleAxis;
    const ORDERED: bool = true;

    fn from_value(value: &AxisValue) -> Option<Self> {
        match value {
            AxisValue::SingleAxis(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> AxisValue {
        AxisValue::SingleAxis(self)
    }

    fn compare(observed: Self, reference: Self, op: ComparisonOp) -> bool {
        op.evaluate(observed, reference)
    }

    fn partition(rules: &RuleSet) -> &RulePartition<Self> {
        &rules.single_axis
    }

    fn partition_mut(rules: &mut RuleSet) -> &mut RulePartition<Self> {
        &mut rules.single_axis
    }

    fn into_any(rule: ActionRule<Self>) -> AnyRule {
        AnyRule::SingleAxis(rule)
    }
}
