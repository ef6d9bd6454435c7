use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Unique identifier for an input action. Id 0 is reserved for [`InputAction::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub u32);

impl ActionId {
    pub const NONE: ActionId = ActionId(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies the device (controller, hand, gaze provider...) that produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub u32);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source:{}", self.0)
    }
}

/// The value-shape category an action carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisType {
    None,
    Raw,
    Digital,
    SingleAxis,
    DualAxis,
    ThreeDofPosition,
    ThreeDofRotation,
    SixDof,
}

impl AxisType {
    /// The six axis types that carry typed values, in partition order.
    pub const RULE_AXES: [AxisType; 6] = [
        AxisType::Digital,
        AxisType::SingleAxis,
        AxisType::DualAxis,
        AxisType::ThreeDofPosition,
        AxisType::ThreeDofRotation,
        AxisType::SixDof,
    ];

    /// Whether an action with this constraint may be the base action of a rule.
    pub fn can_seed_rules(self) -> bool {
        !matches!(self, AxisType::None | AxisType::Raw)
    }

    /// Whether an action constrained to `self` may be raised by a rule whose
    /// base action is constrained to `base`.
    ///
    /// Same axis always matches. Continuous bases may additionally raise
    /// Digital or None actions.
    pub fn is_compatible_rule_axis(self, base: AxisType) -> bool {
        if self == base {
            return true;
        }
        if base.can_seed_rules() && base != AxisType::Digital {
            return matches!(self, AxisType::Digital | AxisType::None);
        }
        false
    }
}

impl fmt::Display for AxisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AxisType::None => "none",
            AxisType::Raw => "raw",
            AxisType::Digital => "digital",
            AxisType::SingleAxis => "single_axis",
            AxisType::DualAxis => "dual_axis",
            AxisType::ThreeDofPosition => "three_dof_position",
            AxisType::ThreeDofRotation => "three_dof_rotation",
            AxisType::SixDof => "six_dof",
        };
        f.write_str(s)
    }
}

/// An input action as defined by the action registry.
///
/// Immutable once defined. Equality and hashing only consider the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputAction {
    pub id: ActionId,
    pub description: String,
    pub axis_constraint: AxisType,
}

impl InputAction {
    pub const NONE: InputAction = InputAction {
        id: ActionId::NONE,
        description: String::new(),
        axis_constraint: AxisType::None,
    };

    pub fn new(id: u32, description: impl Into<String>, axis_constraint: AxisType) -> Self {
        Self {
            id: ActionId(id),
            description: description.into(),
            axis_constraint,
        }
    }
}

impl PartialEq for InputAction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for InputAction {}

impl Hash for InputAction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for InputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.description, self.id)
        }
    }
}

/// Which physical hand (or neither/both) a source represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    #[default]
    None,
    Left,
    Right,
    Both,
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Handedness::None => "none",
            Handedness::Left => "left",
            Handedness::Right => "right",
            Handedness::Both => "both",
        };
        f.write_str(s)
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Handedness::None),
            "left" => Ok(Handedness::Left),
            "right" => Ok(Handedness::Right),
            "both" => Ok(Handedness::Both),
            other => Err(format!("unknown handedness '{other}'")),
        }
    }
}

/// Six degree-of-freedom pose: position plus rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const ZERO_IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::ZERO_IDENTITY
    }
}

/// A typed value carried by an action on one of the six rule axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "axis", content = "value")]
pub enum AxisValue {
    Digital(bool),
    SingleAxis(f32),
    DualAxis(Vec2),
    Position(Vec3),
    Rotation(Quat),
    Pose(Pose),
}

impl AxisValue {
    pub fn axis_type(&self) -> AxisType {
        match self {
            AxisValue::Digital(_) => AxisType::Digital,
            AxisValue::SingleAxis(_) => AxisType::SingleAxis,
            AxisValue::DualAxis(_) => AxisType::DualAxis,
            AxisValue::Position(_) => AxisType::ThreeDofPosition,
            AxisValue::Rotation(_) => AxisType::ThreeDofRotation,
            AxisValue::Pose(_) => AxisType::SixDof,
        }
    }

    /// Neutral value for an axis. `None` for axes that carry no typed value.
    pub fn default_for(axis: AxisType) -> Option<AxisValue> {
        match axis {
            AxisType::Digital => Some(AxisValue::Digital(false)),
            AxisType::SingleAxis => Some(AxisValue::SingleAxis(0.0)),
            AxisType::DualAxis => Some(AxisValue::DualAxis(Vec2::ZERO)),
            AxisType::ThreeDofPosition => Some(AxisValue::Position(Vec3::ZERO)),
            AxisType::ThreeDofRotation => Some(AxisValue::Rotation(Quat::IDENTITY)),
            AxisType::SixDof => Some(AxisValue::Pose(Pose::ZERO_IDENTITY)),
            AxisType::None | AxisType::Raw => None,
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Digital(v) => write!(f, "{v}"),
            AxisValue::SingleAxis(v) => write!(f, "{v}"),
            AxisValue::DualAxis(v) => write!(f, "({}, {})", v.x, v.y),
            AxisValue::Position(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            AxisValue::Rotation(q) => write!(f, "({}, {}, {}, {})", q.x, q.y, q.z, q.w),
            AxisValue::Pose(p) => write!(
                f,
                "pos=({}, {}, {}) rot=({}, {}, {}, {})",
                p.position.x,
                p.position.y,
                p.position.z,
                p.rotation.x,
                p.rotation.y,
                p.rotation.z,
                p.rotation.w
            ),
        }
    }
}
