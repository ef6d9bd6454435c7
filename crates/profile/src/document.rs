use actionrule_common::{ActionId, AxisType, InputAction, Pose};
use actionrule_input::{ActionRegistry, ActionRule, AxisKind, CriteriaEvaluator, RuleError, RuleSet};
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::store::ProfileError;

/// Current profile schema version.
pub const PROFILE_SCHEMA_VERSION: u32 = 1;

/// One persisted rule. Actions are referenced by id and resolved on compile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord<T> {
    pub base_action: ActionId,
    pub rule_action: ActionId,
    pub criteria: T,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub use_criteria_rule: bool,
    /// Custom evaluator; defaults to equality against `criteria`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria_rule: Option<CriteriaEvaluator<T>>,
}

impl<T: AxisKind> RuleRecord<T> {
    pub fn from_rule(rule: &ActionRule<T>) -> Self {
        let criteria = rule.criteria();
        let evaluator = *rule.criteria_rule();
        Self {
            base_action: rule.base_action().id,
            rule_action: rule.rule_action().id,
            criteria,
            use_criteria_rule: rule.use_criteria_rule(),
            criteria_rule: (evaluator != CriteriaEvaluator::new(criteria)).then_some(evaluator),
        }
    }

    /// Resolve the referenced actions and build a validated rule.
    pub fn to_rule(&self, registry: &ActionRegistry) -> Result<ActionRule<T>, RuleError> {
        let base = registry.resolve(self.base_action)?;
        let rule = registry.resolve(self.rule_action)?;
        ActionRule::from_parts(
            base.clone(),
            rule.clone(),
            self.criteria,
            self.use_criteria_rule,
            self.criteria_rule
                .unwrap_or_else(|| CriteriaEvaluator::new(self.criteria)),
        )
    }
}

/// The six ordered rule lists, one per base axis type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesProfile {
    pub digital: Vec<RuleRecord<bool>>,
    pub single_axis: Vec<RuleRecord<f32>>,
    pub dual_axis: Vec<RuleRecord<Vec2>>,
    pub vector_axis: Vec<RuleRecord<Vec3>>,
    pub quaternion_axis: Vec<RuleRecord<Quat>>,
    pub pose_axis: Vec<RuleRecord<Pose>>,
}

impl RulesProfile {
    pub fn len(&self) -> usize {
        self.digital.len()
            + self.single_axis.len()
            + self.dual_axis.len()
            + self.vector_axis.len()
            + self.quaternion_axis.len()
            + self.pose_axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A complete profile: the action table and the rules built on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub schema_version: u32,
    #[serde(default)]
    pub actions: Vec<InputAction>,
    #[serde(default)]
    pub rules: RulesProfile,
}

impl Default for ProfileDocument {
    fn default() -> Self {
        Self {
            schema_version: PROFILE_SCHEMA_VERSION,
            actions: Vec::new(),
            rules: RulesProfile::default(),
        }
    }
}

/// Output of [`ProfileDocument::compile`], ready to drive a rule engine.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub registry: ActionRegistry,
    pub rules: RuleSet,
}

impl ProfileDocument {
    /// Snapshot a registry and rule set into a document.
    pub fn from_parts(registry: &ActionRegistry, rules: &RuleSet) -> Self {
        fn records<T: AxisKind>(rules: &RuleSet) -> Vec<RuleRecord<T>> {
            rules.rules::<T>().iter().map(RuleRecord::from_rule).collect()
        }

        Self {
            schema_version: PROFILE_SCHEMA_VERSION,
            actions: registry.registered_actions().into_iter().cloned().collect(),
            rules: RulesProfile {
                digital: records(rules),
                single_axis: records(rules),
                dual_axis: records(rules),
                vector_axis: records(rules),
                quaternion_axis: records(rules),
                pose_axis: records(rules),
            },
        }
    }

    /// Validate the document and build the action registry and rule set.
    pub fn compile(&self) -> Result<CompiledProfile, ProfileError> {
        let _span = tracing::info_span!("compile_profile").entered();
        self.check_schema()?;

        let registry = ActionRegistry::from_actions(self.actions.iter().cloned())
            .map_err(ProfileError::Actions)?;
        let mut rules = RuleSet::new();
        compile_records(&registry, &mut rules, &self.rules.digital)?;
        compile_records(&registry, &mut rules, &self.rules.single_axis)?;
        compile_records(&registry, &mut rules, &self.rules.dual_axis)?;
        compile_records(&registry, &mut rules, &self.rules.vector_axis)?;
        compile_records(&registry, &mut rules, &self.rules.quaternion_axis)?;
        compile_records(&registry, &mut rules, &self.rules.pose_axis)?;

        tracing::debug!(
            actions = registry.len(),
            rules = rules.len(),
            "profile compiled"
        );
        Ok(CompiledProfile { registry, rules })
    }

    pub(crate) fn check_schema(&self) -> Result<(), ProfileError> {
        if self.schema_version != PROFILE_SCHEMA_VERSION {
            return Err(ProfileError::SchemaMismatch {
                file_version: self.schema_version,
                expected_version: PROFILE_SCHEMA_VERSION,
            });
        }
        Ok(())
    }
}

fn compile_records<T: AxisKind>(
    registry: &ActionRegistry,
    rules: &mut RuleSet,
    records: &[RuleRecord<T>],
) -> Result<(), ProfileError> {
    for (index, record) in records.iter().enumerate() {
        record
            .to_rule(registry)
            .and_then(|rule| rules.insert(rule))
            .map_err(|source| ProfileError::InvalidRule {
                axis: T::AXIS,
                index,
                source,
            })?;
    }
    Ok(())
}

/// Name of the rule list seeded by `axis`, as it appears in documents.
pub fn partition_name(axis: &AxisType) -> &'static str {
    match axis {
        AxisType::Digital => "digital",
        AxisType::SingleAxis => "single_axis",
        AxisType::DualAxis => "dual_axis",
        AxisType::ThreeDofPosition => "vector_axis",
        AxisType::ThreeDofRotation => "quaternion_axis",
        AxisType::SixDof => "pose_axis",
        AxisType::None | AxisType::Raw => "none",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionrule_input::ComparisonOp;

    const SAMPLE: &str = include_str!("../../../profiles/default.yaml");

    fn sample() -> ProfileDocument {
        ProfileDocument::from_yaml_str(SAMPLE).unwrap()
    }

    #[test]
    fn sample_profile_compiles() {
        let compiled = sample().compile().unwrap();
        assert_eq!(compiled.registry.len(), 9);
        assert_eq!(compiled.rules.count(AxisType::Digital), 1);
        assert_eq!(compiled.rules.count(AxisType::SingleAxis), 2);
        assert_eq!(compiled.rules.count(AxisType::DualAxis), 1);
        assert_eq!(compiled.rules.count(AxisType::SixDof), 1);

        let grip_rule = compiled.rules.rules_for::<f32>(ActionId(3)).next().unwrap();
        assert!(grip_rule.use_criteria_rule());
        assert_eq!(
            grip_rule.criteria_rule().comparison(),
            ComparisonOp::GreaterThanOrEquals
        );
        assert!(grip_rule.should_raise(0.95));
    }

    #[test]
    fn unknown_action_rejected_with_location() {
        let mut doc = sample();
        doc.rules.single_axis[1].rule_action = ActionId(77);
        match doc.compile() {
            Err(ProfileError::InvalidRule {
                axis,
                index,
                source,
            }) => {
                assert_eq!(axis, AxisType::SingleAxis);
                assert_eq!(index, 1);
                assert_eq!(source, RuleError::UnknownAction(ActionId(77)));
            }
            other => panic!("expected InvalidRule, got: {other:?}"),
        }
    }

    #[test]
    fn duplicate_rule_rejected() {
        let mut doc = sample();
        let dup = doc.rules.digital[0].clone();
        doc.rules.digital.push(dup);
        match doc.compile() {
            Err(ProfileError::InvalidRule { index, source, .. }) => {
                assert_eq!(index, 1);
                assert!(matches!(source, RuleError::RuleExists { .. }));
            }
            other => panic!("expected InvalidRule, got: {other:?}"),
        }
    }

    #[test]
    fn raw_base_action_rejected() {
        let mut doc = sample();
        doc.rules.digital.push(RuleRecord {
            base_action: ActionId(9),
            rule_action: ActionId(1),
            criteria: true,
            use_criteria_rule: false,
            criteria_rule: None,
        });
        assert!(matches!(
            doc.compile(),
            Err(ProfileError::InvalidRule {
                source: RuleError::UnsupportedBaseAxis { .. },
                ..
            })
        ));
    }

    #[test]
    fn ordering_comparison_on_vector_rejected() {
        let yaml = r#"
schema_version: 1
actions:
  - { id: 1, description: Stick, axis_constraint: dual_axis }
  - { id: 2, description: Select, axis_constraint: digital }
rules:
  dual_axis:
    - base_action: 1
      rule_action: 2
      criteria: [0.0, 1.0]
      use_criteria_rule: true
      criteria_rule: { criteria: [0.0, 1.0], comparison: greater_than }
"#;
        let doc = ProfileDocument::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            doc.compile(),
            Err(ProfileError::InvalidRule {
                source: RuleError::UnsupportedComparison { .. },
                ..
            })
        ));
    }

    #[test]
    fn duplicate_action_ids_rejected() {
        let mut doc = sample();
        doc.actions.push(InputAction::new(1, "Again", AxisType::Digital));
        assert!(matches!(
            doc.compile(),
            Err(ProfileError::Actions(RuleError::DuplicateAction(_)))
        ));
    }

    #[test]
    fn from_parts_rebuilds_equivalent_document() {
        let original = sample();
        let compiled = original.compile().unwrap();
        let rebuilt = ProfileDocument::from_parts(&compiled.registry, &compiled.rules);
        assert_eq!(rebuilt.actions, original.actions);
        assert_eq!(rebuilt.rules, original.rules);
    }

    #[test]
    fn partition_names_match_document_fields() {
        assert_eq!(partition_name(&AxisType::ThreeDofPosition), "vector_axis");
        assert_eq!(partition_name(&AxisType::SixDof), "pose_axis");
    }
}
