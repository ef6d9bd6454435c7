use actionrule_common::{ActionId, AxisType, Pose};
use glam::{Quat, Vec2, Vec3};
use std::collections::HashMap;

use crate::axis::AxisKind;
use crate::rule::{ActionRule, AnyRule, RuleError, with_rule};

/// Ordered rules of one axis kind, indexed by base action id.
#[derive(Debug, Clone)]
pub struct RulePartition<T> {
    rules: Vec<ActionRule<T>>,
    by_base: HashMap<ActionId, Vec<usize>>,
}

impl<T> Default for RulePartition<T> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            by_base: HashMap::new(),
        }
    }
}

impl<T: AxisKind> RulePartition<T> {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ActionRule<T>> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionRule<T>> {
        self.rules.iter()
    }

    /// Rules whose base action is `base`, in configuration order.
    pub fn matching(&self, base: ActionId) -> impl Iterator<Item = &ActionRule<T>> + '_ {
        self.by_base
            .get(&base)
            .into_iter()
            .flatten()
            .map(|&i| &self.rules[i])
    }

    pub fn contains(&self, rule: &ActionRule<T>) -> bool {
        self.matching(rule.base_action().id)
            .any(|existing| existing.same_definition(rule))
    }

    fn insert(&mut self, index: usize, rule: ActionRule<T>) -> usize {
        let index = index.min(self.rules.len());
        if index == self.rules.len() {
            self.by_base
                .entry(rule.base_action().id)
                .or_default()
                .push(index);
            self.rules.push(rule);
        } else {
            self.rules.insert(index, rule);
            self.reindex();
        }
        index
    }

    fn remove(&mut self, index: usize) -> Option<ActionRule<T>> {
        if index >= self.rules.len() {
            return None;
        }
        let rule = self.rules.remove(index);
        self.reindex();
        Some(rule)
    }

    fn reindex(&mut self) {
        self.by_base.clear();
        for (i, rule) in self.rules.iter().enumerate() {
            self.by_base.entry(rule.base_action().id).or_default().push(i);
        }
    }
}

impl<'a, T: AxisKind> IntoIterator for &'a RulePartition<T> {
    type Item = &'a ActionRule<T>;
    type IntoIter = std::slice::Iter<'a, ActionRule<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// All configured rules, partitioned by the axis type of their base action.
///
/// Every inserted rule is validated and duplicates are rejected here; the
/// engine itself never deduplicates.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub(crate) digital: RulePartition<bool>,
    pub(crate) single_axis: RulePartition<f32>,
    pub(crate) dual_axis: RulePartition<Vec2>,
    pub(crate) vector_axis: RulePartition<Vec3>,
    pub(crate) quaternion_axis: RulePartition<Quat>,
    pub(crate) pose_axis: RulePartition<Pose>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a rule. Returns its index within its partition.
    pub fn insert<T: AxisKind>(&mut self, rule: ActionRule<T>) -> Result<usize, RuleError> {
        self.insert_at(usize::MAX, rule)
    }

    /// Validate and insert a rule at `index` (clamped to the partition length).
    pub fn insert_at<T: AxisKind>(
        &mut self,
        index: usize,
        rule: ActionRule<T>,
    ) -> Result<usize, RuleError> {
        rule.validate()?;
        let partition = T::partition_mut(self);
        if partition.contains(&rule) {
            return Err(RuleError::RuleExists {
                base: rule.base_action().id,
                rule: rule.rule_action().id,
            });
        }
        Ok(partition.insert(index, rule))
    }

    pub fn insert_any(&mut self, rule: AnyRule) -> Result<usize, RuleError> {
        self.insert_any_at(usize::MAX, rule)
    }

    pub fn insert_any_at(&mut self, index: usize, rule: AnyRule) -> Result<usize, RuleError> {
        with_rule!(rule, rule => self.insert_at(index, rule))
    }

    /// The duplicate check applied on insert.
    pub fn contains<T: AxisKind>(&self, rule: &ActionRule<T>) -> bool {
        T::partition(self).contains(rule)
    }

    pub fn contains_any(&self, rule: &AnyRule) -> bool {
        with_rule!(rule, rule => self.contains(rule))
    }

    /// Remove the rule at `index` of the `axis` partition.
    pub fn remove(&mut self, axis: AxisType, index: usize) -> Result<AnyRule, RuleError> {
        let removed = match axis {
            AxisType::Digital => self.digital.remove(index).map(AnyRule::Digital),
            AxisType::SingleAxis => self.single_axis.remove(index).map(AnyRule::SingleAxis),
            AxisType::DualAxis => self.dual_axis.remove(index).map(AnyRule::DualAxis),
            AxisType::ThreeDofPosition => self.vector_axis.remove(index).map(AnyRule::Position),
            AxisType::ThreeDofRotation => {
                self.quaternion_axis.remove(index).map(AnyRule::Rotation)
            }
            AxisType::SixDof => self.pose_axis.remove(index).map(AnyRule::Pose),
            AxisType::None | AxisType::Raw => None,
        };
        removed.ok_or(RuleError::IndexOutOfRange { axis, index })
    }

    pub fn rules<T: AxisKind>(&self) -> &RulePartition<T> {
        T::partition(self)
    }

    /// Rules of kind `T` observing `base`, in configuration order.
    pub fn rules_for<T: AxisKind>(
        &self,
        base: ActionId,
    ) -> impl Iterator<Item = &ActionRule<T>> + '_ {
        T::partition(self).matching(base)
    }

    /// Number of rules seeded by `axis`.
    pub fn count(&self, axis: AxisType) -> usize {
        match axis {
            AxisType::Digital => self.digital.len(),
            AxisType::SingleAxis => self.single_axis.len(),
            AxisType::DualAxis => self.dual_axis.len(),
            AxisType::ThreeDofPosition => self.vector_axis.len(),
            AxisType::ThreeDofRotation => self.quaternion_axis.len(),
            AxisType::SixDof => self.pose_axis.len(),
            AxisType::None | AxisType::Raw => 0,
        }
    }

    pub fn len(&self) -> usize {
        AxisType::RULE_AXES.iter().map(|&axis| self.count(axis)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every rule, partition by partition in axis order.
    pub fn iter_any(&self) -> impl Iterator<Item = AnyRule> + '_ {
        let digital = self.digital.iter().cloned().map(AnyRule::Digital);
        let single = self.single_axis.iter().cloned().map(AnyRule::SingleAxis);
        let dual = self.dual_axis.iter().cloned().map(AnyRule::DualAxis);
        let vector = self.vector_axis.iter().cloned().map(AnyRule::Position);
        let rotation = self.quaternion_axis.iter().cloned().map(AnyRule::Rotation);
        let pose = self.pose_axis.iter().cloned().map(AnyRule::Pose);
        digital
            .chain(single)
            .chain(dual)
            .chain(vector)
            .chain(rotation)
            .chain(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionrule_common::InputAction;

    fn grip() -> InputAction {
        InputAction::new(1, "Grip", AxisType::SingleAxis)
    }

    fn trigger() -> InputAction {
        InputAction::new(2, "Trigger", AxisType::SingleAxis)
    }

    fn select() -> InputAction {
        InputAction::new(3, "Select", AxisType::Digital)
    }

    fn menu() -> InputAction {
        InputAction::new(4, "Menu", AxisType::Digital)
    }

    #[test]
    fn lookup_by_base_preserves_order() {
        let mut rules = RuleSet::new();
        rules.insert(ActionRule::new(grip(), select(), 1.0).unwrap()).unwrap();
        rules.insert(ActionRule::new(trigger(), select(), 1.0).unwrap()).unwrap();
        rules.insert(ActionRule::new(grip(), menu(), 0.0).unwrap()).unwrap();

        let matched: Vec<_> = rules
            .rules_for::<f32>(grip().id)
            .map(|r| r.rule_action().id)
            .collect();
        assert_eq!(matched, vec![select().id, menu().id]);
        assert_eq!(rules.rules_for::<f32>(ActionId(99)).count(), 0);
    }

    #[test]
    fn partitions_are_independent() {
        let mut rules = RuleSet::new();
        let button = InputAction::new(5, "Button", AxisType::Digital);
        rules.insert(ActionRule::new(button.clone(), select(), true).unwrap()).unwrap();
        rules.insert(ActionRule::new(grip(), select(), 1.0).unwrap()).unwrap();

        assert_eq!(rules.count(AxisType::Digital), 1);
        assert_eq!(rules.count(AxisType::SingleAxis), 1);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules_for::<f32>(button.id).count(), 0);
        assert_eq!(rules.rules_for::<bool>(button.id).count(), 1);
    }

    #[test]
    fn duplicate_rule_rejected() {
        let mut rules = RuleSet::new();
        rules.insert(ActionRule::new(grip(), select(), 0.5).unwrap()).unwrap();
        let err = rules
            .insert(ActionRule::new(grip(), select(), 0.5).unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::RuleExists {
                base: grip().id,
                rule: select().id
            }
        );
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn remove_reindexes() {
        let mut rules = RuleSet::new();
        rules.insert(ActionRule::new(grip(), select(), 0.1).unwrap()).unwrap();
        rules.insert(ActionRule::new(trigger(), select(), 0.2).unwrap()).unwrap();
        rules.insert(ActionRule::new(grip(), menu(), 0.3).unwrap()).unwrap();

        let removed = rules.remove(AxisType::SingleAxis, 0).unwrap();
        assert_eq!(removed.rule_action(), &select());

        let remaining: Vec<_> = rules.rules_for::<f32>(grip().id).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].rule_action(), &menu());
        assert_eq!(rules.rules_for::<f32>(trigger().id).count(), 1);
    }

    #[test]
    fn remove_out_of_range_is_error() {
        let mut rules = RuleSet::new();
        assert_eq!(
            rules.remove(AxisType::DualAxis, 0).unwrap_err(),
            RuleError::IndexOutOfRange {
                axis: AxisType::DualAxis,
                index: 0
            }
        );
    }

    #[test]
    fn insert_at_restores_position() {
        let mut rules = RuleSet::new();
        rules.insert(ActionRule::new(grip(), select(), 0.1).unwrap()).unwrap();
        rules.insert(ActionRule::new(grip(), select(), 0.2).unwrap()).unwrap();

        let removed = rules.remove(AxisType::SingleAxis, 0).unwrap();
        let index = rules.insert_any_at(0, removed).unwrap();
        assert_eq!(index, 0);

        let criteria: Vec<f32> = rules.rules::<f32>().iter().map(|r| r.criteria()).collect();
        assert_eq!(criteria, vec![0.1, 0.2]);
        assert_eq!(rules.rules_for::<f32>(grip().id).count(), 2);
    }

    #[test]
    fn iter_any_walks_every_partition() {
        let mut rules = RuleSet::new();
        let stick = InputAction::new(6, "Stick", AxisType::DualAxis);
        rules.insert(ActionRule::new(stick, select(), Vec2::X).unwrap()).unwrap();
        rules.insert(ActionRule::new(grip(), select(), 1.0).unwrap()).unwrap();

        let axes: Vec<_> = rules.iter_any().map(|r| r.axis_type()).collect();
        assert_eq!(axes, vec![AxisType::SingleAxis, AxisType::DualAxis]);
    }
}
