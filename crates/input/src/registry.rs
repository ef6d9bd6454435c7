use actionrule_common::{ActionId, InputAction};
use std::collections::HashMap;

use crate::rule::RuleError;

/// Id-keyed table of every input action known to the input system.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<ActionId, InputAction>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of actions, rejecting duplicate or reserved ids.
    pub fn from_actions(
        actions: impl IntoIterator<Item = InputAction>,
    ) -> Result<Self, RuleError> {
        let mut registry = Self::new();
        for action in actions {
            registry.register(action)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, action: InputAction) -> Result<(), RuleError> {
        if action.id.is_none() {
            return Err(RuleError::InvalidConfiguration(format!(
                "action '{}' uses the reserved id 0",
                action.description
            )));
        }
        if self.contains(action.id) {
            return Err(RuleError::DuplicateAction(action.id));
        }
        self.actions.insert(action.id, action);
        Ok(())
    }

    pub fn get(&self, id: ActionId) -> Option<&InputAction> {
        self.actions.get(&id)
    }

    /// Look up an action, failing with [`RuleError::UnknownAction`].
    pub fn resolve(&self, id: ActionId) -> Result<&InputAction, RuleError> {
        self.get(id).ok_or(RuleError::UnknownAction(id))
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.actions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// All registered actions, ordered by id.
    pub fn registered_actions(&self) -> Vec<&InputAction> {
        let mut actions: Vec<_> = self.actions.values().collect();
        actions.sort_by_key(|a| a.id);
        actions
    }

    /// Actions that may be the base action of a rule.
    pub fn base_action_candidates(&self) -> Vec<&InputAction> {
        self.registered_actions()
            .into_iter()
            .filter(|a| a.axis_constraint.can_seed_rules())
            .collect()
    }

    /// Actions a rule observing `base` may raise.
    pub fn compatible_rule_actions(&self, base: &InputAction) -> Vec<&InputAction> {
        self.registered_actions()
            .into_iter()
            .filter(|a| a.id != base.id)
            .filter(|a| a.axis_constraint.is_compatible_rule_axis(base.axis_constraint))
            .collect()
    }
}
