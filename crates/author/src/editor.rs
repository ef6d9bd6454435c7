use actionrule_common::{ActionId, AxisType, AxisValue, InputAction};
use actionrule_input::{ActionRegistry, AnyRule, ComparisonOp, RuleError, RuleSet};

/// An editing command that can be applied to a rule set and reversed.
///
/// Each command carries the rule and its partition index so it can undo itself.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Add a rule at `index`. Undo = remove it.
    AddRule { index: usize, rule: AnyRule },
    /// Remove the rule at `index`. Undo = re-insert it there.
    RemoveRule { index: usize, rule: AnyRule },
}

impl EditCommand {
    /// Produce the inverse command (for undo).
    pub fn inverse(&self) -> Self {
        match self {
            Self::AddRule { index, rule } => Self::RemoveRule {
                index: *index,
                rule: rule.clone(),
            },
            Self::RemoveRule { index, rule } => Self::AddRule {
                index: *index,
                rule: rule.clone(),
            },
        }
    }
}

/// Errors from edit operations.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("no base action selected")]
    NoBaseAction,
    #[error("no rule action selected")]
    NoRuleAction,
    #[error("no draft criteria for the selected base action")]
    NoDraftCriteria,
    #[error("draft value is {actual}, base action expects {expected}")]
    DraftMismatch { expected: AxisType, actual: AxisType },
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Authoring session for one rule profile.
///
/// Holds the draft of the next rule (selected actions, criteria, optional
/// criteria rule) and the undo/redo history. The rule set itself is owned by
/// the caller and passed into each mutating operation.
#[derive(Debug, Clone)]
pub struct RuleEditor {
    base_action: InputAction,
    rule_action: InputAction,
    criteria: Option<AxisValue>,
    criteria_rule: Option<AxisValue>,
    comparison: ComparisonOp,
    use_criteria_rule: bool,
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl RuleEditor {
    /// Create a new editor with nothing selected.
    pub fn new() -> Self {
        Self {
            base_action: InputAction::NONE,
            rule_action: InputAction::NONE,
            criteria: None,
            criteria_rule: None,
            comparison: ComparisonOp::Equals,
            use_criteria_rule: false,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn base_action(&self) -> &InputAction {
        &self.base_action
    }

    pub fn rule_action(&self) -> &InputAction {
        &self.rule_action
    }

    pub fn criteria(&self) -> Option<AxisValue> {
        self.criteria
    }

    pub fn criteria_rule(&self) -> Option<AxisValue> {
        self.criteria_rule
    }

    pub fn comparison(&self) -> ComparisonOp {
        self.comparison
    }

    pub fn use_criteria_rule(&self) -> bool {
        self.use_criteria_rule
    }

    /// Clear the selection and draft values. History is kept.
    pub fn reset(&mut self) {
        self.base_action = InputAction::NONE;
        self.rule_action = InputAction::NONE;
        self.reset_criteria();
    }

    fn reset_criteria(&mut self) {
        let neutral = AxisValue::default_for(self.base_action.axis_constraint);
        self.criteria = neutral;
        self.criteria_rule = neutral;
        self.comparison = ComparisonOp::Equals;
        self.use_criteria_rule = false;
    }

    /// Select the base action. Drafts are reset to the neutral value of its
    /// axis, and a rule action it cannot raise is deselected.
    pub fn select_base_action(
        &mut self,
        registry: &ActionRegistry,
        id: ActionId,
    ) -> Result<(), EditError> {
        let action = registry.resolve(id)?;
        if !action.axis_constraint.can_seed_rules() {
            return Err(RuleError::UnsupportedBaseAxis {
                action: id,
                axis: action.axis_constraint,
            }
            .into());
        }
        self.base_action = action.clone();
        if self.rule_action == self.base_action
            || !self
                .rule_action
                .axis_constraint
                .is_compatible_rule_axis(self.base_action.axis_constraint)
        {
            self.rule_action = InputAction::NONE;
        }
        self.reset_criteria();
        Ok(())
    }

    /// Select the action to raise. Must be compatible with the base action.
    pub fn select_rule_action(
        &mut self,
        registry: &ActionRegistry,
        id: ActionId,
    ) -> Result<(), EditError> {
        if self.base_action.id.is_none() {
            return Err(EditError::NoBaseAction);
        }
        let action = registry.resolve(id)?;
        if *action == self.base_action {
            return Err(RuleError::SelfReferential(id).into());
        }
        if !action
            .axis_constraint
            .is_compatible_rule_axis(self.base_action.axis_constraint)
        {
            return Err(RuleError::IncompatibleRuleAction {
                base_axis: self.base_action.axis_constraint,
                rule_action: id,
                rule_axis: action.axis_constraint,
            }
            .into());
        }
        self.rule_action = action.clone();
        Ok(())
    }

    pub fn set_criteria(&mut self, value: AxisValue) -> Result<(), EditError> {
        self.check_draft(value)?;
        self.criteria = Some(value);
        Ok(())
    }

    pub fn set_criteria_rule(&mut self, value: AxisValue) -> Result<(), EditError> {
        self.check_draft(value)?;
        self.criteria_rule = Some(value);
        Ok(())
    }

    /// Set the criteria rule comparison. Only single-axis bases support ordering.
    pub fn set_comparison(&mut self, comparison: ComparisonOp) -> Result<(), EditError> {
        let axis = self.base_action.axis_constraint;
        if axis != AxisType::SingleAxis && !comparison.is_equals() {
            return Err(RuleError::UnsupportedComparison { axis, comparison }.into());
        }
        self.comparison = comparison;
        Ok(())
    }

    pub fn set_use_criteria_rule(&mut self, enabled: bool) {
        self.use_criteria_rule = enabled;
    }

    fn check_draft(&self, value: AxisValue) -> Result<(), EditError> {
        if self.base_action.id.is_none() {
            return Err(EditError::NoBaseAction);
        }
        let expected = self.base_action.axis_constraint;
        let actual = value.axis_type();
        if actual != expected {
            return Err(EditError::DraftMismatch { expected, actual });
        }
        Ok(())
    }

    /// Build the rule described by the current draft.
    pub fn draft_rule(&self) -> Result<AnyRule, EditError> {
        if self.base_action.id.is_none() {
            return Err(EditError::NoBaseAction);
        }
        if self.rule_action.id.is_none() {
            return Err(EditError::NoRuleAction);
        }
        let (Some(criteria), Some(criteria_rule)) = (self.criteria, self.criteria_rule) else {
            return Err(EditError::NoDraftCriteria);
        };
        Ok(AnyRule::from_parts(
            self.base_action.clone(),
            self.rule_action.clone(),
            criteria,
            self.use_criteria_rule,
            criteria_rule,
            self.comparison,
        )?)
    }

    /// Whether an equivalent rule is already configured.
    pub fn rule_exists(&self, rules: &RuleSet) -> bool {
        self.draft_rule()
            .map(|rule| rules.contains_any(&rule))
            .unwrap_or(false)
    }

    /// Whether [`add_rule`](Self::add_rule) would succeed.
    pub fn can_add_rule(&self, rules: &RuleSet) -> bool {
        self.draft_rule()
            .map(|rule| !rules.contains_any(&rule))
            .unwrap_or(false)
    }

    /// Add the drafted rule and push to undo stack. The draft criteria are reset.
    pub fn add_rule(&mut self, rules: &mut RuleSet) -> Result<usize, EditError> {
        let rule = self.draft_rule()?;
        let index = rules.insert_any(rule.clone())?;
        tracing::info!(
            base = %rule.base_action(),
            rule = %rule.rule_action(),
            axis = %rule.axis_type(),
            index,
            "rule added"
        );
        self.undo_stack.push(EditCommand::AddRule { index, rule });
        self.redo_stack.clear();
        self.reset_criteria();
        Ok(index)
    }

    /// Remove a rule and push to undo stack.
    pub fn remove_rule(
        &mut self,
        rules: &mut RuleSet,
        axis: AxisType,
        index: usize,
    ) -> Result<AnyRule, EditError> {
        let rule = rules.remove(axis, index)?;
        tracing::info!(axis = %axis, index, "rule removed");
        self.undo_stack.push(EditCommand::RemoveRule {
            index,
            rule: rule.clone(),
        });
        self.redo_stack.clear();
        Ok(rule)
    }

    /// Undo the last edit. Returns false if there was nothing to undo.
    pub fn undo(&mut self, rules: &mut RuleSet) -> Result<bool, EditError> {
        let Some(cmd) = self.undo_stack.pop() else {
            return Ok(false);
        };
        if let Err(e) = apply_command(rules, &cmd.inverse()) {
            self.undo_stack.push(cmd);
            return Err(e.into());
        }
        self.redo_stack.push(cmd);
        Ok(true)
    }

    /// Redo the last undone edit. Returns false if there was nothing to redo.
    pub fn redo(&mut self, rules: &mut RuleSet) -> Result<bool, EditError> {
        let Some(cmd) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(e) = apply_command(rules, &cmd) {
            self.redo_stack.push(cmd);
            return Err(e.into());
        }
        self.undo_stack.push(cmd);
        Ok(true)
    }

    /// Number of operations on the undo stack.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of operations on the redo stack.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Whether there is an operation to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether there is an operation to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

impl Default for RuleEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_command(rules: &mut RuleSet, cmd: &EditCommand) -> Result<(), RuleError> {
    match cmd {
        EditCommand::AddRule { index, rule } => {
            rules.insert_any_at(*index, rule.clone())?;
        }
        EditCommand::RemoveRule { index, rule } => {
            rules.remove(rule.axis_type(), *index)?;
        }
    }
    Ok(())
}
