use actionrule_common::{AxisValue, Handedness, InputAction, Pose, SourceId};
use glam::{Quat, Vec2, Vec3};
use serde::Serialize;

use crate::axis::AxisKind;
use crate::cache::DigitalActionRaiseCache;
use crate::rule_set::RuleSet;

/// Consumer of derived actions produced by the rule engine.
pub trait ActionSink {
    fn raise_action(
        &mut self,
        source: SourceId,
        handedness: Handedness,
        action: &InputAction,
        value: AxisValue,
    );

    /// Only ever called for digital rules, after a matching raise.
    fn release_action(&mut self, source: SourceId, handedness: Handedness, action: &InputAction);
}

/// A derived action event, as recorded by the `Vec<RuleEvent>` sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RuleEvent {
    Raised {
        source: SourceId,
        handedness: Handedness,
        action: InputAction,
        value: AxisValue,
    },
    Released {
        source: SourceId,
        handedness: Handedness,
        action: InputAction,
    },
}

impl RuleEvent {
    pub fn action(&self) -> &InputAction {
        match self {
            RuleEvent::Raised { action, .. } | RuleEvent::Released { action, .. } => action,
        }
    }

    pub fn is_raise(&self) -> bool {
        matches!(self, RuleEvent::Raised { .. })
    }
}

impl ActionSink for Vec<RuleEvent> {
    fn raise_action(
        &mut self,
        source: SourceId,
        handedness: Handedness,
        action: &InputAction,
        value: AxisValue,
    ) {
        self.push(RuleEvent::Raised {
            source,
            handedness,
            action: action.clone(),
            value,
        });
    }

    fn release_action(&mut self, source: SourceId, handedness: Handedness, action: &InputAction) {
        self.push(RuleEvent::Released {
            source,
            handedness,
            action: action.clone(),
        });
    }
}

/// Re-raises derived actions from base-action value updates.
///
/// Digital rules are edge-triggered: the rule action is raised once when the
/// criteria starts holding and released once when it stops, tracked per
/// source, hand and action in a [`DigitalActionRaiseCache`]. Every other axis
/// is level-triggered: the rule action is raised on each update for which the
/// criteria holds and never released.
///
/// The engine is driven from a single input thread and performs no locking.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: RuleSet,
    cache: DigitalActionRaiseCache,
}

impl RuleEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            cache: DigitalActionRaiseCache::new(),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn cache(&self) -> &DigitalActionRaiseCache {
        &self.cache
    }

    /// Feed one base-action value update. Returns the number of events emitted.
    pub fn on_base_action_value(
        &mut self,
        source: SourceId,
        handedness: Handedness,
        base_action: &InputAction,
        value: AxisValue,
        sink: &mut impl ActionSink,
    ) -> usize {
        tracing::trace!(%source, %handedness, action = %base_action, %value, "base action value");
        match value {
            AxisValue::Digital(v) => self.process_digital(source, handedness, base_action, v, sink),
            AxisValue::SingleAxis(v) => {
                self.process_level::<f32>(source, handedness, base_action, v, sink)
            }
            AxisValue::DualAxis(v) => {
                self.process_level::<Vec2>(source, handedness, base_action, v, sink)
            }
            AxisValue::Position(v) => {
                self.process_level::<Vec3>(source, handedness, base_action, v, sink)
            }
            AxisValue::Rotation(v) => {
                self.process_level::<Quat>(source, handedness, base_action, v, sink)
            }
            AxisValue::Pose(v) => {
                self.process_level::<Pose>(source, handedness, base_action, v, sink)
            }
        }
    }

    /// A source disconnected: release its raised digital actions and forget them.
    pub fn on_source_lost(&mut self, source: SourceId, sink: &mut impl ActionSink) -> usize {
        let released = self.cache.clear_source(source);
        for (handedness, action) in &released {
            tracing::debug!(%source, %handedness, %action, "releasing on source loss");
            sink.release_action(source, *handedness, action);
        }
        released.len()
    }

    /// Swap in a new rule set, releasing every raised digital action first.
    pub fn replace_rules(&mut self, rules: RuleSet, sink: &mut impl ActionSink) -> usize {
        let released = self.cache.clear();
        for (entry, action) in &released {
            sink.release_action(entry.source, entry.handedness, action);
        }
        tracing::debug!(
            rules = rules.len(),
            released = released.len(),
            "rule set replaced"
        );
        self.rules = rules;
        released.len()
    }

    fn process_digital(
        &mut self,
        source: SourceId,
        handedness: Handedness,
        base_action: &InputAction,
        observed: bool,
        sink: &mut impl ActionSink,
    ) -> usize {
        let Self { rules, cache } = self;
        let mut emitted = 0;
        for rule in rules.rules_for::<bool>(base_action.id) {
            let action = rule.rule_action();
            let active = cache.has_input_translation(source, handedness, action);
            if rule.should_raise(observed) {
                if !active {
                    tracing::debug!(%source, %handedness, %action, "raising digital rule action");
                    sink.raise_action(source, handedness, action, AxisValue::Digital(observed));
                    cache.register(source, handedness, action);
                    emitted += 1;
                }
            } else if active {
                tracing::debug!(%source, %handedness, %action, "releasing digital rule action");
                sink.release_action(source, handedness, action);
                cache.deregister(source, handedness, action);
                emitted += 1;
            }
        }
        emitted
    }

    fn process_level<T: AxisKind>(
        &self,
        source: SourceId,
        handedness: Handedness,
        base_action: &InputAction,
        observed: T,
        sink: &mut impl ActionSink,
    ) -> usize {
        let mut emitted = 0;
        for rule in self.rules.rules_for::<T>(base_action.id) {
            if rule.should_raise(observed) {
                tracing::trace!(
                    %source,
                    %handedness,
                    action = %rule.rule_action(),
                    "raising rule action"
                );
                sink.raise_action(source, handedness, rule.rule_action(), observed.into_value());
                emitted += 1;
            }
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ComparisonOp;
    use crate::criteria::CriteriaEvaluator;
    use crate::rule::ActionRule;
    use actionrule_common::AxisType;
    use proptest::prelude::*;

    const RIGHT_CONTROLLER: SourceId = SourceId(1);
    const LEFT_CONTROLLER: SourceId = SourceId(2);

    fn grip() -> InputAction {
        InputAction::new(1, "Grip", AxisType::SingleAxis)
    }

    fn select() -> InputAction {
        InputAction::new(2, "Select", AxisType::Digital)
    }

    fn button_a() -> InputAction {
        InputAction::new(3, "ButtonA", AxisType::Digital)
    }

    fn action_x() -> InputAction {
        InputAction::new(4, "ActionX", AxisType::Digital)
    }

    fn digital_engine() -> RuleEngine {
        let mut rules = RuleSet::new();
        rules
            .insert(ActionRule::new(button_a(), action_x(), true).unwrap())
            .unwrap();
        RuleEngine::new(rules)
    }

    fn feed_digital(
        engine: &mut RuleEngine,
        source: SourceId,
        hand: Handedness,
        values: &[bool],
    ) -> Vec<RuleEvent> {
        let mut events = Vec::new();
        for &v in values {
            let value = AxisValue::Digital(v);
            engine.on_base_action_value(source, hand, &button_a(), value, &mut events);
        }
        events
    }

    #[test]
    fn single_axis_rule_is_level_triggered() {
        let mut rules = RuleSet::new();
        let eval = CriteriaEvaluator::with_comparison(0.9, ComparisonOp::GreaterThanOrEquals);
        rules
            .insert(ActionRule::with_criteria_rule(grip(), select(), eval).unwrap())
            .unwrap();
        let mut engine = RuleEngine::new(rules);

        let mut raised_at = Vec::new();
        for (step, v) in [0.0, 0.5, 0.95, 0.95, 0.2].into_iter().enumerate() {
            let mut events = Vec::new();
            engine.on_base_action_value(
                RIGHT_CONTROLLER,
                Handedness::Right,
                &grip(),
                AxisValue::SingleAxis(v),
                &mut events,
            );
            if !events.is_empty() {
                assert_eq!(
                    events,
                    vec![RuleEvent::Raised {
                        source: RIGHT_CONTROLLER,
                        handedness: Handedness::Right,
                        action: select(),
                        value: AxisValue::SingleAxis(v),
                    }]
                );
                raised_at.push(step + 1);
            }
        }
        assert_eq!(raised_at, vec![3, 4]);
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn digital_rule_is_edge_triggered() {
        let mut engine = digital_engine();
        let events = feed_digital(
            &mut engine,
            RIGHT_CONTROLLER,
            Handedness::Right,
            &[false, true, true, false, true],
        );
        let kinds: Vec<bool> = events.iter().map(RuleEvent::is_raise).collect();
        assert_eq!(kinds, vec![true, false, true]);
        assert_eq!(events.iter().filter(|e| e.is_raise()).count(), 2);
        assert!(events.iter().all(|e| e.action() == &action_x()));
        assert!(engine.cache().has_input_translation(
            RIGHT_CONTROLLER,
            Handedness::Right,
            &action_x()
        ));
    }

    #[test]
    fn digital_state_is_tracked_per_source_and_hand() {
        let mut engine = digital_engine();
        let right = feed_digital(&mut engine, RIGHT_CONTROLLER, Handedness::Right, &[true]);
        let left = feed_digital(&mut engine, LEFT_CONTROLLER, Handedness::Left, &[true, false]);
        assert_eq!(right.len(), 1);
        assert_eq!(left.len(), 2);
        assert!(engine.cache().has_input_translation(
            RIGHT_CONTROLLER,
            Handedness::Right,
            &action_x()
        ));
        assert!(!engine.cache().has_input_translation(
            LEFT_CONTROLLER,
            Handedness::Left,
            &action_x()
        ));
    }

    #[test]
    fn unmatched_base_action_emits_nothing() {
        let mut engine = digital_engine();
        let mut events = Vec::new();
        let emitted = engine.on_base_action_value(
            RIGHT_CONTROLLER,
            Handedness::Right,
            &select(),
            AxisValue::Digital(true),
            &mut events,
        );
        assert_eq!(emitted, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn value_of_other_axis_does_not_match_digital_rules() {
        let mut engine = digital_engine();
        let mut events = Vec::new();
        engine.on_base_action_value(
            RIGHT_CONTROLLER,
            Handedness::Right,
            &button_a(),
            AxisValue::SingleAxis(1.0),
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn pose_rule_raises_on_exact_match() {
        let tracked = InputAction::new(5, "Pointer Pose", AxisType::SixDof);
        let target = Pose::new(Vec3::new(0.0, 1.5, 0.0), Quat::IDENTITY);
        let mut rules = RuleSet::new();
        rules
            .insert(ActionRule::new(tracked.clone(), select(), target).unwrap())
            .unwrap();
        let mut engine = RuleEngine::new(rules);

        let mut events = Vec::new();
        engine.on_base_action_value(
            RIGHT_CONTROLLER,
            Handedness::Right,
            &tracked,
            AxisValue::Pose(Pose::ZERO_IDENTITY),
            &mut events,
        );
        assert!(events.is_empty());
        engine.on_base_action_value(
            RIGHT_CONTROLLER,
            Handedness::Right,
            &tracked,
            AxisValue::Pose(target),
            &mut events,
        );
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn every_matching_rule_fires() {
        let stick = InputAction::new(6, "Stick", AxisType::DualAxis);
        let menu = InputAction::new(7, "Menu", AxisType::Digital);
        let mut rules = RuleSet::new();
        rules.insert(ActionRule::new(stick.clone(), select(), Vec2::Y).unwrap()).unwrap();
        rules.insert(ActionRule::new(stick.clone(), menu.clone(), Vec2::Y).unwrap()).unwrap();
        let mut engine = RuleEngine::new(rules);

        let mut events = Vec::new();
        let emitted = engine.on_base_action_value(
            RIGHT_CONTROLLER,
            Handedness::None,
            &stick,
            AxisValue::DualAxis(Vec2::Y),
            &mut events,
        );
        assert_eq!(emitted, 2);
        assert_eq!(events[0].action(), &select());
        assert_eq!(events[1].action(), &menu);
    }

    #[test]
    fn source_loss_releases_raised_actions() {
        let mut engine = digital_engine();
        feed_digital(&mut engine, RIGHT_CONTROLLER, Handedness::Right, &[true]);
        feed_digital(&mut engine, LEFT_CONTROLLER, Handedness::Left, &[true]);

        let mut events = Vec::new();
        assert_eq!(engine.on_source_lost(RIGHT_CONTROLLER, &mut events), 1);
        assert_eq!(
            events,
            vec![RuleEvent::Released {
                source: RIGHT_CONTROLLER,
                handedness: Handedness::Right,
                action: action_x(),
            }]
        );
        assert_eq!(engine.cache().len(), 1);

        // a fresh press raises again
        let again = feed_digital(&mut engine, RIGHT_CONTROLLER, Handedness::Right, &[true]);
        assert_eq!(again.len(), 1);
        assert!(again[0].is_raise());
    }

    #[test]
    fn replacing_rules_releases_everything() {
        let mut engine = digital_engine();
        feed_digital(&mut engine, RIGHT_CONTROLLER, Handedness::Right, &[true]);

        let mut events = Vec::new();
        assert_eq!(engine.replace_rules(RuleSet::new(), &mut events), 1);
        assert!(!events[0].is_raise());
        assert!(engine.cache().is_empty());
        assert!(engine.rules().is_empty());
    }

    proptest! {
        #[test]
        fn digital_events_alternate_starting_with_raise(
            values in proptest::collection::vec(any::<bool>(), 0..64)
        ) {
            let mut engine = digital_engine();
            let events = feed_digital(&mut engine, RIGHT_CONTROLLER, Handedness::Right, &values);

            for (i, event) in events.iter().enumerate() {
                prop_assert_eq!(event.is_raise(), i % 2 == 0);
            }
            let raises = events.iter().filter(|e| e.is_raise()).count();
            let releases = events.len() - raises;
            prop_assert!(raises == releases || raises == releases + 1);
            let active = engine
                .cache()
                .has_input_translation(RIGHT_CONTROLLER, Handedness::Right, &action_x());
            prop_assert_eq!(active, raises > releases);
        }
    }
}
