use actionrule_common::{ActionId, Handedness, InputAction, SourceId};
use std::collections::BTreeMap;

/// Key of a raised digital rule action: which source, which hand, which action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RaiseCacheEntry {
    pub source: SourceId,
    pub handedness: Handedness,
    pub action: ActionId,
}

impl RaiseCacheEntry {
    pub fn new(source: SourceId, handedness: Handedness, action: &InputAction) -> Self {
        Self {
            source,
            handedness,
            action: action.id,
        }
    }
}

/// Tracks which digital rule actions are currently raised.
///
/// Presence of an entry means the rule action has been raised for that
/// source and hand and not yet released. Registration is idempotent: a
/// triple registered twice is cleared by a single deregistration.
///
/// Uses BTreeMap so releases on source loss come out in a stable order.
#[derive(Debug, Clone, Default)]
pub struct DigitalActionRaiseCache {
    entries: BTreeMap<RaiseCacheEntry, InputAction>,
}

impl DigitalActionRaiseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `action` is currently raised for `source` and `handedness`.
    pub fn has_input_translation(
        &self,
        source: SourceId,
        handedness: Handedness,
        action: &InputAction,
    ) -> bool {
        self.entries
            .contains_key(&RaiseCacheEntry::new(source, handedness, action))
    }

    /// Mark `action` as raised. Returns false if it already was.
    pub fn register(
        &mut self,
        source: SourceId,
        handedness: Handedness,
        action: &InputAction,
    ) -> bool {
        let key = RaiseCacheEntry::new(source, handedness, action);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, action.clone());
        true
    }

    /// Mark `action` as released. No-op (returns false) if it was not raised.
    pub fn deregister(
        &mut self,
        source: SourceId,
        handedness: Handedness,
        action: &InputAction,
    ) -> bool {
        self.entries
            .remove(&RaiseCacheEntry::new(source, handedness, action))
            .is_some()
    }

    /// Drop every entry of `source`, returning what was raised.
    pub fn clear_source(&mut self, source: SourceId) -> Vec<(Handedness, InputAction)> {
        let keys: Vec<RaiseCacheEntry> = self
            .entries
            .keys()
            .filter(|k| k.source == source)
            .copied()
            .collect();
        keys.into_iter()
            .filter_map(|k| self.entries.remove(&k).map(|a| (k.handedness, a)))
            .collect()
    }

    /// Drop every entry, returning what was raised.
    pub fn clear(&mut self) -> Vec<(RaiseCacheEntry, InputAction)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RaiseCacheEntry, &InputAction)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionrule_common::AxisType;

    fn select() -> InputAction {
        InputAction::new(1, "Select", AxisType::Digital)
    }

    const RIGHT: SourceId = SourceId(10);
    const LEFT: SourceId = SourceId(11);

    #[test]
    fn register_then_lookup() {
        let mut cache = DigitalActionRaiseCache::new();
        assert!(!cache.has_input_translation(RIGHT, Handedness::Right, &select()));
        assert!(cache.register(RIGHT, Handedness::Right, &select()));
        assert!(cache.has_input_translation(RIGHT, Handedness::Right, &select()));
    }

    #[test]
    fn entries_are_per_source_and_hand() {
        let mut cache = DigitalActionRaiseCache::new();
        cache.register(RIGHT, Handedness::Right, &select());
        assert!(!cache.has_input_translation(LEFT, Handedness::Right, &select()));
        assert!(!cache.has_input_translation(RIGHT, Handedness::Left, &select()));
    }

    #[test]
    fn double_register_cleared_by_single_deregister() {
        let mut cache = DigitalActionRaiseCache::new();
        assert!(cache.register(RIGHT, Handedness::Right, &select()));
        assert!(!cache.register(RIGHT, Handedness::Right, &select()));
        assert_eq!(cache.len(), 1);

        assert!(cache.deregister(RIGHT, Handedness::Right, &select()));
        assert!(!cache.has_input_translation(RIGHT, Handedness::Right, &select()));
        assert!(cache.is_empty());
    }

    #[test]
    fn deregister_without_register_is_noop() {
        let mut cache = DigitalActionRaiseCache::new();
        assert!(!cache.deregister(RIGHT, Handedness::None, &select()));
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_source_leaves_other_sources() {
        let mut cache = DigitalActionRaiseCache::new();
        let menu = InputAction::new(2, "Menu", AxisType::Digital);
        cache.register(RIGHT, Handedness::Right, &select());
        cache.register(RIGHT, Handedness::Right, &menu);
        cache.register(LEFT, Handedness::Left, &select());

        let cleared = cache.clear_source(RIGHT);
        assert_eq!(cleared.len(), 2);
        assert_eq!(cleared[0].1, select());
        assert_eq!(cleared[1].1, menu);
        assert_eq!(cache.len(), 1);
        assert!(cache.has_input_translation(LEFT, Handedness::Left, &select()));
    }
}
