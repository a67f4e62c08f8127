//! Per-type tracking metadata.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::instance::InstanceId;
use crate::json::TrackedTypeJson;

/// Count, limit and live instances of one tracked type.
///
/// Equality and ordering only look at [`name`](TrackedType::name).
#[derive(Debug, Clone)]
pub struct TrackedType {
    pub(crate) name: String,
    pub(crate) current_count: usize,
    pub(crate) max_allowed: i64,
    // id -> multiplicity, so a duplicate registration is still counted once per call
    pub(crate) live_ids: BTreeMap<InstanceId, usize>,
}

impl TrackedType {
    pub(crate) fn new(name: impl Into<String>, max_allowed: i64) -> Self {
        Self {
            name: name.into(),
            current_count: 0,
            max_allowed,
            live_ids: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of currently live registered instances.
    pub fn current_count(&self) -> usize {
        self.current_count
    }

    pub fn max_allowed(&self) -> i64 {
        self.max_allowed
    }

    /// Distinct ids of the live instances, in ascending order.
    pub fn live_instance_ids(&self) -> Vec<InstanceId> {
        self.live_ids.keys().copied().collect()
    }

    pub fn is_live(&self, id: InstanceId) -> bool {
        self.live_ids.contains_key(&id)
    }

    /// Whether more instances are alive than the configured maximum allows.
    pub fn is_over_limit(&self) -> bool {
        i64::try_from(self.current_count).map_or(true, |count| count > self.max_allowed)
    }

    /// `current / max`, e.g. `3 / 2`.
    pub fn fraction_string(&self) -> String {
        format!("{} / {}", self.current_count, self.max_allowed)
    }

    pub(crate) fn increment(&mut self, id: InstanceId) {
        let seen = self.live_ids.entry(id).or_insert(0);
        if *seen > 0 {
            tracing::warn!(type_name = %self.name, instance = %id, "instance registered more than once");
        }
        *seen += 1;
        self.current_count += 1;
        self.check_consistency();
    }

    /// Removes one registration of `id`. Returns `false` if `id` was not live.
    pub(crate) fn decrement(&mut self, id: InstanceId) -> bool {
        let Entry::Occupied(mut seen) = self.live_ids.entry(id) else {
            tracing::warn!(type_name = %self.name, instance = %id, "deregistered an instance that is not live");
            return false;
        };

        if *seen.get() > 1 {
            *seen.get_mut() -= 1;
        } else {
            seen.remove();
        }
        self.current_count = self.current_count.saturating_sub(1);
        self.check_consistency();
        true
    }

    pub(crate) fn set_max_allowed(&mut self, max_allowed: i64) {
        self.max_allowed = max_allowed;
    }

    // O(1): the count covers every multiplicity, so it is never below the
    // number of distinct ids, and it is zero exactly when no id is live.
    fn check_consistency(&mut self) {
        let diverged = self.current_count < self.live_ids.len()
            || (self.current_count == 0) != self.live_ids.is_empty();
        debug_assert!(
            !diverged,
            "count {} and {} live ids of {} diverged",
            self.current_count,
            self.live_ids.len(),
            self.name
        );
        if diverged {
            self.current_count = self.live_ids.values().sum();
        }
    }
}

impl PartialEq for TrackedType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TrackedType {}

impl PartialOrd for TrackedType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TrackedType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl From<&TrackedType> for TrackedTypeJson {
    fn from(tracked: &TrackedType) -> Self {
        Self {
            name: tracked.name.clone(),
            current_count: tracked.current_count,
            max_allowed: tracked.max_allowed,
            is_over_limit: tracked.is_over_limit(),
            live_instance_ids: tracked.live_instance_ids(),
        }
    }
}
