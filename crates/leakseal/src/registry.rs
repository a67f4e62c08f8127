//! Tracking registry - live instance counts per type name and the aggregate leak status.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Instant;

use crate::events::RegistryEvent;
use crate::instance::InstanceId;
use crate::json::{LeakSealJson, LeakStatus, TrackedTypeJson};
use crate::tracked::TrackGuard;
use crate::tracked_type::TrackedType;
use crate::watch::StatusWatcher;

static GLOBAL_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry, created on first use and never torn down.
///
/// Unless disabled with `LEAKSEAL_METRICS_SERVER_OFF=1`, first use also starts
/// the HTTP inspection server (see the `server` feature).
pub fn global() -> &'static Registry {
    GLOBAL_REGISTRY.get_or_init(|| {
        let registry = Registry::new();

        #[cfg(feature = "server")]
        crate::metrics_server::start_metrics_server_once(
            registry.clone(),
            *crate::metrics_server::METRICS_SERVER_PORT,
        );

        registry
    })
}

/// Shared handle to a tracking registry.
///
/// Cloning is cheap and every clone refers to the same state. All mutations
/// are serialized by one lock over the whole map, so the aggregate status is
/// always computed from a consistent view of every tracked type.
#[derive(Debug, Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<RegistryState>,
    started_at: Instant,
}

#[derive(Debug, Default)]
struct RegistryState {
    descriptors: HashMap<String, TrackedType>,
    subscribers: Vec<Sender<RegistryEvent>>,
}

impl RegistryState {
    fn status(&self) -> LeakStatus {
        aggregate_status(self.descriptors.values())
    }

    // Unbounded sends never block and never run subscriber code.
    fn publish(&mut self, event: RegistryEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// `Leaking` iff any of the given types is over its limit.
pub(crate) fn aggregate_status<'a>(types: impl IntoIterator<Item = &'a TrackedType>) -> LeakStatus {
    if types.into_iter().any(TrackedType::is_over_limit) {
        LeakStatus::Leaking
    } else {
        LeakStatus::Sealed
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RegistryState::default()),
                started_at: Instant::now(),
            }),
        }
    }

    // A panic elsewhere must not disable tracking, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers one live instance of `type_name`.
    ///
    /// `initial_max_allowed` creates the type's limit on first registration and
    /// overwrites a differing stored limit on later ones. The returned guard
    /// deregisters the instance when dropped.
    pub fn register_instance(
        &self,
        id: InstanceId,
        type_name: impl Into<String>,
        initial_max_allowed: i64,
    ) -> TrackGuard {
        let type_name = type_name.into();

        let mut state = self.lock();
        let tracked = state
            .descriptors
            .entry(type_name.clone())
            .or_insert_with(|| TrackedType::new(type_name.clone(), initial_max_allowed));

        if tracked.max_allowed != initial_max_allowed {
            tracked.set_max_allowed(initial_max_allowed);
        }
        tracked.increment(id);

        let current_count = tracked.current_count;
        let status = state.status();
        state.publish(RegistryEvent::Registered {
            type_name: type_name.clone(),
            id,
            current_count,
            status,
        });
        drop(state);

        tracing::trace!(type_name = %type_name, instance = %id, current_count, "instance registered");

        TrackGuard::new(self.clone(), type_name, id)
    }

    /// Removes one registration of `id` from `type_name`.
    ///
    /// Normally called by [`TrackGuard`]'s drop. Unknown types and ids are ignored.
    pub fn deregister_instance(&self, id: InstanceId, type_name: &str) {
        let mut state = self.lock();
        let Some(tracked) = state.descriptors.get_mut(type_name) else {
            tracing::warn!(type_name, instance = %id, "deregistered an instance of an unknown type");
            return;
        };

        if !tracked.decrement(id) {
            return;
        }

        let current_count = tracked.current_count;
        let status = state.status();
        state.publish(RegistryEvent::Deregistered {
            type_name: type_name.to_string(),
            id,
            current_count,
            status,
        });
        drop(state);

        tracing::trace!(type_name, instance = %id, current_count, "instance deregistered");
    }

    /// Changes the limit of an already registered type. Unknown names are ignored.
    pub fn change_max_allowed(&self, type_name: &str, max_allowed: i64) {
        let mut state = self.lock();
        let Some(tracked) = state.descriptors.get_mut(type_name) else {
            tracing::debug!(type_name, max_allowed, "ignoring max change of an unregistered type");
            return;
        };

        tracked.set_max_allowed(max_allowed);

        let status = state.status();
        state.publish(RegistryEvent::MaxAllowedChanged {
            type_name: type_name.to_string(),
            max_allowed,
            status,
        });
    }

    /// All tracked types sorted by name, read under a single lock acquisition.
    pub fn snapshot(&self) -> Vec<TrackedType> {
        let mut types: Vec<TrackedType> = self.lock().descriptors.values().cloned().collect();
        types.sort();
        types
    }

    pub fn get(&self, type_name: &str) -> Option<TrackedType> {
        self.lock().descriptors.get(type_name).cloned()
    }

    pub fn status(&self) -> LeakStatus {
        self.lock().status()
    }

    /// Serializable report of the whole registry.
    pub fn report(&self) -> LeakSealJson {
        let types = self.snapshot();

        LeakSealJson {
            current_elapsed_ns: self.inner.started_at.elapsed().as_nanos() as u64,
            status: aggregate_status(&types),
            types: types.iter().map(TrackedTypeJson::from).collect(),
        }
    }

    /// Returns a receiver of every mutation applied from now on.
    ///
    /// The queue is unbounded: a receiver that is kept alive must be drained,
    /// or it grows with every mutation. The registry only prunes receivers
    /// that have been dropped, on the next mutation.
    pub fn subscribe(&self) -> Receiver<RegistryEvent> {
        let (tx, rx) = unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Spawns a background thread that logs leak status transitions.
    pub fn watch(&self) -> StatusWatcher {
        StatusWatcher::spawn(self)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> InstanceId {
        InstanceId::from_raw(raw)
    }

    #[test]
    fn empty_registry_is_sealed() {
        let registry = Registry::new();
        assert_eq!(registry.status(), LeakStatus::Sealed);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn widget_scenario() {
        let registry = Registry::new();

        let a = registry.register_instance(id(1), "Widget", 2);
        let _b = registry.register_instance(id(2), "Widget", 2);

        let widget = registry.get("Widget").unwrap();
        assert_eq!(widget.current_count(), 2);
        assert!(!widget.is_over_limit());
        assert_eq!(registry.status(), LeakStatus::Sealed);

        let _c = registry.register_instance(id(3), "Widget", 2);
        let widget = registry.get("Widget").unwrap();
        assert_eq!(widget.current_count(), 3);
        assert!(widget.is_over_limit());
        assert_eq!(registry.status(), LeakStatus::Leaking);

        drop(a);
        let widget = registry.get("Widget").unwrap();
        assert_eq!(widget.current_count(), 2);
        assert!(!widget.is_live(id(1)));
        assert!(!widget.is_over_limit());
        assert_eq!(registry.status(), LeakStatus::Sealed);
    }

    #[test]
    fn lowering_the_max_flips_over_limit_only() {
        let registry = Registry::new();
        let _guard = registry.register_instance(id(7), "Widget", 4);

        registry.change_max_allowed("Widget", 0);

        let widget = registry.get("Widget").unwrap();
        assert!(widget.is_over_limit());
        assert_eq!(widget.current_count(), 1);
        assert_eq!(widget.live_instance_ids(), vec![id(7)]);
        assert_eq!(registry.status(), LeakStatus::Leaking);
    }

    #[test]
    fn later_registrations_overwrite_the_max() {
        let registry = Registry::new();
        let _a = registry.register_instance(id(1), "Widget", 8);
        let _b = registry.register_instance(id(2), "Widget", 1);

        assert_eq!(registry.get("Widget").unwrap().max_allowed(), 1);
        assert_eq!(registry.status(), LeakStatus::Leaking);
    }

    #[test]
    fn changing_an_unknown_type_is_a_no_op() {
        let registry = Registry::new();
        let _guard = registry.register_instance(id(1), "Widget", 3);
        let events = registry.subscribe();
        let before = registry.report();

        registry.change_max_allowed("Gadget", 0);

        let after = registry.report();
        assert_eq!(before.types, after.types);
        assert_eq!(before.status, after.status);
        assert!(registry.get("Gadget").is_none());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn double_deregistration_is_ignored() {
        let registry = Registry::new();
        let _keep = registry.register_instance(id(1), "Widget", 3);
        let gone = registry.register_instance(id(2), "Widget", 3);
        drop(gone);

        registry.deregister_instance(id(2), "Widget");
        registry.deregister_instance(id(2), "Nope");

        let widget = registry.get("Widget").unwrap();
        assert_eq!(widget.current_count(), 1);
        assert_eq!(widget.live_instance_ids(), vec![id(1)]);
    }

    #[test]
    fn types_stay_listed_at_zero() {
        let registry = Registry::new();
        drop(registry.register_instance(id(1), "Widget", 3));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].fraction_string(), "0 / 3");
    }

    #[test]
    fn snapshot_is_sorted_by_name() {
        let registry = Registry::new();
        let _c = registry.register_instance(id(1), "Gamma", 1);
        let _a = registry.register_instance(id(2), "Alpha", 1);
        let _b = registry.register_instance(id(3), "Beta", 1);

        let names: Vec<String> = registry
            .snapshot()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, ["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn events_follow_mutation_order() {
        let registry = Registry::new();
        let events = registry.subscribe();

        let a = registry.register_instance(id(1), "Widget", 1);
        let _b = registry.register_instance(id(2), "Widget", 1);
        registry.change_max_allowed("Widget", 5);
        drop(a);

        let received: Vec<RegistryEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                RegistryEvent::Registered {
                    type_name: "Widget".to_string(),
                    id: id(1),
                    current_count: 1,
                    status: LeakStatus::Sealed,
                },
                RegistryEvent::Registered {
                    type_name: "Widget".to_string(),
                    id: id(2),
                    current_count: 2,
                    status: LeakStatus::Leaking,
                },
                RegistryEvent::MaxAllowedChanged {
                    type_name: "Widget".to_string(),
                    max_allowed: 5,
                    status: LeakStatus::Sealed,
                },
                RegistryEvent::Deregistered {
                    type_name: "Widget".to_string(),
                    id: id(1),
                    current_count: 1,
                    status: LeakStatus::Sealed,
                },
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let registry = Registry::new();
        let kept = registry.subscribe();
        drop(registry.subscribe());

        let _guard = registry.register_instance(id(1), "Widget", 1);

        assert_eq!(registry.lock().subscribers.len(), 1);
        assert_eq!(kept.try_iter().count(), 1);
    }

    #[test]
    fn undrained_subscribers_buffer_until_dropped() {
        let registry = Registry::new();
        let idle = registry.subscribe();

        for raw in 1..=3 {
            drop(registry.register_instance(id(raw), "Widget", 1));
        }
        assert_eq!(idle.len(), 6);

        drop(idle);
        let _guard = registry.register_instance(id(4), "Widget", 1);
        assert!(registry.lock().subscribers.is_empty());
    }

    #[test]
    fn report_matches_snapshot() {
        let registry = Registry::new();
        let _a = registry.register_instance(id(1), "Widget", 0);

        let report = registry.report();
        assert_eq!(report.status, LeakStatus::Leaking);
        assert_eq!(report.types.len(), 1);
        assert_eq!(report.types[0].name, "Widget");
        assert!(report.types[0].is_over_limit);
        assert_eq!(report.types[0].live_instance_ids, vec![id(1)]);
    }

    #[test]
    fn registry_is_send_sync() {
        fn is_send_sync<T: Send + Sync>() {}
        is_send_sync::<Registry>();
    }
}
