//! RAII registration handles and the [`Trackable`] wrapper.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::instance::InstanceId;
use crate::output::shorten_type_name;
use crate::registry::Registry;

/// Proof that one instance is registered with a [`Registry`].
///
/// Dropping the guard deregisters the instance exactly once. Store it inside
/// the tracked value so the instance's own drop releases it.
#[must_use = "dropping the guard deregisters the instance immediately"]
pub struct TrackGuard {
    registry: Registry,
    type_name: String,
    id: InstanceId,
}

impl TrackGuard {
    pub(crate) fn new(registry: Registry, type_name: String, id: InstanceId) -> Self {
        Self {
            registry,
            type_name,
            id,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for TrackGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackGuard")
            .field("type_name", &self.type_name)
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for TrackGuard {
    fn drop(&mut self) {
        self.registry.deregister_instance(self.id, &self.type_name);
    }
}

/// Types whose live instances are counted when wrapped in [`Tracked`].
///
/// Can be derived with `#[derive(leakseal::Trackable)]`.
///
/// # Examples
///
/// ```rust
/// use leakseal::{Registry, Trackable, Tracked};
///
/// struct Session;
///
/// impl Trackable for Session {
///     const MAX_ALLOWED: i64 = 4;
/// }
///
/// let registry = Registry::new();
/// let session = Tracked::new_in(&registry, Session);
/// assert_eq!(registry.get(&Session::tracked_name()).unwrap().current_count(), 1);
/// drop(session);
/// assert_eq!(registry.get(&Session::tracked_name()).unwrap().current_count(), 0);
/// ```
pub trait Trackable {
    /// Live instances allowed before the type counts as leaking.
    const MAX_ALLOWED: i64;

    /// Name the type is tracked under. Defaults to the last two segments of its type path.
    fn tracked_name() -> String {
        shorten_type_name(std::any::type_name::<Self>())
    }
}

/// A value that is counted as a live instance of `T` for as long as it exists.
pub struct Tracked<T: Trackable> {
    value: T,
    guard: TrackGuard,
}

impl<T: Trackable> Tracked<T> {
    /// Wraps `value` and registers it with the process-wide registry.
    pub fn new(value: T) -> Self {
        Self::new_in(crate::global(), value)
    }

    pub fn new_in(registry: &Registry, value: T) -> Self {
        let guard = registry.register_instance(InstanceId::next(), T::tracked_name(), T::MAX_ALLOWED);
        Self { value, guard }
    }

    pub fn id(&self) -> InstanceId {
        self.guard.id()
    }

    /// Deregisters the instance and hands back the plain value.
    pub fn into_inner(self) -> T {
        let Tracked { value, guard } = self;
        drop(guard);
        value
    }
}

impl<T: Trackable> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Trackable> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

// A clone is a new live instance with its own id.
impl<T: Trackable + Clone> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        Self::new_in(self.guard.registry(), self.value.clone())
    }
}

impl<T: Trackable + fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("value", &self.value)
            .field("id", &self.guard.id())
            .finish()
    }
}

/// Registers a new instance with the process-wide registry and returns its [`TrackGuard`].
///
/// # Variants
///
/// - `track!("Name", max = N)` - tracks under an explicit type name
/// - `track!(max = N)` - tracks under the call site, e.g. `src/widgets.rs:12`
///
/// # Examples
///
/// ```rust,no_run
/// struct Widget {
///     _seal: leakseal::TrackGuard,
/// }
///
/// impl Widget {
///     fn new() -> Self {
///         Self {
///             _seal: leakseal::track!("Widget", max = 8),
///         }
///     }
/// }
/// ```
#[macro_export]
macro_rules! track {
    (max = $max:expr) => {{
        const TRACK_SOURCE: &'static str = concat!(file!(), ":", line!());
        $crate::global().register_instance(
            $crate::InstanceId::next(),
            $crate::source_label(TRACK_SOURCE),
            $max,
        )
    }};

    ($name:expr, max = $max:expr) => {{
        $crate::global().register_instance($crate::InstanceId::next(), $name, $max)
    }};
}
