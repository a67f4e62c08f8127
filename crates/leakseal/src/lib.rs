//! An in-process instance lifecycle tracker that counts live instances per type and flags
//! the types holding on to more instances than they should.
//! Register instances from their constructors, keep the returned guard inside the value,
//! and read the per-type counts and the aggregate leak status at any time.
//! ## Setup & Usage
//! For a complete setup guide and examples, see the
//! [GitHub repository](https://github.com/pawurb/leakseal).

mod events;
mod guard;
mod instance;
pub mod json;
#[cfg(feature = "server")]
mod metrics_server;
mod output;
mod registry;
mod tracked;
mod tracked_type;
mod watch;

pub use events::RegistryEvent;
pub use guard::{LeakSealGuard, LeakSealGuardBuilder};
pub use instance::InstanceId;
pub use json::{LeakSealJson, LeakStatus, Route, StatusJson, TrackedTypeJson};
#[cfg(feature = "server")]
pub use metrics_server::start_metrics_server;
pub use output::{
    build_table, format_duration, format_ids, shorten_type_name, source_label,
    JsonPrettyReporter, JsonReporter, Reporter, TableReporter,
};
pub use registry::{global, Registry};
pub use tracked::{TrackGuard, Trackable, Tracked};
pub use watch::StatusWatcher;

pub use leakseal_macros::{main, Trackable};

/// Output format for leak reports.
///
/// # Variants
///
/// * `Table` - Human-readable table format (default)
/// * `Json` - Compact JSON format (single line)
/// * `JsonPretty` - Pretty-printed JSON format with indentation
///
/// # Examples
///
/// ```rust,no_run
/// use leakseal::{Format, LeakSealGuardBuilder};
///
/// let _guard = LeakSealGuardBuilder::new()
///     .format(Format::JsonPretty)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Table,
    Json,
    JsonPretty,
}
