use crate::output::{JsonPrettyReporter, JsonReporter, Reporter, TableReporter};
use crate::registry::Registry;
use crate::Format;

/// Builder for creating a [`LeakSealGuard`] with custom configuration.
///
/// # Examples
///
/// ```no_run
/// use leakseal::{Format, LeakSealGuardBuilder};
///
/// let _guard = LeakSealGuardBuilder::new()
///     .format(Format::JsonPretty)
///     .build();
/// // The leak report will be printed as pretty JSON when _guard is dropped
/// ```
pub struct LeakSealGuardBuilder {
    registry: Option<Registry>,
    reporter: ReporterConfig,
}

enum ReporterConfig {
    Format(Format),
    Custom(Box<dyn Reporter>),
}

impl LeakSealGuardBuilder {
    /// Create a new guard builder reporting on the process-wide registry in table format.
    pub fn new() -> Self {
        Self {
            registry: None,
            reporter: ReporterConfig::Format(Format::default()),
        }
    }

    /// Set the output format of the report.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use leakseal::{Format, LeakSealGuardBuilder};
    ///
    /// let _guard = LeakSealGuardBuilder::new()
    ///     .format(Format::Json)
    ///     .build();
    /// ```
    pub fn format(mut self, format: Format) -> Self {
        self.reporter = ReporterConfig::Format(format);
        self
    }

    /// Set a custom reporter. Overrides any format setting.
    pub fn reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = ReporterConfig::Custom(reporter);
        self
    }

    /// Report on `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: &Registry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    /// Build and return the guard.
    /// The report will be printed when the guard is dropped.
    pub fn build(self) -> LeakSealGuard {
        let reporter: Box<dyn Reporter> = match self.reporter {
            ReporterConfig::Format(Format::Table) => Box::new(TableReporter),
            ReporterConfig::Format(Format::Json) => Box::new(JsonReporter),
            ReporterConfig::Format(Format::JsonPretty) => Box::new(JsonPrettyReporter),
            ReporterConfig::Custom(reporter) => reporter,
        };

        LeakSealGuard {
            registry: self.registry.unwrap_or_else(|| crate::global().clone()),
            reporter,
        }
    }
}

impl Default for LeakSealGuardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for leak reporting.
/// When dropped, prints a summary of every tracked type of its registry.
///
/// Use [`LeakSealGuardBuilder`] to create a guard with custom configuration.
///
/// # Examples
///
/// ```no_run
/// use leakseal::LeakSealGuard;
///
/// let _guard = LeakSealGuard::new();
/// // Your code with tracked instances here
/// // The leak report will be printed when _guard is dropped
/// ```
pub struct LeakSealGuard {
    registry: Registry,
    reporter: Box<dyn Reporter>,
}

impl LeakSealGuard {
    /// Create a new guard with default settings (table format, process-wide registry).
    ///
    /// For custom configuration, use [`LeakSealGuardBuilder::new()`] instead.
    pub fn new() -> Self {
        LeakSealGuardBuilder::new().build()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for LeakSealGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LeakSealGuard {
    fn drop(&mut self) {
        let report = self.registry.report();
        if let Err(e) = self.reporter.report(&report) {
            eprintln!("[leakseal] Failed to report tracked types: {}", e);
        }
    }
}
