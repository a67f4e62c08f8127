use colored::*;
use prettytable::{color, Attr, Cell, Row, Table};
use std::sync::LazyLock;

use crate::instance::InstanceId;
use crate::json::{LeakSealJson, TrackedTypeJson};

const DEFAULT_IDS_LIMIT: usize = 8;

/// Maximum number of instance ids printed per row in table output.
pub(crate) static IDS_LIMIT: LazyLock<usize> = LazyLock::new(|| {
    std::env::var("LEAKSEAL_IDS_LIMIT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_IDS_LIMIT)
});

/// Trait for implementing custom leak report output.
///
/// Implement this trait to control how a registry report is displayed or stored,
/// e.g. to forward it to a logging system or fail a CI job on leaks.
///
/// # Examples
///
/// ```rust
/// use leakseal::{LeakSealJson, Reporter};
/// use std::error::Error;
///
/// struct FailOnLeak;
///
/// impl Reporter for FailOnLeak {
///     fn report(&self, report: &LeakSealJson) -> Result<(), Box<dyn Error>> {
///         if report.status.is_leaking() {
///             return Err("leak detected".into());
///         }
///         Ok(())
///     }
/// }
/// ```
///
/// # See Also
///
/// * [`LeakSealGuardBuilder::reporter`](crate::LeakSealGuardBuilder::reporter) - Method to set custom reporter
pub trait Reporter: Send + Sync {
    fn report(&self, report: &LeakSealJson) -> Result<(), Box<dyn std::error::Error>>;
}

/// Human-readable table, one row per tracked type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableReporter;

impl Reporter for TableReporter {
    fn report(&self, report: &LeakSealJson) -> Result<(), Box<dyn std::error::Error>> {
        if report.types.is_empty() {
            display_no_tracked_types_message();
            return Ok(());
        }

        display_table(report);
        Ok(())
    }
}

/// Compact single-line JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn report(&self, report: &LeakSealJson) -> Result<(), Box<dyn std::error::Error>> {
        println!("{}", serde_json::to_string(report)?);
        Ok(())
    }
}

/// Indented JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPrettyReporter;

impl Reporter for JsonPrettyReporter {
    fn report(&self, report: &LeakSealJson) -> Result<(), Box<dyn std::error::Error>> {
        println!("{}", serde_json::to_string_pretty(report)?);
        Ok(())
    }
}

pub(crate) fn display_table(report: &LeakSealJson) {
    let use_colors = std::env::var("NO_COLOR").is_err();

    let over_limit = report.types.iter().filter(|t| t.is_over_limit).count();
    let status = if report.status.is_leaking() {
        report.status.as_str().to_uppercase().red().bold()
    } else {
        report.status.as_str().to_uppercase().green().bold()
    };

    println!(
        "\n{} {} - {} of {} tracked types over limit (runtime: {})",
        "[leakseal]".blue().bold(),
        status,
        over_limit,
        report.types.len(),
        format_duration(report.current_elapsed_ns)
    );

    build_table(&report.types, use_colors).printstd();
}

/// Builds the per-type table without printing it.
pub fn build_table(types: &[TrackedTypeJson], use_colors: bool) -> Table {
    let mut table = Table::new();

    let header_cells: Vec<Cell> = ["Type", "Live", "Max", "Status", "Instances"]
        .into_iter()
        .map(|header| {
            if use_colors {
                Cell::new(header)
                    .with_style(Attr::Bold)
                    .with_style(Attr::ForegroundColor(color::CYAN))
            } else {
                Cell::new(header).with_style(Attr::Bold)
            }
        })
        .collect();
    table.add_row(Row::new(header_cells));

    for tracked in types {
        let (label, status_color) = if tracked.is_over_limit {
            ("over limit", color::RED)
        } else {
            ("ok", color::GREEN)
        };
        let status_cell = if use_colors {
            Cell::new(label).with_style(Attr::ForegroundColor(status_color))
        } else {
            Cell::new(label)
        };

        table.add_row(Row::new(vec![
            Cell::new(&tracked.name),
            Cell::new(&tracked.current_count.to_string()),
            Cell::new(&tracked.max_allowed.to_string()),
            status_cell,
            Cell::new(&format_ids(&tracked.live_instance_ids, *IDS_LIMIT)),
        ]));
    }

    table
}

fn display_no_tracked_types_message() {
    println!(
        "\n{} No tracked instances found.",
        "[leakseal]".blue().bold()
    );
    println!();
    println!(
        "To start tracking, register instances from their constructors with {}:",
        "leakseal::track!".cyan().bold()
    );
    println!();
    println!("  {}", "struct Widget { _seal: leakseal::TrackGuard }".cyan());
    println!();
    println!("  {}", "let widget = Widget {".cyan());
    println!("  {}", "    _seal: leakseal::track!(\"Widget\", max = 8),".cyan());
    println!("  {}", "};".cyan());
    println!();
}

/// Joins ids for display, eliding everything past `limit` (0 means no limit).
pub fn format_ids(ids: &[InstanceId], limit: usize) -> String {
    if limit == 0 || ids.len() <= limit {
        return ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
    }

    let shown = ids[..limit]
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} (+{} more)", shown, ids.len() - limit)
}

/// Formats a duration in nanoseconds into a human-readable string with appropriate units.
pub fn format_duration(ns: u64) -> String {
    if ns < 1_000 {
        format!("{} ns", ns)
    } else if ns < 1_000_000 {
        format!("{:.2} µs", ns as f64 / 1_000.0)
    } else if ns < 1_000_000_000 {
        format!("{:.2} ms", ns as f64 / 1_000_000.0)
    } else {
        format!("{:.2} s", ns as f64 / 1_000_000_000.0)
    }
}

/// Keeps the last two `::` segments of a type path.
///
/// Generic arguments are kept verbatim, so `a::b::Pool<alloc::string::String>`
/// becomes `b::Pool<alloc::string::String>`. Tuples, slices, arrays, references
/// and pointers are returned unchanged.
pub fn shorten_type_name(type_name: &str) -> String {
    if !type_name.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        return type_name.to_string();
    }

    let (path, generics) = type_name.split_at(type_name.find('<').unwrap_or(type_name.len()));
    let parts: Vec<&str> = path.split("::").collect();
    if parts.len() > 2 {
        format!("{}{}", parts[parts.len() - 2..].join("::"), generics)
    } else {
        type_name.to_string()
    }
}

/// Turns a `file!():line!()` source location into a short `dir/file.rs:line` label.
#[doc(hidden)]
pub fn source_label(source: &str) -> String {
    if let Some(pos) = source.rfind(':') {
        let (path, line_part) = source.split_at(pos);
        let line = &line_part[1..];
        format!("{}:{}", extract_filename(path), line)
    } else {
        extract_filename(source)
    }
}

fn extract_filename(path: &str) -> String {
    let components: Vec<&str> = path.split('/').collect();
    if components.len() >= 2 {
        format!(
            "{}/{}",
            components[components.len() - 2],
            components[components.len() - 1]
        )
    } else {
        path.to_string()
    }
}
