pub mod http;
pub mod set_max;
pub mod status;
pub mod type_info;
pub mod types;

use clap::Args;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Location of the metrics server of the inspected process.
#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    #[arg(
        long,
        default_value_t = default_metrics_port(),
        help = "Port where the metrics HTTP server is running (env: LEAKSEAL_METRICS_PORT)"
    )]
    pub metrics_port: u16,

    #[arg(
        long,
        default_value_t = default_metrics_host(),
        value_parser = validate_metrics_host,
        help = "Host URL where the metrics HTTP server is running (env: LEAKSEAL_METRICS_HOST)"
    )]
    pub metrics_host: String,
}

pub fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

fn default_metrics_port() -> u16 {
    std::env::var("LEAKSEAL_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(6790)
}

fn default_metrics_host() -> String {
    std::env::var("LEAKSEAL_METRICS_HOST").unwrap_or_else(|_| "http://localhost".to_string())
}

fn validate_metrics_host(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("metrics host cannot be empty".to_string());
    }

    let after_scheme = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .ok_or_else(|| {
            format!(
                "--metrics-host must start with 'http://' or 'https://', got: {}",
                s
            )
        })?;

    let host_part = after_scheme.split('/').next().unwrap_or("");

    if host_part.is_empty() {
        return Err("metrics host must include a hostname after the scheme".to_string());
    }

    if host_part.contains(':') {
        return Err(format!(
            "metrics host should not include a port (use --metrics-port instead), got: {}",
            s
        ));
    }

    Ok(s.trim_end_matches('/').to_string())
}
