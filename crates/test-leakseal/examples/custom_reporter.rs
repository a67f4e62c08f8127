use leakseal::{LeakSealJson, Reporter, Tracked};
use tracing::{info, warn};

struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, report: &LeakSealJson) -> Result<(), Box<dyn std::error::Error>> {
        info!("leakseal report: {}", report.status);

        for tracked in &report.types {
            if tracked.is_over_limit {
                warn!("{} over limit: {}", tracked.name, tracked.fraction_string());
            } else {
                info!("{} ok: {}", tracked.name, tracked.fraction_string());
            }
        }

        Ok(())
    }
}

#[derive(leakseal::Trackable)]
#[trackable(name = "Handle", max = 3)]
struct Handle;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(false)
        .init();

    let _leakseal = leakseal::LeakSealGuardBuilder::new()
        .reporter(Box::new(TracingReporter))
        .build();

    let handles: Vec<_> = (0..2).map(|_| Tracked::new(Handle)).collect();
    std::mem::forget(handles);
}
