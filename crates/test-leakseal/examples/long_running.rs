use std::time::Duration;

use leakseal::TrackGuard;

struct Request {
    _tracked: TrackGuard,
}

fn main() {
    let sleep_seconds: u64 = std::env::var("TEST_SLEEP_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let mut requests = Vec::new();
    for _ in 0..3 {
        requests.push(Request {
            _tracked: leakseal::track!("Request", max = 5),
        });
    }
    let _marker = leakseal::track!(max = 0);

    println!("serving {} requests", requests.len());
    std::thread::sleep(Duration::from_secs(sleep_seconds));
}
