use std::thread;

use leakseal::Tracked;

#[derive(leakseal::Trackable)]
#[trackable(name = "Job", max = 4)]
struct Job {
    id: usize,
}

#[leakseal::main(format = "json")]
fn main() {
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            thread::spawn(move || {
                for i in 0..100 {
                    let job = Tracked::new(Job { id: worker * 100 + i });
                    std::hint::black_box(job.id);
                }

                // one job per worker is never finished
                std::mem::forget(Tracked::new(Job { id: worker }));
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }
}
