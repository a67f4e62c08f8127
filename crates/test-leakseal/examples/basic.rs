use leakseal::TrackGuard;

struct Widget {
    color: u8,
    _tracked: TrackGuard,
}

impl Widget {
    fn new(color: u8) -> Self {
        Self {
            color,
            _tracked: leakseal::track!("Widget", max = 2),
        }
    }
}

struct Session {
    _tracked: TrackGuard,
}

impl Session {
    fn open() -> Self {
        Self {
            _tracked: leakseal::track!("Session", max = 4),
        }
    }
}

fn main() {
    let _leakseal = leakseal::LeakSealGuard::new();

    for _ in 0..3 {
        let session = Session::open();
        drop(session);
    }

    let widgets: Vec<Widget> = (0..3).map(Widget::new).collect();
    let colors: u32 = widgets.iter().map(|w| u32::from(w.color)).sum();
    println!("widget colors: {}", colors);

    // never deregistered
    std::mem::forget(widgets);
}
