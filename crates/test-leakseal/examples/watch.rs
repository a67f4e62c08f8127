use leakseal::Tracked;

#[derive(leakseal::Trackable)]
#[trackable(name = "Socket", max = 1)]
struct Socket;

#[leakseal::main(watch = true)]
fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(false)
        .init();

    let first = Tracked::new(Socket);
    let second = Tracked::new(Socket);
    drop(second);
    drop(first);
}
