#[derive(leakseal::Trackable)]
#[trackable(name = "Connection", max = 1)]
struct Connection {
    port: u16,
}

#[leakseal::main(format = "json-pretty")]
fn main() {
    let first = leakseal::Tracked::new(Connection { port: 5432 });
    let second = leakseal::Tracked::new(Connection { port: 5433 });
    println!("ports: {} {}", first.port, second.port);

    std::mem::forget(first);
    std::mem::forget(second);
}
