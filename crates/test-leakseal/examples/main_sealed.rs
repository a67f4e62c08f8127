use leakseal::Tracked;

#[derive(leakseal::Trackable, Clone)]
#[trackable(max = 2)]
struct Buffer {
    bytes: Vec<u8>,
}

#[leakseal::main]
fn main() {
    let buffer = Tracked::new(Buffer {
        bytes: vec![1, 2, 3],
    });
    let copy = buffer.clone();
    println!("buffer sizes: {} {}", buffer.bytes.len(), copy.bytes.len());
}
