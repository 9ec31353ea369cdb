// Usage: cargo run --example blocking_consumer -- [readers]
//
// Several threads share one synchronized reader handle and drain a stream of
// fixed-size records until the writer closes the pipe.

use dmxp_pipe::{PipeBuilder, PipeError};
use std::env;
use std::sync::Arc;
use std::thread;

const RECORD: usize = 16;

fn main() -> Result<(), PipeError> {
    let readers: usize = env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(4);

    let writer = PipeBuilder::new().with_capacity(4096).build()?;
    let reader = Arc::new(writer.derive(true));

    println!("Blocking Consumer: {} readers waiting for records...", readers);

    let workers: Vec<_> = (0..readers)
        .map(|id| {
            let reader = reader.clone();
            thread::spawn(move || {
                let mut rec = [0u8; RECORD];
                let mut count = 0usize;
                loop {
                    match reader.read_full(&mut rec) {
                        Ok(_) => count += 1,
                        Err(e) if e.is_end_of_stream() => break,
                        Err(e) => {
                            eprintln!("Reader {}: error: {}", id, e);
                            break;
                        }
                    }
                }
                println!("Reader {}: received {} records", id, count);
                count
            })
        })
        .collect();

    for i in 0..10_000u64 {
        let mut rec = [0u8; RECORD];
        rec[..8].copy_from_slice(&i.to_le_bytes());
        writer.write(&rec)?;
    }
    writer.close()?;

    let total: usize = workers.into_iter().map(|w| w.join().unwrap_or(0)).sum();
    println!("Blocking Consumer: {} records in total", total);
    Ok(())
}
