// Usage: cargo run --example producer_consumer -- <num_messages> [capacity]
//
// A producer thread streams "index:sha256(message_index)" lines through the
// pipe; the consumer re-hashes each index and checks the digest. Ctrl+C
// closes the pipe, which ends both sides cleanly.

use dmxp_pipe::PipeBuilder;
use sha2::{Digest, Sha256};
use std::env;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::thread;

fn digest(i: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("message_{}", i).as_bytes());
    format!("{:x}", hasher.finalize())
}

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <num_messages> [capacity]", args[0]);
        std::process::exit(1);
    }
    let num_messages: usize = args[1].parse().unwrap_or(1000);
    let capacity: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);

    let writer = Arc::new(
        PipeBuilder::new()
            .with_capacity(capacity)
            .build()
            .map_err(std::io::Error::from)?,
    );
    let reader = writer.derive(false);
    println!("Pipe: capacity {} bytes", writer.capacity());

    // Handle Ctrl+C to shut the pipe down
    let closer = writer.clone();
    ctrlc::set_handler(move || {
        let _ = closer.close();
    })
    .expect("Error setting Ctrl+C handler");

    let producer = {
        let writer = writer.clone();
        thread::spawn(move || -> std::io::Result<usize> {
            let start = std::time::Instant::now();
            let mut sent = 0;
            let mut out = &*writer;
            for i in 0..num_messages {
                let line = format!("{}:{}\n", i, digest(i));
                if let Err(e) = out.write_all(line.as_bytes()) {
                    eprintln!("Producer: stopped after {} messages: {}", sent, e);
                    break;
                }
                sent += 1;
            }
            let _ = writer.close();
            println!("Producer: sent {} messages in {:.2?}", sent, start.elapsed());
            Ok(sent)
        })
    };

    let mut received = 0;
    let mut mismatches = 0;
    for line in BufReader::new(&reader).lines() {
        let line = line?;
        let Some((idx, hash)) = line.split_once(':') else {
            mismatches += 1;
            continue;
        };
        match idx.parse::<usize>() {
            Ok(i) if digest(i) == hash => received += 1,
            _ => mismatches += 1,
        }
    }

    let sent = producer.join().expect("producer panicked")?;
    println!(
        "Consumer: verified {} / {} messages, {} mismatches",
        received, sent, mismatches
    );
    Ok(())
}
