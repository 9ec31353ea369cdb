// Randomised and scenario checks of the occupancy / ordering properties.

use dmxp_pipe::Core::normalize_capacity;
use dmxp_pipe::{CancelToken, PipeBuilder};
use serial_test::serial;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn capacity_normalisation() {
    assert_eq!(normalize_capacity(0).unwrap().size(), 32768);
    assert_eq!(normalize_capacity(5).unwrap().size(), 8);
    assert_eq!(normalize_capacity(1000).unwrap().size(), 1024);
    assert_eq!(normalize_capacity(1024).unwrap().size(), 1024);
}

#[test]
fn occupancy_matches_produced_minus_consumed() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..20 {
        let pipe = PipeBuilder::new()
            .with_capacity(rng.usize(8..=256))
            .build()
            .unwrap();
        let cap = pipe.capacity();
        let mut produced = 0usize;
        let mut consumed = 0usize;
        let mut next_out = 0u8;
        let mut next_in = 0u8;

        for _ in 0..2_000 {
            let hs = pipe.load_header();
            if rng.bool() {
                let n = rng.usize(0..=hs.free(cap));
                let chunk: Vec<u8> = (0..n)
                    .map(|_| {
                        let b = next_out;
                        next_out = next_out.wrapping_add(1);
                        b
                    })
                    .collect();
                assert_eq!(pipe.write(&chunk).unwrap(), n);
                produced += n;
            } else if hs.available > 0 {
                let mut buf = vec![0u8; rng.usize(1..=cap)];
                let n = pipe.read(&mut buf).unwrap();
                assert!(n >= 1 && n <= hs.available);
                for b in &buf[..n] {
                    assert_eq!(*b, next_in);
                    next_in = next_in.wrapping_add(1);
                }
                consumed += n;
            }

            let hs = pipe.load_header();
            assert!(hs.available <= cap);
            assert_eq!(hs.available, produced - consumed);
        }
    }
}

#[test]
#[serial]
fn blocked_consumer_is_woken_by_producer() {
    let writer = PipeBuilder::new().with_capacity(8).build().unwrap();
    let reader = Arc::new(writer.derive(false));
    let t = {
        let reader = reader.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 8];
            let n = reader.read(&mut buf).unwrap();
            buf[..n].to_vec()
        })
    };
    thread::sleep(Duration::from_millis(50));
    writer.write(b"wake").unwrap();
    assert_eq!(t.join().unwrap(), b"wake");
}

#[test]
#[serial]
fn blocked_producer_is_woken_by_consumer() {
    let writer = Arc::new(PipeBuilder::new().with_capacity(8).build().unwrap());
    let reader = writer.derive(false);
    writer.write(&[1; 8]).unwrap();

    let t = {
        let writer = writer.clone();
        thread::spawn(move || writer.write(&[2; 3]))
    };
    thread::sleep(Duration::from_millis(50));
    assert_eq!(writer.available(), 8);

    let mut buf = [0u8; 4];
    reader.read_full(&mut buf).unwrap();
    assert_eq!(t.join().unwrap().unwrap(), 3);
    assert_eq!(writer.available(), 7);
}

#[test]
#[serial]
fn cancelled_read_leaves_pipe_untouched() {
    let pipe = Arc::new(PipeBuilder::new().with_capacity(8).build().unwrap());
    let token = CancelToken::new();
    let t = {
        let (pipe, token) = (pipe.clone(), token.clone());
        thread::spawn(move || {
            let mut buf = [0u8; 4];
            pipe.read_cancellable(&mut buf, &token)
        })
    };
    thread::sleep(Duration::from_millis(50));
    token.cancel();
    let err = t.join().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "operation canceled");

    // the pipe keeps working for everyone else
    assert!(!pipe.is_closed());
    pipe.write(b"ok").unwrap();
    let mut buf = [0u8; 2];
    assert_eq!(pipe.read(&mut buf).unwrap(), 2);
}

#[test]
#[serial]
fn cancelled_write_commits_nothing() {
    let pipe = Arc::new(PipeBuilder::new().with_capacity(8).build().unwrap());
    pipe.write(&[0; 6]).unwrap();
    let token = CancelToken::new();
    let t = {
        let (pipe, token) = (pipe.clone(), token.clone());
        thread::spawn(move || pipe.write_cancellable(&[1; 4], &token))
    };
    thread::sleep(Duration::from_millis(50));
    token.cancel();
    assert!(t.join().unwrap().unwrap_err().is_cancelled());
    assert_eq!(pipe.available(), 6);
}

#[test]
fn cancelled_token_does_not_block_ready_operations() {
    let pipe = PipeBuilder::new().with_capacity(8).build().unwrap();
    let token = CancelToken::new();
    token.cancel();
    // nothing to wait for, so the token is never consulted
    assert_eq!(pipe.write_cancellable(b"abc", &token).unwrap(), 3);
    let mut buf = [0u8; 3];
    assert_eq!(pipe.read_full_cancellable(&mut buf, &token).unwrap(), 3);
    // now a wait is needed and the token wins
    assert!(pipe.read_cancellable(&mut buf, &token).unwrap_err().is_cancelled());
}

#[test]
fn cross_handle_fifo() {
    let a = PipeBuilder::new().with_capacity(64).build().unwrap();
    let b = a.derive(false);
    let c = b.derive(true);

    a.write(b"one ").unwrap();
    c.write(b"two ").unwrap();
    a.write(b"three").unwrap();

    let mut out = Vec::new();
    let mut buf = [0u8; 5];
    while !b.is_empty() {
        let n = b.read(&mut buf).unwrap();
        out.extend_from_slice(&buf[..n]);
    }
    assert_eq!(out, b"one two three");
    assert_eq!(a.load_header(), c.load_header());
}

#[test]
fn streaming_through_sibling_handles() {
    let writer = PipeBuilder::new().with_capacity(32).build().unwrap();
    let reader = writer.derive(false);
    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

    thread::scope(|s| {
        s.spawn(|| {
            for chunk in data.chunks(13) {
                writer.write(chunk).unwrap();
            }
            writer.close().unwrap();
        });
        let got = s
            .spawn(|| {
                let mut got = Vec::with_capacity(data.len());
                let mut buf = [0u8; 7];
                while let Ok(n) = reader.read(&mut buf) {
                    got.extend_from_slice(&buf[..n]);
                }
                got
            })
            .join()
            .unwrap();
        assert_eq!(got, data);
    });
}
