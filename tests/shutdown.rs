// Close/shutdown behaviour across handles and blocked waiters.

use dmxp_pipe::PipeBuilder;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn close_twice_sequentially() {
    let pipe = PipeBuilder::new().build().unwrap();
    assert!(pipe.close().is_ok());
    assert!(pipe.close().is_ok());
    assert!(pipe.is_closed());
}

#[test]
fn concurrent_closers_release_once() {
    let pipe = Arc::new(PipeBuilder::new().synchronized(true).build().unwrap());
    let core = pipe.core().clone();
    let barrier = Arc::new(Barrier::new(8));
    let flips = Arc::new(AtomicUsize::new(0));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let (core, barrier, flips) = (core.clone(), barrier.clone(), flips.clone());
            thread::spawn(move || {
                barrier.wait();
                if core.close() {
                    flips.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(flips.load(Ordering::SeqCst), 1);
    assert!(pipe.is_closed());
    assert!(pipe.close().is_ok());
}

#[test]
fn close_preserves_cursor_and_count() {
    let pipe = PipeBuilder::new().with_capacity(16).build().unwrap();
    pipe.write(b"abcdef").unwrap();
    let mut two = [0u8; 2];
    pipe.read_full(&mut two).unwrap();
    pipe.close().unwrap();

    let hs = pipe.load_header();
    assert!(hs.closed);
    assert_eq!((hs.read_pos, hs.available), (2, 4));
}

#[test]
#[serial]
fn blocked_reader_gets_end_of_stream() {
    let pipe = Arc::new(PipeBuilder::new().with_capacity(8).build().unwrap());
    let reader = {
        let pipe = pipe.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 4];
            pipe.read(&mut buf)
        })
    };
    thread::sleep(Duration::from_millis(50));
    pipe.close().unwrap();
    assert!(reader.join().unwrap().unwrap_err().is_end_of_stream());
}

#[test]
#[serial]
fn blocked_writer_gets_end_of_stream() {
    let pipe = Arc::new(PipeBuilder::new().with_capacity(8).build().unwrap());
    pipe.write(&[0; 8]).unwrap();
    let writer = {
        let pipe = pipe.clone();
        thread::spawn(move || pipe.write(&[1]))
    };
    thread::sleep(Duration::from_millis(50));
    pipe.close().unwrap();
    assert!(writer.join().unwrap().unwrap_err().is_end_of_stream());
    // the queued byte never made it in
    assert_eq!(pipe.available(), 8);
}

#[test]
#[serial]
fn close_from_sibling_handle_wakes_every_waiter() {
    let pipe = PipeBuilder::new().with_capacity(8).build().unwrap();
    let readers: Vec<_> = (0..4).map(|_| Arc::new(pipe.derive(false))).collect();
    let threads: Vec<_> = readers
        .iter()
        .map(|h| {
            let h = h.clone();
            thread::spawn(move || {
                let mut buf = [0u8; 1];
                h.read(&mut buf)
            })
        })
        .collect();
    thread::sleep(Duration::from_millis(50));
    pipe.derive(false).close().unwrap();
    for t in threads {
        assert!(t.join().unwrap().unwrap_err().is_end_of_stream());
    }
}

#[test]
#[serial]
fn lock_waiters_on_non_closing_handle_see_end_of_stream() {
    let writer = PipeBuilder::new().with_capacity(8).build().unwrap();
    let shared = Arc::new(writer.derive(true));

    // Hold the shared handle's lock, park two more callers behind it.
    let guard_holder = {
        let shared = shared.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 1];
            shared.read(&mut buf)
        })
    };
    thread::sleep(Duration::from_millis(30));
    let waiters: Vec<_> = (0..2)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                let mut buf = [0u8; 1];
                shared.read(&mut buf)
            })
        })
        .collect();
    thread::sleep(Duration::from_millis(30));

    // Close through a different handle: the holder wakes on data-ready
    // release, then its unlock hands end-of-stream to the parked callers.
    writer.close().unwrap();
    assert!(guard_holder.join().unwrap().unwrap_err().is_end_of_stream());
    for w in waiters {
        assert!(w.join().unwrap().unwrap_err().is_end_of_stream());
    }
    assert_eq!(shared.mutex().unwrap().waiting(), 0);
}
