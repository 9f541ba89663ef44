//! End-to-end queue scenarios through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use lattice_queue::{MpmcQueue, spsc};

// ============================================================================
// SPSC
// ============================================================================

#[test]
fn spsc_drains_fifo() {
    let (mut tx, mut rx) = spsc::ring_buffer::<u32>(8);

    for i in 0..8 {
        assert!(tx.push(i).is_ok());
    }
    // The ninth push must fail before anything is popped.
    assert!(tx.push(8).is_err());

    for i in 0..8 {
        assert_eq!(rx.pop(), Some(i));
    }
    assert_eq!(rx.pop(), None);
}

#[test]
fn spsc_pipeline_with_batches() {
    const COUNT: u64 = 50_000;

    let (mut tx, mut rx) = spsc::ring_buffer::<u64>(256);

    let producer = thread::spawn(move || {
        let mut next = 0u64;
        while next < COUNT {
            next += tx.push_iter(next..COUNT) as u64;
        }
    });

    let consumer = thread::spawn(move || {
        let mut out = [0u64; 32];
        let mut expected = 0u64;
        while expected < COUNT {
            let popped = rx.pop_slice(&mut out);
            for value in &out[..popped] {
                assert_eq!(*value, expected);
                expected += 1;
            }
        }
    });

    producer.join().unwrap();
    consumer.join().unwrap();
}

// ============================================================================
// MPMC
// ============================================================================

#[test]
fn mpmc_multiset_is_preserved() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 50_000;

    let q = Arc::new(MpmcQueue::<usize>::new(1024));
    let counts: Arc<Box<[AtomicUsize]>> = Arc::new(
        (0..PER_PRODUCER)
            .map(|_| AtomicUsize::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice(),
    );
    let popped = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    while q.push(i).is_err() {
                        std::hint::spin_loop();
                    }
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let q = Arc::clone(&q);
            let counts = Arc::clone(&counts);
            let popped = Arc::clone(&popped);
            thread::spawn(move || {
                loop {
                    if popped.load(Ordering::SeqCst) >= PRODUCERS * PER_PRODUCER {
                        break;
                    }
                    if let Some(value) = q.pop() {
                        counts[value].fetch_add(1, Ordering::SeqCst);
                        popped.fetch_add(1, Ordering::SeqCst);
                    } else {
                        std::hint::spin_loop();
                    }
                }
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    for c in consumers {
        c.join().unwrap();
    }

    for count in counts.iter() {
        assert_eq!(count.load(Ordering::SeqCst), PRODUCERS);
    }
}

#[test]
fn spsc_feeds_mpmc_fan_out() {
    const COUNT: usize = 20_000;
    const WORKERS: usize = 3;

    let (mut tx, mut rx) = spsc::ring_buffer::<usize>(128);
    let work = Arc::new(MpmcQueue::<usize>::new(256));
    let done = Arc::new(AtomicUsize::new(0));

    let source = thread::spawn(move || {
        for i in 0..COUNT {
            while tx.push(i).is_err() {
                std::hint::spin_loop();
            }
        }
    });

    let router = {
        let work = Arc::clone(&work);
        thread::spawn(move || {
            let mut routed = 0;
            while routed < COUNT {
                if let Some(value) = rx.pop() {
                    while work.push(value).is_err() {
                        std::hint::spin_loop();
                    }
                    routed += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
        })
    };

    let workers: Vec<_> = (0..WORKERS)
        .map(|_| {
            let work = Arc::clone(&work);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                loop {
                    if done.load(Ordering::SeqCst) >= COUNT {
                        break;
                    }
                    if work.pop().is_some() {
                        done.fetch_add(1, Ordering::SeqCst);
                    } else {
                        std::hint::spin_loop();
                    }
                }
            })
        })
        .collect();

    source.join().unwrap();
    router.join().unwrap();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(done.load(Ordering::SeqCst), COUNT);
}
