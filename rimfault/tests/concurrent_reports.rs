// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rimfault::prelude::*;

const THREADS: usize = 8;
const PER_THREAD: usize = 500;

#[test]
fn racing_flag_setters_converge() {
    let sink = Arc::new(MemorySink::new());
    let fs = Filesystem::builder("pool0")
        .sink(sink.clone())
        .policy(RepairPolicy::Always)
        .build();
    let dev = fs.attach("sda");

    thread::scope(|s| {
        for t in 0..THREADS {
            let fs = &fs;
            let dev = &dev;
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    match i % 3 {
                        0 => fs.report_inconsistent(format_args!("t{t} key {i} out of order")),
                        1 => dev.report_fatal(format_args!("t{t} journal write {i}")),
                        _ => {
                            let fixed = fs.negotiator().fix_on(true, "bucket gen").unwrap();
                            assert!(fixed);
                        }
                    }
                }
            });
        }
    });

    assert_eq!(
        fs.flags(),
        FsFlags::INCONSISTENT | FsFlags::FATAL | FsFlags::FSCK_FIXED_ERRORS
    );
    assert_eq!(dev.flags(), DevFlags::FATAL | DevFlags::DEGRADED);
    // "emergency read only" is emitted by exactly one winner
    let ro = sink
        .messages()
        .iter()
        .filter(|m| m.as_str() == "emergency read only")
        .count();
    assert_eq!(ro, 1);
}

#[test]
fn throttled_io_errors_are_all_counted() {
    let sink = Arc::new(MemorySink::new());
    let fs = Filesystem::builder("pool0")
        .sink(sink.clone())
        .clock(Arc::new(ManualClock::new()))
        .ratelimit(RateLimitConfig::new(Duration::from_secs(5), 10))
        .build();
    let dev = fs.attach("sdb");

    thread::scope(|s| {
        for _ in 0..THREADS {
            let dev = &dev;
            s.spawn(move || {
                for sector in 0..PER_THREAD {
                    dev.report_nonfatal_io(format_args!("read sector {sector}"));
                }
            });
        }
    });

    let total = (THREADS * PER_THREAD) as u64;
    assert_eq!(dev.io_errors(), total);
    assert!(dev.is_degraded());
    assert_eq!(sink.len(), 10);
    assert!(!fs.is_fatal());
}
