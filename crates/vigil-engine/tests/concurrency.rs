//! Integration test: submissions from several threads.
//!
//! Each thread owns one queue and one resource, so the expected reports
//! per thread are deterministic no matter how submissions interleave.

use std::sync::Arc;
use std::thread;

use vigil_core::{
    AccessKind, HazardKind, HazardReport, QueueId, ResourceHandle, ResourceInfo, Subrange,
    SyncScope, Usage,
};
use vigil_engine::{
    AccessContext, ChannelSink, DetectorConfig, HazardDetector, RecordedCommands, SubmitBatch,
    Submission,
};
use vigil_test_utils::fixtures::transfer_to_compute;

const THREADS: u32 = 4;
const ROUNDS: u32 = 25;
const SIZE: u64 = 4096;

fn unsynchronized(buf: ResourceHandle) -> RecordedCommands {
    let mut ctx = AccessContext::new();
    ctx.begin();
    ctx.record_access(buf, Subrange::new(0, SIZE), AccessKind::Write, Usage::TRANSFER_WRITE)
        .unwrap();
    ctx.record_access(buf, Subrange::new(0, SIZE), AccessKind::Read, Usage::COMPUTE_READ)
        .unwrap();
    ctx.end().unwrap()
}

fn synchronized(buf: ResourceHandle) -> RecordedCommands {
    let mut ctx = AccessContext::new();
    ctx.begin();
    ctx.record_barrier(SyncScope::full()).unwrap();
    ctx.record_access(buf, Subrange::new(0, SIZE), AccessKind::Write, Usage::TRANSFER_WRITE)
        .unwrap();
    ctx.record_barrier(transfer_to_compute(buf, Subrange::new(0, SIZE)))
        .unwrap();
    ctx.record_access(buf, Subrange::new(0, SIZE), AccessKind::Read, Usage::COMPUTE_READ)
        .unwrap();
    ctx.end().unwrap()
}

#[test]
fn synchronized_threads_stay_clean() {
    let d = Arc::new(HazardDetector::new(DetectorConfig::default()).unwrap());
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let d = Arc::clone(&d);
            thread::spawn(move || {
                let buf = d.create_resource(&ResourceInfo::buffer(SIZE));
                let cmds = synchronized(buf);
                for _ in 0..ROUNDS {
                    let out = d.submit(
                        Submission::new(QueueId(i)).batch(SubmitBatch::new().commands(cmds.clone())),
                    );
                    assert!(out.is_clean(), "thread {i}: {:?}", out.reports);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let totals = d.metrics();
    assert_eq!(totals.submissions, (THREADS * ROUNDS) as u64);
    assert_eq!(totals.hazards, 0);
    assert_eq!(d.resource_count(), THREADS as usize);
}

#[test]
fn racing_threads_report_only_their_own_hazards() {
    let (sink, rx) = ChannelSink::unbounded();
    let d = Arc::new(
        HazardDetector::new(DetectorConfig::default())
            .unwrap()
            .with_sink(Arc::new(sink)),
    );
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let d = Arc::clone(&d);
            thread::spawn(move || {
                let buf = d.create_resource(&ResourceInfo::buffer(SIZE));
                let cmds = unsynchronized(buf);
                let mut reports: Vec<HazardReport> = Vec::new();
                for _ in 0..ROUNDS {
                    let out = d.submit(
                        Submission::new(QueueId(i)).batch(SubmitBatch::new().commands(cmds.clone())),
                    );
                    reports.extend(out.reports);
                }
                assert!(reports.iter().all(|r| r.resource == buf));
                reports
            })
        })
        .collect();

    let mut total = 0usize;
    for h in handles {
        let reports = h.join().unwrap();
        // First round: RAW. Every later round: WAR, WAW, RAW.
        assert_eq!(reports.len(), 1 + 3 * (ROUNDS as usize - 1));
        let raw = reports
            .iter()
            .filter(|r| r.kind == HazardKind::ReadAfterWrite)
            .count();
        assert_eq!(raw, ROUNDS as usize);
        total += reports.len();
    }

    let delivered: usize = rx.try_iter().map(|batch| batch.len()).sum();
    assert_eq!(delivered, total);
}

#[test]
fn threads_sharing_a_queue_get_whole_submissions() {
    let d = Arc::new(HazardDetector::new(DetectorConfig::default()).unwrap());
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let d = Arc::clone(&d);
            thread::spawn(move || {
                let buf = d.create_resource(&ResourceInfo::buffer(SIZE));
                let cmds = unsynchronized(buf);
                let mut seen = Vec::new();
                for _ in 0..ROUNDS {
                    let out = d.submit(
                        Submission::new(QueueId(0)).batch(SubmitBatch::new().commands(cmds.clone())),
                    );
                    let raw = out
                        .reports
                        .iter()
                        .find(|r| r.kind == HazardKind::ReadAfterWrite)
                        .unwrap();
                    let (write, read) = (raw.prior.unwrap().tag, raw.access.unwrap().tag);
                    // Write and read of one list are adjacent tags of one submission.
                    assert_eq!(write.submission, read.submission);
                    assert_eq!(write.sequence + 1, read.sequence);
                    assert!(out
                        .reports
                        .iter()
                        .all(|r| r.access.unwrap().tag.submission == read.submission));
                    seen.push(read.submission);
                }
                seen
            })
        })
        .collect();

    let mut submissions: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    submissions.sort_unstable();
    submissions.dedup();
    assert_eq!(submissions.len(), (THREADS * ROUNDS) as usize);
}
