//! Property tests: whole-detector behaviour over random access streams.

#![cfg(not(miri))]

use proptest::prelude::*;
use vigil_core::{AccessKind, HazardKind, QueueId, ResourceInfo, Subrange, SyncScope, Usage};
use vigil_engine::{AccessContext, DetectorConfig, HazardDetector, SubmitBatch, Submission};

const SIZE: u64 = 256;

fn arb_access() -> impl Strategy<Value = (u64, u64, bool)> {
    (0..SIZE, 1..=SIZE, any::<bool>()).prop_map(|(start, len, is_write)| {
        let end = (start + len).min(SIZE);
        (start, end.max(start + 1), is_write)
    })
}

fn usage(is_write: bool) -> (AccessKind, Usage) {
    if is_write {
        (AccessKind::Write, Usage::COMPUTE_WRITE)
    } else {
        (AccessKind::Read, Usage::COMPUTE_READ)
    }
}

proptest! {
    #[test]
    fn full_barriers_between_accesses_leave_nothing_to_report(
        accesses in prop::collection::vec(arb_access(), 1..24),
    ) {
        let d = HazardDetector::new(DetectorConfig::default()).unwrap();
        let buf = d.create_resource(&ResourceInfo::buffer(SIZE));
        let mut ctx = AccessContext::new();
        ctx.begin();
        for (start, end, is_write) in &accesses {
            let (kind, usage) = usage(*is_write);
            ctx.record_barrier(SyncScope::full()).unwrap();
            ctx.record_access(buf, Subrange::new(*start, *end), kind, usage).unwrap();
        }
        let cmds = ctx.end().unwrap();
        let out = d.submit(Submission::new(QueueId(0)).batch(SubmitBatch::new().commands(cmds)));
        prop_assert!(out.is_clean(), "{:?}", out.reports);
    }

    #[test]
    fn unsynchronized_write_then_overlapping_access_always_reports(
        (start, end, is_write) in arb_access(),
        (w_start, w_end) in (0..SIZE / 2, SIZE / 2..=SIZE),
    ) {
        let d = HazardDetector::new(DetectorConfig::default()).unwrap();
        let buf = d.create_resource(&ResourceInfo::buffer(SIZE));
        let (kind, usage) = usage(is_write);
        let mut ctx = AccessContext::new();
        ctx.begin();
        ctx.record_access(buf, Subrange::new(w_start, w_end), AccessKind::Write, Usage::TRANSFER_WRITE).unwrap();
        ctx.record_access(buf, Subrange::new(start, end), kind, usage).unwrap();
        let cmds = ctx.end().unwrap();
        let out = d.submit(Submission::new(QueueId(0)).batch(SubmitBatch::new().commands(cmds)));

        let overlap = Subrange::new(w_start, w_end).intersection(&Subrange::new(start, end));
        match overlap {
            None => prop_assert!(out.is_clean()),
            Some(bytes) => {
                prop_assert_eq!(out.reports.len(), 1);
                let expected = if is_write {
                    HazardKind::WriteAfterWrite
                } else {
                    HazardKind::ReadAfterWrite
                };
                prop_assert_eq!(out.reports[0].kind, expected);
                prop_assert_eq!(out.reports[0].subrange, bytes);
            }
        }
    }
}
