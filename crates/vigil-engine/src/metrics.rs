//! Per-submission and cumulative detector metrics.
//!
//! [`SubmitMetrics`] is returned with every submission's reports.
//! [`DetectorMetrics`] keeps lock-free running totals across submissions.

use std::sync::atomic::{AtomicU64, Ordering};

use vigil_core::HazardKind;

/// Counters collected while replaying one submission (or one host fence wait).
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitMetrics {
    /// Wall-clock time for the whole call, in microseconds.
    pub total_us: u64,
    /// Recorded events replayed (accesses and in-recording sync ops).
    pub events_replayed: u32,
    /// Accesses evaluated against a timeline.
    pub accesses: u32,
    /// Sync ops whose scope was applied to the timelines.
    pub scopes_applied: u32,
    /// Retained accesses captured by those scopes.
    pub captures: u64,
    /// `ReadAfterWrite` reports.
    pub read_after_write: u32,
    /// `WriteAfterWrite` reports.
    pub write_after_write: u32,
    /// `WriteAfterRead` reports.
    pub write_after_read: u32,
    /// `OrderedButNotVisible` reports.
    pub ordered_not_visible: u32,
    /// `QueueOwnershipMismatch` reports.
    pub ownership_mismatches: u32,
    /// Skipped malformed inputs.
    pub input_errors: u32,
}

impl SubmitMetrics {
    /// Count one report of `kind`.
    pub fn count(&mut self, kind: HazardKind) {
        let slot = match kind {
            HazardKind::ReadAfterWrite => &mut self.read_after_write,
            HazardKind::WriteAfterWrite => &mut self.write_after_write,
            HazardKind::WriteAfterRead => &mut self.write_after_read,
            HazardKind::OrderedButNotVisible => &mut self.ordered_not_visible,
            HazardKind::QueueOwnershipMismatch => &mut self.ownership_mismatches,
            HazardKind::InputError => &mut self.input_errors,
        };
        *slot += 1;
    }

    /// Reports of every kind except input errors.
    pub fn hazards(&self) -> u32 {
        self.read_after_write
            + self.write_after_write
            + self.write_after_read
            + self.ordered_not_visible
            + self.ownership_mismatches
    }
}

/// Running totals across every submission a detector has processed.
#[derive(Debug, Default)]
pub struct DetectorMetrics {
    submissions: AtomicU64,
    fence_waits: AtomicU64,
    events_replayed: AtomicU64,
    hazards: AtomicU64,
    input_errors: AtomicU64,
}

/// Point-in-time copy of [`DetectorMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectorTotals {
    /// Submissions processed.
    pub submissions: u64,
    /// Host fence waits processed.
    pub fence_waits: u64,
    /// Recorded events replayed.
    pub events_replayed: u64,
    /// Hazard reports produced, excluding input errors.
    pub hazards: u64,
    /// Input-error reports produced.
    pub input_errors: u64,
}

impl DetectorMetrics {
    /// Fold one submission's counters in.
    pub fn add_submission(&self, m: &SubmitMetrics) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        self.add_common(m);
    }

    /// Fold one host fence wait's counters in.
    pub fn add_fence_wait(&self, m: &SubmitMetrics) {
        self.fence_waits.fetch_add(1, Ordering::Relaxed);
        self.add_common(m);
    }

    fn add_common(&self, m: &SubmitMetrics) {
        self.events_replayed
            .fetch_add(m.events_replayed as u64, Ordering::Relaxed);
        self.hazards.fetch_add(m.hazards() as u64, Ordering::Relaxed);
        self.input_errors
            .fetch_add(m.input_errors as u64, Ordering::Relaxed);
    }

    /// Snapshot the totals.
    pub fn totals(&self) -> DetectorTotals {
        DetectorTotals {
            submissions: self.submissions.load(Ordering::Relaxed),
            fence_waits: self.fence_waits.load(Ordering::Relaxed),
            events_replayed: self.events_replayed.load(Ordering::Relaxed),
            hazards: self.hazards.load(Ordering::Relaxed),
            input_errors: self.input_errors.load(Ordering::Relaxed),
        }
    }
}
