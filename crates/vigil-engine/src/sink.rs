//! Ready-made [`ReportSink`] implementations.

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use vigil_core::{HazardKind, HazardReport, ReportSink};

/// Keeps every delivered batch in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    batches: Mutex<Vec<Vec<HazardReport>>>,
}

impl CollectingSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every report delivered so far, in delivery order.
    pub fn reports(&self) -> Vec<HazardReport> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Kinds of every delivered report, in delivery order.
    pub fn kinds(&self) -> Vec<HazardKind> {
        self.reports().iter().map(|r| r.kind).collect()
    }

    /// Number of `deliver` calls.
    pub fn batch_count(&self) -> usize {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop everything collected.
    pub fn clear(&self) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ReportSink for CollectingSink {
    fn deliver(&self, reports: &[HazardReport]) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reports.to_vec());
    }
}

/// Writes each report through the `log` facade.
///
/// Hazards go out at `info`, input errors at `warn`. Empty batches are
/// skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn deliver(&self, reports: &[HazardReport]) {
        for report in reports {
            match report.kind {
                HazardKind::InputError => log::warn!(target: "vigil::report", "{report}"),
                _ => log::info!(target: "vigil::report", "{report}"),
            }
        }
    }
}

/// Forwards each non-empty batch to a consumer thread.
///
/// Never blocks the submitting thread: a full bounded channel or a
/// disconnected receiver drops the batch with a warning.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: Sender<Vec<HazardReport>>,
}

impl ChannelSink {
    /// An unbounded channel and its receiving end.
    pub fn unbounded() -> (Self, Receiver<Vec<HazardReport>>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    /// A channel holding at most `capacity` pending batches.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Vec<HazardReport>>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }
}

impl ReportSink for ChannelSink {
    fn deliver(&self, reports: &[HazardReport]) {
        if reports.is_empty() {
            return;
        }
        match self.tx.try_send(reports.to_vec()) {
            Ok(()) => {}
            Err(TrySendError::Full(batch)) => {
                log::warn!("report channel full, dropped {} reports", batch.len());
            }
            Err(TrySendError::Disconnected(batch)) => {
                log::warn!("report receiver gone, dropped {} reports", batch.len());
            }
        }
    }
}
