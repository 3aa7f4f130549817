//! Queue submissions as handed to [`HazardDetector::submit`](crate::HazardDetector::submit).

use vigil_core::{ExecScope, FenceId, HazardReport, QueueId, SemaphoreId, StageSet};

use crate::context::RecordedCommands;
use crate::metrics::SubmitMetrics;

/// A semaphore wait at the start of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SemaphoreWait {
    /// The semaphore waited on.
    pub semaphore: SemaphoreId,
    /// Second scope. Without an access mask the wait orders but does not
    /// make anything visible.
    pub dst: ExecScope,
}

impl SemaphoreWait {
    /// A wait blocking every stage with no memory declaration.
    pub fn bare(semaphore: SemaphoreId) -> Self {
        Self {
            semaphore,
            dst: ExecScope::execution(StageSet::ALL_COMMANDS),
        }
    }
}

/// A semaphore signal at the end of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SemaphoreSignal {
    /// The semaphore signaled.
    pub semaphore: SemaphoreId,
    /// First scope.
    pub src: ExecScope,
}

impl SemaphoreSignal {
    /// A signal waiting on every stage with no memory declaration.
    pub fn bare(semaphore: SemaphoreId) -> Self {
        Self {
            semaphore,
            src: ExecScope::execution(StageSet::ALL_COMMANDS),
        }
    }
}

/// Waits, then command lists in order, then signals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitBatch {
    /// Semaphores waited on before any command runs.
    pub waits: Vec<SemaphoreWait>,
    /// Recorded command lists, executed in order.
    pub contexts: Vec<RecordedCommands>,
    /// Semaphores signaled after every command.
    pub signals: Vec<SemaphoreSignal>,
}

impl SubmitBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a semaphore wait.
    pub fn wait(mut self, wait: SemaphoreWait) -> Self {
        self.waits.push(wait);
        self
    }

    /// Add a command list.
    pub fn commands(mut self, commands: RecordedCommands) -> Self {
        self.contexts.push(commands);
        self
    }

    /// Add a semaphore signal.
    pub fn signal(mut self, signal: SemaphoreSignal) -> Self {
        self.signals.push(signal);
        self
    }
}

/// One queue submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// Target queue.
    pub queue: QueueId,
    /// Batches in submission order.
    pub batches: Vec<SubmitBatch>,
    /// Fence signaled once every batch completes.
    pub fence: Option<FenceId>,
}

impl Submission {
    /// An empty submission to `queue`.
    pub fn new(queue: QueueId) -> Self {
        Self {
            queue,
            batches: Vec::new(),
            fence: None,
        }
    }

    /// Append a batch.
    pub fn batch(mut self, batch: SubmitBatch) -> Self {
        self.batches.push(batch);
        self
    }

    /// Signal `fence` on completion.
    pub fn fence(mut self, fence: FenceId) -> Self {
        self.fence = Some(fence);
        self
    }
}

/// Everything one submission (or host fence wait) produced.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct SubmitOutcome {
    /// Reports in replay order.
    pub reports: Vec<HazardReport>,
    /// Counters for the call.
    pub metrics: SubmitMetrics,
}

impl SubmitOutcome {
    /// Whether the call produced no reports at all.
    pub fn is_clean(&self) -> bool {
        self.reports.is_empty()
    }
}
