//! [`HazardDetector`]: replays submissions into resource timelines.
//!
//! # Locking
//!
//! Shared state is split so that submissions touching disjoint resources
//! do not serialize on one lock:
//!
//! - the timeline registry lock is held only to look up or clone handles;
//! - each timeline has its own mutex;
//! - the order tracker sits behind an `RwLock`: tag allocation and link
//!   recording take it for writing with no other lock held, timeline
//!   evaluation takes it for reading while holding that timeline's mutex;
//! - semaphore, event and fence tables share one short-lived mutex;
//! - each queue has a submit gate held for a whole [`HazardDetector::submit`]
//!   call, so concurrent submissions to one queue replay one after the
//!   other and never interleave their tags.
//!
//! No thread ever waits for a timeline while holding the tracker, so apart
//! from the outermost submit gate the order timeline → tracker is the only
//! nesting.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use indexmap::IndexMap;
use vigil_core::{
    AccessKind, AccessRecord, AffectedRanges, EventId, ExecScope, ExecutionTag, FenceId,
    HazardReport, InputError, QueueFamilyId, QueueId, ReportSink, ResourceHandle,
    ResourceMetadata, SemaphoreId, Subrange, SyncOpKind, SyncScope, Usage,
};
use vigil_timeline::{SubrangeState, TimelineOptions, TimelineRegistry};

use crate::config::{ConfigError, DetectorConfig};
use crate::context::{RecordedCommands, RecordedEvent};
use crate::metrics::{DetectorMetrics, DetectorTotals, SubmitMetrics};
use crate::submission::{SemaphoreWait, Submission, SubmitOutcome};
use crate::tracker::SubmissionOrderTracker;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(PoisonError::into_inner)
}

/// The first half of a semaphore or event dependency, waiting for its
/// second half.
#[derive(Clone, Copy, Debug)]
struct PendingHalf {
    tag: ExecutionTag,
    src: ExecScope,
}

#[derive(Default)]
struct SyncTables {
    /// Binary semaphores: a wait consumes the signal.
    semaphores: IndexMap<SemaphoreId, PendingHalf>,
    /// Events stay set once set.
    events: IndexMap<EventId, PendingHalf>,
    /// Fence → tag of its signal.
    fences: IndexMap<FenceId, ExecutionTag>,
}

/// What a replay pass was for, for logging.
enum Origin {
    Submission { queue: QueueId, index: u64 },
    FenceWait(FenceId),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submission { queue, index } => write!(f, "submission {index} on {queue}"),
            Self::FenceWait(fence) => write!(f, "host wait on {fence}"),
        }
    }
}

/// Per-call accumulator.
#[derive(Default)]
struct Replay {
    reports: Vec<HazardReport>,
    metrics: SubmitMetrics,
}

impl Replay {
    fn input(&mut self, resource: ResourceHandle, subrange: Subrange, error: InputError) {
        log::warn!("skipped malformed input on {resource}: {error}");
        self.reports.push(HazardReport::input(resource, subrange, error));
    }

    fn sync_input(&mut self, error: InputError) {
        self.input(ResourceHandle::NONE, Subrange::new(0, 0), error);
    }
}

/// Validates explicitly synchronized submissions against accumulated
/// resource history.
pub struct HazardDetector {
    config: DetectorConfig,
    options: TimelineOptions,
    registry: Mutex<TimelineRegistry>,
    tracker: RwLock<SubmissionOrderTracker>,
    sync: Mutex<SyncTables>,
    families: RwLock<IndexMap<QueueId, QueueFamilyId>>,
    gates: Mutex<IndexMap<QueueId, Arc<Mutex<()>>>>,
    sink: Option<Arc<dyn ReportSink>>,
    metrics: DetectorMetrics,
}

impl fmt::Debug for HazardDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HazardDetector")
            .field("config", &self.config)
            .field("resources", &lock(&self.registry).len())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl HazardDetector {
    /// A detector with no resources, queues, or sink.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            options: config.timeline_options(),
            tracker: RwLock::new(SubmissionOrderTracker::new(config.max_link_walk)),
            config,
            registry: Mutex::new(TimelineRegistry::new()),
            sync: Mutex::new(SyncTables::default()),
            families: RwLock::new(IndexMap::new()),
            gates: Mutex::new(IndexMap::new()),
            sink: None,
            metrics: DetectorMetrics::default(),
        })
    }

    /// Deliver every call's reports to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    // ── Collaborator notifications ─────────────────────────────────

    /// Declare which family `queue` belongs to. Unregistered queues are
    /// exempt from ownership checks.
    pub fn register_queue(&self, queue: QueueId, family: QueueFamilyId) -> Result<(), InputError> {
        if queue.is_host() {
            return Err(InputError::UnknownQueue { queue });
        }
        write(&self.families).insert(queue, family);
        Ok(())
    }

    fn family(&self, queue: QueueId) -> Option<QueueFamilyId> {
        read(&self.families).get(&queue).copied()
    }

    /// Allocate a timeline for a newly created resource.
    pub fn create_resource(&self, metadata: &dyn ResourceMetadata) -> ResourceHandle {
        let handle = lock(&self.registry).create(metadata);
        log::debug!("created {handle} with extent {}", metadata.extent());
        handle
    }

    /// Free a destroyed resource's timeline. Returns `false` for a stale
    /// or unknown handle.
    pub fn destroy_resource(&self, handle: ResourceHandle) -> bool {
        let freed = lock(&self.registry).destroy(handle).is_some();
        if freed {
            log::debug!("destroyed {handle}");
        }
        freed
    }

    /// Number of live resources.
    pub fn resource_count(&self) -> usize {
        lock(&self.registry).len()
    }

    // ── Submission ─────────────────────────────────────────────────

    /// Replay one queue submission and report every hazard it exposes.
    ///
    /// Never stops early: every batch and every event is processed, and a
    /// malformed event is reported and skipped on its own. Calls for the
    /// same queue are serialized; calls for different queues run
    /// concurrently.
    pub fn submit(&self, submission: Submission) -> SubmitOutcome {
        let start = Instant::now();
        let mut replay = Replay::default();
        let queue = submission.queue;
        if queue.is_host() {
            replay.sync_input(InputError::UnknownQueue { queue });
            return self.finish(replay, start, Origin::Submission { queue, index: 0 });
        }
        let gate = Arc::clone(lock(&self.gates).entry(queue).or_default());
        let _serial = lock(&gate);
        let family = self.family(queue);
        let index = write(&self.tracker).begin_submission(queue);

        for batch in &submission.batches {
            for wait in &batch.waits {
                self.replay_wait(&mut replay, queue, wait);
            }
            for commands in &batch.contexts {
                self.replay_commands(&mut replay, queue, family, commands);
            }
            for signal in &batch.signals {
                let tag = self.next_tag(queue);
                log::trace!("{} {} at {tag}", SyncOpKind::SemaphoreSignal, signal.semaphore);
                let pending = PendingHalf {
                    tag,
                    src: signal.src,
                };
                lock(&self.sync).semaphores.insert(signal.semaphore, pending);
            }
        }
        if let Some(fence) = submission.fence {
            let tag = self.next_tag(queue);
            log::trace!("{} {fence} at {tag}", SyncOpKind::FenceSignal);
            lock(&self.sync).fences.insert(fence, tag);
        }
        self.finish(replay, start, Origin::Submission { queue, index })
    }

    /// The host waited on `fence`: everything the fence covered becomes
    /// ordered before, and visible to, all work submitted afterwards.
    pub fn wait_fence(&self, fence: FenceId) -> SubmitOutcome {
        let start = Instant::now();
        let mut replay = Replay::default();
        let signal = lock(&self.sync).fences.get(&fence).copied();
        match signal {
            None => replay.sync_input(InputError::UnknownFence { fence }),
            Some(signal) => {
                let linked = write(&self.tracker).link_via_fence(signal);
                match linked {
                    Ok(host) => self.apply_everywhere(
                        &mut replay,
                        SyncOpKind::FenceWait,
                        &SyncScope::full(),
                        signal,
                        host,
                    ),
                    Err(e) => replay.sync_input(e),
                }
            }
        }
        self.finish(replay, start, Origin::FenceWait(fence))
    }

    /// Return `fence` to the unsignaled state. Returns `false` if it was
    /// never signaled.
    pub fn reset_fence(&self, fence: FenceId) -> bool {
        lock(&self.sync).fences.shift_remove(&fence).is_some()
    }

    /// Whether `a` happens-before `b` under everything submitted so far.
    pub fn precedes(&self, a: &ExecutionTag, b: &ExecutionTag) -> bool {
        read(&self.tracker).precedes(a, b)
    }

    /// Copy of a resource's stored pieces, or `None` for a stale handle.
    pub fn snapshot(&self, handle: ResourceHandle) -> Option<Vec<(Subrange, SubrangeState)>> {
        let timeline = lock(&self.registry).get(handle)?;
        let snapshot = lock(&timeline).snapshot();
        Some(snapshot)
    }

    /// Running totals across every call so far.
    pub fn metrics(&self) -> DetectorTotals {
        self.metrics.totals()
    }

    // ── Replay internals ───────────────────────────────────────────

    fn next_tag(&self, queue: QueueId) -> ExecutionTag {
        write(&self.tracker).next_tag(queue)
    }

    fn replay_wait(&self, replay: &mut Replay, queue: QueueId, wait: &SemaphoreWait) {
        let pending = lock(&self.sync).semaphores.shift_remove(&wait.semaphore);
        let tag = self.next_tag(queue);
        let Some(signal) = pending else {
            replay.sync_input(InputError::UnsignaledSemaphore {
                semaphore: wait.semaphore,
            });
            return;
        };
        let linked = write(&self.tracker).link_via_semaphore(signal.tag, tag);
        if let Err(e) = linked {
            replay.sync_input(e);
            return;
        }
        log::trace!(
            "{} {} at {tag}, signaled at {}",
            SyncOpKind::SemaphoreWait,
            wait.semaphore,
            signal.tag
        );
        // A wait without access masks on both halves orders but does not
        // make anything visible; the link alone carries that.
        if signal.src.has_memory() && wait.dst.has_memory() {
            let scope = SyncScope::barrier(signal.src, wait.dst, AffectedRanges::Global);
            self.apply_everywhere(replay, SyncOpKind::SemaphoreWait, &scope, signal.tag, tag);
        }
    }

    fn replay_commands(
        &self,
        replay: &mut Replay,
        queue: QueueId,
        family: Option<QueueFamilyId>,
        commands: &RecordedCommands,
    ) {
        for event in commands.events() {
            replay.metrics.events_replayed += 1;
            match event {
                RecordedEvent::Access {
                    resource,
                    subrange,
                    kind,
                    usage,
                } => self.replay_access(replay, queue, family, *resource, *subrange, *kind, *usage),
                RecordedEvent::Barrier(scope) => {
                    let tag = self.next_tag(queue);
                    self.apply_everywhere(replay, SyncOpKind::Barrier, scope, tag, tag);
                }
                RecordedEvent::EventSet { event, src } => {
                    let tag = self.next_tag(queue);
                    log::trace!("{} {event} at {tag}", SyncOpKind::EventSet);
                    lock(&self.sync)
                        .events
                        .insert(*event, PendingHalf { tag, src: *src });
                }
                RecordedEvent::EventWait {
                    event,
                    dst,
                    affected,
                } => {
                    let tag = self.next_tag(queue);
                    let set = lock(&self.sync).events.get(event).copied();
                    match set {
                        None => replay.sync_input(InputError::UnsetEvent { event: *event }),
                        Some(set) if set.tag.queue != queue && !self.precedes(&set.tag, &tag) => {
                            replay.sync_input(InputError::CrossQueueEvent {
                                event: *event,
                                set_on: set.tag.queue,
                                waited_on: queue,
                            });
                        }
                        Some(set) => {
                            let scope = SyncScope::barrier(set.src, *dst, affected.clone());
                            self.apply_everywhere(replay, SyncOpKind::EventWait, &scope, set.tag, tag);
                        }
                    }
                }
                RecordedEvent::Invalid { resource, error } => {
                    replay.input(*resource, Subrange::new(0, 0), error.clone());
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn replay_access(
        &self,
        replay: &mut Replay,
        queue: QueueId,
        family: Option<QueueFamilyId>,
        resource: ResourceHandle,
        subrange: Subrange,
        kind: AccessKind,
        usage: Usage,
    ) {
        let found = lock(&self.registry).get(resource);
        let Some(timeline) = found else {
            replay.input(resource, subrange, InputError::UnknownResource { resource });
            return;
        };
        let record = AccessRecord {
            kind,
            usage,
            tag: self.next_tag(queue),
            resource,
            subrange,
        };
        log::trace!("replaying {record}");
        let result = {
            let mut timeline = lock(&timeline);
            let order = read(&self.tracker);
            timeline.record_access(record, family, &self.options, &*order)
        };
        match result {
            Ok(reports) => {
                replay.metrics.accesses += 1;
                replay.reports.extend(reports);
            }
            Err(e) => replay.input(resource, subrange, e),
        }
    }

    /// Apply a sync op to every live timeline.
    fn apply_everywhere(
        &self,
        replay: &mut Replay,
        op: SyncOpKind,
        scope: &SyncScope,
        bound: ExecutionTag,
        stamp: ExecutionTag,
    ) {
        let timelines = lock(&self.registry).live();
        let mut captured = 0u64;
        for timeline in &timelines {
            let mut guard = lock(timeline);
            let order = read(&self.tracker);
            captured += guard.apply_scope(scope, &bound, &stamp, &*order) as u64;
        }
        log::trace!("{op} at {stamp} (first scope ends {bound}) captured {captured}");
        replay.metrics.scopes_applied += 1;
        replay.metrics.captures += captured;
    }

    fn finish(&self, replay: Replay, start: Instant, origin: Origin) -> SubmitOutcome {
        let Replay {
            reports,
            mut metrics,
        } = replay;
        for r in &reports {
            metrics.count(r.kind);
        }
        metrics.total_us = start.elapsed().as_micros() as u64;
        match origin {
            Origin::Submission { .. } => self.metrics.add_submission(&metrics),
            Origin::FenceWait(_) => self.metrics.add_fence_wait(&metrics),
        }
        log::debug!(
            "{origin}: {} events, {} hazards, {} input errors in {}us",
            metrics.events_replayed,
            metrics.hazards(),
            metrics.input_errors,
            metrics.total_us
        );
        if let Some(sink) = &self.sink {
            sink.deliver(&reports);
        }
        SubmitOutcome { reports, metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AccessContext;
    use crate::sink::CollectingSink;
    use crate::submission::{SemaphoreSignal, SubmitBatch};
    use vigil_core::{HazardKind, ResourceInfo, StageSet};

    const Q0: QueueId = QueueId(0);

    fn detector() -> HazardDetector {
        HazardDetector::new(DetectorConfig::default()).unwrap()
    }

    fn record(f: impl FnOnce(&mut AccessContext)) -> RecordedCommands {
        let mut ctx = AccessContext::new();
        ctx.begin();
        f(&mut ctx);
        ctx.end().unwrap()
    }

    fn submit_on(d: &HazardDetector, queue: QueueId, cmds: RecordedCommands) -> SubmitOutcome {
        d.submit(Submission::new(queue).batch(SubmitBatch::new().commands(cmds)))
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = DetectorConfig {
            max_link_walk: 0,
            ..DetectorConfig::default()
        };
        assert!(matches!(HazardDetector::new(cfg), Err(ConfigError::LinkWalkZero)));
    }

    #[test]
    fn unknown_resource_is_skipped_not_fatal() {
        let d = detector();
        let buf = d.create_resource(&ResourceInfo::buffer(64));
        let ghost = ResourceHandle::from_parts(42, 0);
        let cmds = record(|c| {
            c.record_access(ghost, Subrange::new(0, 8), AccessKind::Write, Usage::TRANSFER_WRITE)
                .unwrap();
            c.record_access(buf, Subrange::new(0, 8), AccessKind::Write, Usage::TRANSFER_WRITE)
                .unwrap();
            c.record_access(buf, Subrange::new(0, 8), AccessKind::Read, Usage::COMPUTE_READ)
                .unwrap();
        });
        let out = submit_on(&d, Q0, cmds);
        let kinds: Vec<HazardKind> = out.reports.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![HazardKind::InputError, HazardKind::ReadAfterWrite]);
        assert_eq!(out.metrics.input_errors, 1);
        assert_eq!(out.metrics.events_replayed, 3);
        assert_eq!(out.metrics.accesses, 2);
    }

    #[test]
    fn destroyed_resource_handle_goes_stale() {
        let d = detector();
        let buf = d.create_resource(&ResourceInfo::buffer(64));
        assert!(d.destroy_resource(buf));
        assert!(!d.destroy_resource(buf));
        assert!(d.snapshot(buf).is_none());
        let cmds = record(|c| {
            c.record_access(buf, Subrange::new(0, 8), AccessKind::Read, Usage::COMPUTE_READ)
                .unwrap();
        });
        let out = submit_on(&d, Q0, cmds);
        assert_eq!(
            out.reports[0].input_error,
            Some(InputError::UnknownResource { resource: buf })
        );
    }

    #[test]
    fn waiting_on_unsignaled_semaphore_is_input_error() {
        let d = detector();
        let out = d.submit(
            Submission::new(Q0).batch(SubmitBatch::new().wait(SemaphoreWait::bare(SemaphoreId(9)))),
        );
        assert_eq!(
            out.reports[0].input_error,
            Some(InputError::UnsignaledSemaphore {
                semaphore: SemaphoreId(9)
            })
        );
    }

    #[test]
    fn semaphore_signal_is_consumed_by_wait() {
        let d = detector();
        let sem = SemaphoreId(1);
        let sig = d.submit(
            Submission::new(Q0).batch(SubmitBatch::new().signal(SemaphoreSignal::bare(sem))),
        );
        assert!(sig.is_clean());
        let first = d.submit(
            Submission::new(QueueId(1)).batch(SubmitBatch::new().wait(SemaphoreWait::bare(sem))),
        );
        assert!(first.is_clean());
        let second = d.submit(
            Submission::new(QueueId(1)).batch(SubmitBatch::new().wait(SemaphoreWait::bare(sem))),
        );
        assert_eq!(second.metrics.input_errors, 1);
    }

    #[test]
    fn unset_event_wait_is_input_error() {
        let d = detector();
        let cmds = record(|c| {
            c.record_event_wait(
                EventId(4),
                ExecScope::execution(StageSet::COMPUTE),
                AffectedRanges::Global,
            )
            .unwrap();
        });
        let out = submit_on(&d, Q0, cmds);
        assert_eq!(
            out.reports[0].input_error,
            Some(InputError::UnsetEvent { event: EventId(4) })
        );
        assert_eq!(out.reports[0].resource, ResourceHandle::NONE);
    }

    #[test]
    fn host_queue_rejects_submissions() {
        let d = detector();
        let out = d.submit(Submission::new(QueueId::HOST));
        assert_eq!(
            out.reports[0].input_error,
            Some(InputError::UnknownQueue {
                queue: QueueId::HOST
            })
        );
        assert!(d.register_queue(QueueId::HOST, QueueFamilyId(0)).is_err());
    }

    #[test]
    fn unknown_fence_wait_is_input_error() {
        let d = detector();
        let out = d.wait_fence(FenceId(3));
        assert_eq!(
            out.reports[0].input_error,
            Some(InputError::UnknownFence { fence: FenceId(3) })
        );
        assert!(!d.reset_fence(FenceId(3)));
    }

    #[test]
    fn sink_receives_one_batch_per_call() {
        let sink = Arc::new(CollectingSink::new());
        let d = detector().with_sink(sink.clone());
        let buf = d.create_resource(&ResourceInfo::buffer(16));
        let cmds = record(|c| {
            c.record_access(buf, Subrange::new(0, 16), AccessKind::Write, Usage::TRANSFER_WRITE)
                .unwrap();
            c.record_access(buf, Subrange::new(0, 16), AccessKind::Read, Usage::COMPUTE_READ)
                .unwrap();
        });
        let out = submit_on(&d, Q0, cmds);
        let _ = d.wait_fence(FenceId(1));
        assert_eq!(sink.batch_count(), 2);
        assert_eq!(sink.reports()[0], out.reports[0]);
        let totals = d.metrics();
        assert_eq!(totals.submissions, 1);
        assert_eq!(totals.fence_waits, 1);
        assert_eq!(totals.hazards, 1);
        assert_eq!(totals.input_errors, 1);
    }
}
