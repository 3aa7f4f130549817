//! [`AccessContext`]: thread-confined recording of one command buffer.
//!
//! Recording touches no shared state. Accesses and in-recording sync ops
//! are appended to one ordered list; their position in that list is the
//! only ordering they carry until the list is submitted and each event is
//! given a real execution tag.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use vigil_core::{
    AccessKind, AffectedRanges, CommandObserver, EventId, ExecScope, ImageLayout,
    ImageSubresourceRange, InputError, ResourceHandle, Subrange, SyncScope, Usage,
};

/// One recorded event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A command touched `subrange` of `resource`.
    Access {
        /// The resource touched.
        resource: ResourceHandle,
        /// The bytes touched.
        subrange: Subrange,
        /// Read or write.
        kind: AccessKind,
        /// Stage/access classification.
        usage: Usage,
    },
    /// A pipeline barrier.
    Barrier(SyncScope),
    /// First half of a split barrier.
    EventSet {
        /// The event.
        event: EventId,
        /// First scope.
        src: ExecScope,
    },
    /// Second half of a split barrier.
    EventWait {
        /// The event.
        event: EventId,
        /// Second scope.
        dst: ExecScope,
        /// Regions the memory dependency applies to.
        affected: AffectedRanges,
    },
    /// An access that was malformed at record time. Reported, never replayed.
    Invalid {
        /// The resource named by the access.
        resource: ResourceHandle,
        /// What was wrong.
        error: InputError,
    },
}

/// Lifecycle of a recording unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// Nothing recorded, or reset.
    Idle,
    /// Between [`begin`](AccessContext::begin) and [`end`](AccessContext::end).
    Recording,
    /// Finished; may be submitted any number of times.
    Executable,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Recording => write!(f, "recording"),
            Self::Executable => write!(f, "executable"),
        }
    }
}

/// Misuse of the recording lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextError {
    /// An event or `end()` arrived outside `Recording`.
    NotRecording {
        /// The state the context was in.
        state: ContextState,
    },
    /// The recorded list was requested before `end()`.
    NotExecutable {
        /// The state the context was in.
        state: ContextState,
    },
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRecording { state } => write!(f, "context is {state}, not recording"),
            Self::NotExecutable { state } => write!(f, "context is {state}, not executable"),
        }
    }
}

impl Error for ContextError {}

/// A finished, immutable event list ready for submission.
///
/// Cheap to clone; submitting the same list twice replays it twice under
/// fresh tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCommands {
    events: Arc<[RecordedEvent]>,
}

impl RecordedCommands {
    /// Events in recording order.
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Per-recording-unit accumulator.
#[derive(Debug)]
pub struct AccessContext {
    state: ContextState,
    events: Vec<RecordedEvent>,
    finished: Option<RecordedCommands>,
}

impl Default for AccessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessContext {
    /// An idle context.
    pub fn new() -> Self {
        Self {
            state: ContextState::Idle,
            events: Vec::new(),
            finished: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Events recorded so far (or in the finished list).
    pub fn len(&self) -> usize {
        match &self.finished {
            Some(f) => f.len(),
            None => self.events.len(),
        }
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start recording, discarding any previous list. Already-submitted
    /// history is unaffected.
    pub fn begin(&mut self) {
        self.events.clear();
        self.finished = None;
        self.state = ContextState::Recording;
    }

    /// Return to `Idle`, discarding everything.
    pub fn reset(&mut self) {
        self.events.clear();
        self.finished = None;
        self.state = ContextState::Idle;
    }

    fn push(&mut self, event: RecordedEvent) -> Result<(), ContextError> {
        if self.state != ContextState::Recording {
            return Err(ContextError::NotRecording { state: self.state });
        }
        self.events.push(event);
        Ok(())
    }

    /// Record an access to a linear subrange.
    pub fn record_access(
        &mut self,
        resource: ResourceHandle,
        subrange: Subrange,
        kind: AccessKind,
        usage: Usage,
    ) -> Result<(), ContextError> {
        self.push(RecordedEvent::Access {
            resource,
            subrange,
            kind,
            usage,
        })
    }

    /// Record an access to an image subresource selection, flattened to
    /// one linear access per contiguous piece. A selection outside the
    /// image is kept as an invalid event and reported at submission.
    pub fn record_image_access(
        &mut self,
        resource: ResourceHandle,
        layout: &ImageLayout,
        range: &ImageSubresourceRange,
        kind: AccessKind,
        usage: Usage,
    ) -> Result<(), ContextError> {
        match layout.decompose(range) {
            Ok(pieces) => {
                for subrange in pieces {
                    self.record_access(resource, subrange, kind, usage)?;
                }
                Ok(())
            }
            Err(error) => self.push(RecordedEvent::Invalid { resource, error }),
        }
    }

    /// Record a pipeline barrier.
    pub fn record_barrier(&mut self, scope: SyncScope) -> Result<(), ContextError> {
        self.push(RecordedEvent::Barrier(scope))
    }

    /// Record the set half of a split barrier.
    pub fn record_event_set(&mut self, event: EventId, src: ExecScope) -> Result<(), ContextError> {
        self.push(RecordedEvent::EventSet { event, src })
    }

    /// Record the wait half of a split barrier.
    pub fn record_event_wait(
        &mut self,
        event: EventId,
        dst: ExecScope,
        affected: AffectedRanges,
    ) -> Result<(), ContextError> {
        self.push(RecordedEvent::EventWait {
            event,
            dst,
            affected,
        })
    }

    /// Finish recording and hand out the executable list.
    pub fn end(&mut self) -> Result<RecordedCommands, ContextError> {
        if self.state != ContextState::Recording {
            return Err(ContextError::NotRecording { state: self.state });
        }
        let commands = RecordedCommands {
            events: std::mem::take(&mut self.events).into(),
        };
        self.finished = Some(commands.clone());
        self.state = ContextState::Executable;
        Ok(commands)
    }

    /// The finished list, for resubmission.
    pub fn commands(&self) -> Result<RecordedCommands, ContextError> {
        match (&self.finished, self.state) {
            (Some(c), ContextState::Executable) => Ok(c.clone()),
            _ => Err(ContextError::NotExecutable { state: self.state }),
        }
    }
}

impl CommandObserver for AccessContext {
    fn access(&mut self, resource: ResourceHandle, subrange: Subrange, kind: AccessKind, usage: Usage) {
        if let Err(e) = self.record_access(resource, subrange, kind, usage) {
            log::warn!("dropped access to {resource}{subrange}: {e}");
        }
    }

    fn barrier(&mut self, scope: SyncScope) {
        if let Err(e) = self.record_barrier(scope) {
            log::warn!("dropped barrier: {e}");
        }
    }

    fn set_event(&mut self, event: EventId, src: ExecScope) {
        if let Err(e) = self.record_event_set(event, src) {
            log::warn!("dropped set of {event}: {e}");
        }
    }

    fn wait_event(&mut self, event: EventId, dst: ExecScope, affected: AffectedRanges) {
        if let Err(e) = self.record_event_wait(event, dst, affected) {
            log::warn!("dropped wait on {event}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{AccessSet, StageSet};

    const RES: ResourceHandle = ResourceHandle(0);

    #[test]
    fn lifecycle_idle_recording_executable() {
        let mut ctx = AccessContext::new();
        assert_eq!(ctx.state(), ContextState::Idle);
        ctx.begin();
        assert_eq!(ctx.state(), ContextState::Recording);
        ctx.record_access(RES, Subrange::new(0, 8), AccessKind::Write, Usage::TRANSFER_WRITE)
            .unwrap();
        let cmds = ctx.end().unwrap();
        assert_eq!(ctx.state(), ContextState::Executable);
        assert_eq!(cmds.len(), 1);
        assert_eq!(ctx.commands().unwrap(), cmds);
    }

    #[test]
    fn events_keep_recording_order() {
        let mut ctx = AccessContext::new();
        ctx.begin();
        ctx.record_access(RES, Subrange::new(0, 8), AccessKind::Write, Usage::TRANSFER_WRITE)
            .unwrap();
        ctx.record_barrier(SyncScope::full()).unwrap();
        ctx.record_access(RES, Subrange::new(0, 8), AccessKind::Read, Usage::COMPUTE_READ)
            .unwrap();
        let cmds = ctx.end().unwrap();
        assert!(matches!(cmds.events()[0], RecordedEvent::Access { kind: AccessKind::Write, .. }));
        assert!(matches!(cmds.events()[1], RecordedEvent::Barrier(_)));
        assert!(matches!(cmds.events()[2], RecordedEvent::Access { kind: AccessKind::Read, .. }));
    }

    #[test]
    fn recording_outside_recording_state_fails() {
        let mut ctx = AccessContext::new();
        match ctx.record_barrier(SyncScope::full()) {
            Err(ContextError::NotRecording { state: ContextState::Idle }) => {}
            other => panic!("expected NotRecording, got {other:?}"),
        }
        ctx.begin();
        ctx.end().unwrap();
        assert!(ctx.end().is_err());
        assert!(ctx
            .record_event_set(EventId(1), ExecScope::execution(StageSet::COMPUTE))
            .is_err());
    }

    #[test]
    fn begin_discards_previous_list() {
        let mut ctx = AccessContext::new();
        ctx.begin();
        ctx.record_barrier(SyncScope::full()).unwrap();
        let first = ctx.end().unwrap();
        ctx.begin();
        assert!(ctx.is_empty());
        assert!(ctx.commands().is_err());
        let second = ctx.end().unwrap();
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut ctx = AccessContext::new();
        ctx.begin();
        ctx.record_barrier(SyncScope::full()).unwrap();
        ctx.reset();
        assert_eq!(ctx.state(), ContextState::Idle);
        assert!(ctx.is_empty());
    }

    #[test]
    fn image_access_flattens_and_keeps_bad_selection() {
        let layout = ImageLayout::new(1, 4, &[64, 16]).unwrap();
        let mut ctx = AccessContext::new();
        ctx.begin();
        let mut sel = layout.full_range();
        sel.base_layer = 1;
        sel.layer_count = 1;
        ctx.record_image_access(RES, &layout, &sel, AccessKind::Write, Usage::TRANSFER_WRITE)
            .unwrap();
        sel.layer_count = 9;
        ctx.record_image_access(RES, &layout, &sel, AccessKind::Read, Usage::COMPUTE_READ)
            .unwrap();
        let cmds = ctx.end().unwrap();
        assert_eq!(cmds.len(), 3);
        assert!(matches!(
            cmds.events()[2],
            RecordedEvent::Invalid {
                error: InputError::SubresourceOutOfRange { .. },
                ..
            }
        ));
    }

    #[test]
    fn observer_feeds_the_list() {
        let mut ctx = AccessContext::new();
        ctx.begin();
        let obs: &mut dyn CommandObserver = &mut ctx;
        obs.access(RES, Subrange::new(0, 4), AccessKind::Write, Usage::HOST_WRITE);
        obs.set_event(EventId(3), ExecScope::new(StageSet::HOST, AccessSet::HOST_WRITE));
        obs.wait_event(
            EventId(3),
            ExecScope::new(StageSet::TRANSFER, AccessSet::TRANSFER_READ),
            AffectedRanges::Global,
        );
        obs.barrier(SyncScope::full());
        assert_eq!(ctx.len(), 4);
    }
}
