//! Error types for malformed inputs handed to the detector.
//!
//! An [`InputError`] never aborts a submission: the offending event is
//! skipped and surfaces once as a [`HazardKind::InputError`](crate::HazardKind)
//! report while the rest of the submission is still processed.

use std::error::Error;
use std::fmt;

use crate::id::{EventId, ExecutionTag, FenceId, QueueId, ResourceHandle, SemaphoreId};
use crate::range::{ImageSubresourceRange, Subrange};

/// A malformed fact supplied by an upstream collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputError {
    /// Zero-length (or inverted) subrange.
    EmptyRange {
        /// The rejected range.
        subrange: Subrange,
    },
    /// Subrange extends past the resource's declared extent.
    OutOfExtent {
        /// The rejected range.
        subrange: Subrange,
        /// The resource's extent.
        extent: u64,
    },
    /// Handle is unknown or was destroyed.
    UnknownResource {
        /// The stale or invalid handle.
        resource: ResourceHandle,
    },
    /// Image subresource selection outside the image or empty.
    SubresourceOutOfRange {
        /// The rejected selection.
        requested: ImageSubresourceRange,
        /// Aspect planes the image has.
        aspects: u32,
        /// Mip levels the image has.
        mips: u32,
        /// Array layers the image has.
        layers: u32,
    },
    /// Image layout whose flattened extent overflows a 64-bit address
    /// space.
    ImageTooLarge {
        /// Aspect planes.
        aspects: u32,
        /// Mip levels.
        mips: u32,
        /// Array layers.
        layers: u32,
    },
    /// Recording a link would close a cycle in the happens-before graph.
    DependencyCycle {
        /// Link source.
        from: ExecutionTag,
        /// Link target.
        to: ExecutionTag,
    },
    /// Semaphore waited on with no pending signal.
    UnsignaledSemaphore {
        /// The semaphore.
        semaphore: SemaphoreId,
    },
    /// Event waited on before it was ever set.
    UnsetEvent {
        /// The event.
        event: EventId,
    },
    /// Event set on one queue and waited on from another with no
    /// semaphore or fence chain ordering the set before the wait.
    CrossQueueEvent {
        /// The event.
        event: EventId,
        /// Queue that set it.
        set_on: QueueId,
        /// Queue that waited on it.
        waited_on: QueueId,
    },
    /// Fence waited on that was never submitted for signalling.
    UnknownFence {
        /// The fence.
        fence: FenceId,
    },
    /// Submission to a queue that was never registered, or to the host
    /// pseudo-queue.
    UnknownQueue {
        /// The queue.
        queue: QueueId,
    },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRange { subrange } => write!(f, "empty subrange {subrange}"),
            Self::OutOfExtent { subrange, extent } => {
                write!(f, "subrange {subrange} exceeds resource extent {extent}")
            }
            Self::UnknownResource { resource } => write!(f, "unknown resource {resource}"),
            Self::SubresourceOutOfRange {
                requested,
                aspects,
                mips,
                layers,
            } => write!(
                f,
                "subresource selection {requested:?} outside image \
                 ({aspects} aspects, {mips} mips, {layers} layers)"
            ),
            Self::ImageTooLarge {
                aspects,
                mips,
                layers,
            } => write!(
                f,
                "image layout ({aspects} aspects, {mips} mips, {layers} layers) \
                 overflows a 64-bit extent"
            ),
            Self::DependencyCycle { from, to } => {
                write!(f, "link {from} -> {to} would create a dependency cycle")
            }
            Self::UnsignaledSemaphore { semaphore } => {
                write!(f, "wait on {semaphore} with no pending signal")
            }
            Self::UnsetEvent { event } => write!(f, "wait on {event} before it was set"),
            Self::CrossQueueEvent {
                event,
                set_on,
                waited_on,
            } => write!(
                f,
                "wait on {event} from {waited_on} is not ordered after its set on {set_on}"
            ),
            Self::UnknownFence { fence } => write!(f, "wait on {fence} that was never submitted"),
            Self::UnknownQueue { queue } => write!(f, "submission to unknown queue {queue}"),
        }
    }
}

impl Error for InputError {}
