//! Strongly-typed identifiers and the [`ExecutionTag`] ordering point.

use std::fmt;

/// Identifies a tracked resource (buffer or image).
///
/// Encodes a registry slot index in the upper 32 bits and the slot's
/// generation in the lower 32 bits. Destroying a resource bumps the
/// generation, so a stale handle never resolves to a newer resource that
/// happens to reuse the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(pub u64);

impl ResourceHandle {
    /// Placeholder carried by input-error reports raised by a sync op
    /// rather than by an access. Never issued by the registry.
    pub const NONE: ResourceHandle = ResourceHandle(u64::MAX);

    /// Build a handle from a slot index and generation.
    pub fn from_parts(slot: u32, generation: u32) -> Self {
        Self(((slot as u64) << 32) | (generation as u64))
    }

    /// The registry slot index.
    pub fn slot(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The slot generation this handle was issued for.
    pub fn generation(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            return write!(f, "res#none");
        }
        write!(f, "res#{}v{}", self.slot(), self.generation())
    }
}

/// Identifies an execution queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(pub u32);

impl QueueId {
    /// Pseudo-queue used to order host-side operations (fence waits).
    ///
    /// Never accepts submissions; only the submission order tracker
    /// allocates tags on it.
    pub const HOST: QueueId = QueueId(u32::MAX);

    /// Whether this is the host pseudo-queue.
    pub fn is_host(self) -> bool {
        self == Self::HOST
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "host")
        } else {
            write!(f, "Q{}", self.0)
        }
    }
}

impl From<u32> for QueueId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a queue family. Ownership of exclusive resources is
/// tracked per family, not per queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueFamilyId(pub u32);

impl fmt::Display for QueueFamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "family {}", self.0)
    }
}

impl From<u32> for QueueFamilyId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a split-barrier event object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

/// Identifies a cross-queue semaphore.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemaphoreId(pub u64);

/// Identifies a fence signalled by a queue and waited on by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FenceId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event {}", self.0)
    }
}

impl fmt::Display for SemaphoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "semaphore {}", self.0)
    }
}

impl fmt::Display for FenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fence {}", self.0)
    }
}

/// A point in the global partial order of submitted work.
///
/// Tags on one queue are totally ordered by `(submission, sequence)`.
/// Tags on different queues are only ordered through explicit
/// semaphore or fence links recorded by the submission order tracker;
/// the derived `Ord` is a storage order, not a happens-before relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutionTag {
    /// Queue the tagged work executes on.
    pub queue: QueueId,
    /// Per-queue submission counter.
    pub submission: u64,
    /// Position within the submission.
    pub sequence: u32,
}

impl ExecutionTag {
    /// Create a tag.
    pub fn new(queue: QueueId, submission: u64, sequence: u32) -> Self {
        Self {
            queue,
            submission,
            sequence,
        }
    }

    /// Program order on a single queue: `true` iff both tags are on the
    /// same queue and `self` comes strictly first.
    pub fn same_queue_before(&self, other: &ExecutionTag) -> bool {
        self.queue == other.queue
            && (self.submission, self.sequence) < (other.submission, other.sequence)
    }
}

impl fmt::Display for ExecutionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.queue, self.submission, self.sequence)
    }
}
