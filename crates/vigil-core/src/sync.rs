//! Declared synchronization scopes.

use std::fmt;

use crate::id::{QueueFamilyId, ResourceHandle};
use crate::range::Subrange;
use crate::stage::{AccessSet, StageSet};

/// One half of a dependency: the stages to wait for (or block) and the
/// memory accesses to make available (or visible).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExecScope {
    /// Pipeline stages in scope.
    pub stages: StageSet,
    /// Memory accesses in scope. Empty means execution-only.
    pub access: AccessSet,
}

impl ExecScope {
    /// Create a scope.
    pub const fn new(stages: StageSet, access: AccessSet) -> Self {
        Self { stages, access }
    }

    /// An execution-only scope over `stages`.
    pub const fn execution(stages: StageSet) -> Self {
        Self {
            stages,
            access: AccessSet::empty(),
        }
    }

    /// Every stage, every access.
    pub const ALL: ExecScope = ExecScope::new(
        StageSet::ALL_COMMANDS,
        AccessSet::MEMORY_READ.union(AccessSet::MEMORY_WRITE),
    );

    /// Whether the scope carries a memory (access-mask) declaration.
    pub fn has_memory(&self) -> bool {
        !self.access.is_empty()
    }
}

/// Which bytes a sync op's memory dependency applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AffectedRanges {
    /// A global memory barrier: every resource, every byte.
    Global,
    /// Buffer/image barriers: the listed regions only.
    Ranges(Vec<(ResourceHandle, Subrange)>),
}

impl AffectedRanges {
    /// A single-region barrier.
    pub fn single(resource: ResourceHandle, subrange: Subrange) -> Self {
        Self::Ranges(vec![(resource, subrange)])
    }

    /// Whether `piece` of `resource` is affected.
    pub fn intersects(&self, resource: ResourceHandle, piece: &Subrange) -> bool {
        match self {
            Self::Global => true,
            Self::Ranges(list) => list
                .iter()
                .any(|(r, range)| *r == resource && range.intersects(piece)),
        }
    }

    /// The affected regions of `resource`, or `None` for every byte.
    pub fn regions_of(&self, resource: ResourceHandle) -> Option<Vec<Subrange>> {
        match self {
            Self::Global => None,
            Self::Ranges(list) => Some(
                list.iter()
                    .filter(|(r, _)| *r == resource)
                    .map(|(_, range)| *range)
                    .collect(),
            ),
        }
    }
}

/// A queue-family ownership transfer declared on a barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OwnershipTransfer {
    /// Family releasing ownership.
    pub src_family: QueueFamilyId,
    /// Family acquiring ownership.
    pub dst_family: QueueFamilyId,
}

/// A declared dependency between the work before a sync op and the work
/// after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncScope {
    /// First scope: what must complete / be made available.
    pub src: ExecScope,
    /// Second scope: what waits / has memory made visible.
    pub dst: ExecScope,
    /// Regions the memory dependency applies to.
    pub affected: AffectedRanges,
    /// Optional queue-family ownership transfer.
    pub ownership: Option<OwnershipTransfer>,
}

impl SyncScope {
    /// A barrier over explicit regions with no ownership transfer.
    pub fn barrier(src: ExecScope, dst: ExecScope, affected: AffectedRanges) -> Self {
        Self {
            src,
            dst,
            affected,
            ownership: None,
        }
    }

    /// A global full barrier: everything before is visible to everything after.
    pub fn full() -> Self {
        Self::barrier(ExecScope::ALL, ExecScope::ALL, AffectedRanges::Global)
    }

    /// Attach an ownership transfer.
    pub fn with_ownership(mut self, transfer: OwnershipTransfer) -> Self {
        self.ownership = Some(transfer);
        self
    }

    /// Whether both halves declare memory access, i.e. the scope can make
    /// a write visible rather than only ordering it.
    pub fn has_memory(&self) -> bool {
        self.src.has_memory() && self.dst.has_memory()
    }
}

/// The synchronization operations the command recorder can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncOpKind {
    /// Pipeline barrier inside one recording.
    Barrier,
    /// First half of a split barrier.
    EventSet,
    /// Second half of a split barrier.
    EventWait,
    /// Queue-side semaphore signal.
    SemaphoreSignal,
    /// Queue-side semaphore wait.
    SemaphoreWait,
    /// Queue-side fence signal at the end of a submission.
    FenceSignal,
    /// Host-side fence wait.
    FenceWait,
}

impl fmt::Display for SyncOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Barrier => "barrier",
            Self::EventSet => "event-set",
            Self::EventWait => "event-wait",
            Self::SemaphoreSignal => "semaphore-signal",
            Self::SemaphoreWait => "semaphore-wait",
            Self::FenceSignal => "fence-signal",
            Self::FenceWait => "fence-wait",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_affects_everything() {
        let a = AffectedRanges::Global;
        assert!(a.intersects(ResourceHandle(9), &Subrange::new(0, 1)));
        assert_eq!(a.regions_of(ResourceHandle(9)), None);
    }

    #[test]
    fn ranges_filter_by_resource_and_overlap() {
        let r = ResourceHandle(1);
        let a = AffectedRanges::single(r, Subrange::new(0, 512));
        assert!(a.intersects(r, &Subrange::new(256, 1024)));
        assert!(!a.intersects(r, &Subrange::new(512, 1024)));
        assert!(!a.intersects(ResourceHandle(2), &Subrange::new(0, 512)));
        assert_eq!(a.regions_of(r), Some(vec![Subrange::new(0, 512)]));
    }

    #[test]
    fn execution_only_scope_has_no_memory() {
        let s = SyncScope::barrier(
            ExecScope::execution(StageSet::TRANSFER),
            ExecScope::new(StageSet::COMPUTE, AccessSet::SHADER_READ),
            AffectedRanges::Global,
        );
        assert!(!s.has_memory());
        assert!(SyncScope::full().has_memory());
    }
}
