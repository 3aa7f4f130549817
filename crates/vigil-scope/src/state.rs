//! Per-access dependency state.
//!
//! Every access retained in a resource timeline carries a
//! [`DependencyState`]: the second halves of every sync op whose first half
//! captured the access. Each entry is stamped with the tag of the op that
//! applied it, so a later access is only covered when that op
//! happens-before it.

use smallvec::SmallVec;
use vigil_core::{
    AccessRecord, AccessSet, ExecScope, ExecutionTag, HappensBefore, QueueFamilyId, StageSet,
    SyncScope,
};

use crate::resolver::src_matches;

/// The second scope of one applied sync op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AppliedScope {
    /// Destination stages that are execution-ordered after the access.
    pub stages: StageSet,
    /// Destination accesses the access is visible to. Empty for
    /// execution-only entries.
    pub access: AccessSet,
    /// Tag of the op that applied this scope.
    pub tag: ExecutionTag,
}

impl AppliedScope {
    /// Whether `other` is at least as strong as `self` and was applied no
    /// later on the same queue, so `self` adds nothing.
    fn subsumed_by(&self, other: &AppliedScope) -> bool {
        self.stages.within(other.stages)
            && self.access.within(other.access)
            && (other.tag == self.tag || other.tag.same_queue_before(&self.tag))
    }
}

/// How an access relates to a sync op's first scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FirstScope {
    /// Not captured: the op establishes nothing for this access.
    Outside,
    /// Captured by the execution dependency only.
    Execution,
    /// Captured by both the execution and the memory dependency.
    Memory,
}

/// Dependencies accumulated by one retained access.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyState {
    execution: SmallVec<[AppliedScope; 2]>,
    visible: SmallVec<[AppliedScope; 2]>,
    transferred_to: Option<QueueFamilyId>,
}

impl DependencyState {
    /// A state with no dependencies applied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Execution-only entries.
    pub fn execution(&self) -> &[AppliedScope] {
        &self.execution
    }

    /// Entries that also carry memory visibility.
    pub fn visible(&self) -> &[AppliedScope] {
        &self.visible
    }

    /// The family an applied ownership transfer released the access to.
    pub fn transferred_to(&self) -> Option<QueueFamilyId> {
        self.transferred_to
    }

    /// Whether no sync op has captured the access yet.
    pub fn is_empty(&self) -> bool {
        self.execution.is_empty() && self.visible.is_empty() && self.transferred_to.is_none()
    }

    /// The dependencies both `self` and `other` carry.
    ///
    /// An entry of `self` survives only if `other` holds one at least as
    /// strong, applied no later on the same queue. Whatever orders the
    /// result therefore orders both accesses.
    pub fn intersection(&self, other: &DependencyState) -> DependencyState {
        fn keep(mine: &[AppliedScope], theirs: &[AppliedScope]) -> SmallVec<[AppliedScope; 2]> {
            mine.iter()
                .filter(|e| theirs.iter().any(|o| e.subsumed_by(o)))
                .copied()
                .collect()
        }
        let all_other: SmallVec<[AppliedScope; 4]> =
            other.execution.iter().chain(&other.visible).copied().collect();
        DependencyState {
            execution: keep(&self.execution[..], &all_other[..]),
            visible: keep(&self.visible[..], &other.visible[..]),
            transferred_to: self.transferred_to.filter(|f| other.transferred_to == Some(*f)),
        }
    }

    /// Decide whether `record` falls in the first scope `src` of an op
    /// whose first half ends at `bound`.
    ///
    /// Directly captured accesses must precede `bound` and match `src`.
    /// An access whose existing entries overlap `src` (and precede `bound`)
    /// is captured through the dependency chain. `memory_eligible` is false
    /// when the op declares no memory dependency for this piece.
    pub fn first_scope<O: HappensBefore + ?Sized>(
        &self,
        record: &AccessRecord,
        src: &ExecScope,
        bound: &ExecutionTag,
        memory_eligible: bool,
        order: &O,
    ) -> FirstScope {
        let direct = order.precedes(&record.tag, bound) && record.usage.stages.within(src.stages);
        let chained = self
            .execution
            .iter()
            .chain(self.visible.iter())
            .any(|e| e.stages.overlaps(src.stages) && order.precedes(&e.tag, bound));
        if !direct && !chained {
            return FirstScope::Outside;
        }
        if !memory_eligible {
            return FirstScope::Execution;
        }
        let memory_direct = direct && src_matches(src, &record.usage);
        let memory_chained = self.visible.iter().any(|v| {
            v.stages.overlaps(src.stages)
                && v.access.expand().intersects(src.access.expand())
                && order.precedes(&v.tag, bound)
        });
        if memory_direct || memory_chained {
            FirstScope::Memory
        } else {
            FirstScope::Execution
        }
    }

    /// Apply `scope` to the access `record`, returning how the access was
    /// captured.
    ///
    /// `bound` is the end of the op's first scope and `stamp` the point the
    /// second scope starts from: equal for a barrier, the signal and wait
    /// tags for a semaphore, the set and wait tags for an event. `affected`
    /// says whether this piece lies in the op's memory regions.
    pub fn apply<O: HappensBefore + ?Sized>(
        &mut self,
        record: &AccessRecord,
        scope: &SyncScope,
        bound: &ExecutionTag,
        stamp: &ExecutionTag,
        affected: bool,
        order: &O,
    ) -> FirstScope {
        let memory_eligible = affected && scope.has_memory();
        let captured = self.first_scope(record, &scope.src, bound, memory_eligible, order);
        match captured {
            FirstScope::Outside => return captured,
            FirstScope::Execution => push_entry(
                &mut self.execution,
                AppliedScope {
                    stages: scope.dst.stages,
                    access: AccessSet::empty(),
                    tag: *stamp,
                },
            ),
            FirstScope::Memory => push_entry(
                &mut self.visible,
                AppliedScope {
                    stages: scope.dst.stages,
                    access: scope.dst.access,
                    tag: *stamp,
                },
            ),
        }
        if let (Some(transfer), true) = (scope.ownership, affected) {
            self.transferred_to = Some(transfer.dst_family);
        }
        captured
    }
}

fn push_entry(list: &mut SmallVec<[AppliedScope; 2]>, entry: AppliedScope) {
    if list.iter().any(|e| entry.subsumed_by(e)) {
        return;
    }
    list.retain(|e| !e.subsumed_by(&entry));
    list.push(entry);
}
