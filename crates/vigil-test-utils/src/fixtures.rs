//! Record and scope builders for tests.

use vigil_core::{
    AccessKind, AccessRecord, AccessSet, AffectedRanges, ExecScope, ExecutionTag, QueueId,
    ResourceHandle, StageSet, Subrange, SyncScope, Usage,
};

/// Tag on `queue`, submission 0.
pub fn tag(queue: u32, sequence: u32) -> ExecutionTag {
    ExecutionTag::new(QueueId(queue), 0, sequence)
}

/// A write record.
pub fn write(resource: ResourceHandle, range: Subrange, usage: Usage, tag: ExecutionTag) -> AccessRecord {
    AccessRecord {
        kind: AccessKind::Write,
        usage,
        tag,
        resource,
        subrange: range,
    }
}

/// A read record.
pub fn read(resource: ResourceHandle, range: Subrange, usage: Usage, tag: ExecutionTag) -> AccessRecord {
    AccessRecord {
        kind: AccessKind::Read,
        usage,
        tag,
        resource,
        subrange: range,
    }
}

/// Barrier from transfer writes to compute reads over `range` of `resource`.
pub fn transfer_to_compute(resource: ResourceHandle, range: Subrange) -> SyncScope {
    SyncScope::barrier(
        ExecScope::new(StageSet::TRANSFER, AccessSet::TRANSFER_WRITE),
        ExecScope::new(StageSet::COMPUTE, AccessSet::SHADER_READ),
        AffectedRanges::single(resource, range),
    )
}

/// Execution-only barrier between two stage sets.
pub fn execution_barrier(src: StageSet, dst: StageSet) -> SyncScope {
    SyncScope::barrier(
        ExecScope::execution(src),
        ExecScope::execution(dst),
        AffectedRanges::Global,
    )
}
