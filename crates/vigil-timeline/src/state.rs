//! Aggregated per-piece access history.

use smallvec::SmallVec;
use vigil_core::{AccessRecord, QueueFamilyId};
use vigil_scope::DependencyState;

/// One access kept in a timeline, with everything applied to it since.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Retained {
    /// The access as recorded.
    pub record: AccessRecord,
    /// Family of the queue that issued it. `None` for unregistered queues.
    pub family: Option<QueueFamilyId>,
    /// Sync ops that captured it.
    pub deps: DependencyState,
}

impl Retained {
    /// A freshly recorded access with no dependencies applied.
    pub fn new(record: AccessRecord, family: Option<QueueFamilyId>) -> Self {
        Self {
            record,
            family,
            deps: DependencyState::new(),
        }
    }
}

/// A read since the last write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadEntry {
    /// The read.
    pub access: Retained,
    /// Whether the last write was visible to this read when it was recorded.
    pub saw_write: bool,
}

/// State of one piece of a resource: the last write and the reads since.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubrangeState {
    /// Most recent write, if any.
    pub last_write: Option<Retained>,
    /// Reads recorded after `last_write`, oldest first.
    pub reads: SmallVec<[ReadEntry; 4]>,
}

impl SubrangeState {
    /// Whether nothing has touched the piece yet.
    pub fn is_untouched(&self) -> bool {
        self.last_write.is_none() && self.reads.is_empty()
    }

    /// Replace the history with a new write.
    pub fn set_write(&mut self, write: Retained) {
        self.last_write = Some(write);
        self.reads.clear();
    }

    /// Add a read, keeping at most `max_reads` entries.
    ///
    /// A read from the same queue with the same usage replaces the older
    /// one: anything that will order the newer read also orders the older.
    /// Past the bound, the two oldest reads on a common queue collapse into
    /// one entry with the union of their usages, the later tag, and only
    /// the dependencies both reads carry, which can only over-report.
    pub fn add_read(&mut self, read: ReadEntry, max_reads: usize) {
        let same = self.reads.iter().position(|r| {
            r.access.record.tag.queue == read.access.record.tag.queue
                && r.access.record.usage == read.access.record.usage
        });
        if let Some(i) = same {
            self.reads.remove(i);
        }
        self.reads.push(read);
        while self.reads.len() > max_reads.max(1) {
            if !self.collapse_oldest() {
                break;
            }
        }
    }

    fn collapse_oldest(&mut self) -> bool {
        let pair = (0..self.reads.len()).find_map(|i| {
            let q = self.reads[i].access.record.tag.queue;
            (i + 1..self.reads.len())
                .find(|&j| self.reads[j].access.record.tag.queue == q)
                .map(|j| (i, j))
        });
        let Some((older, newer)) = pair else {
            return false;
        };
        let old = self.reads.remove(older);
        let merged = &mut self.reads[newer - 1];
        merged.access.record.usage.stages |= old.access.record.usage.stages;
        merged.access.record.usage.access |= old.access.record.usage.access;
        merged.saw_write &= old.saw_write;
        merged.access.deps = merged.access.deps.intersection(&old.access.deps);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{ResourceHandle, StageSet, Subrange, Usage};
    use vigil_test_utils::{read, tag};

    fn entry(queue: u32, seq: u32, usage: Usage) -> ReadEntry {
        ReadEntry {
            access: Retained::new(
                read(ResourceHandle(1), Subrange::new(0, 8), usage, tag(queue, seq)),
                None,
            ),
            saw_write: true,
        }
    }

    #[test]
    fn same_queue_same_usage_replaces() {
        let mut s = SubrangeState::default();
        s.add_read(entry(0, 0, Usage::COMPUTE_READ), 8);
        s.add_read(entry(0, 3, Usage::COMPUTE_READ), 8);
        assert_eq!(s.reads.len(), 1);
        assert_eq!(s.reads[0].access.record.tag, tag(0, 3));
    }

    #[test]
    fn overflow_collapses_same_queue_pair() {
        let mut s = SubrangeState::default();
        s.add_read(entry(0, 0, Usage::COMPUTE_READ), 2);
        s.add_read(entry(1, 0, Usage::COMPUTE_READ), 2);
        s.add_read(entry(0, 1, Usage::FRAGMENT_READ), 2);
        assert_eq!(s.reads.len(), 2);
        let merged = s
            .reads
            .iter()
            .find(|r| r.access.record.tag.queue.0 == 0)
            .unwrap();
        assert_eq!(merged.access.record.tag, tag(0, 1));
        assert!(merged
            .access
            .record
            .usage
            .stages
            .contains(StageSet::COMPUTE | StageSet::FRAGMENT_SHADER));
    }

    #[test]
    fn collapsed_read_keeps_only_shared_dependencies() {
        let order = vigil_test_utils::TestOrder::new();
        let mut s = SubrangeState::default();
        s.add_read(entry(0, 0, Usage::COMPUTE_READ), 2);
        s.add_read(entry(0, 1, Usage::FRAGMENT_READ), 2);
        // Captures the fragment read only.
        let scope = vigil_test_utils::execution_barrier(StageSet::FRAGMENT_SHADER, StageSet::TRANSFER);
        for r in s.reads.iter_mut() {
            r.access.deps.apply(&r.access.record, &scope, &tag(0, 2), &tag(0, 2), true, &order);
        }
        assert!(!s.reads[1].access.deps.is_empty());
        s.add_read(
            entry(0, 3, Usage::new(StageSet::VERTEX_SHADER, vigil_core::AccessSet::SHADER_READ)),
            2,
        );
        assert_eq!(s.reads.len(), 2);
        assert!(s.reads[0].access.deps.is_empty());
    }

    #[test]
    fn overflow_without_shared_queue_keeps_everything() {
        let mut s = SubrangeState::default();
        for q in 0..4 {
            s.add_read(entry(q, 0, Usage::COMPUTE_READ), 2);
        }
        assert_eq!(s.reads.len(), 4);
    }

    #[test]
    fn write_clears_reads() {
        let mut s = SubrangeState::default();
        s.add_read(entry(0, 0, Usage::COMPUTE_READ), 8);
        s.set_write(Retained::new(
            vigil_test_utils::write(ResourceHandle(1), Subrange::new(0, 8), Usage::TRANSFER_WRITE, tag(0, 1)),
            None,
        ));
        assert!(s.reads.is_empty());
        assert!(!s.is_untouched());
    }
}
