//! Coverage decisions over stage/access sets.
//!
//! [`src_matches`] and [`dst_matches`] test one usage against one half of a
//! declared scope. [`classify`] answers whether a retained access is
//! covered against a later one by everything applied to it so far,
//! distinguishing a pair that is merely execution-ordered from one whose
//! write is visible.

use vigil_core::{
    AccessKind, AccessRecord, ExecScope, HappensBefore, HazardKind, QueueFamilyId, SharingMode,
    Usage,
};

use crate::state::{AppliedScope, DependencyState};

// ── Direct scope predicates ────────────────────────────────────────

/// Whether `usage` lies in a first scope `src`.
pub fn src_matches(src: &ExecScope, usage: &Usage) -> bool {
    usage.stages.within(src.stages) && usage.access.within(src.access)
}

/// Whether `usage` lies in a second scope `dst`.
pub fn dst_matches(dst: &ExecScope, usage: &Usage) -> bool {
    usage.stages.within(dst.stages) && usage.access.within(dst.access)
}

// ── Accumulated coverage ───────────────────────────────────────────

/// What the dependencies applied to a prior access establish for a later one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coverage {
    /// Ordered, and the prior access's memory effects are visible.
    Visible,
    /// Execution-ordered only.
    OrderedOnly,
    /// Neither.
    Unordered,
}

impl Coverage {
    /// The hazard a conflicting pair with this coverage constitutes, if any.
    ///
    /// A prior write needs visibility; a prior read needs only execution
    /// order. Read-after-read never conflicts.
    pub fn hazard(self, prior: AccessKind, next: AccessKind) -> Option<HazardKind> {
        match (prior, next, self) {
            (AccessKind::Read, AccessKind::Read, _) => None,
            (AccessKind::Read, AccessKind::Write, Coverage::Unordered) => {
                Some(HazardKind::WriteAfterRead)
            }
            (AccessKind::Read, AccessKind::Write, _) => None,
            (AccessKind::Write, _, Coverage::Visible) => None,
            (AccessKind::Write, _, Coverage::OrderedOnly) => Some(HazardKind::OrderedButNotVisible),
            (AccessKind::Write, AccessKind::Read, Coverage::Unordered) => {
                Some(HazardKind::ReadAfterWrite)
            }
            (AccessKind::Write, AccessKind::Write, Coverage::Unordered) => {
                Some(HazardKind::WriteAfterWrite)
            }
        }
    }
}

fn reaches<O: HappensBefore + ?Sized>(entry: &AppliedScope, next: &AccessRecord, order: &O) -> bool {
    next.usage.stages.within(entry.stages) && order.precedes(&entry.tag, &next.tag)
}

/// Whether anything applied to `prior`, or a cross-queue link, orders it
/// before `next`.
///
/// Program order alone never orders two accesses on one queue; only an
/// applied dependency does. Across queues, a semaphore or fence chain
/// establishes order on its own.
pub fn ordered<O: HappensBefore + ?Sized>(
    prior: &AccessRecord,
    deps: &DependencyState,
    next: &AccessRecord,
    order: &O,
) -> bool {
    deps.execution()
        .iter()
        .chain(deps.visible())
        .any(|e| reaches(e, next, order))
        || (prior.tag.queue != next.tag.queue && order.precedes(&prior.tag, &next.tag))
}

/// Classify the dependency from retained access `prior` to `next`.
pub fn classify<O: HappensBefore + ?Sized>(
    prior: &AccessRecord,
    deps: &DependencyState,
    next: &AccessRecord,
    order: &O,
) -> Coverage {
    let visible = deps.visible().iter().any(|v| {
        dst_matches(&ExecScope::new(v.stages, v.access), &next.usage)
            && order.precedes(&v.tag, &next.tag)
    });
    if visible {
        Coverage::Visible
    } else if ordered(prior, deps, next, order) {
        Coverage::OrderedOnly
    } else {
        Coverage::Unordered
    }
}

/// Whether an access on `next_family` may follow `prior` (issued on
/// `prior_family`) without a queue-family ownership violation.
///
/// Host-side or unregistered queues (`None`) are exempt.
pub fn ownership_ok(
    prior_family: Option<QueueFamilyId>,
    deps: &DependencyState,
    next_family: Option<QueueFamilyId>,
    sharing: SharingMode,
) -> bool {
    match (sharing, prior_family, next_family) {
        (SharingMode::Concurrent, _, _) => true,
        (_, Some(p), Some(n)) if p != n => deps.transferred_to() == Some(n),
        _ => true,
    }
}
