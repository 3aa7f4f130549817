//! Hazard taxonomy and reports.
//!
//! Hazards are values, not errors: detection is advisory and never stops
//! the host from continuing.

use std::fmt;

use crate::access::AccessRecord;
use crate::error::InputError;
use crate::id::ResourceHandle;
use crate::range::Subrange;

/// Classification of a detected violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HazardKind {
    /// A read conflicting with an uncovered prior write.
    ReadAfterWrite,
    /// A write conflicting with an uncovered prior write.
    WriteAfterWrite,
    /// A write conflicting with an uncovered prior read.
    WriteAfterRead,
    /// The pair is execution-ordered but the prior write was never made
    /// visible to the new access.
    OrderedButNotVisible,
    /// Conflicting accesses from different queue families on an exclusive
    /// resource with no ownership transfer.
    QueueOwnershipMismatch,
    /// A malformed access or sync op; the offending event was skipped.
    InputError,
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadAfterWrite => "READ_AFTER_WRITE",
            Self::WriteAfterWrite => "WRITE_AFTER_WRITE",
            Self::WriteAfterRead => "WRITE_AFTER_READ",
            Self::OrderedButNotVisible => "ORDERED_BUT_NOT_VISIBLE",
            Self::QueueOwnershipMismatch => "QUEUE_OWNERSHIP_MISMATCH",
            Self::InputError => "INPUT_ERROR",
        };
        write!(f, "{name}")
    }
}

/// One detected violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HazardReport {
    /// What went wrong.
    pub kind: HazardKind,
    /// The resource involved. For input errors that do not name a
    /// resource this is the handle the recorder supplied, possibly stale.
    pub resource: ResourceHandle,
    /// The conflicting bytes (hull of every piece the pair conflicted on).
    pub subrange: Subrange,
    /// The earlier access of the pair. `None` for input errors.
    pub prior: Option<AccessRecord>,
    /// The access that exposed the hazard. `None` for input errors raised
    /// by a sync op rather than an access.
    pub access: Option<AccessRecord>,
    /// Detail for [`HazardKind::InputError`] reports.
    pub input_error: Option<InputError>,
}

impl HazardReport {
    /// A conflict between two accesses.
    pub fn conflict(
        kind: HazardKind,
        subrange: Subrange,
        prior: AccessRecord,
        access: AccessRecord,
    ) -> Self {
        Self {
            kind,
            resource: access.resource,
            subrange,
            prior: Some(prior),
            access: Some(access),
            input_error: None,
        }
    }

    /// A skipped malformed input.
    pub fn input(resource: ResourceHandle, subrange: Subrange, error: InputError) -> Self {
        Self {
            kind: HazardKind::InputError,
            resource,
            subrange,
            prior: None,
            access: None,
            input_error: Some(error),
        }
    }
}

impl fmt::Display for HazardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}{}", self.kind, self.resource, self.subrange)?;
        if let Some(access) = &self.access {
            write!(f, ": {access}")?;
        }
        if let Some(prior) = &self.prior {
            write!(f, " conflicts with prior {prior}")?;
        }
        if let Some(err) = &self.input_error {
            write!(f, ": {err}")?;
        }
        Ok(())
    }
}
