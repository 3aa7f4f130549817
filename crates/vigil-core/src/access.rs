//! Access events: what touched which bytes, where, and when.

use std::fmt;

use crate::id::{ExecutionTag, ResourceHandle};
use crate::range::Subrange;
use crate::stage::{AccessSet, StageSet};

/// Whether an access reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// The access only observes memory.
    Read,
    /// The access modifies memory.
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Stage/access classification of one access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Usage {
    /// Pipeline stages performing the access.
    pub stages: StageSet,
    /// Memory access kinds performed.
    pub access: AccessSet,
}

impl Usage {
    /// Create a usage.
    pub const fn new(stages: StageSet, access: AccessSet) -> Self {
        Self { stages, access }
    }

    /// Transfer-stage write (copy destination).
    pub const TRANSFER_WRITE: Usage = Usage::new(StageSet::TRANSFER, AccessSet::TRANSFER_WRITE);
    /// Transfer-stage read (copy source).
    pub const TRANSFER_READ: Usage = Usage::new(StageSet::TRANSFER, AccessSet::TRANSFER_READ);
    /// Compute shader storage read.
    pub const COMPUTE_READ: Usage = Usage::new(StageSet::COMPUTE, AccessSet::SHADER_READ);
    /// Compute shader storage write.
    pub const COMPUTE_WRITE: Usage = Usage::new(StageSet::COMPUTE, AccessSet::SHADER_WRITE);
    /// Fragment shader sampled read.
    pub const FRAGMENT_READ: Usage = Usage::new(StageSet::FRAGMENT_SHADER, AccessSet::SHADER_READ);
    /// Host write through a mapping.
    pub const HOST_WRITE: Usage = Usage::new(StageSet::HOST, AccessSet::HOST_WRITE);
    /// Host read through a mapping.
    pub const HOST_READ: Usage = Usage::new(StageSet::HOST, AccessSet::HOST_READ);
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.stages, self.access)
    }
}

/// One access event replayed against a resource timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccessRecord {
    /// Read or write.
    pub kind: AccessKind,
    /// Stage/access classification.
    pub usage: Usage,
    /// When the access executes.
    pub tag: ExecutionTag,
    /// Which resource is touched.
    pub resource: ResourceHandle,
    /// Which bytes are touched.
    pub subrange: Subrange,
}

impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} of {}{} at {}",
            self.usage, self.kind, self.resource, self.subrange, self.tag
        )
    }
}
