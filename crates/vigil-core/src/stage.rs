//! Pipeline-stage and memory-access classification sets.

bitflags::bitflags! {
    /// Pipeline stages an access happens in or a scope names.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StageSet: u32 {
        /// Top of pipe (beginning).
        const TOP_OF_PIPE = 1 << 0;
        /// Indirect argument fetch.
        const DRAW_INDIRECT = 1 << 1;
        /// Vertex and index fetch.
        const VERTEX_INPUT = 1 << 2;
        /// Vertex shader.
        const VERTEX_SHADER = 1 << 3;
        /// Fragment shader.
        const FRAGMENT_SHADER = 1 << 4;
        /// Early fragment tests.
        const EARLY_FRAGMENT_TESTS = 1 << 5;
        /// Late fragment tests.
        const LATE_FRAGMENT_TESTS = 1 << 6;
        /// Color attachment output.
        const COLOR_ATTACHMENT_OUTPUT = 1 << 7;
        /// Compute shader.
        const COMPUTE = 1 << 8;
        /// Copy, blit, fill and clear.
        const TRANSFER = 1 << 9;
        /// Bottom of pipe (end).
        const BOTTOM_OF_PIPE = 1 << 10;
        /// Host reads and writes of mapped memory.
        const HOST = 1 << 11;
        /// All graphics stages.
        const ALL_GRAPHICS = Self::DRAW_INDIRECT.bits()
            | Self::VERTEX_INPUT.bits()
            | Self::VERTEX_SHADER.bits()
            | Self::FRAGMENT_SHADER.bits()
            | Self::EARLY_FRAGMENT_TESTS.bits()
            | Self::LATE_FRAGMENT_TESTS.bits()
            | Self::COLOR_ATTACHMENT_OUTPUT.bits();
        /// Every stage; acts as a wildcard in scope matching.
        const ALL_COMMANDS = 0x0FFF;
    }
}

impl StageSet {
    /// `self ⊆ scope`, with an all-commands scope matching anything.
    pub fn within(self, scope: StageSet) -> bool {
        scope.is_all() || scope.contains(self)
    }

    /// Whether the two sets share a stage (an all-commands set shares
    /// with any non-empty set).
    pub fn overlaps(self, other: StageSet) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.is_all() || other.is_all() || self.intersects(other)
    }
}

bitflags::bitflags! {
    /// Memory access kinds an access performs or a scope names.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessSet: u32 {
        /// Indirect command read.
        const INDIRECT_COMMAND_READ = 1 << 0;
        /// Index buffer read.
        const INDEX_READ = 1 << 1;
        /// Vertex attribute read.
        const VERTEX_ATTRIBUTE_READ = 1 << 2;
        /// Uniform buffer read.
        const UNIFORM_READ = 1 << 3;
        /// Shader storage/sampled read.
        const SHADER_READ = 1 << 4;
        /// Shader storage write.
        const SHADER_WRITE = 1 << 5;
        /// Color attachment read.
        const COLOR_ATTACHMENT_READ = 1 << 6;
        /// Color attachment write.
        const COLOR_ATTACHMENT_WRITE = 1 << 7;
        /// Transfer source read.
        const TRANSFER_READ = 1 << 8;
        /// Transfer destination write.
        const TRANSFER_WRITE = 1 << 9;
        /// Host read.
        const HOST_READ = 1 << 10;
        /// Host write.
        const HOST_WRITE = 1 << 11;
        /// Every read kind.
        const MEMORY_READ = 1 << 12;
        /// Every write kind.
        const MEMORY_WRITE = 1 << 13;
    }
}

impl AccessSet {
    /// All concrete read bits.
    pub const READS: AccessSet = AccessSet::INDIRECT_COMMAND_READ
        .union(AccessSet::INDEX_READ)
        .union(AccessSet::VERTEX_ATTRIBUTE_READ)
        .union(AccessSet::UNIFORM_READ)
        .union(AccessSet::SHADER_READ)
        .union(AccessSet::COLOR_ATTACHMENT_READ)
        .union(AccessSet::TRANSFER_READ)
        .union(AccessSet::HOST_READ);

    /// All concrete write bits.
    pub const WRITES: AccessSet = AccessSet::SHADER_WRITE
        .union(AccessSet::COLOR_ATTACHMENT_WRITE)
        .union(AccessSet::TRANSFER_WRITE)
        .union(AccessSet::HOST_WRITE);

    /// Replace the `MEMORY_*` umbrella bits by the concrete bits they stand for.
    pub fn expand(self) -> AccessSet {
        let mut out = self.difference(AccessSet::MEMORY_READ | AccessSet::MEMORY_WRITE);
        if self.contains(AccessSet::MEMORY_READ) {
            out |= Self::READS;
        }
        if self.contains(AccessSet::MEMORY_WRITE) {
            out |= Self::WRITES;
        }
        out
    }

    /// `self ⊆ scope` after umbrella expansion on both sides.
    pub fn within(self, scope: AccessSet) -> bool {
        scope.expand().contains(self.expand())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_commands_is_wildcard() {
        assert!(StageSet::COMPUTE.within(StageSet::ALL_COMMANDS));
        assert!(StageSet::ALL_GRAPHICS.within(StageSet::ALL_COMMANDS));
        assert!(!StageSet::COMPUTE.within(StageSet::TRANSFER));
        assert!(StageSet::COMPUTE.within(StageSet::COMPUTE | StageSet::TRANSFER));
    }

    #[test]
    fn all_commands_names_every_stage() {
        assert!(StageSet::ALL_COMMANDS.is_all());
        assert!(StageSet::all().within(StageSet::ALL_COMMANDS));
        assert!(!(StageSet::ALL_GRAPHICS | StageSet::COMPUTE).is_all());
    }

    #[test]
    fn empty_stage_sets_never_overlap() {
        assert!(!StageSet::empty().overlaps(StageSet::ALL_COMMANDS));
        assert!(StageSet::ALL_COMMANDS.overlaps(StageSet::HOST));
        assert!(!StageSet::COMPUTE.overlaps(StageSet::TRANSFER));
    }

    #[test]
    fn memory_umbrella_expands() {
        assert!(AccessSet::SHADER_READ.within(AccessSet::MEMORY_READ));
        assert!(AccessSet::TRANSFER_WRITE.within(AccessSet::MEMORY_WRITE));
        assert!(!AccessSet::TRANSFER_WRITE.within(AccessSet::MEMORY_READ));
        assert!(AccessSet::MEMORY_READ.within(AccessSet::READS));
    }
}
