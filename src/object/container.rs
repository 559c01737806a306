//! Open-container descriptors.

use std::path::PathBuf;

use crate::format::FormatFamily;

/// Access mode a container was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Existing container, structure and data read-only.
    Read,
    /// Existing container, mutations allowed.
    ReadWrite,
    /// Newly created container.
    Create,
}

/// Bounds on how many siblings are materialized per group on first load.
///
/// Very large hierarchies stay tractable by skipping `start_member` children
/// and materializing at most `max_members` of the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberBounds {
    /// Maximum children materialized per group; `None` is unbounded.
    pub max_members: Option<usize>,
    /// Index of the first child to materialize.
    pub start_member: usize,
}

impl Default for MemberBounds {
    fn default() -> Self {
        Self {
            max_members: None,
            start_member: 0,
        }
    }
}

impl MemberBounds {
    /// Bound a group's child count to the configured window.
    pub(crate) fn clamp_range(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.start_member.min(len);
        let end = match self.max_members {
            Some(max) => (start + max).min(len),
            None => len,
        };
        start..end
    }
}

/// One open container: file identity, mode, format family, and the member
/// bounds applied while materializing its hierarchy.
///
/// The container owns its root node and, transitively, every node reachable
/// from it; closing the container invalidates them all.
#[derive(Debug, Clone)]
pub struct ContainerRef {
    /// Path of the underlying file.
    pub path: PathBuf,
    /// Mode the container was opened with.
    pub mode: AccessMode,
    /// Format family reported by the provider.
    pub family: FormatFamily,
    /// Sibling materialization bounds.
    pub bounds: MemberBounds,
    pub(crate) open: bool,
}

impl ContainerRef {
    /// Describe a container about to be opened.
    pub fn new(path: PathBuf, mode: AccessMode, family: FormatFamily) -> Self {
        Self {
            path,
            mode,
            family,
            bounds: MemberBounds::default(),
            open: true,
        }
    }

    /// Apply sibling materialization bounds.
    pub fn with_bounds(mut self, bounds: MemberBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Whether the container is still open.
    pub fn is_open(&self) -> bool {
        self.open
    }
}
