//! Error types for Rossby.
//!
//! This module provides a unified error handling approach using `thiserror`.
//! Structural, compatibility and range errors are always returned to the
//! caller; none of them leaves the tree or a selection window partially
//! mutated.

use std::path::PathBuf;
use thiserror::Error;

use crate::format::FormatFamily;
use crate::object::{ContainerId, NodeId};
use crate::view::Capability;

/// Result type alias for Rossby operations.
pub type Result<T> = std::result::Result<T, RossbyError>;

/// Errors raised by tree-shape operations (`insert`, `remove`, `rename`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The node id does not resolve in this tree.
    #[error("node not found: {id}")]
    NodeNotFound {
        /// Id that failed to resolve.
        id: NodeId,
    },

    /// The container id does not resolve, or the container was closed.
    #[error("container is not open: {id}")]
    ContainerClosed {
        /// Container that is missing or closed.
        id: ContainerId,
    },

    /// Insertion target is not a group.
    #[error("invalid parent {id}: not a group")]
    InvalidParent {
        /// The non-group node used as a parent.
        id: NodeId,
    },

    /// A sibling with this name already exists.
    #[error("duplicate name among siblings: {name}")]
    DuplicateName {
        /// The clashing name.
        name: String,
    },

    /// Container roots cannot be removed.
    #[error("cannot remove a container root")]
    RootDeletion,

    /// Container roots cannot be renamed.
    #[error("cannot rename a container root")]
    RootRename,

    /// The owning container's format family does not allow renames.
    #[error("cannot rename objects in a {family} container")]
    RenameUnsupported {
        /// Family that is read-structure-only for renames.
        family: FormatFamily,
    },
}

/// Errors raised by the transfer engine, both batch-level and per-node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// A transferred node id does not resolve.
    #[error("node not found: {id}")]
    NodeNotFound {
        /// Id that failed to resolve.
        id: NodeId,
    },

    /// Source or destination container is closed.
    #[error("container is not open: {id}")]
    ContainerClosed {
        /// Container that is missing or closed.
        id: ContainerId,
    },

    /// The destination parent is not a group.
    #[error("invalid destination {id}: not a group")]
    InvalidParent {
        /// The non-group destination node.
        id: NodeId,
    },

    /// Objects cannot be copied between these format families.
    #[error("cannot copy {source_family} object to {destination} container")]
    UnsupportedCrossFormat {
        /// Family of the source container.
        source_family: FormatFamily,
        /// Family of the destination container.
        destination: FormatFamily,
    },

    /// Moves never cross container boundaries.
    #[error("cannot move objects to a different container")]
    UnsupportedCrossContainerMove,

    /// Container roots cannot be transferred.
    #[error("cannot copy a container root")]
    RootTransfer,

    /// The destination lies inside the transferred subtree.
    #[error("cannot copy a group into itself or one of its descendants")]
    CycleDetected,

    /// The destination already has a child with this name.
    #[error("duplicate name among siblings: {name}")]
    DuplicateName {
        /// The clashing name.
        name: String,
    },

    /// The node (or one of its descendants) has an open view binding.
    #[error("object {name} is in use; close its view and try again")]
    NodeInUse {
        /// Name of the in-use object.
        name: String,
    },
}

/// Range errors from selection-window subsetting and paging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// Frame index outside `[0, extent)` for the page axis.
    #[error("frame index {index} out of range (0..{extent})")]
    FrameOutOfRange {
        /// Requested frame.
        index: u64,
        /// Extent of the page axis.
        extent: u64,
    },

    /// start/stride/count selects past the end of an axis.
    #[error("selection exceeds shape on axis {axis}")]
    ExtentOutOfBounds {
        /// First offending axis.
        axis: usize,
    },

    /// Display axes are out of range, duplicated, or not 1-3 of them.
    #[error("invalid display axes for rank {rank}")]
    InvalidAxes {
        /// Rank of the dataset.
        rank: usize,
    },

    /// start/stride/count length differs from the dataset rank.
    #[error("selection rank {given} does not match dataset rank {rank}")]
    RankMismatch {
        /// Rank of the dataset.
        rank: usize,
        /// Length of the supplied selection arrays.
        given: usize,
    },
}

/// View resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// Every candidate implementation failed to instantiate.
    #[error("no {capability} view available")]
    NoViewAvailable {
        /// Requested capability.
        capability: Capability,
    },

    /// The built-in default failed. This is a broken deployment, not a data
    /// problem, and is never folded into the fallback chain.
    #[error("built-in {capability} view failed to instantiate: {reason}")]
    BuiltinViewFailed {
        /// Requested capability.
        capability: Capability,
        /// Why the built-in refused.
        reason: String,
    },

    /// A factory declined the object it was asked to display.
    #[error("{factory} cannot display this object: {reason}")]
    Unsuitable {
        /// Name of the declining factory.
        factory: String,
        /// Why the factory declined.
        reason: String,
    },

    /// A window operation was requested for a node with no open view.
    #[error("no open view for {node}")]
    NoOpenView {
        /// The node without a binding.
        node: NodeId,
    },
}

/// Errors that can occur in Rossby.
#[derive(Debug, Error)]
pub enum RossbyError {
    /// Failed to open a file.
    #[error("failed to open file: {path}")]
    FileOpen {
        /// Path of the file.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The file's signature matches no supported container format.
    #[error("unrecognized container format: {path}")]
    UnrecognizedFormat {
        /// Path of the rejected file.
        path: PathBuf,
    },

    /// The file is already open as a container.
    #[error("container already open: {path}")]
    AlreadyOpen {
        /// Path of the already-open container.
        path: PathBuf,
    },

    /// Structure or data reported broken by the container provider.
    #[error("container provider error: {0}")]
    Provider(String),

    /// Tree-shape error.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Transfer error.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Selection-window range error.
    #[error(transparent)]
    Window(#[from] WindowError),

    /// View resolution error.
    #[error(transparent)]
    View(#[from] ViewError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RossbyError {
    /// Create a FileOpen error.
    pub fn file_open(path: PathBuf, source: std::io::Error) -> Self {
        Self::FileOpen { path, source }
    }

    /// Create a Provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }
}
