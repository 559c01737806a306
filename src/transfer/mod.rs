//! Cross-container transfer.
//!
//! The [`TransferEngine`] copies, moves, and deletes nodes within and across
//! open containers. Batch-level compatibility is validated before any
//! mutation; the remaining checks run per node with best-effort semantics,
//! so one node failing is reported and the rest of the batch is still
//! attempted.

use std::collections::HashSet;

use crate::error::{TransferError, TreeError};
use crate::object::{ContainerTree, NodeId};

/// Whether a transfer duplicates or relocates its nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Deep-duplicate into the destination; the source is untouched.
    Copy,
    /// In-container copy-then-delete; external references against the
    /// container stay valid. Never crosses container boundaries.
    Move,
}

/// Outcome of a batch transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Ids of the newly created subtree roots, in batch order.
    pub succeeded: Vec<NodeId>,
    /// Per-node failures, in batch order.
    pub failed: Vec<(NodeId, TransferError)>,
}

impl TransferReport {
    /// Whether every node in the batch went through.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Every removed node id, including descendants.
    pub removed: Vec<NodeId>,
    /// Per-node failures, in batch order.
    pub failed: Vec<(NodeId, TreeError)>,
}

/// Copy/move/delete engine over a [`ContainerTree`].
///
/// The engine tracks which nodes have open view bindings; a `Move` refuses to
/// relocate a node whose subtree is in use, since the binding's window would
/// silently detach from its data.
#[derive(Debug, Default)]
pub struct TransferEngine {
    open_nodes: HashSet<NodeId>,
}

impl TransferEngine {
    /// Create an engine with no open nodes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a node has an open view binding.
    pub fn mark_open(&mut self, id: NodeId) {
        self.open_nodes.insert(id);
    }

    /// Record that a node's view binding was closed.
    pub fn clear_open(&mut self, id: NodeId) {
        self.open_nodes.remove(&id);
    }

    /// Transfer `nodes` under `destination_parent`.
    ///
    /// Batch-level preconditions, checked in order before any mutation:
    /// every involved container must be open; copies between HDF4 and HDF5
    /// containers are unsupported in both directions (same-family and
    /// same-container transfers are always allowed); moves never cross
    /// containers. Root, cycle, destination-kind, in-use and duplicate-name
    /// checks then run per node.
    pub fn transfer(
        &self,
        tree: &mut ContainerTree,
        nodes: &[NodeId],
        destination_parent: NodeId,
        mode: TransferMode,
    ) -> Result<TransferReport, TransferError> {
        let dest = tree
            .node(destination_parent)
            .ok_or(TransferError::NodeNotFound {
                id: destination_parent,
            })?;
        let dest_container = dest.container();
        let dest_family = match tree.container(dest_container) {
            Some(c) if c.is_open() => c.family,
            _ => return Err(TransferError::ContainerClosed { id: dest_container }),
        };

        for &id in nodes {
            let node = tree.node(id).ok_or(TransferError::NodeNotFound { id })?;
            let src_container = node.container();
            let src_family = match tree.container(src_container) {
                Some(c) if c.is_open() => c.family,
                _ => return Err(TransferError::ContainerClosed { id: src_container }),
            };

            if src_container != dest_container {
                if src_family != dest_family {
                    return Err(TransferError::UnsupportedCrossFormat {
                        source_family: src_family,
                        destination: dest_family,
                    });
                }
                if mode == TransferMode::Move {
                    return Err(TransferError::UnsupportedCrossContainerMove);
                }
            }
        }

        let mut report = TransferReport::default();
        for &id in nodes {
            match self.transfer_one(tree, id, destination_parent, mode) {
                Ok(new_id) => report.succeeded.push(new_id),
                Err(e) => {
                    tracing::warn!("transfer of {} failed: {}", id, e);
                    report.failed.push((id, e));
                }
            }
        }
        Ok(report)
    }

    fn transfer_one(
        &self,
        tree: &mut ContainerTree,
        id: NodeId,
        destination_parent: NodeId,
        mode: TransferMode,
    ) -> Result<NodeId, TransferError> {
        let node = tree.node(id).ok_or(TransferError::NodeNotFound { id })?;
        if node.is_root() {
            return Err(TransferError::RootTransfer);
        }
        let name = node.name.clone();

        // Walk from the destination up to its root: landing anywhere inside
        // the transferred subtree would create a cycle.
        let mut cursor = Some(destination_parent);
        while let Some(at) = cursor {
            if tree.is_root(at) {
                break;
            }
            if at == id {
                return Err(TransferError::CycleDetected);
            }
            cursor = tree.node(at).and_then(|n| n.parent());
        }

        let dest = tree
            .node(destination_parent)
            .ok_or(TransferError::NodeNotFound {
                id: destination_parent,
            })?;
        if !dest.is_group() {
            return Err(TransferError::InvalidParent {
                id: destination_parent,
            });
        }

        if mode == TransferMode::Move {
            if let Some(open) = self.open_in_subtree(tree, id) {
                let name = tree.node(open).map_or_else(String::new, |n| n.name.clone());
                return Err(TransferError::NodeInUse { name });
            }
        }

        if tree.child_named(destination_parent, &name).is_some() {
            return Err(TransferError::DuplicateName { name });
        }

        tracing::debug!("{} {} -> {}", mode_verb(mode), id, destination_parent);
        let new_id = tree
            .duplicate_subtree(id, destination_parent)
            .ok_or(TransferError::NodeNotFound { id })?;

        if mode == TransferMode::Move {
            // Listeners must see the insertion before the source deletion.
            tree.remove(id)
                .map_err(|_| TransferError::NodeNotFound { id })?;
        }

        Ok(new_id)
    }

    /// Detach `nodes` (and their subtrees) from the tree, best-effort.
    ///
    /// Roots are refused per node; the underlying containers' persisted
    /// storage is the caller's responsibility.
    pub fn delete(&self, tree: &mut ContainerTree, nodes: &[NodeId]) -> DeleteReport {
        let mut report = DeleteReport::default();
        for &id in nodes {
            match tree.remove(id) {
                Ok(ids) => report.removed.extend(ids),
                Err(e) => {
                    tracing::warn!("delete of {} failed: {}", id, e);
                    report.failed.push((id, e));
                }
            }
        }
        report
    }

    fn open_in_subtree(&self, tree: &ContainerTree, root: NodeId) -> Option<NodeId> {
        if self.open_nodes.is_empty() {
            return None;
        }
        tree.iter_breadth_first(root)
            .find(|id| self.open_nodes.contains(id))
    }
}

fn mode_verb(mode: TransferMode) -> &'static str {
    match mode {
        TransferMode::Copy => "copying",
        TransferMode::Move => "moving",
    }
}
