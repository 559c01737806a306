//! Change notification.
//!
//! The tree and the window layer each expose a single typed observer channel.
//! Events fire after (never before) a successful mutation and carry the
//! affected node ids; there is no UI event system in the core.

use std::fmt;

use crate::object::{ContainerId, NodeId};

/// A tree mutation that listeners may react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// A container was opened and its root inserted.
    ContainerOpened {
        /// The new container.
        container: ContainerId,
        /// Its root node.
        root: NodeId,
    },
    /// A container was closed; all of its nodes are now invalid.
    ContainerClosed {
        /// The closed container.
        container: ContainerId,
    },
    /// A node (possibly a whole subtree) was inserted.
    NodeInserted {
        /// Root of the inserted subtree.
        id: NodeId,
    },
    /// A subtree was detached; ids are in removal order.
    NodeRemoved {
        /// Every removed node id.
        ids: Vec<NodeId>,
    },
    /// A node was renamed in place; its id is unchanged.
    NodeRenamed {
        /// The renamed node.
        id: NodeId,
    },
}

/// A selection-window mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    /// The page position changed; displayed data must be re-fetched.
    FrameChanged {
        /// Dataset node the window belongs to.
        node: NodeId,
        /// New frame index.
        frame: u64,
    },
    /// The subsetting extent or display axes changed.
    SelectionChanged {
        /// Dataset node the window belongs to.
        node: NodeId,
    },
}

/// An ordered list of observers for one event type.
pub struct Notifier<E> {
    listeners: Vec<Box<dyn Fn(&E)>>,
}

impl<E> Notifier<E> {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a listener. Listeners are invoked in registration order.
    pub fn subscribe(&mut self, listener: impl Fn(&E) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Deliver an event to every listener.
    pub fn notify(&self, event: &E) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
