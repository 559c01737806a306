//! The container tree.
//!
//! One [`ContainerTree`] owns the forest of every open container's nodes as
//! an id arena. It is a cache/index over the containers' persisted structure:
//! removing a node detaches it here, while removal from the underlying store
//! is the caller's responsibility. All mutations are synchronous and fire
//! listeners after (never before) they succeed.

use std::collections::{HashMap, VecDeque};

use crate::error::TreeError;
use crate::notify::{Notifier, TreeEvent};
use crate::object::container::ContainerRef;
use crate::object::node::{ContainerId, NodeId, ResourceNode};
use crate::object::provider::NodeSpec;
use crate::object::MemberBounds;

/// Name-matching mode for [`ContainerTree::find`], derived by stripping
/// leading/trailing `*` from the query.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NamePattern {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl NamePattern {
    /// `None` for queries that can never match (`""`, `"*"`, `"**"`).
    fn parse(query: &str) -> Option<Self> {
        let mut text = query;
        let mut is_suffix = false;
        let mut is_prefix = false;

        if let Some(stripped) = text.strip_prefix('*') {
            is_suffix = true;
            text = stripped;
        }
        if let Some(stripped) = text.strip_suffix('*') {
            is_prefix = true;
            text = stripped;
        }
        if text.is_empty() {
            return None;
        }

        let text = text.to_string();
        Some(match (is_prefix, is_suffix) {
            (true, true) => NamePattern::Contains(text),
            (true, false) => NamePattern::Prefix(text),
            (false, true) => NamePattern::Suffix(text),
            (false, false) => NamePattern::Exact(text),
        })
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(t) => name == t,
            NamePattern::Prefix(t) => name.starts_with(t.as_str()),
            NamePattern::Suffix(t) => name.ends_with(t.as_str()),
            NamePattern::Contains(t) => name.contains(t.as_str()),
        }
    }
}

/// Breadth-first traversal over a subtree.
#[derive(Debug)]
pub struct BreadthFirst<'a> {
    tree: &'a ContainerTree,
    queue: VecDeque<NodeId>,
}

impl Iterator for BreadthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.queue.pop_front()?;
        if let Some(node) = self.tree.node(id) {
            self.queue.extend(node.children().iter().copied());
        }
        Some(id)
    }
}

/// The forest of open containers.
#[derive(Debug)]
pub struct ContainerTree {
    nodes: HashMap<NodeId, ResourceNode>,
    containers: HashMap<ContainerId, ContainerRef>,
    roots: HashMap<ContainerId, NodeId>,
    next_node: u64,
    next_container: u32,
    notifier: Notifier<TreeEvent>,
}

impl ContainerTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            containers: HashMap::new(),
            roots: HashMap::new(),
            next_node: 0,
            next_container: 0,
            notifier: Notifier::new(),
        }
    }

    /// Register a listener for tree mutations.
    pub fn on_tree_changed(&mut self, listener: impl Fn(&TreeEvent) + 'static) {
        self.notifier.subscribe(listener);
    }

    /// Insert an opened container's hierarchy, materializing at most the
    /// siblings its member bounds allow per group.
    pub fn open_container(&mut self, descriptor: ContainerRef, structure: NodeSpec) -> ContainerId {
        let container = ContainerId::from_raw(self.next_container);
        self.next_container += 1;

        let bounds = descriptor.bounds;
        let root = self.materialize(container, None, &structure, bounds);

        tracing::debug!(
            "opened {} as {} ({} nodes)",
            descriptor.path.display(),
            container,
            self.iter_breadth_first(root).count()
        );

        self.containers.insert(container, descriptor);
        self.roots.insert(container, root);
        self.notifier
            .notify(&TreeEvent::ContainerOpened { container, root });
        container
    }

    /// Close a container, dropping every node reachable from its root.
    ///
    /// Returns the removed node ids so callers can invalidate outstanding
    /// windows and view bindings.
    pub fn close_container(&mut self, container: ContainerId) -> Result<Vec<NodeId>, TreeError> {
        match self.containers.get_mut(&container) {
            Some(c) if c.open => c.open = false,
            _ => return Err(TreeError::ContainerClosed { id: container }),
        }

        let removed = match self.roots.remove(&container) {
            Some(root) => {
                let ids: Vec<NodeId> = self.iter_breadth_first(root).collect();
                for id in &ids {
                    self.nodes.remove(id);
                }
                ids
            }
            None => Vec::new(),
        };

        tracing::debug!("closed {} ({} nodes dropped)", container, removed.len());
        self.notifier
            .notify(&TreeEvent::ContainerClosed { container });
        Ok(removed)
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&ResourceNode> {
        self.nodes.get(&id)
    }

    /// Look up a container descriptor.
    pub fn container(&self, id: ContainerId) -> Option<&ContainerRef> {
        self.containers.get(&id)
    }

    /// Root node of an open container.
    pub fn root_of(&self, container: ContainerId) -> Option<NodeId> {
        self.roots.get(&container).copied()
    }

    /// Iterate every known container descriptor, closed ones included.
    pub fn containers(&self) -> impl Iterator<Item = (ContainerId, &ContainerRef)> {
        self.containers.iter().map(|(id, c)| (*id, c))
    }

    /// Whether `id` is a container root.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.is_root())
    }

    /// Number of live nodes across all containers.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert the subtree `spec` describes under `parent`, appended as the
    /// last sibling. Fails with `InvalidParent` if `parent` is not a group
    /// and `DuplicateName` if a sibling already carries the name.
    pub fn insert(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId, TreeError> {
        let parent_node = self
            .node(parent)
            .ok_or(TreeError::NodeNotFound { id: parent })?;
        if !parent_node.is_group() {
            return Err(TreeError::InvalidParent { id: parent });
        }
        if self.child_named(parent, &spec.name).is_some() {
            return Err(TreeError::DuplicateName { name: spec.name });
        }

        let container = parent_node.container();
        let id = self.materialize(container, Some(parent), &spec, MemberBounds::default());
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        self.notifier.notify(&TreeEvent::NodeInserted { id });
        Ok(id)
    }

    /// Detach a node and its subtree. Container roots cannot be removed.
    ///
    /// Returns every removed id, subtree root first.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let node = self.node(id).ok_or(TreeError::NodeNotFound { id })?;
        let parent = node.parent().ok_or(TreeError::RootDeletion)?;

        let ids: Vec<NodeId> = self.iter_breadth_first(id).collect();
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != id);
        }
        for removed in &ids {
            self.nodes.remove(removed);
        }

        self.notifier
            .notify(&TreeEvent::NodeRemoved { ids: ids.clone() });
        Ok(ids)
    }

    /// Rename a node in place; its id is preserved.
    ///
    /// Renaming to the current name is a no-op. Fails on container roots, on
    /// sibling name clashes, and in containers whose format family is
    /// read-structure-only for renames.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<(), TreeError> {
        let node = self.node(id).ok_or(TreeError::NodeNotFound { id })?;
        let parent = match node.parent() {
            Some(p) => p,
            None => return Err(TreeError::RootRename),
        };

        let family = self
            .container(node.container())
            .map(|c| c.family)
            .ok_or(TreeError::ContainerClosed {
                id: node.container(),
            })?;
        if !family.supports_rename() {
            return Err(TreeError::RenameUnsupported { family });
        }

        if node.name == new_name {
            return Ok(());
        }
        if self.child_named(parent, new_name).is_some() {
            return Err(TreeError::DuplicateName {
                name: new_name.to_string(),
            });
        }

        if let Some(n) = self.nodes.get_mut(&id) {
            n.name = new_name.to_string();
        }
        self.notifier.notify(&TreeEvent::NodeRenamed { id });
        Ok(())
    }

    /// Breadth-first search from `start` for the first node whose name
    /// matches `query`: `name*` prefix, `*name` suffix, `*name*` substring,
    /// otherwise exact. A bare `*` matches nothing.
    pub fn find(&self, start: NodeId, query: &str) -> Option<NodeId> {
        let pattern = NamePattern::parse(query)?;
        self.iter_breadth_first(start)
            .find(|id| self.node(*id).is_some_and(|n| pattern.matches(&n.name)))
    }

    /// Iterate a subtree breadth-first, `start` included.
    pub fn iter_breadth_first(&self, start: NodeId) -> BreadthFirst<'_> {
        let mut queue = VecDeque::new();
        if self.nodes.contains_key(&start) {
            queue.push_back(start);
        }
        BreadthFirst { tree: self, queue }
    }

    /// Whether `node` lies in the subtree rooted at `root` (inclusive).
    pub fn is_in_subtree(&self, node: NodeId, root: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == root {
                return true;
            }
            cursor = self.node(id).and_then(|n| n.parent());
        }
        false
    }

    /// Absolute `/`-separated path of a node within its container.
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut cursor = self.node(id)?;
        while let Some(parent) = cursor.parent() {
            segments.push(cursor.name.clone());
            cursor = self.node(parent)?;
        }
        if segments.is_empty() {
            return Some("/".to_string());
        }
        segments.reverse();
        Some(format!("/{}", segments.join("/")))
    }

    /// Child of `parent` with exactly this name.
    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)?
            .children()
            .iter()
            .copied()
            .find(|c| self.node(*c).is_some_and(|n| n.name == name))
    }

    /// Deep-duplicate the subtree at `src` as a new child of `dest_parent`.
    ///
    /// Fresh ids are allocated in the destination's container; attributes are
    /// copied verbatim, so reference-valued attributes in the duplicate still
    /// point at objects in the source container. Precondition checks are the
    /// transfer engine's job.
    pub(crate) fn duplicate_subtree(&mut self, src: NodeId, dest_parent: NodeId) -> Option<NodeId> {
        let container = self.node(dest_parent)?.container();
        let id = self.clone_into(src, container, Some(dest_parent))?;
        self.nodes.get_mut(&dest_parent)?.children.push(id);
        self.notifier.notify(&TreeEvent::NodeInserted { id });
        Some(id)
    }

    fn clone_into(
        &mut self,
        src: NodeId,
        container: ContainerId,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let source = self.node(src)?.clone();
        let id = self.alloc_node();

        let mut children = Vec::with_capacity(source.children.len());
        for child in source.children {
            children.push(self.clone_into(child, container, Some(id))?);
        }

        self.nodes.insert(
            id,
            ResourceNode {
                id,
                container,
                parent,
                children,
                name: source.name,
                kind: source.kind,
                class: source.class,
                attributes: source.attributes,
                shape: source.shape,
                dtype: source.dtype,
            },
        );
        Some(id)
    }

    fn materialize(
        &mut self,
        container: ContainerId,
        parent: Option<NodeId>,
        spec: &NodeSpec,
        bounds: MemberBounds,
    ) -> NodeId {
        let id = self.alloc_node();

        let mut children = Vec::new();
        if spec.kind.is_group() {
            let range = bounds.clamp_range(spec.children.len());
            for child in &spec.children[range] {
                children.push(self.materialize(container, Some(id), child, bounds));
            }
        }

        self.nodes.insert(
            id,
            ResourceNode {
                id,
                container,
                parent,
                children,
                name: spec.name.clone(),
                kind: spec.kind,
                class: spec.class,
                attributes: spec.attributes.clone(),
                shape: spec.shape.clone(),
                dtype: spec.dtype.clone(),
            },
        );
        id
    }

    fn alloc_node(&mut self) -> NodeId {
        let id = NodeId::from_raw(self.next_node);
        self.next_node += 1;
        id
    }
}

impl Default for ContainerTree {
    fn default() -> Self {
        Self::new()
    }
}
