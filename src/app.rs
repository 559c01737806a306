//! Application context.
//!
//! One [`App`] is constructed at startup and passed by reference to whatever
//! drives the core; it owns the container tree, the view registry, the
//! transfer engine, the per-container providers, and the ledger of open view
//! bindings. There is no global state.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::ArrayD;

use crate::error::{Result, RossbyError, TransferError, TreeError, ViewError};
use crate::format::{FormatFamily, SignatureDetector};
use crate::notify::{Notifier, TreeEvent, WindowEvent};
use crate::object::{
    AccessMode, ContainerId, ContainerProvider, ContainerRef, ContainerTree, MemberBounds, NodeId,
    NodeKind,
};
use crate::transfer::{DeleteReport, TransferEngine, TransferMode, TransferReport};
use crate::view::{Capability, ViewBinding, ViewConfig, ViewRegistry};
use crate::window::SelectionWindow;

/// The core's root object: open containers, views, and the engines over them.
#[derive(Debug)]
pub struct App {
    tree: ContainerTree,
    registry: ViewRegistry,
    engine: TransferEngine,
    providers: HashMap<ContainerId, Box<dyn ContainerProvider>>,
    bindings: HashMap<NodeId, ViewBinding>,
    bounds: MemberBounds,
    window_notifier: Notifier<WindowEvent>,
    next_binding: u64,
}

impl App {
    /// Create a context with unbounded member materialization.
    pub fn new() -> Self {
        Self::with_bounds(MemberBounds::default())
    }

    /// Create a context that materializes at most the given sibling window
    /// per group when opening containers.
    pub fn with_bounds(bounds: MemberBounds) -> Self {
        Self {
            tree: ContainerTree::new(),
            registry: ViewRegistry::new(),
            engine: TransferEngine::new(),
            providers: HashMap::new(),
            bindings: HashMap::new(),
            bounds,
            window_notifier: Notifier::new(),
            next_binding: 0,
        }
    }

    /// The container tree, read-only. Mutations go through the context so
    /// view bindings stay consistent.
    pub fn tree(&self) -> &ContainerTree {
        &self.tree
    }

    /// The view registry.
    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// The view registry, for factory registration at startup.
    pub fn registry_mut(&mut self) -> &mut ViewRegistry {
        &mut self.registry
    }

    /// Register a listener for tree mutations.
    pub fn on_tree_changed(&mut self, listener: impl Fn(&TreeEvent) + 'static) {
        self.tree.on_tree_changed(listener);
    }

    /// Register a listener for selection-window mutations.
    pub fn on_window_changed(&mut self, listener: impl Fn(&WindowEvent) + 'static) {
        self.window_notifier.subscribe(listener);
    }

    /// Open a container through its provider and insert its hierarchy.
    ///
    /// The signature detector cross-checks the provider's family claim when
    /// the file exists; a mismatch is logged, the provider wins.
    pub fn open_container(
        &mut self,
        path: PathBuf,
        mode: AccessMode,
        mut provider: Box<dyn ContainerProvider>,
    ) -> Result<ContainerId> {
        let already_open = self
            .tree
            .containers()
            .any(|(_, c)| c.is_open() && c.path == path);
        if already_open {
            return Err(RossbyError::AlreadyOpen { path });
        }

        if mode != AccessMode::Create && path.exists() {
            let detected = SignatureDetector::classify(&path);
            if detected != FormatFamily::Unknown && detected != provider.family() {
                tracing::warn!(
                    "{} detected as {} but provider reports {}",
                    path.display(),
                    detected,
                    provider.family()
                );
            }
        }

        let structure = provider.load_structure()?;
        let descriptor =
            ContainerRef::new(path.clone(), mode, provider.family()).with_bounds(self.bounds);
        let container = self.tree.open_container(descriptor, structure);
        self.providers.insert(container, provider);

        tracing::info!("opened {} as {}", path.display(), container);
        Ok(container)
    }

    /// Close a container, invalidating every view binding into it.
    pub fn close_container(&mut self, container: ContainerId) -> Result<()> {
        let removed = self.tree.close_container(container)?;
        for id in &removed {
            if self.bindings.remove(id).is_some() {
                tracing::debug!("invalidated view binding for {}", id);
            }
            self.engine.clear_open(*id);
        }
        self.providers.remove(&container);
        Ok(())
    }

    /// Rename a node in place.
    pub fn rename(&mut self, node: NodeId, new_name: &str) -> std::result::Result<(), TreeError> {
        self.tree.rename(node, new_name)
    }

    /// Transfer nodes under a destination parent; see
    /// [`TransferEngine::transfer`].
    pub fn transfer(
        &mut self,
        nodes: &[NodeId],
        destination_parent: NodeId,
        mode: TransferMode,
    ) -> std::result::Result<TransferReport, TransferError> {
        self.engine
            .transfer(&mut self.tree, nodes, destination_parent, mode)
    }

    /// Delete nodes best-effort, dropping any view bindings into the removed
    /// subtrees.
    pub fn delete(&mut self, nodes: &[NodeId]) -> DeleteReport {
        let report = self.engine.delete(&mut self.tree, nodes);
        for id in &report.removed {
            self.bindings.remove(id);
            self.engine.clear_open(*id);
        }
        report
    }

    /// Open a view on a node, resolving the capability from its
    /// classification when none is requested.
    ///
    /// Opening an already-open node is a no-op that re-activates and returns
    /// the existing binding.
    pub fn open_view(
        &mut self,
        node: NodeId,
        capability: Option<Capability>,
        config: ViewConfig,
    ) -> Result<&ViewBinding> {
        match self.bindings.entry(node) {
            Entry::Occupied(entry) => {
                tracing::debug!("re-activating open view for {}", node);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let node_ref = self
                    .tree
                    .node(node)
                    .ok_or(TreeError::NodeNotFound { id: node })?;
                let capability = capability.unwrap_or_else(|| Capability::infer(node_ref));
                let view = self.registry.resolve(capability, node_ref, &config)?;

                let window = match (&node_ref.kind, &node_ref.shape) {
                    (NodeKind::Dataset, Some(shape)) => Some(SelectionWindow::new(shape.clone())),
                    _ => None,
                };

                let serial = self.next_binding;
                self.next_binding += 1;
                self.engine.mark_open(node);
                tracing::info!(
                    "opened {} view for {} via '{}'",
                    capability,
                    node,
                    view.factory_name()
                );
                Ok(entry.insert(ViewBinding {
                    node,
                    capability,
                    view,
                    window,
                    serial,
                }))
            }
        }
    }

    /// Close the view on a node, if any.
    pub fn close_view(&mut self, node: NodeId) {
        if self.bindings.remove(&node).is_some() {
            self.engine.clear_open(node);
            tracing::debug!("closed view for {}", node);
        }
    }

    /// The open view binding for a node, if any.
    pub fn binding(&self, node: NodeId) -> Option<&ViewBinding> {
        self.bindings.get(&node)
    }

    /// Number of open views.
    pub fn open_view_count(&self) -> usize {
        self.bindings.len()
    }

    /// Jump the node's window to a frame and notify window listeners.
    ///
    /// A no-op for views without a window (non-dataset nodes).
    pub fn goto_frame(&mut self, node: NodeId, index: u64) -> Result<()> {
        let binding = self
            .bindings
            .get_mut(&node)
            .ok_or(ViewError::NoOpenView { node })?;
        if let Some(window) = binding.window.as_mut() {
            window.goto_frame(index)?;
            let frame = window.frame_index();
            self.window_notifier
                .notify(&WindowEvent::FrameChanged { node, frame });
        }
        Ok(())
    }

    /// Step the node's window to the next frame.
    pub fn next_frame(&mut self, node: NodeId) -> Result<()> {
        self.step_frame(node, SelectionWindow::next_frame)
    }

    /// Step the node's window to the previous frame.
    pub fn previous_frame(&mut self, node: NodeId) -> Result<()> {
        self.step_frame(node, SelectionWindow::previous_frame)
    }

    /// Jump the node's window to the first frame.
    pub fn first_frame(&mut self, node: NodeId) -> Result<()> {
        self.step_frame(node, SelectionWindow::first_frame)
    }

    /// Jump the node's window to the last frame.
    pub fn last_frame(&mut self, node: NodeId) -> Result<()> {
        self.step_frame(node, SelectionWindow::last_frame)
    }

    /// Fetch the node's currently windowed data through its container's
    /// provider, clearing the window's dirty flag.
    pub fn materialize(&mut self, node: NodeId) -> Result<ArrayD<f64>> {
        let path = self
            .tree
            .path_of(node)
            .ok_or(TreeError::NodeNotFound { id: node })?;
        let container = self
            .tree
            .node(node)
            .map(|n| n.container())
            .ok_or(TreeError::NodeNotFound { id: node })?;

        let binding = self
            .bindings
            .get_mut(&node)
            .ok_or(ViewError::NoOpenView { node })?;
        let window = binding
            .window
            .as_mut()
            .ok_or(ViewError::NoOpenView { node })?;
        let provider = self
            .providers
            .get_mut(&container)
            .ok_or(TreeError::ContainerClosed { id: container })?;

        window.materialize(provider.as_mut(), &path)
    }

    fn step_frame(&mut self, node: NodeId, step: fn(&mut SelectionWindow)) -> Result<()> {
        let binding = self
            .bindings
            .get_mut(&node)
            .ok_or(ViewError::NoOpenView { node })?;
        if let Some(window) = binding.window.as_mut() {
            let before = window.frame_index();
            step(window);
            let after = window.frame_index();
            if before != after {
                self.window_notifier
                    .notify(&WindowEvent::FrameChanged { node, frame: after });
            }
        }
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a container file by signature, picking a provider for its family.
///
/// `make_provider` adapts the host's container-format libraries: given the
/// detected family it returns the provider to read the file with, or `None`
/// when the host has no library for that family.
pub fn open_detected(
    app: &mut App,
    path: &Path,
    mode: AccessMode,
    make_provider: impl FnOnce(FormatFamily) -> Option<Box<dyn ContainerProvider>>,
) -> Result<ContainerId> {
    let family = SignatureDetector::classify(path);
    if family == FormatFamily::Unknown {
        return Err(RossbyError::UnrecognizedFormat {
            path: path.to_path_buf(),
        });
    }
    let provider = make_provider(family).ok_or_else(|| RossbyError::UnrecognizedFormat {
        path: path.to_path_buf(),
    })?;
    app.open_container(path.to_path_buf(), mode, provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatFamily;
    use crate::object::{DataClass, MemoryContainer, NodeSpec};
    use ndarray::IxDyn;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample_provider() -> Box<dyn ContainerProvider> {
        let structure = NodeSpec::group("/").with_child(
            NodeSpec::group("g1")
                .with_child(NodeSpec::dataset("d1", vec![4, 10, 10], "f32"))
                .with_child(
                    NodeSpec::dataset("notes", vec![16], "u8").with_class(DataClass::Text),
                ),
        );
        let data = ArrayD::from_shape_vec(
            IxDyn(&[4, 10, 10]),
            (0..400).map(f64::from).collect(),
        )
        .unwrap();
        Box::new(MemoryContainer::new(FormatFamily::Hdf5, structure).with_data("/g1/d1", data))
    }

    fn sample_app() -> (App, ContainerId) {
        let mut app = App::new();
        let c = app
            .open_container(PathBuf::from("sample.h5"), AccessMode::Read, sample_provider())
            .unwrap();
        (app, c)
    }

    #[test]
    fn opening_the_same_path_twice_is_refused() {
        let (mut app, _) = sample_app();
        let err = app
            .open_container(PathBuf::from("sample.h5"), AccessMode::Read, sample_provider())
            .unwrap_err();
        assert!(matches!(err, RossbyError::AlreadyOpen { .. }));
    }

    #[test]
    fn open_view_is_idempotent() {
        let (mut app, c) = sample_app();
        let root = app.tree().root_of(c).unwrap();
        let d1 = app.tree().find(root, "*d1").unwrap();

        let first = app
            .open_view(d1, None, ViewConfig::default())
            .unwrap()
            .serial();
        let second = app
            .open_view(d1, None, ViewConfig::default())
            .unwrap()
            .serial();
        assert_eq!(first, second);
        assert_eq!(app.open_view_count(), 1);
    }

    #[test]
    fn capability_is_inferred_from_classification() {
        let (mut app, c) = sample_app();
        let root = app.tree().root_of(c).unwrap();
        let notes = app.tree().find(root, "notes").unwrap();
        let g1 = app.tree().find(root, "g1").unwrap();

        let binding = app.open_view(notes, None, ViewConfig::default()).unwrap();
        assert_eq!(binding.capability, Capability::Text);
        assert!(binding.window.is_some());

        let binding = app.open_view(g1, None, ViewConfig::default()).unwrap();
        assert_eq!(binding.capability, Capability::Metadata);
        assert!(binding.window.is_none());
    }

    #[test]
    fn closing_a_container_invalidates_bindings() {
        let (mut app, c) = sample_app();
        let root = app.tree().root_of(c).unwrap();
        let d1 = app.tree().find(root, "*d1").unwrap();

        app.open_view(d1, None, ViewConfig::default()).unwrap();
        assert_eq!(app.open_view_count(), 1);

        app.close_container(c).unwrap();
        assert_eq!(app.open_view_count(), 0);
        assert!(app.binding(d1).is_none());
    }

    #[test]
    fn frame_navigation_notifies_listeners() {
        let (mut app, c) = sample_app();
        let root = app.tree().root_of(c).unwrap();
        let d1 = app.tree().find(root, "*d1").unwrap();
        app.open_view(d1, None, ViewConfig::default()).unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        app.on_window_changed(move |e| sink.borrow_mut().push(e.clone()));

        app.next_frame(d1).unwrap();
        app.next_frame(d1).unwrap();
        app.last_frame(d1).unwrap();
        // Already on the last frame: no event.
        app.next_frame(d1).unwrap();
        app.goto_frame(d1, 1).unwrap();
        assert!(app.goto_frame(d1, 99).is_err());

        let events = events.borrow();
        assert_eq!(
            *events,
            vec![
                WindowEvent::FrameChanged { node: d1, frame: 1 },
                WindowEvent::FrameChanged { node: d1, frame: 2 },
                WindowEvent::FrameChanged { node: d1, frame: 3 },
                WindowEvent::FrameChanged { node: d1, frame: 1 },
            ]
        );
    }

    #[test]
    fn materialize_reads_the_current_frame() {
        let (mut app, c) = sample_app();
        let root = app.tree().root_of(c).unwrap();
        let d1 = app.tree().find(root, "*d1").unwrap();
        app.open_view(d1, None, ViewConfig::default()).unwrap();

        let frame = app.materialize(d1).unwrap();
        assert_eq!(frame.shape(), &[1, 10, 10]);
        assert_eq!(frame[[0, 0, 0]], 0.0);

        app.goto_frame(d1, 2).unwrap();
        let frame = app.materialize(d1).unwrap();
        assert_eq!(frame[[0, 0, 0]], 200.0);
    }

    #[test]
    fn delete_drops_bindings_into_the_subtree() {
        let (mut app, c) = sample_app();
        let root = app.tree().root_of(c).unwrap();
        let g1 = app.tree().find(root, "g1").unwrap();
        let d1 = app.tree().find(root, "*d1").unwrap();
        app.open_view(d1, None, ViewConfig::default()).unwrap();

        let report = app.delete(&[g1]);
        assert!(report.failed.is_empty());
        assert_eq!(app.open_view_count(), 0);
    }

    #[test]
    fn open_detected_rejects_unrecognized_files() {
        let mut app = App::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.bin");
        std::fs::write(&path, [1u8, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        let err = open_detected(&mut app, &path, AccessMode::Read, |_| {
            Some(sample_provider())
        })
        .unwrap_err();
        assert!(matches!(err, RossbyError::UnrecognizedFormat { .. }));
    }
}
