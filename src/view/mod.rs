//! View resolution.
//!
//! A [`ViewRegistry`] maps a requested capability plus an object's data-class
//! classification to the implementation that will display it. Candidates are
//! tried in a deterministic order (the configured preferred factory, then
//! every registered factory in registration order, then a built-in default
//! that always exists) and the first that instantiates wins. Rendering
//! itself lives behind the [`ViewFactory`] seam and is not the core's
//! concern.

use std::collections::HashMap;
use std::fmt;

use crate::error::ViewError;
use crate::object::{DataClass, NodeId, NodeKind, ResourceNode};
use crate::window::SelectionWindow;

/// A requested kind of viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Spreadsheet-style value display.
    Table,
    /// Image rendering.
    Image,
    /// Text display.
    Text,
    /// Object metadata display.
    Metadata,
}

impl Capability {
    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Capability::Table => "table",
            Capability::Image => "image",
            Capability::Text => "text",
            Capability::Metadata => "metadata",
        }
    }

    /// Capability inferred from a node's kind and classification, used when
    /// the caller does not request one explicitly.
    pub fn infer(node: &ResourceNode) -> Capability {
        if node.kind != NodeKind::Dataset {
            return Capability::Metadata;
        }
        match node.class {
            DataClass::Text => Capability::Text,
            DataClass::Image => Capability::Image,
            DataClass::Table | DataClass::Unknown => Capability::Table,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bitmask handling for table/image views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitmaskOp {
    /// No bitmask applied.
    #[default]
    None,
    /// Show only the bits the mask selects.
    Extract,
    /// AND the mask into displayed values.
    Apply,
}

/// Index base for row/column labels and frame numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexBase {
    /// 0-based indexing.
    #[default]
    Zero,
    /// 1-based indexing.
    One,
}

/// Display configuration handed to table/image factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewConfig {
    /// Bitmask operation mode.
    pub bitmask_op: BitmaskOp,
    /// Swap rows and columns.
    pub transposed: bool,
    /// 0- vs 1-based indexing.
    pub index_base: IndexBase,
    /// Show character data as raw bytes.
    pub chars_as_bytes: bool,
}

/// A resolved, instantiated view.
pub trait ViewInstance: fmt::Debug {
    /// Capability this view serves.
    fn capability(&self) -> Capability;

    /// Name of the factory that built this view.
    fn factory_name(&self) -> &str;
}

/// Builds view instances for one capability.
pub trait ViewFactory: fmt::Debug {
    /// Unique factory name; the preferred-implementation setting refers to it.
    fn name(&self) -> &str;

    /// Instantiate a view for `node`. A factory may decline an object it
    /// cannot display; resolution then falls back to the next candidate.
    fn instantiate(
        &self,
        node: &ResourceNode,
        config: &ViewConfig,
    ) -> Result<Box<dyn ViewInstance>, ViewError>;
}

/// The built-in fallback view: inert, records what it was asked to display.
#[derive(Debug)]
pub struct BuiltinView {
    capability: Capability,
    /// Node the view was opened for.
    pub node: NodeId,
    /// Configuration the view was opened with.
    pub config: ViewConfig,
}

impl ViewInstance for BuiltinView {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn factory_name(&self) -> &str {
        builtin_name(self.capability)
    }
}

fn builtin_name(capability: Capability) -> &'static str {
    match capability {
        Capability::Table => "builtin.table",
        Capability::Image => "builtin.image",
        Capability::Text => "builtin.text",
        Capability::Metadata => "builtin.metadata",
    }
}

/// Factory for the built-in default of one capability. Guaranteed present in
/// every registry; it accepts every object.
#[derive(Debug)]
struct BuiltinFactory {
    capability: Capability,
}

impl ViewFactory for BuiltinFactory {
    fn name(&self) -> &str {
        builtin_name(self.capability)
    }

    fn instantiate(
        &self,
        node: &ResourceNode,
        config: &ViewConfig,
    ) -> Result<Box<dyn ViewInstance>, ViewError> {
        Ok(Box::new(BuiltinView {
            capability: self.capability,
            node: node.id(),
            config: *config,
        }))
    }
}

/// Ordered factory registry with a guaranteed built-in default per
/// capability.
#[derive(Debug)]
pub struct ViewRegistry {
    factories: HashMap<Capability, Vec<Box<dyn ViewFactory>>>,
    preferred: HashMap<Capability, String>,
}

impl ViewRegistry {
    /// Create a registry holding only the built-in defaults.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            preferred: HashMap::new(),
        }
    }

    /// Register a factory for a capability, after any already registered.
    pub fn register(&mut self, capability: Capability, factory: Box<dyn ViewFactory>) {
        tracing::debug!("registering {} view factory '{}'", capability, factory.name());
        self.factories.entry(capability).or_default().push(factory);
    }

    /// Prefer the named factory for a capability; it is tried first.
    pub fn set_preferred(&mut self, capability: Capability, name: impl Into<String>) {
        self.preferred.insert(capability, name.into());
    }

    /// Resolve and instantiate a view for `node`.
    ///
    /// Candidate order: the preferred factory, remaining registered factories
    /// in registration order, then the built-in default. A candidate that
    /// fails to instantiate is skipped; the built-in default failing is a
    /// broken deployment and surfaces as [`ViewError::BuiltinViewFailed`],
    /// never as a silent fallback.
    pub fn resolve(
        &self,
        capability: Capability,
        node: &ResourceNode,
        config: &ViewConfig,
    ) -> Result<Box<dyn ViewInstance>, ViewError> {
        let registered = self.factories.get(&capability);
        let preferred = self.preferred.get(&capability);

        let mut candidates: Vec<&dyn ViewFactory> = Vec::new();
        if let (Some(factories), Some(name)) = (registered, preferred) {
            if let Some(factory) = factories.iter().find(|f| f.name() == name.as_str()) {
                candidates.push(factory.as_ref());
            }
        }
        if let Some(factories) = registered {
            for factory in factories {
                if preferred.map(String::as_str) != Some(factory.name()) {
                    candidates.push(factory.as_ref());
                }
            }
        }

        for factory in candidates {
            match factory.instantiate(node, config) {
                Ok(view) => {
                    tracing::debug!(
                        "resolved {} view for {} via '{}'",
                        capability,
                        node.id(),
                        factory.name()
                    );
                    return Ok(view);
                }
                Err(e) => {
                    tracing::debug!("view factory '{}' declined: {}", factory.name(), e);
                }
            }
        }

        let builtin = BuiltinFactory { capability };
        builtin.instantiate(node, config).map_err(|e| {
            tracing::error!(
                "built-in {} view failed; this deployment is broken: {}",
                capability,
                e
            );
            ViewError::BuiltinViewFailed {
                capability,
                reason: e.to_string(),
            }
        })
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Association between a node, its resolved view, and, for datasets, the
/// selection window it displays through. At most one binding exists per node;
/// re-opening an open node re-activates the existing binding.
#[derive(Debug)]
pub struct ViewBinding {
    /// Node the view displays.
    pub node: NodeId,
    /// Capability the view was resolved for.
    pub capability: Capability,
    /// The instantiated view.
    pub view: Box<dyn ViewInstance>,
    /// Selection window, present for dataset nodes.
    pub window: Option<SelectionWindow>,
    pub(crate) serial: u64,
}

impl ViewBinding {
    /// Creation serial; stable across re-activations of the same binding.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatFamily;
    use crate::object::{AccessMode, ContainerRef, ContainerTree, NodeSpec};
    use std::path::PathBuf;

    fn table_node() -> (ContainerTree, NodeId) {
        let mut tree = ContainerTree::new();
        let structure =
            NodeSpec::group("/").with_child(NodeSpec::dataset("d1", vec![4, 4], "f32"));
        let c = tree.open_container(
            ContainerRef::new(PathBuf::from("t.h5"), AccessMode::Read, FormatFamily::Hdf5),
            structure,
        );
        let root = tree.root_of(c).unwrap();
        let d1 = tree.find(root, "d1").unwrap();
        (tree, d1)
    }

    #[derive(Debug)]
    struct NamedFactory {
        name: &'static str,
        accept: bool,
    }

    #[derive(Debug)]
    struct NamedView(&'static str);

    impl ViewInstance for NamedView {
        fn capability(&self) -> Capability {
            Capability::Table
        }
        fn factory_name(&self) -> &str {
            self.0
        }
    }

    impl ViewFactory for NamedFactory {
        fn name(&self) -> &str {
            self.name
        }
        fn instantiate(
            &self,
            _node: &ResourceNode,
            _config: &ViewConfig,
        ) -> Result<Box<dyn ViewInstance>, ViewError> {
            if self.accept {
                Ok(Box::new(NamedView(self.name)))
            } else {
                Err(ViewError::Unsuitable {
                    factory: self.name.to_string(),
                    reason: "declined".to_string(),
                })
            }
        }
    }

    #[test]
    fn unregistered_capability_falls_back_to_builtin() {
        let (tree, d1) = table_node();
        let registry = ViewRegistry::new();
        let view = registry
            .resolve(Capability::Table, tree.node(d1).unwrap(), &ViewConfig::default())
            .unwrap();
        assert_eq!(view.factory_name(), "builtin.table");
    }

    #[test]
    fn registered_factory_wins_over_builtin() {
        let (tree, d1) = table_node();
        let mut registry = ViewRegistry::new();
        registry.register(
            Capability::Table,
            Box::new(NamedFactory {
                name: "custom.table",
                accept: true,
            }),
        );

        let view = registry
            .resolve(Capability::Table, tree.node(d1).unwrap(), &ViewConfig::default())
            .unwrap();
        assert_eq!(view.factory_name(), "custom.table");
    }

    #[test]
    fn preferred_factory_is_tried_first() {
        let (tree, d1) = table_node();
        let mut registry = ViewRegistry::new();
        registry.register(
            Capability::Table,
            Box::new(NamedFactory {
                name: "first.table",
                accept: true,
            }),
        );
        registry.register(
            Capability::Table,
            Box::new(NamedFactory {
                name: "second.table",
                accept: true,
            }),
        );
        registry.set_preferred(Capability::Table, "second.table");

        let view = registry
            .resolve(Capability::Table, tree.node(d1).unwrap(), &ViewConfig::default())
            .unwrap();
        assert_eq!(view.factory_name(), "second.table");
    }

    #[test]
    fn declining_factories_fall_through() {
        let (tree, d1) = table_node();
        let mut registry = ViewRegistry::new();
        registry.register(
            Capability::Table,
            Box::new(NamedFactory {
                name: "picky.table",
                accept: false,
            }),
        );
        registry.register(
            Capability::Table,
            Box::new(NamedFactory {
                name: "easy.table",
                accept: true,
            }),
        );

        let view = registry
            .resolve(Capability::Table, tree.node(d1).unwrap(), &ViewConfig::default())
            .unwrap();
        assert_eq!(view.factory_name(), "easy.table");
    }

    #[test]
    fn everything_declining_still_lands_on_builtin() {
        let (tree, d1) = table_node();
        let mut registry = ViewRegistry::new();
        registry.register(
            Capability::Image,
            Box::new(NamedFactory {
                name: "picky.image",
                accept: false,
            }),
        );

        let view = registry
            .resolve(Capability::Image, tree.node(d1).unwrap(), &ViewConfig::default())
            .unwrap();
        assert_eq!(view.factory_name(), "builtin.image");
    }

    #[test]
    fn capability_inference_follows_classification() {
        let (mut tree, d1) = table_node();
        assert_eq!(
            Capability::infer(tree.node(d1).unwrap()),
            Capability::Table
        );

        let root = tree.node(d1).unwrap().parent().unwrap();
        assert_eq!(
            Capability::infer(tree.node(root).unwrap()),
            Capability::Metadata
        );

        let text = tree
            .insert(
                root,
                NodeSpec::dataset("notes", vec![80], "u8").with_class(DataClass::Text),
            )
            .unwrap();
        assert_eq!(Capability::infer(tree.node(text).unwrap()), Capability::Text);

        let image = tree
            .insert(
                root,
                NodeSpec::dataset("photo", vec![64, 64], "u8").with_class(DataClass::Image),
            )
            .unwrap();
        assert_eq!(
            Capability::infer(tree.node(image).unwrap()),
            Capability::Image
        );
    }
}
