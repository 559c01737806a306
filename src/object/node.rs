//! Resource node types and identity.

use std::fmt;

/// Opaque object identifier, stable for a node's lifetime within its
/// container. Preserved across renames; never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oid#{}", self.0)
    }
}

/// Identifier of one open container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u32);

impl ContainerId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// Kind of node in the container hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A group; the only kind that can have children.
    Group,
    /// A typed, shaped array-valued leaf.
    Dataset,
    /// Small named metadata holder.
    Attribute,
    /// A named datatype.
    Datatype,
    /// A link to another object.
    Link,
}

impl NodeKind {
    /// Whether this kind can hold children.
    pub fn is_group(self) -> bool {
        matches!(self, NodeKind::Group)
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Dataset => "dataset",
            NodeKind::Attribute => "attribute",
            NodeKind::Datatype => "datatype",
            NodeKind::Link => "link",
        }
    }
}

/// Data-class classification of an object, supplied by the container
/// provider's predicates ("is this dataset text", "is this paletted image
/// data"). Drives view-capability inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataClass {
    /// Text-like data.
    Text,
    /// Paletted or true-color image data.
    Image,
    /// Generic table-like data.
    Table,
    /// Nothing known about the data.
    #[default]
    Unknown,
}

/// A node in a container's object tree.
///
/// Nodes form a forest owned by the [`ContainerTree`]: each node holds its
/// parent link and an ordered list of child ids, never owning pointers.
///
/// [`ContainerTree`]: crate::object::ContainerTree
#[derive(Debug, Clone)]
pub struct ResourceNode {
    pub(crate) id: NodeId,
    pub(crate) container: ContainerId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Node name, unique among its siblings.
    pub name: String,
    /// Kind of node.
    pub kind: NodeKind,
    /// Data-class classification.
    pub class: DataClass,
    /// Attribute metadata as name/rendered-value pairs, in container order.
    pub attributes: Vec<(String, String)>,
    /// Shape for dataset nodes.
    pub shape: Option<Vec<u64>>,
    /// Element type name for dataset nodes.
    pub dtype: Option<String>,
}

impl ResourceNode {
    /// This node's identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The container owning this node.
    pub fn container(&self) -> ContainerId {
        self.container
    }

    /// Parent id; `None` only for a container root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Ordered child ids (empty for non-group kinds).
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node is a container root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Check if this node is a group.
    pub fn is_group(&self) -> bool {
        self.kind.is_group()
    }

    /// Number of attributes attached to this node.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Get display name with kind and shape metadata.
    pub fn display_name(&self) -> String {
        let suffix = match self.kind {
            NodeKind::Dataset => {
                let mut parts = Vec::new();
                if let Some(shape) = &self.shape {
                    if !shape.is_empty() {
                        parts.push(format!("[{}D]", shape.len()));
                        let dims: Vec<String> =
                            shape.iter().map(|d| d.to_string()).collect();
                        parts.push(format!("({})", dims.join(", ")));
                    }
                }
                if let Some(dtype) = &self.dtype {
                    parts.push(dtype.clone());
                }
                if parts.is_empty() {
                    String::new()
                } else {
                    format!(" {}", parts.join(" "))
                }
            }
            NodeKind::Group => format!(" ({})", self.children.len()),
            _ => String::new(),
        };

        format!("{} {}{}", self.kind.name(), self.name, suffix)
    }
}
