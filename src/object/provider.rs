//! Container provider seam.
//!
//! On-disk parsing is delegated to an external container-format library. A
//! [`ContainerProvider`] adapts one such library: it reports the container's
//! format family, describes its hierarchy as a [`NodeSpec`] tree, and reads
//! windowed dataset regions. The core never touches container bytes itself.

use ndarray::{ArrayD, Slice};
use std::collections::HashMap;

use crate::error::{Result, RossbyError};
use crate::format::FormatFamily;
use crate::object::{DataClass, NodeKind};
use crate::window::SelectionWindow;

/// Structure description of one object, as reported by a provider.
///
/// Mirrors what a format library yields while walking a file: name, kind,
/// classification, attributes, dataset geometry, and children in container
/// order. The tree materializes these into [`ResourceNode`]s, applying the
/// container's member bounds per group.
///
/// [`ResourceNode`]: crate::object::ResourceNode
#[derive(Debug, Clone)]
pub struct NodeSpec {
    /// Object name.
    pub name: String,
    /// Kind of object.
    pub kind: NodeKind,
    /// Data-class classification.
    pub class: DataClass,
    /// Attribute metadata as name/rendered-value pairs.
    pub attributes: Vec<(String, String)>,
    /// Shape for dataset objects.
    pub shape: Option<Vec<u64>>,
    /// Element type name for dataset objects.
    pub dtype: Option<String>,
    /// Children in container order.
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Describe a group.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Group,
            class: DataClass::Unknown,
            attributes: Vec::new(),
            shape: None,
            dtype: None,
            children: Vec::new(),
        }
    }

    /// Describe a dataset.
    pub fn dataset(name: impl Into<String>, shape: Vec<u64>, dtype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Dataset,
            class: DataClass::Table,
            attributes: Vec::new(),
            shape: Some(shape),
            dtype: Some(dtype.into()),
            children: Vec::new(),
        }
    }

    /// Describe an attribute-holder, datatype, or link object.
    pub fn leaf(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            class: DataClass::Unknown,
            attributes: Vec::new(),
            shape: None,
            dtype: None,
            children: Vec::new(),
        }
    }

    /// Set the data-class classification.
    pub fn with_class(mut self, class: DataClass) -> Self {
        self.class = class;
        self
    }

    /// Attach an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// Adapter over an external container-format library.
pub trait ContainerProvider: std::fmt::Debug {
    /// Format family of the container.
    fn family(&self) -> FormatFamily;

    /// Describe the container's full hierarchy, rooted at the container root.
    fn load_structure(&mut self) -> Result<NodeSpec>;

    /// Read the region a selection window describes from the dataset at
    /// `dataset_path` (a `/`-separated path from the container root).
    fn read_window(&mut self, dataset_path: &str, window: &SelectionWindow) -> Result<ArrayD<f64>>;
}

/// In-memory provider: a structure plus dense `f64` arrays keyed by path.
///
/// Used as the provider double in tests and by hosts that synthesize
/// containers without a backing file.
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    family: FormatFamily,
    structure: NodeSpec,
    data: HashMap<String, ArrayD<f64>>,
}

impl MemoryContainer {
    /// Create a provider for `structure` with the given family.
    pub fn new(family: FormatFamily, structure: NodeSpec) -> Self {
        Self {
            family,
            structure,
            data: HashMap::new(),
        }
    }

    /// Attach the full array for the dataset at `path`.
    pub fn with_data(mut self, path: impl Into<String>, data: ArrayD<f64>) -> Self {
        self.data.insert(path.into(), data);
        self
    }
}

impl ContainerProvider for MemoryContainer {
    fn family(&self) -> FormatFamily {
        self.family
    }

    fn load_structure(&mut self) -> Result<NodeSpec> {
        Ok(self.structure.clone())
    }

    fn read_window(&mut self, dataset_path: &str, window: &SelectionWindow) -> Result<ArrayD<f64>> {
        let full = self.data.get(dataset_path).ok_or_else(|| {
            RossbyError::provider(format!("no data for dataset '{}'", dataset_path))
        })?;

        if full.ndim() != window.rank() {
            return Err(RossbyError::provider(format!(
                "dataset '{}' rank {} does not match window rank {}",
                dataset_path,
                full.ndim(),
                window.rank()
            )));
        }

        let start = window.start();
        let stride = window.stride();
        let count = window.count();
        let view = full.slice_each_axis(|ax| {
            let i = ax.axis.index();
            let end = start[i] + (count[i] - 1) * stride[i] + 1;
            Slice::new(start[i] as isize, Some(end as isize), stride[i] as isize)
        });
        Ok(view.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn memory_provider_reads_windows() {
        let full = ArrayD::from_shape_vec(IxDyn(&[4, 6]), (0..24).map(f64::from).collect())
            .unwrap();
        let structure =
            NodeSpec::group("/").with_child(NodeSpec::dataset("d", vec![4, 6], "f64"));
        let mut provider =
            MemoryContainer::new(FormatFamily::Hdf5, structure).with_data("/d", full);

        let mut window = SelectionWindow::new(vec![4, 6]);
        window
            .set_extent(vec![1, 2], vec![1, 2], vec![2, 2])
            .unwrap();

        let out = provider.read_window("/d", &window).unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        // Rows 1..3, columns {2, 4}.
        assert_eq!(out[[0, 0]], 8.0);
        assert_eq!(out[[0, 1]], 10.0);
        assert_eq!(out[[1, 0]], 14.0);
        assert_eq!(out[[1, 1]], 16.0);
    }

    #[test]
    fn missing_dataset_is_a_provider_error() {
        let mut provider =
            MemoryContainer::new(FormatFamily::Hdf5, NodeSpec::group("/"));
        let window = SelectionWindow::new(vec![2]);
        assert!(provider.read_window("/nope", &window).is_err());
    }
}
