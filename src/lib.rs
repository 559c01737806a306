//! Rossby - the core engine of a scientific container-file viewer.
//!
//! Rossby holds the viewer logic that is independent of any rendering
//! toolkit: the in-memory tree of open containers' group/dataset/attribute
//! hierarchies, copy/move/delete across containers, N-dimensional selection
//! windows with frame paging, and deterministic resolution of pluggable view
//! implementations. On-disk parsing stays behind the
//! [`ContainerProvider`](object::ContainerProvider) seam, and rendering stays
//! behind [`ViewFactory`](view::ViewFactory).
//!
//! # Features
//!
//! - Format-family detection by magic bytes
//! - Tree navigation, search, and breadth-first traversal
//! - Cross-container copy with compatibility and cycle checks
//! - Frame-by-frame paging through rank-3+ datasets
//! - Ordered view-factory resolution with a guaranteed built-in fallback
//!
//! # Example
//!
//! ```
//! use rossby::app::App;
//! use rossby::format::FormatFamily;
//! use rossby::object::{AccessMode, MemoryContainer, NodeSpec};
//! use std::path::PathBuf;
//!
//! # fn main() -> rossby::Result<()> {
//! let structure = NodeSpec::group("/")
//!     .with_child(NodeSpec::group("g1").with_child(NodeSpec::dataset("d1", vec![4, 10, 10], "f32")));
//! let provider = Box::new(MemoryContainer::new(FormatFamily::Hdf5, structure));
//!
//! let mut app = App::new();
//! let container = app.open_container(PathBuf::from("sample.h5"), AccessMode::Read, provider)?;
//! let root = app.tree().root_of(container).expect("root exists");
//! let d1 = app.tree().find(root, "*d1").expect("dataset exists");
//! println!("found {}", app.tree().path_of(d1).expect("path exists"));
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![deny(unsafe_code)]

pub mod app;
pub mod error;
pub mod format;
pub mod notify;
pub mod object;
pub mod transfer;
pub mod view;
pub mod window;

pub use error::{Result, RossbyError};
