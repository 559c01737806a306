//! Dataset selection windows.
//!
//! A [`SelectionWindow`] maps a dataset's full shape to the subset currently
//! materialized for display: per-axis start/stride/count, the 1-3 axes chosen
//! as row/column/page, and a frame position along the first axis not being
//! displayed. Rank-3+ data is stepped through one slice at a time without
//! re-specifying the whole window; the dirty flag tells the rendering layer
//! that displayed data is stale and must be re-fetched.

use ndarray::ArrayD;

use crate::error::{Result, WindowError};
use crate::object::ContainerProvider;

/// Subsetting and paging state for one materialized dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionWindow {
    full_shape: Vec<u64>,
    start: Vec<u64>,
    stride: Vec<u64>,
    count: Vec<u64>,
    display_axes: Vec<usize>,
    dirty: bool,
}

impl SelectionWindow {
    /// Create a window over a dataset of the given shape.
    ///
    /// The trailing two axes are displayed by default (the trailing one for
    /// rank-1 data); every other axis collapses to a single frame at
    /// position 0.
    pub fn new(full_shape: Vec<u64>) -> Self {
        let rank = full_shape.len();
        let display_axes: Vec<usize> = match rank {
            0 => Vec::new(),
            1 => vec![0],
            _ => vec![rank - 2, rank - 1],
        };

        let mut window = Self {
            start: vec![0; rank],
            stride: vec![1; rank],
            count: vec![1; rank],
            full_shape,
            display_axes,
            dirty: true,
        };
        window.reset_counts();
        window
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.full_shape.len()
    }

    /// The dataset's full shape.
    pub fn full_shape(&self) -> &[u64] {
        &self.full_shape
    }

    /// Per-axis selection origin.
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Per-axis selection stride.
    pub fn stride(&self) -> &[u64] {
        &self.stride
    }

    /// Per-axis selected element count.
    pub fn count(&self) -> &[u64] {
        &self.count
    }

    /// Axes mapped to row/column/page for display, in that order.
    pub fn display_axes(&self) -> &[usize] {
        &self.display_axes
    }

    /// Whether displayed data is stale and must be re-fetched.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The page axis: the first axis not being displayed. `None` when every
    /// axis is displayed, i.e. the window is not pageable.
    pub fn page_axis(&self) -> Option<usize> {
        (0..self.rank()).find(|axis| !self.display_axes.contains(axis))
    }

    /// Current frame position along the page axis; 0 when not pageable.
    pub fn frame_index(&self) -> u64 {
        self.page_axis().map_or(0, |axis| self.start[axis])
    }

    /// Extent of the page axis; 0 when not pageable.
    pub fn frame_extent(&self) -> u64 {
        self.page_axis().map_or(0, |axis| self.full_shape[axis])
    }

    /// Choose which 1-3 axes are displayed as row/column/page.
    ///
    /// Display axes open to their full extent; every other axis collapses to
    /// a single frame, keeping its current position.
    pub fn set_display_axes(&mut self, axes: &[usize]) -> std::result::Result<(), WindowError> {
        let rank = self.rank();
        let valid = !axes.is_empty()
            && axes.len() <= 3
            && axes.len() <= rank
            && axes.iter().all(|a| *a < rank)
            && axes.iter().all(|a| axes.iter().filter(|b| *b == a).count() == 1);
        if !valid {
            return Err(WindowError::InvalidAxes { rank });
        }

        self.display_axes = axes.to_vec();
        self.reset_counts();
        self.dirty = true;
        Ok(())
    }

    /// Re-subset the window. All-or-nothing: on any out-of-bounds axis the
    /// previous selection is kept untouched.
    pub fn set_extent(
        &mut self,
        start: Vec<u64>,
        stride: Vec<u64>,
        count: Vec<u64>,
    ) -> std::result::Result<(), WindowError> {
        let rank = self.rank();
        for given in [start.len(), stride.len(), count.len()] {
            if given != rank {
                return Err(WindowError::RankMismatch { rank, given });
            }
        }
        for axis in 0..rank {
            if stride[axis] == 0 || count[axis] == 0 {
                return Err(WindowError::ExtentOutOfBounds { axis });
            }
            let last = start[axis] + (count[axis] - 1) * stride[axis];
            if last >= self.full_shape[axis] {
                return Err(WindowError::ExtentOutOfBounds { axis });
            }
        }

        self.start = start;
        self.stride = stride;
        self.count = count;
        self.dirty = true;
        Ok(())
    }

    /// Jump to a frame along the page axis.
    ///
    /// A no-op for windows that are not pageable; otherwise fails when
    /// `index` is outside `[0, frame_extent())`.
    pub fn goto_frame(&mut self, index: u64) -> std::result::Result<(), WindowError> {
        let axis = match self.page_axis() {
            Some(axis) => axis,
            None => return Ok(()),
        };

        let extent = self.full_shape[axis];
        if index >= extent {
            return Err(WindowError::FrameOutOfRange { index, extent });
        }

        self.start[axis] = index;
        self.dirty = true;
        Ok(())
    }

    /// Step to the next frame; a no-op on the last frame.
    pub fn next_frame(&mut self) {
        if let Some(axis) = self.page_axis() {
            let cur = self.start[axis];
            if cur + 1 < self.full_shape[axis] {
                self.start[axis] = cur + 1;
                self.dirty = true;
            }
        }
    }

    /// Step to the previous frame; a no-op on the first frame.
    pub fn previous_frame(&mut self) {
        if let Some(axis) = self.page_axis() {
            let cur = self.start[axis];
            if cur > 0 {
                self.start[axis] = cur - 1;
                self.dirty = true;
            }
        }
    }

    /// Jump to the first frame; a no-op when already there.
    pub fn first_frame(&mut self) {
        if let Some(axis) = self.page_axis() {
            if self.start[axis] != 0 {
                self.start[axis] = 0;
                self.dirty = true;
            }
        }
    }

    /// Jump to the last frame; a no-op when already there.
    pub fn last_frame(&mut self) {
        if let Some(axis) = self.page_axis() {
            let extent = self.full_shape[axis];
            if extent > 0 && self.start[axis] != extent - 1 {
                self.start[axis] = extent - 1;
                self.dirty = true;
            }
        }
    }

    /// Fetch the windowed region through the container provider and clear
    /// the dirty flag.
    pub fn materialize(
        &mut self,
        provider: &mut dyn ContainerProvider,
        dataset_path: &str,
    ) -> Result<ArrayD<f64>> {
        let data = provider.read_window(dataset_path, self)?;
        self.dirty = false;
        Ok(data)
    }

    /// Open display axes to their full extent, collapse the rest to one
    /// frame each, clamped into range.
    fn reset_counts(&mut self) {
        for axis in 0..self.rank() {
            let extent = self.full_shape[axis].max(1);
            if self.display_axes.contains(&axis) {
                self.start[axis] = 0;
                self.stride[axis] = 1;
                self.count[axis] = extent;
            } else {
                self.stride[axis] = 1;
                self.count[axis] = 1;
                self.start[axis] = self.start[axis].min(extent - 1);
            }
        }
    }
}
