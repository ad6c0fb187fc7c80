//! The search [`Grid`]: a square cell arena with start/end anchors and
//! per-run metadata.
//!
//! A `Grid` owns all of its cells exclusively. Anchors are stored as
//! coordinates and resolved to arena indices on use, so rebuilding the
//! arena (restart, resize) can never leave them dangling.

use std::fmt;

use gridrace_core::Coord;
use rand::{Rng, RngExt};

use crate::cell::Cell;

// ---------------------------------------------------------------------------
// Status / Step
// ---------------------------------------------------------------------------

/// Run state of a grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// No run active; layout may be edited. Also the state after a
    /// cancelled run (distinct from [`Status::Failed`]).
    Idle,
    /// A search is in progress; the running task is the sole mutator.
    Running,
    /// The last run reached the end cell and marked a path.
    Succeeded,
    /// The last run exhausted the frontier without reaching the end.
    Failed,
}

/// Outcome of a single search step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// The run is still in progress.
    Advanced,
    /// The run reached a terminal status.
    Finished(Status),
}

// ---------------------------------------------------------------------------
// GridError
// ---------------------------------------------------------------------------

/// Errors reported at grid construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// The requested size cannot hold two distinct anchors.
    InvalidSize { size: usize },
    /// An anchor lies outside the grid.
    OutOfBounds { coord: Coord, size: usize },
    /// Start and end refer to the same cell.
    AnchorClash { coord: Coord },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { size } => {
                write!(f, "invalid grid size {size}: must be at least 2")
            }
            Self::OutOfBounds { coord, size } => {
                write!(f, "coordinate {coord} is outside a {size}x{size} grid")
            }
            Self::AnchorClash { coord } => {
                write!(f, "start and end both placed at {coord}")
            }
        }
    }
}

impl std::error::Error for GridError {}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// A square obstacle grid plus the state of its most recent search run.
#[derive(Clone, Debug)]
pub struct Grid {
    pub(crate) size: usize,
    pub(crate) cells: Vec<Cell>,
    pub(crate) start: Coord,
    pub(crate) end: Coord,
    pub(crate) status: Status,
    pub(crate) iterations: u64,
    pub(crate) path_length: i32,
}

fn make_cells(size: usize) -> Vec<Cell> {
    let n = size as i32;
    let mut cells = Vec::with_capacity(size * size);
    for row in 0..n {
        for col in 0..n {
            cells.push(Cell::new(Coord::new(row, col)));
        }
    }
    cells
}

impl Grid {
    /// Create a `size`×`size` grid with the given start and end anchors.
    ///
    /// Malformed dimensions and anchors are precondition failures reported
    /// here, never discovered mid-run.
    pub fn new(size: usize, start: Coord, end: Coord) -> Result<Self, GridError> {
        let n = i32::try_from(size).map_err(|_| GridError::InvalidSize { size })?;
        if size < 2 {
            return Err(GridError::InvalidSize { size });
        }
        if !start.in_bounds(n, n) {
            return Err(GridError::OutOfBounds { coord: start, size });
        }
        if !end.in_bounds(n, n) {
            return Err(GridError::OutOfBounds { coord: end, size });
        }
        if start == end {
            return Err(GridError::AnchorClash { coord: start });
        }
        Ok(Self {
            size,
            cells: make_cells(size),
            start,
            end,
            status: Status::Idle,
            iterations: 0,
            path_length: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// Side length of the grid.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// All cells in row-major order.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The cell at `coord`, or `None` if out of bounds.
    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.idx(coord).map(|i| &self.cells[i])
    }

    /// The start anchor.
    #[inline]
    pub fn start(&self) -> Coord {
        self.start
    }

    /// The end anchor.
    #[inline]
    pub fn end(&self) -> Coord {
        self.end
    }

    /// Whether `coord` is the start anchor.
    #[inline]
    pub fn is_start(&self, coord: Coord) -> bool {
        coord == self.start
    }

    /// Whether `coord` is the end anchor.
    #[inline]
    pub fn is_end(&self, coord: Coord) -> bool {
        coord == self.end
    }

    /// Current run status.
    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Loop iterations performed by the current or most recent run.
    #[inline]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Interior cell count of the reconstructed path, or `-1` if the most
    /// recent run found no path.
    #[inline]
    pub fn path_length(&self) -> i32 {
        self.path_length
    }

    /// Convert a coordinate to a flat arena index.
    #[inline]
    pub(crate) fn idx(&self, coord: Coord) -> Option<usize> {
        let n = self.size as i32;
        if !coord.in_bounds(n, n) {
            return None;
        }
        Some(coord.row as usize * self.size + coord.col as usize)
    }

    // -----------------------------------------------------------------------
    // Layout editing
    // -----------------------------------------------------------------------

    /// Set or clear the wall flag at `coord`.
    ///
    /// Rejected (returns `false`) while a run is active, out of bounds, or
    /// on an anchor.
    pub fn set_wall(&mut self, coord: Coord, wall: bool) -> bool {
        if self.status == Status::Running {
            return false;
        }
        if coord == self.start || coord == self.end {
            return false;
        }
        let Some(i) = self.idx(coord) else {
            return false;
        };
        self.cells[i].is_wall = wall;
        true
    }

    /// Flip the wall flag at `coord`, with the same rejections as
    /// [`set_wall`](Grid::set_wall).
    pub fn toggle_wall(&mut self, coord: Coord) -> bool {
        let Some(wall) = self.cell(coord).map(|c| !c.is_wall) else {
            return false;
        };
        self.set_wall(coord, wall)
    }

    /// Relocate the start anchor. Rejected onto walls, onto the end anchor,
    /// out of bounds, or while a run is active.
    pub fn move_start(&mut self, coord: Coord) -> bool {
        if self.status == Status::Running || coord == self.end {
            return false;
        }
        let Some(i) = self.idx(coord) else {
            return false;
        };
        if self.cells[i].is_wall {
            return false;
        }
        self.start = coord;
        true
    }

    /// Relocate the end anchor. Same rejections as
    /// [`move_start`](Grid::move_start), against the start anchor.
    pub fn move_end(&mut self, coord: Coord) -> bool {
        if self.status == Status::Running || coord == self.start {
            return false;
        }
        let Some(i) = self.idx(coord) else {
            return false;
        };
        if self.cells[i].is_wall {
            return false;
        }
        self.end = coord;
        true
    }

    /// Turn each non-anchor cell into a wall with probability `density`.
    ///
    /// Rejected while a run is active or when `density` is not a
    /// probability.
    pub fn scatter_walls(&mut self, rng: &mut impl Rng, density: f64) -> bool {
        if self.status == Status::Running || !(0.0..=1.0).contains(&density) {
            return false;
        }
        let (start, end) = (self.start, self.end);
        for cell in &mut self.cells {
            if cell.coord == start || cell.coord == end {
                continue;
            }
            cell.is_wall = rng.random_bool(density);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Reset / run lifecycle
    // -----------------------------------------------------------------------

    /// Replace the cell arena, clearing all search state.
    ///
    /// With `keep_layout` the wall flags carry over; without it the grid
    /// comes back blank. Anchors stay at their coordinates. Rejected while
    /// a run is active.
    pub fn restart(&mut self, keep_layout: bool) -> bool {
        if self.status == Status::Running {
            return false;
        }
        let mut cells = make_cells(self.size);
        if keep_layout {
            for (fresh, old) in cells.iter_mut().zip(&self.cells) {
                fresh.is_wall = old.is_wall;
            }
        }
        self.cells = cells;
        self.iterations = 0;
        self.path_length = 0;
        self.status = Status::Idle;
        true
    }

    /// Clear per-cell search state and enter [`Status::Running`].
    pub(crate) fn reset_for_run(&mut self) {
        for cell in &mut self.cells {
            cell.clear_search_state();
        }
        self.iterations = 0;
        self.path_length = 0;
        self.status = Status::Running;
    }

    /// Reconstruct the path and settle on a terminal status.
    pub(crate) fn finish_run(&mut self) -> Status {
        self.reconstruct_path();
        self.status = if self.path_length >= 0 {
            Status::Succeeded
        } else {
            Status::Failed
        };
        self.status
    }

    /// Abandon an active run, leaving partial visited/frontier state in
    /// place for inspection. Cancellation is not a failure: the grid goes
    /// back to [`Status::Idle`].
    pub(crate) fn abort_run(&mut self) {
        if self.status == Status::Running {
            self.status = Status::Idle;
        }
    }

    /// Walk predecessor links back from the end cell, marking the route and
    /// counting interior cells. No predecessor on the end cell means no
    /// path: `path_length` becomes `-1` and nothing is marked.
    fn reconstruct_path(&mut self) {
        let Some(end_idx) = self.idx(self.end) else {
            self.path_length = -1;
            return;
        };
        if self.cells[end_idx].predecessor.is_none() {
            self.path_length = -1;
            return;
        }
        self.path_length = 0;
        let mut cur = Some(end_idx);
        while let Some(i) = cur {
            self.cells[i].on_path = true;
            let coord = self.cells[i].coord;
            if coord != self.start && coord != self.end {
                self.path_length += 1;
            }
            cur = self.cells[i].predecessor;
        }
    }
}
