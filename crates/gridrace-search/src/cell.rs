//! The [`Cell`] type — one grid position's mutable search state.

use gridrace_core::Coord;

/// Sentinel heap position for a cell that is not in the open heap.
pub(crate) const NO_POS: usize = usize::MAX;

/// Search state of a single grid position.
///
/// Cells are held in a flat arena owned by the grid; predecessors are flat
/// indices into that arena, so reallocating the arena can never leave a
/// dangling link.
#[derive(Debug, Clone)]
pub struct Cell {
    pub(crate) coord: Coord,
    pub(crate) is_wall: bool,
    /// Heap key: distance for Dijkstra, f-cost for A*.
    pub(crate) cost: f64,
    /// A* only: best known path cost from the start cell.
    pub(crate) g_cost: f64,
    pub(crate) visited: bool,
    pub(crate) queued: bool,
    pub(crate) predecessor: Option<usize>,
    pub(crate) on_path: bool,
    /// Position in the heap's backing array, maintained by the heap.
    pub(crate) heap_idx: usize,
}

impl Cell {
    pub(crate) fn new(coord: Coord) -> Self {
        Self {
            coord,
            is_wall: false,
            cost: f64::INFINITY,
            g_cost: f64::INFINITY,
            visited: false,
            queued: false,
            predecessor: None,
            on_path: false,
            heap_idx: NO_POS,
        }
    }

    /// Wipe per-run search state, keeping the coordinate and wall flag.
    pub(crate) fn clear_search_state(&mut self) {
        self.cost = f64::INFINITY;
        self.g_cost = f64::INFINITY;
        self.visited = false;
        self.queued = false;
        self.predecessor = None;
        self.on_path = false;
        self.heap_idx = NO_POS;
    }

    /// The position this cell occupies. Fixed at creation.
    #[inline]
    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// Whether the cell is an obstacle.
    #[inline]
    pub fn is_wall(&self) -> bool {
        self.is_wall
    }

    /// Current best known cost (distance for Dijkstra, f-cost for A*).
    /// Infinite until the cell is first reached.
    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// A* best known path cost from the start. Infinite until reached.
    #[inline]
    pub fn g_cost(&self) -> f64 {
        self.g_cost
    }

    /// Whether the cell has been finalized (popped and expanded).
    #[inline]
    pub fn visited(&self) -> bool {
        self.visited
    }

    /// Whether the cell has entered the frontier at least once.
    #[inline]
    pub fn queued(&self) -> bool {
        self.queued
    }

    /// Whether the cell is on the reconstructed path.
    #[inline]
    pub fn on_path(&self) -> bool {
        self.on_path
    }

    /// Whether the cell is currently in the frontier: queued but not yet
    /// finalized.
    #[inline]
    pub fn frontier(&self) -> bool {
        self.queued && !self.visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cell_is_untouched() {
        let c = Cell::new(Coord::new(1, 2));
        assert_eq!(c.coord(), Coord::new(1, 2));
        assert!(!c.is_wall());
        assert!(c.cost().is_infinite());
        assert!(c.g_cost().is_infinite());
        assert!(!c.visited());
        assert!(!c.queued());
        assert!(!c.on_path());
        assert!(!c.frontier());
    }

    #[test]
    fn clear_keeps_wall_and_coord() {
        let mut c = Cell::new(Coord::new(3, 3));
        c.is_wall = true;
        c.cost = 5.0;
        c.visited = true;
        c.queued = true;
        c.predecessor = Some(7);
        c.on_path = true;
        c.heap_idx = 2;

        c.clear_search_state();
        assert!(c.is_wall());
        assert_eq!(c.coord(), Coord::new(3, 3));
        assert!(c.cost().is_infinite());
        assert!(!c.visited());
        assert!(!c.queued());
        assert_eq!(c.predecessor, None);
        assert!(!c.on_path());
        assert_eq!(c.heap_idx, NO_POS);
    }

    #[test]
    fn frontier_is_queued_and_not_visited() {
        let mut c = Cell::new(Coord::ZERO);
        c.queued = true;
        assert!(c.frontier());
        c.visited = true;
        assert!(!c.frontier());
    }
}
