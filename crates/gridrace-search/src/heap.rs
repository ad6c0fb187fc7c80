//! An indexed binary min-heap over grid cells.
//!
//! The heap stores flat indices into the grid's cell arena and orders them
//! by the live `cost` field of the referenced cells, so a caller can lower
//! a cell's cost in place and restore heap order with a single
//! [`fix`](MinHeap::fix) in O(log n). Each cell carries its position in the
//! backing array (`heap_idx`), maintained here and meaningless elsewhere.
//!
//! Ties on equal cost are broken by a coin flip from the injected [`Rng`],
//! which avoids the pathological FIFO bias a stable ordering gives A* on
//! unit-weight grids. As a consequence, pop order among equal-cost entries
//! is **non-deterministic**; assert on path costs, not on path identity.

use rand::{Rng, RngExt};
use rand::rngs::ThreadRng;

use crate::cell::{Cell, NO_POS};

/// A binary min-heap of cell indices keyed by cell cost.
pub struct MinHeap<R: Rng = ThreadRng> {
    slots: Vec<usize>,
    rng: R,
}

impl MinHeap<ThreadRng> {
    /// Create an empty heap with the thread-local rng for tie-breaking.
    pub fn new() -> Self {
        Self::with_rng(rand::rng())
    }
}

impl Default for MinHeap<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> MinHeap<R> {
    /// Create an empty heap with an explicit tie-breaking rng.
    pub fn with_rng(rng: R) -> Self {
        Self {
            slots: Vec::new(),
            rng,
        }
    }

    /// Number of entries currently in the heap.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the heap is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Insert the cell at arena index `idx`.
    ///
    /// The cell must not already be in the heap. O(log n).
    pub fn push(&mut self, cells: &mut [Cell], idx: usize) {
        let pos = self.slots.len();
        self.slots.push(idx);
        cells[idx].heap_idx = pos;
        self.sift_up(cells, pos);
    }

    /// Remove and return the minimum-cost entry, or `None` if empty.
    /// O(log n).
    pub fn pop_min(&mut self, cells: &mut [Cell]) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }
        let last = self.slots.len() - 1;
        self.swap(cells, 0, last);
        let min = self.slots.pop()?;
        cells[min].heap_idx = NO_POS;
        if !self.slots.is_empty() {
            self.sift_down(cells, 0);
        }
        Some(min)
    }

    /// Restore heap order for a cell whose cost changed in place.
    ///
    /// No-op if the cell is not currently in the heap. O(log n).
    pub fn fix(&mut self, cells: &mut [Cell], idx: usize) {
        let pos = cells[idx].heap_idx;
        if pos >= self.slots.len() || self.slots[pos] != idx {
            return;
        }
        let pos = self.sift_up(cells, pos);
        self.sift_down(cells, pos);
    }

    /// Whether the entry at slot `a` orders before the entry at slot `b`.
    fn less(&mut self, cells: &[Cell], a: usize, b: usize) -> bool {
        let ca = cells[self.slots[a]].cost;
        let cb = cells[self.slots[b]].cost;
        match ca.total_cmp(&cb) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.rng.random_bool(0.5),
        }
    }

    fn swap(&mut self, cells: &mut [Cell], a: usize, b: usize) {
        self.slots.swap(a, b);
        cells[self.slots[a]].heap_idx = a;
        cells[self.slots[b]].heap_idx = b;
    }

    /// Bubble the entry at `pos` up; returns its final slot.
    fn sift_up(&mut self, cells: &mut [Cell], mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less(cells, pos, parent) {
                break;
            }
            self.swap(cells, pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, cells: &mut [Cell], mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            let right = 2 * pos + 2;
            let mut smallest = pos;
            if left < self.slots.len() && self.less(cells, left, smallest) {
                smallest = left;
            }
            if right < self.slots.len() && self.less(cells, right, smallest) {
                smallest = right;
            }
            if smallest == pos {
                return;
            }
            self.swap(cells, pos, smallest);
            pos = smallest;
        }
    }
}
