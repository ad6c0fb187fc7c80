//! Uniform-cost (Dijkstra) search.

use rand::Rng;
use rand::rngs::ThreadRng;

use crate::grid::{Grid, Status, Step};
use crate::heap::MinHeap;
use crate::session::StopToken;

/// A resumable Dijkstra run over one grid.
///
/// [`begin`](Dijkstra::begin) resets the grid's search state and seeds the
/// frontier; each [`step`](Dijkstra::step) performs exactly one loop
/// iteration, so a driver can interleave pacing, cancellation checks and
/// observation between steps.
pub struct Dijkstra<R: Rng = ThreadRng> {
    open: MinHeap<R>,
}

impl Dijkstra<ThreadRng> {
    /// Start a run with the thread-local rng for heap tie-breaking.
    pub fn begin(grid: &mut Grid) -> Self {
        Self::begin_with_rng(grid, rand::rng())
    }
}

impl<R: Rng> Dijkstra<R> {
    /// Start a run with an explicit tie-breaking rng.
    pub fn begin_with_rng(grid: &mut Grid, rng: R) -> Self {
        grid.reset_for_run();
        let mut open = MinHeap::with_rng(rng);
        if let Some(si) = grid.idx(grid.start) {
            grid.cells[si].cost = 0.0;
            grid.cells[si].queued = true;
            open.push(&mut grid.cells, si);
        }
        Self { open }
    }

    /// Perform one search iteration: pop the cheapest frontier cell and
    /// relax its orthogonal neighbors with unit edge cost.
    ///
    /// Already-queued entries are never repositioned; a queued cell whose
    /// cost field improves would have to beat `popped cost + 1`, which the
    /// non-decreasing pop order of unit-weight Dijkstra rules out, so the
    /// heap stays ordered without a decrease-key.
    pub fn step(&mut self, grid: &mut Grid) -> Step {
        grid.iterations += 1;

        let Some(ui) = self.open.pop_min(&mut grid.cells) else {
            return Step::Finished(grid.finish_run());
        };
        if grid.cells[ui].visited {
            // Stale duplicate; discard.
            return Step::Advanced;
        }
        if grid.cells[ui].coord == grid.end {
            return Step::Finished(grid.finish_run());
        }
        grid.cells[ui].visited = true;

        let u_coord = grid.cells[ui].coord;
        let u_cost = grid.cells[ui].cost;
        for neighbor in u_coord.neighbors4() {
            let Some(ni) = grid.idx(neighbor) else {
                continue;
            };
            if grid.cells[ni].is_wall || grid.cells[ni].visited {
                continue;
            }
            let alt = u_cost + 1.0;
            if alt < grid.cells[ni].cost {
                grid.cells[ni].cost = alt;
                grid.cells[ni].predecessor = Some(ui);
                if !grid.cells[ni].queued {
                    grid.cells[ni].queued = true;
                    self.open.push(&mut grid.cells, ni);
                }
            }
        }
        Step::Advanced
    }
}

impl Grid {
    /// Run Dijkstra to completion on the calling thread.
    ///
    /// `stop` is polled at the top of every iteration; observing it
    /// abandons the run and leaves the grid [`Status::Idle`] with its
    /// partial search state intact. Returns the final status. Returns
    /// immediately if a run is already active.
    pub fn run_dijkstra(&mut self, stop: &StopToken) -> Status {
        if self.status == Status::Running {
            return self.status;
        }
        let mut search = Dijkstra::begin(self);
        loop {
            if stop.is_stopped() {
                self.abort_run();
                return self.status;
            }
            if let Step::Finished(status) = search.step(self) {
                log::debug!(
                    "dijkstra finished: {status:?} after {} iterations, path length {}",
                    self.iterations,
                    self.path_length,
                );
                return status;
            }
        }
    }
}
