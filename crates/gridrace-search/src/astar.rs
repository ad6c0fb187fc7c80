//! Best-first (A*) search with a tie-broken Manhattan heuristic.

use gridrace_core::Coord;
use rand::Rng;
use rand::rngs::ThreadRng;

use crate::grid::{Grid, Status, Step};
use crate::heap::MinHeap;
use crate::session::StopToken;

/// Weight applied to both the unit edge cost and the heuristic, keeping
/// the estimate admissible relative to the edges it predicts.
pub const BASE_WEIGHT: f64 = 1.0;

/// A resumable A* run over one grid.
///
/// Same stepping shape as [`Dijkstra`](crate::Dijkstra): `begin` seeds the
/// frontier, `step` performs one iteration. Unlike Dijkstra, improved
/// frontier entries are repositioned in place via the heap's decrease-key.
pub struct Astar<R: Rng = ThreadRng> {
    open: MinHeap<R>,
    goal: Coord,
    tie_factor: f64,
}

impl Astar<ThreadRng> {
    /// Start a run with the thread-local rng for heap tie-breaking.
    pub fn begin(grid: &mut Grid) -> Self {
        Self::begin_with_rng(grid, rand::rng())
    }
}

impl<R: Rng> Astar<R> {
    /// Start a run with an explicit tie-breaking rng.
    pub fn begin_with_rng(grid: &mut Grid, rng: R) -> Self {
        grid.reset_for_run();
        let size = grid.size() as f64;
        let mut run = Self {
            open: MinHeap::with_rng(rng),
            goal: grid.end,
            // Strictly-increasing perturbation that steers equal-f
            // expansion toward cells closer to the goal, shrinking the
            // fan-out of equally good paths on unit-weight grids.
            tie_factor: 1.0 + 1.0 / (size * size),
        };
        if let Some(si) = grid.idx(grid.start) {
            grid.cells[si].g_cost = 0.0;
            grid.cells[si].cost = run.heuristic(grid.start);
            grid.cells[si].queued = true;
            run.open.push(&mut grid.cells, si);
        }
        run
    }

    /// Estimated remaining cost from `coord` to the goal.
    fn heuristic(&self, coord: Coord) -> f64 {
        f64::from(coord.manhattan(self.goal)) * BASE_WEIGHT * self.tie_factor
    }

    /// Perform one search iteration: pop the lowest f-cost frontier cell
    /// and relax its orthogonal neighbors.
    pub fn step(&mut self, grid: &mut Grid) -> Step {
        grid.iterations += 1;

        let Some(ci) = self.open.pop_min(&mut grid.cells) else {
            return Step::Finished(grid.finish_run());
        };
        grid.cells[ci].visited = true;
        if grid.cells[ci].coord == grid.end {
            return Step::Finished(grid.finish_run());
        }

        let current = grid.cells[ci].coord;
        let current_g = grid.cells[ci].g_cost;
        for neighbor in current.neighbors4() {
            let Some(ni) = grid.idx(neighbor) else {
                continue;
            };
            if grid.cells[ni].is_wall || grid.cells[ni].visited {
                continue;
            }
            let tentative = current_g + BASE_WEIGHT;
            if tentative < grid.cells[ni].g_cost {
                grid.cells[ni].predecessor = Some(ci);
                grid.cells[ni].g_cost = tentative;
                grid.cells[ni].cost = tentative + self.heuristic(neighbor);
                if grid.cells[ni].queued {
                    self.open.fix(&mut grid.cells, ni);
                } else {
                    grid.cells[ni].queued = true;
                    self.open.push(&mut grid.cells, ni);
                }
            }
        }
        Step::Advanced
    }
}

impl Grid {
    /// Run A* to completion on the calling thread.
    ///
    /// Cancellation behaves exactly as in
    /// [`run_dijkstra`](Grid::run_dijkstra): polled every iteration,
    /// aborts to [`Status::Idle`] with partial state intact.
    pub fn run_astar(&mut self, stop: &StopToken) -> Status {
        if self.status == Status::Running {
            return self.status;
        }
        let mut search = Astar::begin(self);
        loop {
            if stop.is_stopped() {
                self.abort_run();
                return self.status;
            }
            if let Step::Finished(status) = search.step(self) {
                log::debug!(
                    "a* finished: {status:?} after {} iterations, path length {}",
                    self.iterations,
                    self.path_length,
                );
                return status;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(grid: &mut Grid) -> Status {
        grid.run_astar(&StopToken::new())
    }

    #[test]
    fn open_grid_matches_dijkstra_cost() {
        for size in [3, 5, 8] {
            let n = size as i32;
            let start = Coord::new(n - 1, 0);
            let end = Coord::new(0, n - 1);

            let mut a = Grid::new(size, start, end).unwrap();
            let mut d = Grid::new(size, start, end).unwrap();
            assert_eq!(run(&mut a), Status::Succeeded);
            assert_eq!(d.run_dijkstra(&StopToken::new()), Status::Succeeded);
            assert_eq!(a.path_length(), d.path_length());
            assert_eq!(a.path_length(), start.manhattan(end) - 1);
        }
    }

    #[test]
    fn five_by_five_corner_to_corner() {
        let mut g = Grid::new(5, Coord::new(4, 0), Coord::new(0, 4)).unwrap();
        assert_eq!(run(&mut g), Status::Succeeded);
        // 9 path cells minus the two anchors.
        assert_eq!(g.path_length(), 7);
    }

    #[test]
    fn walled_off_end_fails() {
        let mut g = Grid::new(3, Coord::new(0, 0), Coord::new(2, 2)).unwrap();
        for col in 0..3 {
            assert!(g.set_wall(Coord::new(1, col), true));
        }
        assert_eq!(run(&mut g), Status::Failed);
        assert_eq!(g.path_length(), -1);
        assert!(g.cells().iter().all(|c| !c.on_path()));
    }

    #[test]
    fn detour_matches_dijkstra_cost() {
        let start = Coord::new(0, 0);
        let end = Coord::new(0, 3);
        let walls = [Coord::new(0, 1), Coord::new(1, 1), Coord::new(2, 1)];

        let mut a = Grid::new(4, start, end).unwrap();
        let mut d = Grid::new(4, start, end).unwrap();
        for w in walls {
            assert!(a.set_wall(w, true));
            assert!(d.set_wall(w, true));
        }
        assert_eq!(run(&mut a), Status::Succeeded);
        assert_eq!(d.run_dijkstra(&StopToken::new()), Status::Succeeded);
        assert_eq!(a.path_length(), d.path_length());
    }

    #[test]
    fn goal_directed_search_visits_no_more_than_exhaustive() {
        let mut a = Grid::new(8, Coord::new(7, 0), Coord::new(0, 7)).unwrap();
        let mut d = Grid::new(8, Coord::new(7, 0), Coord::new(0, 7)).unwrap();
        run(&mut a);
        d.run_dijkstra(&StopToken::new());
        let visited = |g: &Grid| g.cells().iter().filter(|c| c.visited()).count();
        assert!(visited(&a) <= visited(&d));
    }

    #[test]
    fn pre_stopped_token_aborts_to_idle() {
        let mut g = Grid::new(5, Coord::new(4, 0), Coord::new(0, 4)).unwrap();
        let stop = StopToken::new();
        stop.stop();
        assert_eq!(g.run_astar(&stop), Status::Idle);
        assert_eq!(g.status(), Status::Idle);
    }

    #[test]
    fn heuristic_perturbation_stays_tiny() {
        let mut g = Grid::new(5, Coord::new(4, 0), Coord::new(0, 4)).unwrap();
        let run = Astar::begin(&mut g);
        // One orthogonal step costs 1; the perturbation must stay well
        // under that to keep unit-grid estimates effectively admissible.
        let h = run.heuristic(Coord::new(4, 0));
        let manhattan = f64::from(Coord::new(4, 0).manhattan(Coord::new(0, 4)));
        assert!(h > manhattan);
        assert!(h - manhattan < 1.0);
    }
}
