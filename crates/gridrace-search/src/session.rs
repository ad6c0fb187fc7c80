//! Run control: cooperative cancellation, paced background runs, and the
//! two-grid [`Session`].
//!
//! A *batch* is the pair of runs (one per algorithm) started together.
//! Both runs share one [`StopToken`]; stopping is idempotent, so a caller
//! can signal the same batch any number of times without first confirming
//! that the runs have drained.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gridrace_core::Coord;
use rand::rngs::StdRng;
use rand::{Rng, RngExt};

use crate::astar::Astar;
use crate::dijkstra::Dijkstra;
use crate::grid::{Grid, GridError, Status, Step};

/// Grid size presets of the interactive tool.
pub const SIZE_SMALL: usize = 22;
pub const SIZE_MEDIUM: usize = 55;
pub const SIZE_LARGE: usize = 110;

/// Default per-iteration pacing delay.
pub const DEFAULT_COOLDOWN_MS: u64 = 10;

// ---------------------------------------------------------------------------
// StopToken
// ---------------------------------------------------------------------------

/// Cooperative cancellation token shared by a batch of runs.
///
/// Clones observe the same signal. [`stop`](StopToken::stop) is
/// idempotent: signalling an already-stopped token is a no-op, never an
/// error.
#[derive(Clone, Debug, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    /// Create a new, un-signalled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Request cancellation.
    #[inline]
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Background runs
// ---------------------------------------------------------------------------

/// Which search algorithm a run executes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    Dijkstra,
    AStar,
}

/// Lock a shared grid, recovering the guard if a previous holder panicked.
pub fn lock_grid(grid: &Mutex<Grid>) -> MutexGuard<'_, Grid> {
    match grid.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

enum Search<R: Rng> {
    Dijkstra(Dijkstra<R>),
    AStar(Astar<R>),
}

impl<R: Rng> Search<R> {
    fn begin(grid: &mut Grid, algo: Algorithm, rng: R) -> Self {
        match algo {
            Algorithm::Dijkstra => Self::Dijkstra(Dijkstra::begin_with_rng(grid, rng)),
            Algorithm::AStar => Self::AStar(Astar::begin_with_rng(grid, rng)),
        }
    }

    fn step(&mut self, grid: &mut Grid) -> Step {
        match self {
            Self::Dijkstra(s) => s.step(grid),
            Self::AStar(s) => s.step(grid),
        }
    }
}

/// Launch a paced background run of `algo` over `grid`.
///
/// The run is begun before this returns, so the grid is already
/// [`Status::Running`] from the caller's point of view (unless a run was
/// active, in which case the returned handle does nothing). Every
/// iteration of the spawned thread locks the grid, performs one step,
/// releases the lock, then sleeps the current `cooldown_ms`. The pacing
/// sleep is the only suspension point and holds no lock, so observers
/// can read the grid between steps. The token is polled at the top of
/// every iteration; observing it leaves the grid [`Status::Idle`] with
/// partial state intact.
pub fn spawn_search(
    grid: Arc<Mutex<Grid>>,
    algo: Algorithm,
    stop: StopToken,
    cooldown_ms: Arc<AtomicU64>,
) -> JoinHandle<()> {
    let search = {
        let mut g = lock_grid(&grid);
        if g.status() == Status::Running {
            None
        } else {
            Some(Search::begin(&mut g, algo, rand::make_rng::<StdRng>()))
        }
    };
    thread::spawn(move || {
        let Some(mut search) = search else {
            return;
        };
        loop {
            if stop.is_stopped() {
                lock_grid(&grid).abort_run();
                return;
            }
            {
                let mut g = lock_grid(&grid);
                if let Step::Finished(status) = search.step(&mut g) {
                    log::debug!(
                        "{algo:?} run finished: {status:?} after {} iterations, path length {}",
                        g.iterations(),
                        g.path_length(),
                    );
                    return;
                }
            }
            let ms = cooldown_ms.load(Ordering::Relaxed);
            if ms > 0 {
                thread::sleep(Duration::from_millis(ms));
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The engine's context object: a pair of identically laid-out grids (one
/// per algorithm), the shared pacing setting, and the current batch's
/// cancellation token.
///
/// Layout edits are mirrored to both grids so the two algorithms always
/// race over the same terrain.
pub struct Session {
    dijkstra: Arc<Mutex<Grid>>,
    astar: Arc<Mutex<Grid>>,
    cooldown_ms: Arc<AtomicU64>,
    stop: Option<StopToken>,
    handles: Vec<JoinHandle<()>>,
}

impl Session {
    /// Create a session over `size`×`size` grids with the given anchors.
    pub fn new(size: usize, start: Coord, end: Coord) -> Result<Self, GridError> {
        let grid = Grid::new(size, start, end)?;
        Ok(Self {
            dijkstra: Arc::new(Mutex::new(grid.clone())),
            astar: Arc::new(Mutex::new(grid)),
            cooldown_ms: Arc::new(AtomicU64::new(DEFAULT_COOLDOWN_MS)),
            stop: None,
            handles: Vec::new(),
        })
    }

    /// Create a session with the tool's default anchors: start at the
    /// bottom-left corner, end at the top-right.
    pub fn with_default_anchors(size: usize) -> Result<Self, GridError> {
        let n = i32::try_from(size).map_err(|_| GridError::InvalidSize { size })?;
        Self::new(size, Coord::new(n - 1, 0), Coord::new(0, n - 1))
    }

    /// Whether either grid currently has a run in progress.
    pub fn is_running(&self) -> bool {
        lock_grid(&self.dijkstra).status() == Status::Running
            || lock_grid(&self.astar).status() == Status::Running
    }

    /// Start a batch: clear previous search state (walls kept), create a
    /// fresh stop token, and launch one background run per algorithm.
    ///
    /// Rejected while a batch is still running.
    pub fn play(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.wait();
        if !lock_grid(&self.dijkstra).restart(true) || !lock_grid(&self.astar).restart(true) {
            return false;
        }

        let stop = StopToken::new();
        self.handles.push(spawn_search(
            Arc::clone(&self.dijkstra),
            Algorithm::Dijkstra,
            stop.clone(),
            Arc::clone(&self.cooldown_ms),
        ));
        self.handles.push(spawn_search(
            Arc::clone(&self.astar),
            Algorithm::AStar,
            stop.clone(),
            Arc::clone(&self.cooldown_ms),
        ));
        self.stop = Some(stop);
        log::info!("batch started ({} ms cooldown)", self.cooldown());
        true
    }

    /// Signal the current batch to stop. Safe to call at any time, any
    /// number of times; a no-op when nothing is running.
    pub fn stop(&self) {
        if let Some(stop) = &self.stop {
            stop.stop();
        }
    }

    /// Block until both runs of the current batch have returned.
    pub fn wait(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }

    /// Current per-iteration pacing delay in milliseconds.
    pub fn cooldown(&self) -> u64 {
        self.cooldown_ms.load(Ordering::Relaxed)
    }

    /// Adjust the pacing delay. Takes effect from the next iteration,
    /// including for runs already in flight.
    pub fn set_cooldown(&self, ms: u64) {
        self.cooldown_ms.store(ms, Ordering::Relaxed);
    }

    /// Shared handle to one of the two grids, for observation or custom
    /// drivers.
    pub fn grid(&self, algo: Algorithm) -> Arc<Mutex<Grid>> {
        Arc::clone(self.grid_for(algo))
    }

    /// Read one grid under a short-lived lock.
    pub fn read<T>(&self, algo: Algorithm, f: impl FnOnce(&Grid) -> T) -> T {
        f(&lock_grid(self.grid_for(algo)))
    }

    fn grid_for(&self, algo: Algorithm) -> &Arc<Mutex<Grid>> {
        match algo {
            Algorithm::Dijkstra => &self.dijkstra,
            Algorithm::AStar => &self.astar,
        }
    }

    // -----------------------------------------------------------------------
    // Mirrored layout editing
    // -----------------------------------------------------------------------

    /// Set or clear a wall on both grids. Same rejections as
    /// [`Grid::set_wall`].
    pub fn set_wall(&mut self, coord: Coord, wall: bool) -> bool {
        let a = lock_grid(&self.dijkstra).set_wall(coord, wall);
        let b = lock_grid(&self.astar).set_wall(coord, wall);
        a && b
    }

    /// Relocate the start anchor on both grids.
    pub fn move_start(&mut self, coord: Coord) -> bool {
        let a = lock_grid(&self.dijkstra).move_start(coord);
        let b = lock_grid(&self.astar).move_start(coord);
        a && b
    }

    /// Relocate the end anchor on both grids.
    pub fn move_end(&mut self, coord: Coord) -> bool {
        let a = lock_grid(&self.dijkstra).move_end(coord);
        let b = lock_grid(&self.astar).move_end(coord);
        a && b
    }

    /// Replace the layout with random terrain at the given wall density,
    /// identical on both grids. Clears previous walls and search state.
    pub fn generate_terrain(&mut self, rng: &mut impl Rng, density: f64) -> bool {
        if self.is_running() || !(0.0..=1.0).contains(&density) {
            return false;
        }
        if !self.clear_all() {
            return false;
        }
        let size = lock_grid(&self.dijkstra).size() as i32;
        for row in 0..size {
            for col in 0..size {
                if rng.random_bool(density) {
                    self.set_wall(Coord::new(row, col), true);
                }
            }
        }
        true
    }

    /// Clear search state on both grids, keeping walls.
    pub fn clear_path(&mut self) -> bool {
        let a = lock_grid(&self.dijkstra).restart(true);
        let b = lock_grid(&self.astar).restart(true);
        a && b
    }

    /// Clear both grids completely, walls included.
    pub fn clear_all(&mut self) -> bool {
        let a = lock_grid(&self.dijkstra).restart(false);
        let b = lock_grid(&self.astar).restart(false);
        a && b
    }

    /// Replace both grids with blank ones of a new size and the default
    /// anchors. Rejected while running or for unusable sizes.
    pub fn resize(&mut self, size: usize) -> bool {
        if self.is_running() {
            return false;
        }
        self.wait();
        let Ok(n) = i32::try_from(size) else {
            return false;
        };
        match Grid::new(size, Coord::new(n - 1, 0), Coord::new(0, n - 1)) {
            Ok(grid) => {
                *lock_grid(&self.astar) = grid.clone();
                *lock_grid(&self.dijkstra) = grid;
                true
            }
            Err(_) => false,
        }
    }
}

impl Drop for Session {
    /// Dropping a session cancels and drains any in-flight batch.
    fn drop(&mut self) {
        self.stop();
        self.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn statuses(s: &Session) -> (Status, Status) {
        (
            s.read(Algorithm::Dijkstra, Grid::status),
            s.read(Algorithm::AStar, Grid::status),
        )
    }

    #[test]
    fn stop_token_is_idempotent_across_clones() {
        let token = StopToken::new();
        let peer = token.clone();
        assert!(!peer.is_stopped());
        token.stop();
        token.stop();
        peer.stop();
        assert!(token.is_stopped());
        assert!(peer.is_stopped());
    }

    #[test]
    fn batch_runs_to_completion() {
        let mut s = Session::new(4, Coord::new(3, 0), Coord::new(0, 3)).unwrap();
        s.set_cooldown(0);
        assert!(s.play());
        s.wait();
        assert_eq!(statuses(&s), (Status::Succeeded, Status::Succeeded));
        let d = s.read(Algorithm::Dijkstra, Grid::path_length);
        let a = s.read(Algorithm::AStar, Grid::path_length);
        assert_eq!(d, a);
        assert_eq!(d, Coord::new(3, 0).manhattan(Coord::new(0, 3)) - 1);
    }

    #[test]
    fn immediate_stop_leaves_both_idle() {
        let mut s = Session::with_default_anchors(SIZE_SMALL).unwrap();
        s.set_cooldown(5);
        assert!(s.play());
        s.stop();
        s.stop(); // double-signal is fine
        s.wait();
        assert_eq!(statuses(&s), (Status::Idle, Status::Idle));
    }

    #[test]
    fn stop_without_play_is_noop() {
        let s = Session::with_default_anchors(4).unwrap();
        s.stop();
        s.stop();
        assert_eq!(statuses(&s), (Status::Idle, Status::Idle));
    }

    #[test]
    fn play_while_running_is_rejected() {
        let mut s = Session::with_default_anchors(SIZE_SMALL).unwrap();
        s.set_cooldown(20);
        assert!(s.play());
        assert!(!s.play());
        s.stop();
        s.wait();
    }

    #[test]
    fn stop_racing_natural_completion_is_harmless() {
        // Tiny grid, no pacing: the runs may finish before or after the
        // signal lands; either way nothing hangs and no status is Failed.
        for _ in 0..20 {
            let mut s = Session::with_default_anchors(3).unwrap();
            s.set_cooldown(0);
            assert!(s.play());
            s.stop();
            s.wait();
            let (d, a) = statuses(&s);
            for status in [d, a] {
                assert!(matches!(status, Status::Idle | Status::Succeeded));
            }
        }
    }

    #[test]
    fn edits_are_mirrored() {
        let mut s = Session::with_default_anchors(6).unwrap();
        assert!(s.set_wall(Coord::new(2, 2), true));
        assert!(s.move_start(Coord::new(3, 3)));
        assert!(s.move_end(Coord::new(1, 4)));

        for algo in [Algorithm::Dijkstra, Algorithm::AStar] {
            s.read(algo, |g| {
                assert!(g.cell(Coord::new(2, 2)).unwrap().is_wall());
                assert_eq!(g.start(), Coord::new(3, 3));
                assert_eq!(g.end(), Coord::new(1, 4));
            });
        }
    }

    #[test]
    fn edits_rejected_while_running() {
        let mut s = Session::with_default_anchors(SIZE_SMALL).unwrap();
        s.set_cooldown(20);
        assert!(s.play());
        assert!(!s.set_wall(Coord::new(5, 5), true));
        assert!(!s.move_start(Coord::new(5, 5)));
        assert!(!s.clear_path());
        assert!(!s.resize(10));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!s.generate_terrain(&mut rng, 0.2));
        s.stop();
        s.wait();
    }

    #[test]
    fn terrain_is_identical_on_both_grids() {
        let mut s = Session::with_default_anchors(10).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        assert!(s.generate_terrain(&mut rng, 0.3));

        let walls = |algo| {
            s.read(algo, |g: &Grid| {
                g.cells().iter().map(|c| c.is_wall()).collect::<Vec<_>>()
            })
        };
        let d = walls(Algorithm::Dijkstra);
        let a = walls(Algorithm::AStar);
        assert_eq!(d, a);
        assert!(d.iter().any(|&w| w));
        s.read(Algorithm::Dijkstra, |g| {
            assert!(!g.cell(g.start()).unwrap().is_wall());
            assert!(!g.cell(g.end()).unwrap().is_wall());
        });
    }

    #[test]
    fn resize_restores_default_anchors() {
        let mut s = Session::with_default_anchors(6).unwrap();
        assert!(s.set_wall(Coord::new(1, 1), true));
        assert!(s.resize(10));
        for algo in [Algorithm::Dijkstra, Algorithm::AStar] {
            s.read(algo, |g| {
                assert_eq!(g.size(), 10);
                assert_eq!(g.start(), Coord::new(9, 0));
                assert_eq!(g.end(), Coord::new(0, 9));
                assert!(g.cells().iter().all(|c| !c.is_wall()));
            });
        }
        assert!(!s.resize(1));
    }

    #[test]
    fn cooldown_is_adjustable() {
        let s = Session::with_default_anchors(4).unwrap();
        assert_eq!(s.cooldown(), DEFAULT_COOLDOWN_MS);
        s.set_cooldown(250);
        assert_eq!(s.cooldown(), 250);
    }

    #[test]
    fn replay_after_completion_works() {
        let mut s = Session::with_default_anchors(4).unwrap();
        s.set_cooldown(0);
        assert!(s.play());
        s.wait();
        let first = s.read(Algorithm::Dijkstra, Grid::path_length);
        assert!(s.play());
        s.wait();
        assert_eq!(s.read(Algorithm::Dijkstra, Grid::path_length), first);
    }

    #[test]
    fn frontier_observable_mid_run() {
        let mut s = Session::with_default_anchors(SIZE_SMALL).unwrap();
        s.set_cooldown(5);
        assert!(s.play());
        // Give the runs a few iterations, then peek while they sleep.
        thread::sleep(Duration::from_millis(50));
        let touched = s.read(Algorithm::Dijkstra, |g| {
            g.cells().iter().filter(|c| c.queued()).count()
        });
        s.stop();
        s.wait();
        assert!(touched > 0);
    }
}
