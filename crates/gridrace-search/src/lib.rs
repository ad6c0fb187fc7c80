//! **gridrace-search** — interactive shortest-path search over mutable
//! obstacle grids.
//!
//! Two classic algorithms run over identically laid-out square grids,
//! mutating per-cell state in place so a caller can observe progress
//! (visited / frontier / path cells, iteration counts) while a run is in
//! flight, and cancel it cooperatively at any point:
//!
//! - **Dijkstra** uniform-cost search ([`Grid::run_dijkstra`], [`Dijkstra`])
//! - **A\*** best-first search with a tie-broken Manhattan heuristic
//!   ([`Grid::run_astar`], [`Astar`])
//!
//! Runs can be driven synchronously, stepped manually through the
//! resumable search types, or launched as paced background threads via
//! [`spawn_search`]. [`Session`] bundles the usual arrangement: one grid
//! per algorithm, mirrored layout editing, a shared pacing delay, and a
//! per-batch [`StopToken`].

pub mod astar;
pub mod cell;
pub mod dijkstra;
pub mod grid;
pub mod heap;
pub mod session;

pub use astar::{Astar, BASE_WEIGHT};
pub use cell::Cell;
pub use dijkstra::Dijkstra;
pub use grid::{Grid, GridError, Status, Step};
pub use heap::MinHeap;
pub use session::{
    Algorithm, DEFAULT_COOLDOWN_MS, SIZE_LARGE, SIZE_MEDIUM, SIZE_SMALL, Session, StopToken,
    lock_grid, spawn_search,
};
