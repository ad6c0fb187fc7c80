//! Headless race between Dijkstra and A* over a random terrain.
//!
//! Scatters walls at 20% density on a small grid, starts both algorithms
//! as a paced batch, polls their statistics while they run, then prints
//! each grid as text. If the terrain happens to wall off the end cell,
//! both runs finish with `Failed` and a path length of -1.

use std::error::Error;
use std::thread;
use std::time::Duration;

use gridrace_core::Coord;
use gridrace_search::{Algorithm, Grid, SIZE_SMALL, Session};

fn glyph(g: &Grid, c: Coord) -> char {
    if g.is_start(c) {
        return 'S';
    }
    if g.is_end(c) {
        return 'E';
    }
    match g.cell(c) {
        Some(cell) if cell.is_wall() => '#',
        Some(cell) if cell.on_path() => '*',
        Some(cell) if cell.frontier() => '+',
        Some(cell) if cell.visited() => '.',
        _ => ' ',
    }
}

fn dump(g: &Grid) -> String {
    let n = g.size() as i32;
    let mut out = String::with_capacity((g.size() + 1) * g.size());
    for row in 0..n {
        for col in 0..n {
            out.push(glyph(g, Coord::new(row, col)));
        }
        out.push('\n');
    }
    out
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut session = Session::with_default_anchors(SIZE_SMALL)?;
    session.set_cooldown(2);

    let mut rng = rand::rng();
    session.generate_terrain(&mut rng, 0.2);

    session.play();
    while session.is_running() {
        let d = session.read(Algorithm::Dijkstra, |g| g.iterations());
        let a = session.read(Algorithm::AStar, |g| g.iterations());
        println!("dijkstra: {d:>4} iterations | a*: {a:>4} iterations");
        thread::sleep(Duration::from_millis(100));
    }
    session.wait();

    for algo in [Algorithm::Dijkstra, Algorithm::AStar] {
        session.read(algo, |g| {
            println!(
                "\n{algo:?}: {:?} after {} iterations, path length {}",
                g.status(),
                g.iterations(),
                g.path_length(),
            );
            print!("{}", dump(g));
        });
    }
    Ok(())
}
