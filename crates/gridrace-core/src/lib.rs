//! **gridrace-core** — geometry primitives for the gridrace search engine.
//!
//! This crate provides [`Coord`], the row/column value type every other
//! gridrace crate builds on, together with direction constants and the
//! distance metrics used by the search heuristics.

pub mod geom;

pub use geom::Coord;
