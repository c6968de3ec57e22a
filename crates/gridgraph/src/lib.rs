//! Grid and graph algorithms for puzzle-style search problems.
//!
//! This crate provides an indexed min-heap with decrease-key, grid neighbor
//! enumeration, an undirected weighted graph that can contract corridors
//! into single weighted edges, and a Dijkstra solver over direction-states
//! for movement rules that depend on heading and run length.

pub mod dijkstra;
pub mod graph;
pub mod grid;
pub mod heap;
pub mod neighbors;
pub mod paths;

// Re-export main types
pub use dijkstra::{
    cheapest_route, grid_states, run_constrained_moves, shortest_paths, solve_grid, Cost, Route,
    RunRules, ShortestPaths, State,
};
pub use graph::{Edge, GraphError, WeightedGraph, DEFAULT_WEIGHT};
pub use grid::{Cell, Direction, Grid, GridError};
pub use heap::{HeapError, IndexedMinHeap};
pub use neighbors::{neighbors, orthogonal, step_frontier, surrounding, Neighbor, Neighbors};
pub use paths::{longest_path, path_weight, simple_paths};
