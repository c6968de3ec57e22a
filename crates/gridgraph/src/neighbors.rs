//! Neighbor enumeration over a grid.
//!
//! Neighbors are produced in a fixed order: up, down, left, right, then the
//! diagonals up-left, up-right, down-left, down-right when requested. Cells
//! outside the grid are skipped; there is no wraparound.

use std::collections::BTreeSet;

use smallvec::SmallVec;

use crate::grid::{Cell, Direction, Grid};

/// Inline capacity covering the 8-connected case
pub const MAX_NEIGHBORS: usize = 8;

pub type Neighbors = SmallVec<[Neighbor; MAX_NEIGHBORS]>;

/// An adjacent cell together with the heading used to reach it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Neighbor {
    pub cell: Cell,
    pub direction: Direction,
}

/// Enumerate the in-bounds neighbors of `cell` accepted by `admissible`.
///
/// `admissible` sees the candidate cell and its value.
pub fn neighbors<T, P>(grid: &Grid<T>, cell: Cell, diagonals: bool, mut admissible: P) -> Neighbors
where
    P: FnMut(Cell, &T) -> bool,
{
    let headings: &[Direction] = if diagonals {
        &[
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
            Direction::UpLeft,
            Direction::UpRight,
            Direction::DownLeft,
            Direction::DownRight,
        ]
    } else {
        &Direction::ORTHOGONAL
    };

    let mut out = Neighbors::new();
    for &direction in headings {
        let Some(next) = cell.step(direction, grid.rows(), grid.cols()) else {
            continue;
        };
        // step() already bounds-checked against the grid shape
        let Some(value) = grid.get(next) else {
            continue;
        };
        if admissible(next, value) {
            out.push(Neighbor {
                cell: next,
                direction,
            });
        }
    }
    out
}

/// Orthogonal neighbors with no filtering
pub fn orthogonal<T>(grid: &Grid<T>, cell: Cell) -> Neighbors {
    neighbors(grid, cell, false, |_, _| true)
}

/// Orthogonal and diagonal neighbors with no filtering
pub fn surrounding<T>(grid: &Grid<T>, cell: Cell) -> Neighbors {
    neighbors(grid, cell, true, |_, _| true)
}

/// Cells occupied after exactly `steps` orthogonal moves from `starts`.
///
/// Every step moves each occupied cell to all of its admissible neighbors;
/// cells may be revisited on later steps. The result is sorted row-major.
pub fn step_frontier<T, P>(
    grid: &Grid<T>,
    starts: impl IntoIterator<Item = Cell>,
    steps: usize,
    mut admissible: P,
) -> BTreeSet<Cell>
where
    P: FnMut(Cell, &T) -> bool,
{
    let mut current: BTreeSet<Cell> = starts.into_iter().collect();
    for _ in 0..steps {
        let mut next = BTreeSet::new();
        for &cell in &current {
            next.extend(
                neighbors(grid, cell, false, &mut admissible)
                    .into_iter()
                    .map(|n| n.cell),
            );
        }
        if next.is_empty() {
            return next;
        }
        current = next;
    }
    current
}
