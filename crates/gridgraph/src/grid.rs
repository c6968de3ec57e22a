//! Rectangular grid container, cell coordinates and headings.
//!
//! Cells are addressed by `(row, col)` with row 0 at the top. A grid owns its
//! values; callers refer to positions by [`Cell`] and never by identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a grid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("character {found:?} at {row}:{col} is not a digit")]
    NotADigit { row: usize, col: usize, found: char },
}

/// Heading of a move between two adjacent cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "U")]
    Up,
    #[serde(rename = "D")]
    Down,
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "UL")]
    UpLeft,
    #[serde(rename = "UR")]
    UpRight,
    #[serde(rename = "DL")]
    DownLeft,
    #[serde(rename = "DR")]
    DownRight,
}

impl Direction {
    /// The four orthogonal headings in enumeration order
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The four diagonal headings in enumeration order
    pub const DIAGONAL: [Direction; 4] = [
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    /// Row and column offset of one step in this heading
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (-1, 1),
            Direction::DownLeft => (1, -1),
            Direction::DownRight => (1, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::UpLeft => Direction::DownRight,
            Direction::UpRight => Direction::DownLeft,
            Direction::DownLeft => Direction::UpRight,
            Direction::DownRight => Direction::UpLeft,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::UpLeft | Direction::UpRight | Direction::DownLeft | Direction::DownRight
        )
    }

    /// Short label: U, D, L, R, UL, UR, DL, DR
    pub fn label(self) -> &'static str {
        match self {
            Direction::Up => "U",
            Direction::Down => "D",
            Direction::Left => "L",
            Direction::Right => "R",
            Direction::UpLeft => "UL",
            Direction::UpRight => "UR",
            Direction::DownLeft => "DL",
            Direction::DownRight => "DR",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Position inside a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The adjacent cell in `direction`, if it stays inside `rows` x `cols`
    pub fn step(self, direction: Direction, rows: usize, cols: usize) -> Option<Cell> {
        let (dr, dc) = direction.delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        if row < rows && col < cols {
            Some(Cell::new(row, col))
        } else {
            None
        }
    }

    pub fn manhattan(self, other: Cell) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell::new(row, col)
    }
}

/// A rectangular, row-major 2D array of values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<T>>", into = "Vec<Vec<T>>")]
#[serde(bound(
    serialize = "T: Clone + Serialize",
    deserialize = "T: Deserialize<'de>"
))]
pub struct Grid<T> {
    rows: Vec<Vec<T>>,
    cols: usize,
}

impl<T> Grid<T> {
    /// Build a grid from rows, rejecting rows of unequal length
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GridError> {
        let cols = rows.first().map_or(0, |r| r.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(GridError::Ragged {
                    row: index,
                    expected: cols,
                    found: row.len(),
                });
            }
        }
        Ok(Self { rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols == 0
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows() && cell.col < self.cols
    }

    /// Get the value at a cell (bounds-checked)
    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.rows.get(cell.row).and_then(|row| row.get(cell.col))
    }

    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut T> {
        self.rows
            .get_mut(cell.row)
            .and_then(|row| row.get_mut(cell.col))
    }

    /// Row-major iteration over every cell and its value
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &T)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, value)| (Cell::new(r, c), value))
        })
    }

    /// Every cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let cols = self.cols;
        (0..self.rows()).flat_map(move |r| (0..cols).map(move |c| Cell::new(r, c)))
    }

    /// Find the first cell (row-major) whose value matches
    pub fn position(&self, mut matches: impl FnMut(&T) -> bool) -> Option<Cell> {
        self.iter()
            .find(|(_, value)| matches(value))
            .map(|(cell, _)| cell)
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(&mut f).collect())
                .collect(),
            cols: self.cols,
        }
    }
}

impl<T: Clone> Grid<T> {
    /// Repeat the grid `down` times vertically and `across` times horizontally
    pub fn tiled(&self, down: usize, across: usize) -> Grid<T> {
        let rows = (0..down)
            .flat_map(|_| self.rows.iter())
            .map(|row| {
                (0..across)
                    .flat_map(|_| row.iter().cloned())
                    .collect::<Vec<T>>()
            })
            .collect();
        Grid {
            rows,
            cols: self.cols * across,
        }
    }
}

impl Grid<char> {
    /// One row per non-empty line, one cell per character.
    ///
    /// Surrounding whitespace on each line is trimmed.
    pub fn parse_chars(input: &str) -> Result<Self, GridError> {
        let rows = input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect())
            .collect();
        Grid::from_rows(rows)
    }
}

impl Grid<u32> {
    /// One row per non-empty line, each character a decimal digit
    pub fn parse_digits(input: &str) -> Result<Self, GridError> {
        let chars = Grid::<char>::parse_chars(input)?;
        let mut rows = Vec::with_capacity(chars.rows());
        for (r, row) in chars.rows.iter().enumerate() {
            let mut values = Vec::with_capacity(row.len());
            for (c, &ch) in row.iter().enumerate() {
                let digit = ch.to_digit(10).ok_or(GridError::NotADigit {
                    row: r,
                    col: c,
                    found: ch,
                })?;
                values.push(digit);
            }
            rows.push(values);
        }
        Grid::from_rows(rows)
    }
}

impl<T> TryFrom<Vec<Vec<T>>> for Grid<T> {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<T>>) -> Result<Self, Self::Error> {
        Grid::from_rows(rows)
    }
}

impl<T> From<Grid<T>> for Vec<Vec<T>> {
    fn from(grid: Grid<T>) -> Self {
        grid.rows
    }
}
