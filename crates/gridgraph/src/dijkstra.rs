//! Dijkstra over direction-states.
//!
//! A [`State`] bundles a cell with the heading used to enter it and how many
//! consecutive moves were made in that heading. The same cell reached with a
//! different heading or run is a different node, which is what lets rules
//! such as "at most three steps straight" or "at least four steps before
//! turning" be expressed as plain shortest paths.
//!
//! The core [`shortest_paths`] is generic over the state type; [`solve_grid`]
//! registers the direction-states of a grid and [`run_constrained_moves`] is
//! the stock neighbor function for run-length rules.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::grid::{Cell, Direction, Grid};
use crate::heap::{HeapError, IndexedMinHeap};
use crate::neighbors::orthogonal;

/// Path cost
pub type Cost = u64;

/// Distance of a registered state that has not been reached
const UNREACHED: Cost = Cost::MAX;

/// Search node for run-constrained movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct State {
    pub cell: Cell,
    /// Heading of the move into `cell`; `None` before the first move
    pub heading: Option<Direction>,
    /// Consecutive moves made in `heading`
    pub run: u32,
}

impl State {
    pub fn new(cell: Cell, heading: Direction, run: u32) -> Self {
        Self {
            cell,
            heading: Some(heading),
            run,
        }
    }

    /// A state that has not moved yet
    pub fn start(cell: Cell) -> Self {
        Self {
            cell,
            heading: None,
            run: 0,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.heading {
            Some(heading) => write!(f, "{}:{}:{}", self.cell, heading, self.run),
            None => write!(f, "{}:-:{}", self.cell, self.run),
        }
    }
}

/// Limits on straight-line travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRules {
    /// Moves required in one heading before turning (or stopping)
    pub min_run: u32,
    /// Moves allowed in one heading before a turn is forced
    pub max_run: u32,
}

impl Default for RunRules {
    fn default() -> Self {
        Self {
            min_run: 1,
            max_run: 3,
        }
    }
}

impl RunRules {
    pub fn new(min_run: u32, max_run: u32) -> Self {
        Self { min_run, max_run }
    }

    /// No effective limit on a grid of the given shape
    pub fn unconstrained(rows: usize, cols: usize) -> Self {
        let longest = rows.max(cols).max(1);
        Self {
            min_run: 1,
            max_run: u32::try_from(longest).unwrap_or(u32::MAX),
        }
    }

    /// Whether a route may end in `state`
    pub fn can_stop(&self, state: &State) -> bool {
        state.heading.is_none() || state.run >= self.min_run
    }

    /// The state after moving from `state` towards `heading`, if allowed.
    ///
    /// Reversing is never allowed; turning requires `min_run` straight moves
    /// first, except from a state that has not moved yet.
    pub fn advance(&self, state: &State, heading: Direction, cell: Cell) -> Option<State> {
        let run = match state.heading {
            None => 1,
            Some(current) if current == heading => state.run + 1,
            Some(current) if current == heading.opposite() => return None,
            Some(_) if state.run < self.min_run => return None,
            Some(_) => 1,
        };
        if run > self.max_run {
            return None;
        }
        Some(State::new(cell, heading, run))
    }
}

/// Distances and predecessors from one start state
#[derive(Debug, Clone)]
pub struct ShortestPaths<S> {
    start: S,
    distances: HashMap<S, Cost>,
    predecessors: HashMap<S, S>,
}

impl<S> ShortestPaths<S>
where
    S: Clone + Eq + Hash,
{
    pub fn start(&self) -> &S {
        &self.start
    }

    /// Shortest distance to `state`; `None` when unreachable or unknown
    pub fn distance(&self, state: &S) -> Option<Cost> {
        self.distances.get(state).copied()
    }

    pub fn predecessor(&self, state: &S) -> Option<&S> {
        self.predecessors.get(state)
    }

    /// Every reached state with its distance
    pub fn reached(&self) -> impl Iterator<Item = (&S, Cost)> + '_ {
        self.distances.iter().map(|(s, &d)| (s, d))
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// States from the start to `target`, both inclusive
    pub fn path_to(&self, target: &S) -> Option<Vec<S>> {
        self.distances.get(target)?;
        let mut path = vec![target.clone()];
        let mut current = target;
        while let Some(previous) = self.predecessors.get(current) {
            path.push(previous.clone());
            current = previous;
        }
        if current != &self.start {
            return None;
        }
        path.reverse();
        Some(path)
    }
}

impl<S> ShortestPaths<S>
where
    S: Clone + Eq + Hash + Ord,
{
    /// The closest reached state accepted by `matches`.
    ///
    /// Ties go to the smallest state so the answer does not depend on hash
    /// order.
    pub fn best(&self, mut matches: impl FnMut(&S) -> bool) -> Option<(S, Cost)> {
        self.distances
            .iter()
            .filter(|(state, _)| matches(state))
            .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(state, &cost)| (state.clone(), cost))
    }
}

#[derive(Debug, Clone)]
struct Queued<S> {
    state: S,
    distance: Cost,
}

fn by_distance<S>(a: &Queued<S>, b: &Queued<S>) -> Ordering {
    a.distance.cmp(&b.distance)
}

fn by_state<S: Clone>(entry: &Queued<S>) -> S {
    entry.state.clone()
}

/// Dijkstra from `start` over the registered states.
///
/// Every state in `seeds` (and `start`) is queued up front. `neighbors`
/// returns the successors of a state with the non-negative cost of moving
/// there; successors that were never registered are ignored. Unreached
/// states are left out of the result.
pub fn shortest_paths<S, I, N, M>(
    seeds: I,
    start: S,
    mut neighbors: N,
) -> Result<ShortestPaths<S>, HeapError>
where
    S: Clone + Eq + Hash,
    I: IntoIterator<Item = S>,
    N: FnMut(&S) -> M,
    M: IntoIterator<Item = (S, Cost)>,
{
    let mut distances: IndexMap<S, Cost> = seeds.into_iter().map(|s| (s, UNREACHED)).collect();
    distances.insert(start.clone(), 0);
    let mut predecessors: HashMap<S, S> = HashMap::new();

    let mut queue = IndexedMinHeap::with_capacity(distances.len(), by_distance::<S>, by_state::<S>);
    for (state, &distance) in &distances {
        queue.insert(Queued {
            state: state.clone(),
            distance,
        })?;
    }

    let registered = distances.len();
    let mut settled = 0usize;
    while !queue.is_empty() {
        let Queued { state, distance } = queue.extract()?;
        if distance == UNREACHED {
            // everything left in the queue is unreachable
            break;
        }
        settled += 1;

        for (next, cost) in neighbors(&state) {
            let Some(&known) = distances.get(&next) else {
                continue;
            };
            let candidate = distance.saturating_add(cost);
            if candidate < known {
                queue.decrease(
                    &Queued {
                        state: next.clone(),
                        distance: known,
                    },
                    Queued {
                        state: next.clone(),
                        distance: candidate,
                    },
                )?;
                distances.insert(next.clone(), candidate);
                predecessors.insert(next, state.clone());
            }
        }
    }
    debug!(registered, settled, "shortest paths");

    Ok(ShortestPaths {
        start,
        distances: distances
            .into_iter()
            .filter(|(_, d)| *d != UNREACHED)
            .collect(),
        predecessors,
    })
}

/// Every direction-state a grid can hold with runs up to `max_run`.
///
/// A run of `k` in one heading needs `k` cells behind it, so runs are capped
/// by the distance to the edge the move came from.
pub fn grid_states<T>(grid: &Grid<T>, max_run: u32) -> Vec<State> {
    let rows = grid.rows();
    let cols = grid.cols();
    let cap = |room: usize| max_run.min(u32::try_from(room).unwrap_or(u32::MAX));

    let mut states = Vec::new();
    for cell in grid.cells() {
        let limits = [
            (Direction::Down, cap(cell.row + 1)),
            (Direction::Up, cap(rows - cell.row)),
            (Direction::Right, cap(cell.col + 1)),
            (Direction::Left, cap(cols - cell.col)),
        ];
        for (heading, limit) in limits {
            states.extend((1..=limit).map(|run| State::new(cell, heading, run)));
        }
    }
    states
}

/// Shortest paths over the direction-states of `grid`
pub fn solve_grid<T, N, M>(
    grid: &Grid<T>,
    start: State,
    max_run: u32,
    neighbors: N,
) -> Result<ShortestPaths<State>, HeapError>
where
    N: FnMut(&State) -> M,
    M: IntoIterator<Item = (State, Cost)>,
{
    shortest_paths(grid_states(grid, max_run), start, neighbors)
}

/// Orthogonal successors of `state` allowed by `rules`, costed by the value
/// of the cell entered
pub fn run_constrained_moves<T>(
    grid: &Grid<T>,
    state: &State,
    rules: &RunRules,
) -> SmallVec<[(State, Cost); 4]>
where
    T: Copy + Into<Cost>,
{
    orthogonal(grid, state.cell)
        .into_iter()
        .filter_map(|n| {
            let next = rules.advance(state, n.direction, n.cell)?;
            let cost: Cost = grid.get(n.cell).copied()?.into();
            Some((next, cost))
        })
        .collect()
}

/// A cheapest route between two cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub cost: Cost,
    pub path: Vec<State>,
}

impl Route {
    /// Number of moves taken
    pub fn steps(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Cheapest route from `from` to `to` under `rules`.
///
/// Entering a cell costs its value; the start cell is free. `Ok(None)` when
/// `to` cannot be reached with a run of at least `min_run`.
pub fn cheapest_route<T>(
    grid: &Grid<T>,
    from: Cell,
    to: Cell,
    rules: &RunRules,
) -> Result<Option<Route>, HeapError>
where
    T: Copy + Into<Cost>,
{
    let start = State::start(from);
    let result = solve_grid(grid, start, rules.max_run, |state| {
        run_constrained_moves(grid, state, rules)
    })?;

    let Some((end, cost)) = result.best(|s| s.cell == to && rules.can_stop(s)) else {
        return Ok(None);
    };
    Ok(result.path_to(&end).map(|path| Route { cost, path }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CITY: &str = "2413432311323
                        3215453535623
                        3255245654254
                        3446585845452
                        4546657867536
                        1438598798454
                        4457876987766
                        3637877979653
                        4654967986887
                        4564679986453
                        1224686865563
                        2546548887735
                        4322674655533";

    fn corner_route(grid: &Grid<u32>, rules: RunRules) -> Route {
        let goal = Cell::new(grid.rows() - 1, grid.cols() - 1);
        cheapest_route(grid, Cell::new(0, 0), goal, &rules)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_state_display() {
        assert_eq!(State::start(Cell::new(0, 0)).to_string(), "0:0:-:0");
        assert_eq!(
            State::new(Cell::new(3, 4), Direction::Left, 2).to_string(),
            "3:4:L:2"
        );
    }

    #[test]
    fn test_advance_rules() {
        let rules = RunRules::new(4, 10);
        let here = Cell::new(5, 5);
        let moving = State::new(here, Direction::Right, 2);
        assert_eq!(
            rules.advance(&moving, Direction::Right, Cell::new(5, 6)),
            Some(State::new(Cell::new(5, 6), Direction::Right, 3))
        );
        // too early to turn, and never back
        assert_eq!(rules.advance(&moving, Direction::Up, Cell::new(4, 5)), None);
        assert_eq!(rules.advance(&moving, Direction::Left, Cell::new(5, 4)), None);

        let long = State::new(here, Direction::Right, 10);
        assert_eq!(rules.advance(&long, Direction::Right, Cell::new(5, 6)), None);
        assert_eq!(
            rules.advance(&long, Direction::Down, Cell::new(6, 5)),
            Some(State::new(Cell::new(6, 5), Direction::Down, 1))
        );

        let start = State::start(here);
        assert!(rules.advance(&start, Direction::Left, Cell::new(5, 4)).is_some());
        assert!(rules.can_stop(&long));
        assert!(!rules.can_stop(&moving));
    }

    #[test]
    fn test_grid_states_respect_edges() {
        let grid = Grid::<u32>::parse_digits("11\n11").unwrap();
        let states = grid_states(&grid, 3);
        // runs are capped by the room behind the move
        assert!(states.contains(&State::new(Cell::new(0, 0), Direction::Up, 2)));
        assert!(!states.contains(&State::new(Cell::new(0, 0), Direction::Up, 3)));
        assert!(states.contains(&State::new(Cell::new(1, 1), Direction::Down, 2)));
        assert!(!states.contains(&State::new(Cell::new(1, 1), Direction::Down, 3)));
        // no duplicates
        let unique: std::collections::HashSet<_> = states.iter().collect();
        assert_eq!(unique.len(), states.len());
    }

    #[test]
    fn test_uniform_grid_is_manhattan() {
        let grid = Grid::from_rows(vec![vec![1u32; 5]; 5]).unwrap();
        let route = corner_route(&grid, RunRules::unconstrained(5, 5));
        assert_eq!(route.cost, 8);
        assert_eq!(route.steps(), 8);
        assert_eq!(route.path.first(), Some(&State::start(Cell::new(0, 0))));
        assert_eq!(route.path.last().map(|s| s.cell), Some(Cell::new(4, 4)));
        for pair in route.path.windows(2) {
            assert_eq!(pair[0].cell.manhattan(pair[1].cell), 1);
        }
    }

    #[test]
    fn test_run_limits_change_the_answer() {
        let grid = Grid::<u32>::parse_digits(CITY).unwrap();
        let free = corner_route(&grid, RunRules::unconstrained(13, 13));
        let short = corner_route(&grid, RunRules::new(1, 3));
        let long = corner_route(&grid, RunRules::new(4, 10));
        assert_eq!(short.cost, 102);
        assert_eq!(long.cost, 94);
        assert!(free.cost <= long.cost && free.cost <= short.cost);
        assert!(short.path.iter().all(|s| s.run <= 3));
        assert!(long.path.last().is_some_and(|s| s.run >= 4));
    }

    #[test]
    fn test_minimum_run_forces_a_long_way_round() {
        let grid = Grid::<u32>::parse_digits(
            "111111111111
             999999999991
             999999999991
             999999999991
             999999999991",
        )
        .unwrap();
        assert_eq!(corner_route(&grid, RunRules::new(4, 10)).cost, 71);
        assert_eq!(corner_route(&grid, RunRules::new(1, 3)).cost, 59);
    }

    #[test]
    fn test_unreachable_state_is_absent() {
        let grid = Grid::<u32>::parse_digits("12\n34").unwrap();
        let start = State::start(Cell::new(0, 0));
        // a neighbor function that never moves
        let result = solve_grid(&grid, start, 2, |_| Vec::<(State, Cost)>::new()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.distance(&start), Some(0));
        let corner = State::new(Cell::new(1, 1), Direction::Down, 1);
        assert_eq!(result.distance(&corner), None);
        assert_eq!(result.path_to(&corner), None);
        assert_eq!(result.path_to(&start), Some(vec![start]));
    }

    #[test]
    fn test_unregistered_neighbors_are_ignored() {
        // string states on a line a - b - c, with c never registered
        let seeds = vec!["a", "b"];
        let result = shortest_paths(seeds, "a", |s: &&'static str| -> Vec<(&'static str, Cost)> {
            match *s {
                "a" => vec![("b", 2)],
                "b" => vec![("c", 1)],
                _ => vec![],
            }
        })
        .unwrap();
        assert_eq!(result.start(), &"a");
        assert_eq!(result.distance(&"b"), Some(2));
        assert_eq!(result.distance(&"c"), None);
        let mut reached: Vec<(&str, Cost)> = result.reached().map(|(s, d)| (*s, d)).collect();
        reached.sort();
        assert_eq!(reached, vec![("a", 0), ("b", 2)]);
        assert_eq!(result.predecessor(&"b"), Some(&"a"));
        assert_eq!(result.best(|_| true), Some(("a", 0)));
    }
}
