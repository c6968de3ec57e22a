//! Undirected weighted graph with degree-2 contraction.
//!
//! Adjacency is insertion-ordered, so edge listings are deterministic: nodes
//! in the order they were added, and each node's neighbors in the order their
//! edges were added. Every undirected edge has a weight recorded under both
//! orderings of its endpoints.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::grid::{Cell, Grid};
use crate::neighbors::neighbors;

/// Weight used by [`Edge::new`]
pub const DEFAULT_WEIGHT: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node {0} is not in the graph")]
    UnknownNode(String),
}

/// A directed view of one undirected edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge<N> {
    pub src: N,
    pub dest: N,
    pub weight: u64,
}

impl<N> Edge<N> {
    pub fn new(src: N, dest: N) -> Self {
        Self::weighted(src, dest, DEFAULT_WEIGHT)
    }

    pub fn weighted(src: N, dest: N, weight: u64) -> Self {
        Self { src, dest, weight }
    }
}

/// Mutable undirected graph keyed by node id
#[derive(Debug, Clone)]
pub struct WeightedGraph<N: Eq + Hash> {
    nodes: IndexMap<N, IndexSet<N>>,
    weights: HashMap<(N, N), u64>,
}

impl<N> WeightedGraph<N>
where
    N: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            weights: HashMap::new(),
        }
    }

    /// Register `id` as an isolated node.
    ///
    /// Re-adding an existing node drops all of its edges.
    pub fn add_node(&mut self, id: N) {
        if let Some(existing) = self.nodes.get(&id) {
            let former: Vec<N> = existing.iter().cloned().collect();
            for other in former {
                self.remove_edge(&id, &other);
            }
        } else {
            self.nodes.insert(id, IndexSet::new());
        }
    }

    /// Connect two existing nodes, overwriting any previous weight
    pub fn add_edge(&mut self, edge: Edge<N>) -> Result<(), GraphError> {
        for endpoint in [&edge.src, &edge.dest] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::UnknownNode(format!("{:?}", endpoint)));
            }
        }
        self.link(edge.src, edge.dest, edge.weight);
        Ok(())
    }

    /// Remove the edge between `src` and `dest`. Returns whether it existed.
    pub fn remove_edge(&mut self, src: &N, dest: &N) -> bool {
        let mut existed = false;
        if let Some(set) = self.nodes.get_mut(src) {
            existed |= set.shift_remove(dest);
        }
        if let Some(set) = self.nodes.get_mut(dest) {
            existed |= set.shift_remove(src);
        }
        self.weights.remove(&(src.clone(), dest.clone()));
        self.weights.remove(&(dest.clone(), src.clone()));
        existed
    }

    /// Remove `id` and every edge touching it. Returns whether it existed.
    pub fn remove_node(&mut self, id: &N) -> bool {
        let Some(adjacent) = self.nodes.get(id) else {
            return false;
        };
        let adjacent: Vec<N> = adjacent.iter().cloned().collect();
        for other in &adjacent {
            self.remove_edge(id, other);
        }
        self.nodes.shift_remove(id);
        true
    }

    pub fn contains_node(&self, id: &N) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.nodes.keys()
    }

    pub fn degree(&self, id: &N) -> Option<usize> {
        self.nodes.get(id).map(IndexSet::len)
    }

    pub fn weight(&self, src: &N, dest: &N) -> Option<u64> {
        self.weights.get(&(src.clone(), dest.clone())).copied()
    }

    /// Outgoing edges of `id` in neighbor insertion order
    pub fn node_edges(&self, id: &N) -> Option<Vec<Edge<N>>> {
        let adjacent = self.nodes.get(id)?;
        Some(
            adjacent
                .iter()
                .map(|dest| self.directed(id, dest))
                .collect(),
        )
    }

    /// Every outgoing edge of every node; undirected edges appear twice
    pub fn edges(&self) -> Vec<Edge<N>> {
        self.nodes
            .iter()
            .flat_map(|(src, adjacent)| adjacent.iter().map(move |dest| self.directed(src, dest)))
            .collect()
    }

    /// Collapse every pass-through node into a single weighted edge.
    ///
    /// Picks the first node (in insertion order) with exactly two neighbors,
    /// removes it and joins its neighbors with the summed weight, then scans
    /// again. Returns how many nodes were removed.
    pub fn contract(&mut self) -> usize {
        self.contract_preserving(&[])
    }

    /// Like [`contract`](Self::contract), but never removes the nodes in `keep`
    pub fn contract_preserving(&mut self, keep: &[N]) -> usize {
        let before = self.nodes.len();
        let mut removed = 0;
        while let Some(node) = self.pass_through_node(keep) {
            let (first, last) = {
                let adjacent = &self.nodes[&node];
                (adjacent[0].clone(), adjacent[1].clone())
            };
            let weight = self
                .directed(&node, &first)
                .weight
                .saturating_add(self.directed(&node, &last).weight);

            self.remove_node(&node);
            // an existing first-last edge is overwritten by the summed weight
            self.link(first.clone(), last.clone(), weight);
            removed += 1;
            trace!(?node, ?first, ?last, weight, "contracted");
        }
        debug!(before, after = self.nodes.len(), removed, "graph contraction");
        removed
    }

    fn pass_through_node(&self, keep: &[N]) -> Option<N> {
        self.nodes
            .iter()
            .find(|(id, adjacent)| {
                adjacent.len() == 2 && !adjacent.contains(*id) && !keep.contains(*id)
            })
            .map(|(id, _)| id.clone())
    }

    fn directed(&self, src: &N, dest: &N) -> Edge<N> {
        // add_edge records both orderings, so the lookup only misses on a
        // corrupted graph
        let weight = self.weight(src, dest).unwrap_or(DEFAULT_WEIGHT);
        Edge::weighted(src.clone(), dest.clone(), weight)
    }

    fn link(&mut self, src: N, dest: N, weight: u64) {
        if let Some(set) = self.nodes.get_mut(&src) {
            set.insert(dest.clone());
        }
        if let Some(set) = self.nodes.get_mut(&dest) {
            set.insert(src.clone());
        }
        self.weights.insert((src.clone(), dest.clone()), weight);
        self.weights.insert((dest, src), weight);
    }
}

impl<N> Default for WeightedGraph<N>
where
    N: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl WeightedGraph<Cell> {
    /// One node per admissible cell (row-major), one unit edge per pair of
    /// orthogonally adjacent admissible cells
    pub fn from_grid<T, P>(grid: &Grid<T>, mut admissible: P) -> Self
    where
        P: FnMut(Cell, &T) -> bool,
    {
        let mut graph = WeightedGraph::new();
        for (cell, value) in grid.iter() {
            if admissible(cell, value) {
                graph.add_node(cell);
            }
        }
        let open: Vec<Cell> = graph.nodes().copied().collect();
        for cell in open {
            for next in neighbors(grid, cell, false, &mut admissible) {
                graph.link(cell, next.cell, DEFAULT_WEIGHT);
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> WeightedGraph<&'static str> {
        let mut graph = WeightedGraph::new();
        for id in ["a", "b", "c", "d"] {
            graph.add_node(id);
        }
        graph.add_edge(Edge::weighted("a", "b", 2)).unwrap();
        graph.add_edge(Edge::weighted("b", "c", 3)).unwrap();
        graph.add_edge(Edge::weighted("c", "d", 4)).unwrap();
        graph
    }

    #[test]
    fn test_edges_are_symmetric() {
        let graph = path_graph();
        assert_eq!(graph.weight(&"a", &"b"), Some(2));
        assert_eq!(graph.weight(&"b", &"a"), Some(2));
        assert_eq!(graph.weight(&"a", &"c"), None);
        // each undirected edge once per direction
        assert_eq!(graph.edges().len(), 6);
        assert_eq!(
            graph.node_edges(&"b").unwrap(),
            vec![Edge::weighted("b", "a", 2), Edge::weighted("b", "c", 3)]
        );
        assert_eq!(graph.node_edges(&"z"), None);
    }

    #[test]
    fn test_add_edge_requires_nodes() {
        let mut graph = path_graph();
        let err = graph.add_edge(Edge::new("a", "z")).unwrap_err();
        assert_eq!(err, GraphError::UnknownNode("\"z\"".to_string()));
        assert!(!graph.contains_node(&"z"));
        assert_eq!(graph.degree(&"a"), Some(1));
    }

    #[test]
    fn test_default_weight_is_one() {
        let mut graph = WeightedGraph::new();
        graph.add_node(1);
        graph.add_node(2);
        graph.add_edge(Edge::new(1, 2)).unwrap();
        assert_eq!(graph.weight(&2, &1), Some(1));
    }

    #[test]
    fn test_remove_edge_both_directions() {
        let mut graph = path_graph();
        assert!(graph.remove_edge(&"c", &"b"));
        assert!(!graph.remove_edge(&"c", &"b"));
        assert_eq!(graph.weight(&"b", &"c"), None);
        assert_eq!(graph.weight(&"c", &"b"), None);
        assert_eq!(graph.degree(&"b"), Some(1));
        assert_eq!(graph.edges().len(), 4);
    }

    #[test]
    fn test_remove_node_leaves_no_dangling_edges() {
        let mut graph = path_graph();
        assert!(graph.remove_node(&"b"));
        assert!(!graph.remove_node(&"b"));
        assert!(graph
            .edges()
            .iter()
            .all(|e| e.src != "b" && e.dest != "b"));
        assert_eq!(graph.weight(&"a", &"b"), None);
        assert_eq!(graph.degree(&"a"), Some(0));
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_re_adding_node_clears_its_edges() {
        let mut graph = path_graph();
        graph.add_node("b");
        assert_eq!(graph.degree(&"b"), Some(0));
        assert_eq!(graph.degree(&"a"), Some(0));
        assert_eq!(graph.degree(&"c"), Some(1));
        assert_eq!(graph.weight(&"c", &"b"), None);
    }

    #[test]
    fn test_contract_simple_path() {
        let mut graph = path_graph();
        assert_eq!(graph.contract(), 2);
        assert!(!graph.contains_node(&"b"));
        assert!(!graph.contains_node(&"c"));
        assert_eq!(graph.weight(&"a", &"d"), Some(9));
        assert_eq!(graph.weight(&"d", &"a"), Some(9));
        assert_eq!(graph.edges().len(), 2);
    }

    #[test]
    fn test_contract_keeps_branch_points() {
        // a - b - c - x and c - y: c is a branch point
        let mut graph = WeightedGraph::new();
        for id in ["a", "b", "c", "x", "y"] {
            graph.add_node(id);
        }
        graph.add_edge(Edge::new("a", "b")).unwrap();
        graph.add_edge(Edge::new("b", "c")).unwrap();
        graph.add_edge(Edge::new("c", "x")).unwrap();
        graph.add_edge(Edge::new("c", "y")).unwrap();

        assert_eq!(graph.contract(), 1);
        assert_eq!(graph.weight(&"a", &"c"), Some(2));
        assert_eq!(graph.degree(&"c"), Some(3));
        assert!(graph.nodes().all(|n| graph.degree(n) != Some(2)));
    }

    #[test]
    fn test_contract_cycle_terminates() {
        let mut graph = WeightedGraph::new();
        for id in 0..4 {
            graph.add_node(id);
        }
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            graph.add_edge(Edge::new(a, b)).unwrap();
        }
        graph.contract();
        assert!(graph.nodes().all(|n| graph.degree(n) != Some(2)));
        assert!(graph.node_count() < 4);
    }

    #[test]
    fn test_contract_skips_self_loop() {
        let mut graph = WeightedGraph::new();
        graph.add_node("a");
        graph.add_node("b");
        graph.add_edge(Edge::weighted("a", "a", 5)).unwrap();
        graph.add_edge(Edge::weighted("a", "b", 1)).unwrap();
        assert_eq!(graph.degree(&"a"), Some(2));

        assert_eq!(graph.contract(), 0);
        assert_eq!(graph.weight(&"a", &"a"), Some(5));
        assert_eq!(graph.weight(&"b", &"a"), Some(1));
        assert_eq!(graph.edges().len(), 3);
    }

    #[test]
    fn test_contract_overwrites_existing_neighbor_edge() {
        // q is scanned first: p - q(2) - r(3) closes a triangle with p - r(10)
        let triangle = || {
            let mut graph = WeightedGraph::new();
            for id in ["q", "p", "r", "s"] {
                graph.add_node(id);
            }
            graph.add_edge(Edge::weighted("p", "q", 2)).unwrap();
            graph.add_edge(Edge::weighted("q", "r", 3)).unwrap();
            graph.add_edge(Edge::weighted("p", "r", 10)).unwrap();
            graph.add_edge(Edge::weighted("r", "s", 1)).unwrap();
            graph
        };

        let mut graph = triangle();
        assert_eq!(graph.contract_preserving(&["r"]), 1);
        assert_eq!(graph.weight(&"p", &"r"), Some(5));
        assert_eq!(graph.weight(&"r", &"p"), Some(5));
        assert_eq!(graph.degree(&"p"), Some(1));

        let mut graph = triangle();
        assert_eq!(graph.contract(), 2);
        assert!(!graph.contains_node(&"q"));
        assert!(!graph.contains_node(&"r"));
        assert_eq!(graph.weight(&"p", &"s"), Some(6));
    }

    #[test]
    fn test_contract_saturates_weights() {
        let mut graph = path_graph();
        graph.add_edge(Edge::weighted("a", "b", u64::MAX / 2 + 1)).unwrap();
        graph.add_edge(Edge::weighted("b", "c", u64::MAX / 2 + 1)).unwrap();
        assert_eq!(graph.contract(), 2);
        assert_eq!(graph.weight(&"a", &"d"), Some(u64::MAX));
    }

    #[test]
    fn test_contract_preserving_keeps_endpoints() {
        let mut graph = path_graph();
        assert_eq!(graph.contract_preserving(&["b"]), 1);
        assert!(graph.contains_node(&"b"));
        assert!(!graph.contains_node(&"c"));
        assert_eq!(graph.weight(&"b", &"d"), Some(7));
        assert_eq!(graph.weight(&"a", &"b"), Some(2));
    }

    #[test]
    fn test_from_grid() {
        let grid = Grid::<char>::parse_chars("#.#\n...\n#.#").unwrap();
        let mut graph = WeightedGraph::from_grid(&grid, |_, v| *v != '#');
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.degree(&Cell::new(1, 1)), Some(4));
        assert_eq!(graph.degree(&Cell::new(0, 1)), Some(1));
        assert_eq!(graph.weight(&Cell::new(1, 0), &Cell::new(1, 1)), Some(1));
        // a plus shape has no pass-through cells
        assert_eq!(graph.contract(), 0);
    }
}
