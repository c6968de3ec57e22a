//! Exhaustive simple-path search over a weighted graph.
//!
//! Enumeration is exponential in the number of branch points, so callers
//! normally [`contract`](crate::graph::WeightedGraph::contract) the graph
//! first to shrink corridors into single weighted hops.

use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

use crate::graph::WeightedGraph;

/// A partial path in the depth-first search
#[derive(Debug, Clone)]
struct SearchFrame<N> {
    current: N,
    path: Vec<N>,
}

/// Every simple path from `start` to `end`, each listed start to end inclusive.
///
/// Paths stop as soon as they reach `end`. Returns nothing when either
/// endpoint is missing.
pub fn simple_paths<N>(graph: &WeightedGraph<N>, start: &N, end: &N) -> Vec<Vec<N>>
where
    N: Clone + Eq + Hash + Debug,
{
    let mut results = Vec::new();
    if !graph.contains_node(start) || !graph.contains_node(end) {
        return results;
    }

    // Depth-first with a stack of owned partial paths
    let mut stack = vec![SearchFrame {
        current: start.clone(),
        path: Vec::new(),
    }];
    while let Some(SearchFrame { current, mut path }) = stack.pop() {
        path.push(current.clone());
        if &current == end {
            results.push(path);
            continue;
        }

        let Some(edges) = graph.node_edges(&current) else {
            continue;
        };
        for edge in edges {
            if path.contains(&edge.dest) {
                continue;
            }
            stack.push(SearchFrame {
                current: edge.dest,
                path: path.clone(),
            });
        }
    }

    debug!(paths = results.len(), "simple path enumeration");
    results
}

/// Sum of edge weights along `path`, or `None` if some hop is not an edge.
///
/// The sum saturates at `u64::MAX`.
pub fn path_weight<N>(graph: &WeightedGraph<N>, path: &[N]) -> Option<u64>
where
    N: Clone + Eq + Hash + Debug,
{
    path.windows(2).try_fold(0u64, |total, hop| {
        let weight = graph.weight(&hop[0], &hop[1])?;
        Some(total.saturating_add(weight))
    })
}

/// The heaviest simple path from `start` to `end` and its weight
pub fn longest_path<N>(graph: &WeightedGraph<N>, start: &N, end: &N) -> Option<(u64, Vec<N>)>
where
    N: Clone + Eq + Hash + Debug,
{
    let mut best: Option<(u64, Vec<N>)> = None;
    for path in simple_paths(graph, start, end) {
        let Some(weight) = path_weight(graph, &path) else {
            continue;
        };
        if best.as_ref().map_or(true, |(w, _)| weight > *w) {
            best = Some((weight, path));
        }
    }
    best
}
