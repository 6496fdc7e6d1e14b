// Graph generators: chain, grid, fully connected.
//
// Every generator yields a graph satisfying the connectivity invariant the
// orchestrator checks before a run.

use log::info;
use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::random::RandomSource;

/// Shape of the graph a sweep ran on, recorded in the sweep metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    /// Hand-built graph, passed in by the caller
    Custom,
    Chain,
    Grid,
    FullyConnected,
}

/// Generate a chain graph (a linked list of nodes).
///
/// With `directed` and `doubly_linked`, every inner node gets a second edge
/// back to its predecessor. For undirected graphs `doubly_linked` is
/// meaningless and ignored. `loop_back` adds an edge from the last node back
/// to the first, which removes the structural dead end of a plain directed
/// chain.
pub fn chain(n: usize, directed: bool, doubly_linked: bool, loop_back: bool) -> Graph {
    let mut g = Graph::new();
    g.add_nodes(n);

    for i in 1..n {
        g.add_edge(i - 1, i, directed);

        if directed && doubly_linked {
            g.add_edge(i, i - 1, true);
        }
    }

    if loop_back && n > 1 {
        g.add_edge(n - 1, 0, directed);
    }

    info!(
        "chain graph generated: {} nodes, {} edges",
        g.node_count(),
        g.edge_count()
    );
    g
}

/// Generate a `side` x `side` grid graph, row-major node order, with edges to
/// the right and down neighbors. `cross_edges` adds a diagonal edge across
/// each grid cell.
pub fn grid(side: usize, directed: bool, cross_edges: bool) -> Graph {
    let mut g = Graph::new();
    g.add_nodes(side * side);

    let at = |row: usize, col: usize| row * side + col;

    for row in 0..side {
        for col in 0..side {
            if col + 1 < side {
                g.add_edge(at(row, col), at(row, col + 1), directed);
            }
            if row + 1 < side {
                g.add_edge(at(row, col), at(row + 1, col), directed);
            }
            if cross_edges && col + 1 < side && row + 1 < side {
                g.add_edge(at(row, col), at(row + 1, col + 1), directed);
            }
        }
    }

    info!(
        "grid graph generated: {} nodes, {} edges",
        g.node_count(),
        g.edge_count()
    );
    g
}

/// Generate a fully connected graph over `n` nodes.
///
/// Directed graphs get edges in both directions for every pair, unless
/// `randomly_directed` is set, in which case each pair gets a single edge
/// whose direction is a coin flip.
pub fn fully_connected(
    n: usize,
    directed: bool,
    randomly_directed: bool,
    rs: &mut RandomSource,
) -> Graph {
    let mut g = Graph::new();
    g.add_nodes(n);

    for i in 0..n {
        for j in (i + 1)..n {
            if !directed {
                g.add_edge(i, j, false);
            } else if randomly_directed {
                if rs.next_inclusive(1) == 0 {
                    g.add_edge(i, j, true);
                } else {
                    g.add_edge(j, i, true);
                }
            } else {
                g.add_edge(i, j, true);
                g.add_edge(j, i, true);
            }
        }
    }

    info!(
        "fully connected graph generated: {} nodes, {} edges",
        g.node_count(),
        g.edge_count()
    );
    g
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_shape() {
        let g = chain(5, false, false, false);
        assert_eq!(g.node_count(), 5);
        assert_eq!(g.edge_count(), 4);
        assert!(g.is_connected());
        assert!(!g.has_dead_end());
    }

    #[test]
    fn test_directed_chain_has_dead_end_at_tail() {
        let g = chain(4, true, false, false);
        assert!(g.is_connected());
        assert!(g.has_dead_end());
        assert_eq!(g.node(3).unwrap().out_degree(), 0);
    }

    #[test]
    fn test_doubly_linked_chain_has_no_dead_end() {
        let g = chain(4, true, true, false);
        assert_eq!(g.edge_count(), 6);
        assert!(!g.has_dead_end());
    }

    #[test]
    fn test_loop_back_removes_dead_end() {
        let g = chain(4, true, false, true);
        assert_eq!(g.edge_count(), 4);
        assert!(!g.has_dead_end());
    }

    #[test]
    fn test_grid_shape() {
        let g = grid(3, false, false);
        assert_eq!(g.node_count(), 9);
        assert_eq!(g.edge_count(), 12);
        assert!(g.is_connected());
    }

    #[test]
    fn test_grid_cross_edges() {
        let g = grid(3, false, true);
        assert_eq!(g.edge_count(), 12 + 4);
        assert!(g.is_connected());
    }

    #[test]
    fn test_fully_connected_undirected() {
        let mut rs = RandomSource::from_seed([1u8; 32]);
        let g = fully_connected(4, false, false, &mut rs);
        assert_eq!(g.edge_count(), 6);
        assert!(g.is_connected());
        assert!(!g.has_dead_end());
    }

    #[test]
    fn test_fully_connected_directed_both_ways() {
        let mut rs = RandomSource::from_seed([1u8; 32]);
        let g = fully_connected(4, true, false, &mut rs);
        assert_eq!(g.edge_count(), 12);
        assert!(g.is_directed());
        assert!(!g.has_dead_end());
    }

    #[test]
    fn test_fully_connected_randomly_directed() {
        let mut rs = RandomSource::from_seed([1u8; 32]);
        let g = fully_connected(5, true, true, &mut rs);
        assert_eq!(g.edge_count(), 10);
        assert!(g.is_directed());
        assert!(g.is_connected());
    }
}
