//! Connectivity tables derived from a topology: edges with their incident tiles, and node neighbors.

use std::collections::{BTreeMap, VecDeque};

use crate::caret_topo::TopologyFile;


/// An undirected mesh edge. The node with the smaller index comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyEdge {
    pub nodes: [usize; 2],
    /// Indices of the tiles using this edge. Exactly one for edges on a boundary of the mesh.
    pub tiles: Vec<usize>,
}

impl TopologyEdge {
    pub fn is_boundary(&self) -> bool {
        self.tiles.len() == 1
    }
}


/// Edge and neighbor information for all nodes of a topology.
#[derive(Debug, Clone, Default)]
pub struct TopologyHelper {
    edges: BTreeMap<(usize, usize), Vec<usize>>,
    neighbors: Vec<Vec<usize>>,
}

impl TopologyHelper {

    /// Build the tables for a topology. The helper covers at least `num_nodes` nodes, nodes not used by any tile have no neighbors.
    pub fn new(topology: &TopologyFile, num_nodes: usize) -> TopologyHelper {
        let num_nodes = num_nodes.max(topology.num_nodes);
        let mut edges: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];

        for (tile_index, tile) in topology.tiles.iter().enumerate() {
            for k in 0..3 {
                let a = tile[k];
                let b = tile[(k + 1) % 3];
                let key = if a < b { (a, b) } else { (b, a) };
                edges.entry(key).or_insert_with(Vec::new).push(tile_index);
                neighbors[a].push(b);
                neighbors[b].push(a);
            }
        }

        for n in &mut neighbors {
            n.sort_unstable();
            n.dedup();
        }

        TopologyHelper { edges, neighbors }
    }

    pub fn num_nodes(&self) -> usize {
        self.neighbors.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// The sorted neighbors of a node. Empty for nodes outside the topology.
    pub fn node_neighbors(&self, node: usize) -> &[usize] {
        self.neighbors.get(node).map(|n| n.as_slice()).unwrap_or(&[])
    }

    pub fn node_number_of_neighbors(&self, node: usize) -> usize {
        self.node_neighbors(node).len()
    }

    pub fn node_has_neighbors(&self, node: usize) -> bool {
        self.node_number_of_neighbors(node) > 0
    }

    /// The tiles using the edge between two nodes, if that edge exists.
    pub fn edge_tiles(&self, a: usize, b: usize) -> Option<&[usize]> {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edges.get(&key).map(|t| t.as_slice())
    }

    pub fn edges(&self) -> impl Iterator<Item = TopologyEdge> + '_ {
        self.edges.iter().map(|(&(a, b), tiles)| TopologyEdge { nodes: [a, b], tiles: tiles.clone() })
    }

    /// Node pairs of all edges used by exactly one tile.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges.iter()
            .filter(|(_, tiles)| tiles.len() == 1)
            .map(|(&key, _)| key)
    }

    /// For each node, the number of boundary edges it is an endpoint of.
    pub fn number_of_boundary_edges_for_all_nodes(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_nodes()];
        for (a, b) in self.boundary_edges() {
            counts[a] += 1;
            counts[b] += 1;
        }
        counts
    }

    /// All nodes reachable from `node` over at most `depth` edges, excluding `node` itself, in breadth-first order.
    pub fn node_neighbors_to_depth(&self, node: usize, depth: usize) -> Vec<usize> {
        let mut visited = vec![false; self.num_nodes()];
        let mut result = Vec::new();
        if node >= self.num_nodes() {
            return result;
        }
        visited[node] = true;
        let mut queue = VecDeque::new();
        queue.push_back((node, 0));
        while let Some((current, d)) = queue.pop_front() {
            if d == depth {
                continue;
            }
            for &n in self.node_neighbors(current) {
                if !visited[n] {
                    visited[n] = true;
                    result.push(n);
                    queue.push_back((n, d + 1));
                }
            }
        }
        result
    }
}
