//! Classification of surface nodes as interior, edge or corner nodes, based on mesh connectivity.

use crate::caret_topo::TopologyFile;
use crate::topology_helper::TopologyHelper;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClassification {
    /// A node surrounded by tiles.
    Interior,
    /// A node on a boundary edge of the mesh, i.e., an edge used by exactly one tile.
    Edge,
    /// A node with exactly two neighbors.
    Corner,
}

impl Default for NodeClassification {
    fn default() -> NodeClassification {
        NodeClassification::Interior
    }
}


/// Classify the nodes of a topology.
///
/// The result has one entry per node, for at least `num_nodes` nodes. Nodes start out as interior nodes.
/// Both endpoints of every boundary edge become edge nodes. Finally every node with exactly two neighbors
/// becomes a corner node, even if it was an edge node before.
pub fn classify_nodes(topology: &TopologyFile, num_nodes: usize) -> Vec<NodeClassification> {
    let helper = TopologyHelper::new(topology, num_nodes);
    classify_with_helper(&helper)
}


/// Like [`classify_nodes`], for callers that already built the connectivity tables.
pub fn classify_with_helper(helper: &TopologyHelper) -> Vec<NodeClassification> {
    let mut classes = vec![NodeClassification::Interior; helper.num_nodes()];

    for (a, b) in helper.boundary_edges() {
        classes[a] = NodeClassification::Edge;
        classes[b] = NodeClassification::Edge;
    }

    for (node, class) in classes.iter_mut().enumerate() {
        if helper.node_number_of_neighbors(node) == 2 {
            *class = NodeClassification::Corner;
        }
    }

    classes
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::caret_topo::TopologyType;

    /// Node 0 in the center of a fan of 4 triangles over the nodes 1..=4, closed all around.
    fn fan() -> TopologyFile {
        TopologyFile::new(TopologyType::Open, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]])
    }

    #[test]
    fn the_center_of_a_closed_fan_is_interior() {
        let classes = classify_nodes(&fan(), 0);
        assert_eq!(NodeClassification::Interior, classes[0]);
        for node in 1..=4 {
            assert_eq!(NodeClassification::Edge, classes[node]);
        }
    }

    #[test]
    fn nodes_with_two_neighbors_are_corners() {
        let square = TopologyFile::new(TopologyType::Cut, vec![[0, 1, 2], [1, 3, 2]]);
        let classes = classify_nodes(&square, 0);
        assert_eq!(NodeClassification::Corner, classes[0]);
        assert_eq!(NodeClassification::Edge, classes[1]);
        assert_eq!(NodeClassification::Edge, classes[2]);
        assert_eq!(NodeClassification::Corner, classes[3]);
    }

    #[test]
    fn a_closed_mesh_has_only_interior_nodes() {
        let tetrahedron = TopologyFile::new(TopologyType::Closed, vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]]);
        let classes = classify_nodes(&tetrahedron, 0);
        assert!(classes.iter().all(|c| *c == NodeClassification::Interior));
    }

    #[test]
    fn every_requested_node_is_classified() {
        let classes = classify_nodes(&fan(), 10);
        assert_eq!(10, classes.len());
        assert_eq!(NodeClassification::Interior, classes[9]);
    }
}
