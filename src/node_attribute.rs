//! Transient per-node state kept by a brain set.

use crate::node_classification::NodeClassification;


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrainSetNodeAttribute {
    /// Scratch flag for graph searches.
    pub visited: bool,
    pub classification: NodeClassification,
    pub highlighted: bool,
    pub displayed: bool,
}

impl Default for BrainSetNodeAttribute {
    fn default() -> BrainSetNodeAttribute {
        BrainSetNodeAttribute {
            visited: false,
            classification: NodeClassification::Interior,
            highlighted: false,
            displayed: true,
        }
    }
}

impl BrainSetNodeAttribute {
    pub fn reset(&mut self) {
        *self = BrainSetNodeAttribute::default();
    }
}


/// Resize the attributes to `num_nodes`, keeping the state of existing nodes. New nodes get the defaults.
pub fn resize_node_attributes(attributes: &mut Vec<BrainSetNodeAttribute>, num_nodes: usize) {
    attributes.resize(num_nodes, BrainSetNodeAttribute::default());
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resizing_keeps_existing_nodes() {
        let mut attrs = vec![BrainSetNodeAttribute::default(); 2];
        attrs[1].highlighted = true;
        resize_node_attributes(&mut attrs, 4);
        assert_eq!(4, attrs.len());
        assert!(attrs[1].highlighted);
        assert!(attrs[3].displayed);

        attrs[1].reset();
        assert!(!attrs[1].highlighted);
    }
}
