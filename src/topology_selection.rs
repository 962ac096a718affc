//! The loaded topology files of a brain set, and the choice of one representative file per topology type.
//!
//! Every topology type gets a slot. A slot holds the first loaded file of its own type. Types without
//! any loaded file borrow the selection of another type, following a fixed fallback chain, so that a
//! slot is only empty when no topology file is loaded at all.

use std::sync::Arc;

use crate::caret_topo::{TopologyFile, TopologyType};


/// The fallback chain for each slot, tried in order when no file of the slot's own type is loaded.
pub fn fallback_chain(slot: TopologyType) -> [TopologyType; 4] {
    use TopologyType::*;
    match slot {
        Closed => [Open, Cut, LobarCut, Unknown],
        Open => [Closed, Cut, LobarCut, Unknown],
        Cut => [LobarCut, Open, Closed, Unknown],
        LobarCut => [Cut, Open, Closed, Unknown],
        Unknown => [Closed, Open, Cut, LobarCut],
    }
}


/// Order in which topology types are preferred when a single topology must be picked, e.g. for node classification.
pub const AUTO_SELECTION_PRIORITY: [TopologyType; 5] = [
    TopologyType::Cut,
    TopologyType::LobarCut,
    TopologyType::Open,
    TopologyType::Closed,
    TopologyType::Unknown,
];


/// One selected topology per type.
#[derive(Debug, Clone, Default)]
pub struct SelectedTopologies {
    pub closed: Option<Arc<TopologyFile>>,
    pub open: Option<Arc<TopologyFile>>,
    pub cut: Option<Arc<TopologyFile>>,
    pub lobar_cut: Option<Arc<TopologyFile>>,
    pub unknown: Option<Arc<TopologyFile>>,
}

impl SelectedTopologies {

    pub fn get(&self, topology_type: TopologyType) -> Option<&Arc<TopologyFile>> {
        self.slot(topology_type).as_ref()
    }

    fn slot(&self, topology_type: TopologyType) -> &Option<Arc<TopologyFile>> {
        match topology_type {
            TopologyType::Closed => &self.closed,
            TopologyType::Open => &self.open,
            TopologyType::Cut => &self.cut,
            TopologyType::LobarCut => &self.lobar_cut,
            TopologyType::Unknown => &self.unknown,
        }
    }

    fn slot_mut(&mut self, topology_type: TopologyType) -> &mut Option<Arc<TopologyFile>> {
        match topology_type {
            TopologyType::Closed => &mut self.closed,
            TopologyType::Open => &mut self.open,
            TopologyType::Cut => &mut self.cut,
            TopologyType::LobarCut => &mut self.lobar_cut,
            TopologyType::Unknown => &mut self.unknown,
        }
    }

    pub fn is_empty(&self) -> bool {
        TopologyType::ALL.iter().all(|t| self.get(*t).is_none())
    }
}


/// Resolve the five slots for the given files, which must be in load order.
pub fn select_topology_files(files: &[Arc<TopologyFile>]) -> SelectedTopologies {
    let mut primary = SelectedTopologies::default();
    for t in TopologyType::ALL.iter() {
        *primary.slot_mut(*t) = files.iter().find(|f| f.topology_type == *t).cloned();
    }

    let mut selected = primary.clone();
    for t in TopologyType::ALL.iter() {
        if selected.get(*t).is_none() {
            *selected.slot_mut(*t) = fallback_chain(*t)
                .iter()
                .find_map(|other| primary.get(*other).cloned());
        }
    }
    selected
}


/// The topology files owned by a brain set, in load order, with their current slot selection.
#[derive(Debug, Clone, Default)]
pub struct TopologyCollection {
    files: Vec<Arc<TopologyFile>>,
    selected: SelectedTopologies,
}

impl TopologyCollection {

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[Arc<TopologyFile>] {
        &self.files
    }

    pub fn selected(&self) -> &SelectedTopologies {
        &self.selected
    }

    pub fn get_selected(&self, topology_type: TopologyType) -> Option<Arc<TopologyFile>> {
        self.selected.get(topology_type).cloned()
    }

    /// The topology to use when the caller does not name one, see [`AUTO_SELECTION_PRIORITY`].
    pub fn auto_selected(&self) -> Option<Arc<TopologyFile>> {
        AUTO_SELECTION_PRIORITY.iter().find_map(|t| self.get_selected(*t))
    }

    /// Add a file and update the selection. Returns the shared handle of the added file.
    pub fn add(&mut self, topology: TopologyFile) -> Arc<TopologyFile> {
        let topology = Arc::new(topology);
        self.files.push(Arc::clone(&topology));
        self.set_selected_topology_files();
        topology
    }

    /// Remove a file by identity. Returns whether it was part of the collection.
    pub fn remove(&mut self, topology: &Arc<TopologyFile>) -> bool {
        let before = self.files.len();
        self.files.retain(|f| !Arc::ptr_eq(f, topology));
        let removed = self.files.len() != before;
        if removed {
            self.set_selected_topology_files();
        }
        removed
    }

    pub fn contains(&self, topology: &Arc<TopologyFile>) -> bool {
        self.files.iter().any(|f| Arc::ptr_eq(f, topology))
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.selected = SelectedTopologies::default();
    }

    pub fn set_selected_topology_files(&mut self) {
        self.selected = select_topology_files(&self.files);
    }
}
