//! The brain set: all data files of one brain structure, loaded together from a spec file.
//!
//! A brain set keeps a single node count for all its surfaces and per-node data. The first surface that is
//! loaded defines it. Later surfaces and per-node files with a different number of nodes are rejected, and
//! topologies may not address more nodes than the surfaces have.
//!
//! Every kind of data lives behind its own lock, so that the files of a spec file can be read by several
//! threads at once. All methods take `&self`.

use parking_lot::{MappedRwLockReadGuard, Mutex, MutexGuard, RwLock, RwLockReadGuard};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::brain_model::{BrainModel, BrainModelSurface, BrainModelVolume, VolumeType};
use crate::caret_coord::{CoordinateFile, SurfaceType};
use crate::caret_header::FileEncoding;
use crate::caret_nodedata::{NodeAttributeKind, NodeDataFile};
use crate::caret_scene::{Scene, SceneClass, SceneFile};
use crate::caret_spec::{SpecEntry, SpecFile, SpecFileKind, SCENE_FILE_TAG, SPEC_FILE_SCENE_CLASS, SPEC_TAGS};
use crate::caret_topo::{TopologyFile, TopologyType};
use crate::context::CaretContext;
use crate::display_settings::DisplaySettings;
use crate::error::{BrainSetError, Result};
use crate::events::{BrainSetEvent, BrainSetObserver};
use crate::fs_annot::FsAnnot;
use crate::fs_curv::read_curv;
use crate::fs_mgh::FsMgh;
use crate::fs_surface::FsSurface;
use crate::node_attribute::{resize_node_attributes, BrainSetNodeAttribute};
use crate::node_classification::{classify_nodes, NodeClassification};
use crate::topology_selection::TopologyCollection;
use crate::traits::NodeValue;
use crate::util::basename;

/// Name of the scene class with the subject, species and structure of a brain set.
pub const BRAIN_SET_SCENE_CLASS: &str = "BrainSet";


/// Where a brain set is in loading its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Empty,
    Loading,
    Loaded,
    /// A spec file load was cancelled. The files read before cancelling stay loaded.
    PartiallyLoaded,
}


/// Whether reading a spec file replaces the current data or adds to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFileReadMode {
    Replace,
    Append,
}


/// A file of a spec file that could not be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub file_name: String,
    pub message: String,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.file_name, self.message)
    }
}


/// The outcome of reading a spec file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecFileLoadReport {
    pub files_loaded: usize,
    pub failures: Vec<LoadFailure>,
    pub cancelled: bool,
}

impl SpecFileLoadReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// All failures, one per line. Empty if nothing failed.
    pub fn error_message(&self) -> String {
        self.failures.iter().map(|f| f.to_string()).collect::<Vec<String>>().join("\n")
    }
}


/// Called before each file of a spec file is read, with the number of files done, the total number
/// of files, and the name of the next file. Return `false` to cancel loading.
pub type LoadProgress = dyn Fn(usize, usize, &str) -> bool + Sync;


/// A file that is listed in a spec file but not parsed by a brain set.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliaryFile {
    pub tag: String,
    pub path: PathBuf,
}


/// A per-node data file together with its display settings.
#[derive(Debug, Clone)]
pub struct NodeDataSlot<T> {
    pub file: NodeDataFile<T>,
    pub display: DisplaySettings,
}

impl<T: NodeValue> NodeDataSlot<T> {
    fn new(kind: NodeAttributeKind) -> NodeDataSlot<T> {
        NodeDataSlot { file: NodeDataFile::new(kind), display: DisplaySettings::new(kind) }
    }

    fn clear(&mut self) {
        self.file.clear();
        self.display.reset();
    }
}


#[derive(Debug, Clone, Default, PartialEq)]
struct Identity {
    subject: Option<String>,
    species: Option<String>,
    structure: Option<String>,
}


struct LoadTracker<'a> {
    total: usize,
    done: AtomicUsize,
    loaded: AtomicUsize,
    cancelled: AtomicBool,
    failures: Mutex<Vec<LoadFailure>>,
    progress: Option<&'a LoadProgress>,
}

impl<'a> LoadTracker<'a> {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Report progress for the next file. Returns false if loading should stop.
    fn next_file(&self, name: &str) -> bool {
        if self.is_cancelled() {
            return false;
        }
        if let Some(progress) = self.progress {
            if !progress(self.done.load(Ordering::SeqCst), self.total, name) {
                info!("Loading of spec file cancelled before {}", name);
                self.cancelled.store(true, Ordering::SeqCst);
                return false;
            }
        }
        true
    }

    /// Record a file that was read but dropped later, such as a topology larger than the first surface.
    fn rejected(&self, name: String, error: BrainSetError) {
        let _ = self.loaded.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        warn!("Rejected {}: {}", name, error);
        self.failures.lock().push(LoadFailure { file_name: name, message: error.to_string() });
    }

    fn finished(&self, name: &str, result: Result<()>) {
        self.done.fetch_add(1, Ordering::SeqCst);
        match result {
            Ok(()) => {
                self.loaded.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                warn!("Failed to load {}: {}", name, e);
                self.failures.lock().push(LoadFailure { file_name: name.to_string(), message: e.to_string() });
            }
        }
    }
}


pub struct BrainSet {
    context: Arc<CaretContext>,
    /// The node count shared by all surfaces and per-node files. Zero until the first surface is loaded.
    num_nodes: AtomicUsize,
    topologies: RwLock<TopologyCollection>,
    models: RwLock<Vec<BrainModel>>,
    node_attributes: RwLock<Vec<BrainSetNodeAttribute>>,
    scalar_files: HashMap<NodeAttributeKind, RwLock<NodeDataSlot<f32>>>,
    label_files: HashMap<NodeAttributeKind, RwLock<NodeDataSlot<i32>>>,
    /// The files that are actually loaded, kept in spec file form.
    loaded_spec: Mutex<SpecFile>,
    scene_file: Mutex<SceneFile>,
    auxiliary_files: Mutex<Vec<AuxiliaryFile>>,
    identity: RwLock<Identity>,
    observers: RwLock<Vec<BrainSetObserver>>,
    load_state: Mutex<LoadState>,
    reading_spec_file: AtomicBool,
    nodes_classified: AtomicBool,
}

impl fmt::Debug for BrainSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BrainSet")
            .field("num_nodes", &self.number_of_nodes())
            .field("topologies", &self.topologies.read().len())
            .field("models", &self.models.read().len())
            .field("load_state", &self.load_state())
            .finish()
    }
}

impl Default for BrainSet {
    fn default() -> BrainSet {
        BrainSet::new(Arc::new(CaretContext::default()))
    }
}


impl BrainSet {

    pub fn new(context: Arc<CaretContext>) -> BrainSet {
        let mut scalar_files = HashMap::new();
        let mut label_files = HashMap::new();
        for kind in NodeAttributeKind::LOAD_ORDER.iter() {
            if kind.is_label_kind() {
                label_files.insert(*kind, RwLock::new(NodeDataSlot::new(*kind)));
            } else {
                scalar_files.insert(*kind, RwLock::new(NodeDataSlot::new(*kind)));
            }
        }
        BrainSet {
            context,
            num_nodes: AtomicUsize::new(0),
            topologies: RwLock::new(TopologyCollection::default()),
            models: RwLock::new(Vec::new()),
            node_attributes: RwLock::new(Vec::new()),
            scalar_files,
            label_files,
            loaded_spec: Mutex::new(SpecFile::new()),
            scene_file: Mutex::new(SceneFile::default()),
            auxiliary_files: Mutex::new(Vec::new()),
            identity: RwLock::new(Identity::default()),
            observers: RwLock::new(Vec::new()),
            load_state: Mutex::new(LoadState::Empty),
            reading_spec_file: AtomicBool::new(false),
            nodes_classified: AtomicBool::new(false),
        }
    }

    pub fn context(&self) -> &Arc<CaretContext> {
        &self.context
    }

    pub fn number_of_nodes(&self) -> usize {
        self.num_nodes.load(Ordering::SeqCst)
    }

    pub fn load_state(&self) -> LoadState {
        *self.load_state.lock()
    }

    pub fn is_reading_spec_file(&self) -> bool {
        self.reading_spec_file.load(Ordering::SeqCst)
    }


    // Observers

    pub fn add_observer(&self, observer: BrainSetObserver) {
        self.observers.write().push(observer);
    }

    fn emit(&self, event: BrainSetEvent) {
        debug!("Brain set event: {}", event);
        for observer in self.observers.read().iter() {
            observer(&event);
        }
    }

    /// Emit an event that reports a change of loaded data. Suppressed while a spec file is read.
    fn emit_data_changed(&self, event: BrainSetEvent) {
        if !self.is_reading_spec_file() {
            self.emit(event);
        }
    }


    /// Remove all data. Observers stay registered.
    pub fn reset(&self) {
        self.topologies.write().clear();
        self.models.write().clear();
        self.node_attributes.write().clear();
        for slot in self.scalar_files.values() {
            slot.write().clear();
        }
        for slot in self.label_files.values() {
            slot.write().clear();
        }
        self.loaded_spec.lock().clear();
        *self.scene_file.lock() = SceneFile::default();
        self.auxiliary_files.lock().clear();
        *self.identity.write() = Identity::default();
        self.num_nodes.store(0, Ordering::SeqCst);
        self.nodes_classified.store(false, Ordering::SeqCst);
        *self.load_state.lock() = LoadState::Empty;
        info!("Brain set reset");
        self.emit(BrainSetEvent::BrainSetChanged);
    }


    // Topologies

    pub fn topology_files(&self) -> Vec<Arc<TopologyFile>> {
        self.topologies.read().files().to_vec()
    }

    pub fn number_of_topology_files(&self) -> usize {
        self.topologies.read().len()
    }

    /// The topology selected for a slot, possibly a fallback of another type.
    pub fn selected_topology(&self, topology_type: TopologyType) -> Option<Arc<TopologyFile>> {
        self.topologies.read().get_selected(topology_type)
    }

    /// Read a topology file. The given type replaces the type in the file's header, unless it is `Unknown`.
    pub fn read_topology_file<P: AsRef<Path>>(&self, path: P, topology_type: Option<TopologyType>, update_spec: bool) -> Result<Arc<TopologyFile>> {
        let mut topo = TopologyFile::from_file(&path)?;
        if let Some(t) = topology_type.filter(|t| *t != TopologyType::Unknown) {
            topo.set_topology_type(t);
        }
        let topo = self.add_topology_file(topo)?;
        debug!("Read {} topology {} with {} tiles", topo.topology_type, topo.filename, topo.num_tiles());
        if update_spec {
            self.add_to_loaded_spec(SpecFileKind::Topology(topo.topology_type), &topo.filename);
        }
        Ok(topo)
    }

    /// Add a topology. It is given to every surface that has none yet and would use a topology of its type.
    pub fn add_topology_file(&self, topology: TopologyFile) -> Result<Arc<TopologyFile>> {
        let num_nodes = self.number_of_nodes();
        if num_nodes > 0 && topology.num_nodes > num_nodes {
            return Err(BrainSetError::TopologyTooLarge(basename(&topology.filename), topology.num_nodes, num_nodes));
        }

        let topology = {
            let mut topologies = self.topologies.write();
            let topology = topologies.add(topology);
            let mut models = self.models.write();
            for surface in models.iter_mut().filter_map(BrainModel::as_surface_mut) {
                if surface.topology.is_none() {
                    surface.topology = topologies.get_selected(surface.surface_type().default_topology_type())
                        .filter(|t| t.num_nodes <= surface.num_nodes());
                }
            }
            topology
        };
        self.nodes_classified.store(false, Ordering::SeqCst);
        self.emit_data_changed(BrainSetEvent::BrainSetChanged);
        Ok(topology)
    }

    /// Remove the topologies with more nodes than the brain set. They can only exist if they were loaded
    /// before the first surface set the node count.
    fn remove_oversized_topologies(&self) -> Vec<(String, BrainSetError)> {
        let num_nodes = self.number_of_nodes();
        if num_nodes == 0 {
            return Vec::new();
        }
        let oversized: Vec<Arc<TopologyFile>> = self.topologies.read()
            .files()
            .iter()
            .filter(|t| t.num_nodes > num_nodes)
            .cloned()
            .collect();
        oversized.into_iter()
            .filter(|t| self.remove_topology(t))
            .map(|t| {
                let name = basename(&t.filename);
                let error = BrainSetError::TopologyTooLarge(name.clone(), t.num_nodes, num_nodes);
                (name, error)
            })
            .collect()
    }

    /// Delete a topology. Surfaces that used it switch to the topology now selected for their type.
    /// Returns false if the topology is not part of this brain set.
    pub fn delete_topology_file(&self, topology: &Arc<TopologyFile>) -> bool {
        let removed = self.remove_topology(topology);
        if removed {
            self.emit(BrainSetEvent::BrainSetChanged);
        }
        removed
    }

    fn remove_topology(&self, topology: &Arc<TopologyFile>) -> bool {
        {
            let mut topologies = self.topologies.write();
            if !topologies.remove(topology) {
                return false;
            }
            let mut models = self.models.write();
            for surface in models.iter_mut().filter_map(BrainModel::as_surface_mut) {
                if surface.uses_topology(topology) {
                    surface.topology = topologies.get_selected(surface.surface_type().default_topology_type())
                        .filter(|t| t.num_nodes <= surface.num_nodes());
                }
            }
        }
        if !topology.filename.is_empty() {
            self.loaded_spec.lock().remove_file(&topology.filename);
        }
        info!("Deleted topology {}", basename(&topology.filename));
        self.nodes_classified.store(false, Ordering::SeqCst);
        true
    }

    /// Write the topology selected for a slot.
    pub fn write_topology_file<P: AsRef<Path>>(&self, topology_type: TopologyType, path: P, encoding: FileEncoding) -> Result<()> {
        let topo = self.selected_topology(topology_type)
            .ok_or_else(|| BrainSetError::MissingData(format!("{} topology", topology_type)))?;
        topo.to_file(&path, encoding)?;
        self.add_to_loaded_spec(SpecFileKind::Topology(topo.topology_type), &path.as_ref().to_string_lossy());
        Ok(())
    }


    // Brain models

    pub fn number_of_brain_models(&self) -> usize {
        self.models.read().len()
    }

    pub fn brain_models(&self) -> RwLockReadGuard<'_, Vec<BrainModel>> {
        self.models.read()
    }

    /// The first surface of the given type.
    pub fn surface_of_type(&self, surface_type: SurfaceType) -> Option<BrainModelSurface> {
        self.models.read()
            .iter()
            .filter_map(BrainModel::surface)
            .find(|s| s.surface_type() == surface_type)
            .cloned()
    }

    /// Read a coordinate file as a new surface. The given type replaces the type in the file's header,
    /// unless it is `Unknown`.
    pub fn read_coordinate_file<P: AsRef<Path>>(&self, path: P, surface_type: Option<SurfaceType>, update_spec: bool) -> Result<()> {
        let mut coords = CoordinateFile::from_file(&path)?;
        if let Some(t) = surface_type.filter(|t| *t != SurfaceType::Unknown) {
            coords.set_surface_type(t);
        }
        let surface_type = coords.surface_type();
        let filename = coords.filename.clone();
        self.add_coordinate_file(coords, None)?;
        debug!("Read {} coordinates {}", surface_type, filename);
        if update_spec {
            self.add_to_loaded_spec(SpecFileKind::Coordinate(surface_type), &filename);
        }
        Ok(())
    }

    /// Add a surface. The first surface sets the node count of the brain set; later ones must match it.
    /// Without an explicit topology, the one selected for the surface's type is used.
    pub fn add_coordinate_file(&self, coords: CoordinateFile, topology: Option<Arc<TopologyFile>>) -> Result<()> {
        let n = coords.num_nodes();
        match self.num_nodes.compare_exchange(0, n, Ordering::SeqCst, Ordering::SeqCst) {
            Err(current) if current != n => {
                return Err(BrainSetError::NodeCountMismatch(basename(&coords.filename), current, n));
            }
            Ok(_) if !self.reading_spec_file.load(Ordering::SeqCst) => {
                for (_, e) in self.remove_oversized_topologies() {
                    warn!("Removed topology: {}", e);
                }
            }
            _ => {}
        }
        {
            let mut attrs = self.node_attributes.write();
            if attrs.len() != n {
                resize_node_attributes(&mut attrs, n);
            }
        }

        let topology = topology.or_else(|| {
            self.selected_topology(coords.surface_type().default_topology_type())
                .filter(|t| t.num_nodes <= n)
        });
        self.models.write().push(BrainModel::Surface(BrainModelSurface::new(coords, topology)));
        self.update_surface_and_volume_model();
        self.emit_data_changed(BrainSetEvent::BrainSetChanged);
        Ok(())
    }

    /// Delete the brain model at the given index. The node count of the brain set is kept.
    pub fn delete_brain_model(&self, index: usize) -> bool {
        let removed = {
            let mut models = self.models.write();
            if index >= models.len() {
                return false;
            }
            models.remove(index)
        };
        let filename = match &removed {
            BrainModel::Surface(s) => Some(s.filename().to_string()),
            BrainModel::Volume(v) => Some(v.filename.clone()),
            BrainModel::SurfaceAndVolume { .. } => None,
        };
        if let Some(filename) = filename.filter(|f| !f.is_empty()) {
            self.loaded_spec.lock().remove_file(&filename);
        }
        info!("Deleted {}", removed.descriptive_name());
        self.emit(BrainSetEvent::BrainSetChanged);
        true
    }

    /// Delete the first surface of the given type.
    pub fn delete_surface(&self, surface_type: SurfaceType) -> bool {
        let index = self.models.read()
            .iter()
            .position(|m| matches!(m, BrainModel::Surface(s) if s.surface_type() == surface_type));
        match index {
            Some(index) => self.delete_brain_model(index),
            None => false,
        }
    }

    /// Write the coordinates of the brain model at the given index.
    pub fn write_coordinate_file<P: AsRef<Path>>(&self, model_index: usize, path: P, encoding: FileEncoding) -> Result<()> {
        let surface_type = {
            let models = self.models.read();
            let surface = models.get(model_index)
                .and_then(BrainModel::as_surface)
                .ok_or_else(|| BrainSetError::MissingData(format!("surface with index {}", model_index)))?;
            surface.coordinates.to_file(&path, encoding, self.context.text_file_digits())?;
            surface.surface_type()
        };
        self.add_to_loaded_spec(SpecFileKind::Coordinate(surface_type), &path.as_ref().to_string_lossy());
        Ok(())
    }


    // Volumes

    /// Read an MGH or MGZ volume. Other volume formats are not supported.
    pub fn read_volume_file<P: AsRef<Path>>(&self, path: P, volume_type: VolumeType, update_spec: bool) -> Result<()> {
        let name = basename(&path);
        let lower = name.to_ascii_lowercase();
        if !(lower.ends_with(".mgh") || lower.ends_with(".mgz") || lower.ends_with(".mgh.gz")) {
            return Err(BrainSetError::UnsupportedFormat(name, String::from("only MGH and MGZ volumes are supported")));
        }
        let volume = FsMgh::from_file(&path)?;
        let filename = path.as_ref().to_string_lossy().into_owned();
        debug!("Read {} volume {} of shape {:?}", volume_type, filename, volume.data.shape());
        self.models.write().push(BrainModel::Volume(BrainModelVolume { volume_type, filename: filename.clone(), volume }));
        self.update_surface_and_volume_model();
        if update_spec {
            self.add_to_loaded_spec(SpecFileKind::Volume(volume_type), &filename);
        }
        self.emit_data_changed(BrainSetEvent::BrainSetChanged);
        Ok(())
    }

    /// Create the surface-and-volume model once a fiducial surface and an anatomy or segmentation volume are loaded.
    fn update_surface_and_volume_model(&self) {
        let mut models = self.models.write();
        if models.iter().any(BrainModel::is_surface_and_volume) {
            return;
        }
        let surface = models.iter()
            .filter_map(BrainModel::surface)
            .find(|s| s.surface_type() == SurfaceType::Fiducial)
            .cloned();
        let volume = models.iter()
            .filter_map(BrainModel::volume)
            .find(|v| matches!(v.volume_type, VolumeType::Anatomy | VolumeType::Segmentation))
            .cloned();
        if let (Some(surface), Some(volume)) = (surface, volume) {
            debug!("Creating surface and volume model");
            models.push(BrainModel::SurfaceAndVolume { surface, volume });
        }
    }


    // Per-node attribute files

    fn scalar_slot(&self, kind: NodeAttributeKind) -> Result<&RwLock<NodeDataSlot<f32>>> {
        self.scalar_files.get(&kind)
            .ok_or_else(|| BrainSetError::UnsupportedFormat(kind.to_string(), String::from("not a scalar file type")))
    }

    fn label_slot(&self, kind: NodeAttributeKind) -> Result<&RwLock<NodeDataSlot<i32>>> {
        self.label_files.get(&kind)
            .ok_or_else(|| BrainSetError::UnsupportedFormat(kind.to_string(), String::from("not a label file type")))
    }

    /// The data of a scalar kind (metric, surface shape, ...). `None` for paint-like kinds.
    pub fn scalar_node_data(&self, kind: NodeAttributeKind) -> Option<MappedRwLockReadGuard<'_, NodeDataFile<f32>>> {
        self.scalar_files.get(&kind).map(|slot| RwLockReadGuard::map(slot.read(), |s| &s.file))
    }

    /// The data of a paint-like kind. `None` for scalar kinds.
    pub fn label_node_data(&self, kind: NodeAttributeKind) -> Option<MappedRwLockReadGuard<'_, NodeDataFile<i32>>> {
        self.label_files.get(&kind).map(|slot| RwLockReadGuard::map(slot.read(), |s| &s.file))
    }

    pub fn column_names(&self, kind: NodeAttributeKind) -> Vec<String> {
        if kind.is_label_kind() {
            self.label_files.get(&kind).map(|s| s.read().file.column_names.clone()).unwrap_or_default()
        } else {
            self.scalar_files.get(&kind).map(|s| s.read().file.column_names.clone()).unwrap_or_default()
        }
    }

    pub fn display_settings(&self, kind: NodeAttributeKind) -> Option<DisplaySettings> {
        if kind.is_label_kind() {
            self.label_files.get(&kind).map(|s| s.read().display.clone())
        } else {
            self.scalar_files.get(&kind).map(|s| s.read().display.clone())
        }
    }

    /// Change the display settings of a kind. The closure gets the settings and the number of columns.
    pub fn update_display_settings<F: FnOnce(&mut DisplaySettings, usize)>(&self, kind: NodeAttributeKind, f: F) -> Result<()> {
        if kind.is_label_kind() {
            let mut slot = self.label_slot(kind)?.write();
            let n = slot.file.num_columns();
            f(&mut slot.display, n);
        } else {
            let mut slot = self.scalar_slot(kind)?.write();
            let n = slot.file.num_columns();
            f(&mut slot.display, n);
        }
        self.emit(BrainSetEvent::SurfaceOverlaysChanged);
        Ok(())
    }

    /// Select the displayed column by name.
    pub fn set_display_column_by_name(&self, kind: NodeAttributeKind, column_name: &str) -> Result<()> {
        let column = self.column_names(kind)
            .iter()
            .position(|n| n == column_name)
            .ok_or_else(|| BrainSetError::NoSuchColumn(column_name.to_string()))?;
        self.update_display_settings(kind, |ds, n| ds.set_display_column(column, n))
    }

    /// Read a per-node attribute file.
    ///
    /// The file is rejected if a surface is loaded and the file has a different number of nodes. In that case
    /// the data already loaded for the kind is left untouched. With `append`, the columns of the file are added
    /// to the loaded ones, otherwise they replace them.
    pub fn read_node_attribute_file<P: AsRef<Path>>(&self, kind: NodeAttributeKind, path: P, append: bool, update_spec: bool) -> Result<()> {
        let filename = path.as_ref().to_string_lossy().into_owned();
        if kind.is_label_kind() {
            let file = NodeDataFile::<i32>::from_file(&path, kind)?;
            self.add_node_data(self.label_slot(kind)?, file, append)?;
        } else {
            let file = NodeDataFile::<f32>::from_file(&path, kind)?;
            self.add_node_data(self.scalar_slot(kind)?, file, append)?;
        }
        debug!("Read {} file {}", kind, filename);
        if update_spec {
            self.add_to_loaded_spec(SpecFileKind::NodeAttribute(kind), &filename);
        }
        Ok(())
    }

    fn add_node_data<T: NodeValue>(&self, slot: &RwLock<NodeDataSlot<T>>, file: NodeDataFile<T>, append: bool) -> Result<()> {
        let kind = file.kind;
        {
            let mut slot = slot.write();
            let num_nodes = self.number_of_nodes();
            if num_nodes > 0 && file.num_nodes() != num_nodes {
                return Err(BrainSetError::NodeCountMismatch(basename(&file.filename), num_nodes, file.num_nodes()));
            }
            if append && !slot.file.is_empty() && slot.file.num_nodes() != file.num_nodes() {
                return Err(BrainSetError::NodeCountMismatch(basename(&file.filename), slot.file.num_nodes(), file.num_nodes()));
            }
            if append {
                slot.file.append(file)?;
            } else {
                slot.file = file;
            }
            let num_columns = slot.file.num_columns();
            slot.display.update(num_columns);
        }
        self.emit_data_changed(BrainSetEvent::NodeAttributeChanged(kind));
        Ok(())
    }

    /// Remove all data of a kind.
    pub fn clear_node_attribute_file(&self, kind: NodeAttributeKind) -> Result<()> {
        if kind.is_label_kind() {
            self.label_slot(kind)?.write().clear();
        } else {
            self.scalar_slot(kind)?.write().clear();
        }
        self.emit(BrainSetEvent::NodeAttributeChanged(kind));
        Ok(())
    }

    /// Write the data of a kind. The file name of the data is updated.
    pub fn write_node_attribute_file<P: AsRef<Path>>(&self, kind: NodeAttributeKind, path: P, encoding: FileEncoding) -> Result<()> {
        let digits = self.context.text_file_digits();
        let filename = path.as_ref().to_string_lossy().into_owned();
        if kind.is_label_kind() {
            write_slot(self.label_slot(kind)?, &path, encoding, digits)?;
        } else {
            write_slot(self.scalar_slot(kind)?, &path, encoding, digits)?;
        }
        self.add_to_loaded_spec(SpecFileKind::NodeAttribute(kind), &filename);
        Ok(())
    }


    // FreeSurfer imports

    /// Import a FreeSurfer surface: its faces become a topology and its vertices a surface using it.
    pub fn import_freesurfer_surface<P: AsRef<Path>>(&self, path: P, surface_type: SurfaceType, topology_type: TopologyType) -> Result<()> {
        let surf = FsSurface::from_file(&path)?;
        let filename = path.as_ref().to_string_lossy().into_owned();
        let num_nodes = self.number_of_nodes();
        let surf_nodes = surf.header.num_vertices as usize;
        if num_nodes > 0 && surf_nodes != num_nodes {
            return Err(BrainSetError::NodeCountMismatch(basename(&filename), num_nodes, surf_nodes));
        }
        let mut coords = surf.to_coordinate_file(surface_type)?;
        coords.filename = filename;
        let topology = self.add_topology_file(surf.to_topology_file(topology_type))?;
        self.add_coordinate_file(coords, Some(topology))?;
        info!("Imported FreeSurfer surface {} with {} vertices", basename(&path), surf_nodes);
        Ok(())
    }

    /// Import a FreeSurfer curv file as a surface shape column named after the file.
    pub fn import_freesurfer_curv<P: AsRef<Path>>(&self, path: P, append: bool) -> Result<()> {
        let curv = read_curv(&path)?;
        let mut shape = curv.to_surface_shape_file(&basename(&path))?;
        shape.filename = path.as_ref().to_string_lossy().into_owned();
        self.add_node_data(self.scalar_slot(NodeAttributeKind::SurfaceShape)?, shape, append)
    }

    /// Import a FreeSurfer parcellation as a paint column named after the file.
    pub fn import_freesurfer_annot<P: AsRef<Path>>(&self, path: P, append: bool) -> Result<()> {
        let annot = FsAnnot::from_file(&path)?;
        let mut paint = annot.to_paint_file(&basename(&path))?;
        paint.filename = path.as_ref().to_string_lossy().into_owned();
        self.add_node_data(self.label_slot(NodeAttributeKind::Paint)?, paint, append)
    }


    // Node classification

    pub fn nodes_classified(&self) -> bool {
        self.nodes_classified.load(Ordering::SeqCst)
    }

    pub fn node_attributes(&self) -> RwLockReadGuard<'_, Vec<BrainSetNodeAttribute>> {
        self.node_attributes.read()
    }

    pub fn node_classification(&self, node: usize) -> Option<NodeClassification> {
        self.node_attributes.read().get(node).map(|a| a.classification)
    }

    /// Classify all nodes as interior, edge or corner nodes, using the given topology or the automatically
    /// selected one. With `only_if_needed`, nothing is done if the nodes were classified before and no
    /// topology changed since. Returns whether the nodes were classified.
    pub fn classify_nodes(&self, topology: Option<&Arc<TopologyFile>>, only_if_needed: bool) -> bool {
        if only_if_needed && self.nodes_classified() {
            return false;
        }
        let topology = match topology.cloned().or_else(|| self.topologies.read().auto_selected()) {
            Some(t) => t,
            None => {
                debug!("No topology to classify nodes with");
                return false;
            }
        };

        let num_nodes = match self.number_of_nodes() {
            0 => topology.num_nodes,
            n => n,
        };
        let classes = classify_nodes(&topology, num_nodes);
        {
            let mut attrs = self.node_attributes.write();
            if attrs.len() < num_nodes {
                resize_node_attributes(&mut attrs, num_nodes);
            }
            for (attr, class) in attrs.iter_mut().zip(classes.iter()) {
                attr.classification = *class;
            }
        }
        self.nodes_classified.store(true, Ordering::SeqCst);
        debug!("Classified {} nodes with topology {}", num_nodes, basename(&topology.filename));
        self.emit(BrainSetEvent::DisplayListsInvalidated);
        self.emit(BrainSetEvent::SurfaceOverlaysChanged);
        true
    }


    // Scenes and auxiliary files

    pub fn scene_file(&self) -> MutexGuard<'_, SceneFile> {
        self.scene_file.lock()
    }

    /// Read a scene file. With `append`, its scenes are added to the loaded ones.
    pub fn read_scene_file<P: AsRef<Path>>(&self, path: P, append: bool, update_spec: bool) -> Result<()> {
        let scenes = SceneFile::from_file(&path)?;
        let filename = scenes.filename.clone();
        {
            let mut current = self.scene_file.lock();
            if append && !current.is_empty() {
                current.append(scenes);
            } else {
                *current = scenes;
            }
        }
        if update_spec {
            self.add_to_loaded_spec(SpecFileKind::Scene, &filename);
        }
        Ok(())
    }

    pub fn write_scene_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut scenes = self.scene_file.lock();
        scenes.to_file(&path)?;
        scenes.filename = path.as_ref().to_string_lossy().into_owned();
        Ok(())
    }

    pub fn auxiliary_files(&self) -> Vec<AuxiliaryFile> {
        self.auxiliary_files.lock().clone()
    }

    /// Register a file that is not parsed. It must exist.
    pub fn add_auxiliary_file<P: AsRef<Path>>(&self, tag: &str, path: P, update_spec: bool) -> Result<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BrainSetError::FileIo(path.display().to_string(), io::Error::new(io::ErrorKind::NotFound, "file not found")));
        }
        self.auxiliary_files.lock().push(AuxiliaryFile { tag: tag.to_string(), path: path.to_path_buf() });
        if update_spec {
            if let Err(e) = self.loaded_spec.lock().add_to_spec_file(tag, &path.to_string_lossy(), None) {
                warn!("Unable to add {} to the spec file: {}", path.display(), e);
            }
        }
        Ok(())
    }


    // Spec files

    /// The files that are loaded, as a spec file.
    pub fn loaded_spec_file(&self) -> SpecFile {
        self.loaded_spec.lock().clone()
    }

    pub fn write_spec_file<P: AsRef<Path>>(&self, path: P, only_selected: bool) -> Result<()> {
        let mut spec = self.loaded_spec.lock();
        spec.to_file(&path, only_selected)?;
        spec.filename = path.as_ref().to_string_lossy().into_owned();
        Ok(())
    }

    fn add_to_loaded_spec(&self, kind: SpecFileKind, filename: &str) {
        if filename.is_empty() {
            return;
        }
        let tag = match SPEC_TAGS.iter().find(|t| t.kind == kind) {
            Some(t) => t.tag,
            None => return,
        };
        if let Err(e) = self.loaded_spec.lock().add_to_spec_file(tag, filename, None) {
            warn!("Unable to add {} to the spec file: {}", filename, e);
        }
    }

    /// Load the selected files of a spec file.
    ///
    /// Files are read by type: topologies, coordinates, volumes, per-node attribute files, scenes, and finally
    /// all other files, which are only checked for existence. A file that fails to load does not stop the
    /// others; all failures are collected in the report. If `progress` returns false, loading stops and the
    /// brain set keeps what was loaded so far, in state [`LoadState::PartiallyLoaded`].
    ///
    /// With more than one file reading thread in the preferences, the tags of each type group are read in
    /// parallel. The groups themselves are always read one after the other.
    pub fn read_spec_file(&self, spec: &SpecFile, mode: SpecFileReadMode, progress: Option<&LoadProgress>) -> SpecFileLoadReport {
        if mode == SpecFileReadMode::Replace {
            self.reset();
        }
        *self.load_state.lock() = LoadState::Loading;
        self.reading_spec_file.store(true, Ordering::SeqCst);
        {
            let mut loaded = self.loaded_spec.lock();
            if mode == SpecFileReadMode::Replace || loaded.filename.is_empty() {
                loaded.header = spec.header.clone();
                loaded.filename = spec.filename.clone();
            }
        }

        let tracker = LoadTracker {
            total: spec.number_of_selected_files(),
            done: AtomicUsize::new(0),
            loaded: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            failures: Mutex::new(Vec::new()),
            progress,
        };
        info!("Reading {} files of spec file {}", tracker.total, spec.filename);

        let threads = self.context.file_reading_threads();
        let pool = if threads > 1 {
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!("Unable to start {} file reading threads, reading on one: {}", threads, e);
                    None
                }
            }
        } else {
            None
        };

        for (phase_name, entries) in load_phases(spec) {
            if tracker.is_cancelled() {
                break;
            }
            debug!("Spec file phase {}: {} tags", phase_name, entries.len());
            match &pool {
                Some(pool) => pool.install(|| {
                    entries.par_iter().for_each(|entry| self.load_spec_entry(spec, entry, &tracker))
                }),
                None => {
                    for entry in &entries {
                        self.load_spec_entry(spec, entry, &tracker);
                    }
                }
            }
            for (name, e) in self.remove_oversized_topologies() {
                tracker.rejected(name, e);
            }
        }

        for kind in NodeAttributeKind::LOAD_ORDER.iter() {
            let _ = self.update_display_settings_quietly(*kind);
        }
        self.reading_spec_file.store(false, Ordering::SeqCst);
        if !self.topologies.read().is_empty() {
            self.classify_nodes(None, false);
        }
        self.guess_subject_species_structure();

        let cancelled = tracker.is_cancelled();
        *self.load_state.lock() = if cancelled { LoadState::PartiallyLoaded } else { LoadState::Loaded };
        let report = SpecFileLoadReport {
            files_loaded: tracker.loaded.load(Ordering::SeqCst),
            failures: tracker.failures.into_inner(),
            cancelled,
        };
        info!("Spec file read: {} files loaded, {} failed{}", report.files_loaded, report.failures.len(),
              if cancelled { ", cancelled" } else { "" });
        self.emit(BrainSetEvent::SpecFileLoaded { cancelled });
        self.emit(BrainSetEvent::BrainSetChanged);
        report
    }

    fn update_display_settings_quietly(&self, kind: NodeAttributeKind) -> Result<()> {
        if kind.is_label_kind() {
            let mut slot = self.label_slot(kind)?.write();
            let n = slot.file.num_columns();
            slot.display.update(n);
        } else {
            let mut slot = self.scalar_slot(kind)?.write();
            let n = slot.file.num_columns();
            slot.display.update(n);
        }
        Ok(())
    }

    fn load_spec_entry(&self, spec: &SpecFile, entry: &SpecEntry, tracker: &LoadTracker) {
        if entry.kind() == SpecFileKind::Ignored {
            return;
        }
        for file in entry.selected_files() {
            if !tracker.next_file(&file.filename) {
                return;
            }
            let path = spec.resolve_path(&file.filename);
            let result = match entry.kind() {
                SpecFileKind::Topology(t) => self.read_topology_file(&path, Some(t), true).map(|_| ()),
                SpecFileKind::Coordinate(s) => self.read_coordinate_file(&path, Some(s), true),
                SpecFileKind::Volume(v) => self.read_volume_file(&path, v, true),
                SpecFileKind::NodeAttribute(k) => self.read_node_attribute_file(k, &path, true, true),
                SpecFileKind::Scene => self.read_scene_file(&path, true, true),
                SpecFileKind::Auxiliary => self.add_auxiliary_file(entry.tag(), &path, true),
                SpecFileKind::Ignored => Ok(()),
            };
            tracker.finished(&file.filename, result);
        }
    }


    // Subject, species and structure

    pub fn subject(&self) -> Option<String> {
        self.identity.read().subject.clone()
    }

    pub fn species(&self) -> Option<String> {
        self.identity.read().species.clone()
    }

    pub fn structure(&self) -> Option<String> {
        self.identity.read().structure.clone()
    }

    /// Take subject, species and structure from the loaded spec file's header. Values it does not name are
    /// guessed from the names of the coordinate and topology files, like `Human.colin.L.FIDUCIAL.coord`.
    pub fn guess_subject_species_structure(&self) {
        let mut identity = {
            let spec = self.loaded_spec.lock();
            Identity {
                subject: spec.subject().map(str::to_string),
                species: spec.species().map(str::to_string),
                structure: spec.structure().map(str::to_string),
            }
        };

        let mut names: Vec<String> = self.models.read()
            .iter()
            .filter_map(BrainModel::surface)
            .map(|s| basename(s.filename()))
            .collect();
        names.extend(self.topologies.read().files().iter().map(|t| basename(&t.filename)));

        for name in names {
            if identity.subject.is_some() && identity.species.is_some() && identity.structure.is_some() {
                break;
            }
            if let Some(guess) = identity_from_file_name(&name) {
                identity.species = identity.species.or(guess.species);
                identity.subject = identity.subject.or(guess.subject);
                identity.structure = identity.structure.or(guess.structure);
            }
        }
        *self.identity.write() = identity;
    }


    // Scenes

    /// Save the loaded files, the display settings and the identity of the brain set.
    pub fn save_scene(&self, name: &str) -> Scene {
        let mut scene = Scene::new(name);
        scene.add_class(self.loaded_spec.lock().save_scene(true));

        let mut brain = SceneClass::new(BRAIN_SET_SCENE_CLASS);
        let identity = self.identity.read().clone();
        if let Some(v) = identity.subject { brain.add("subject", v); }
        if let Some(v) = identity.species { brain.add("species", v); }
        if let Some(v) = identity.structure { brain.add("structure", v); }
        scene.add_class(brain);

        for kind in NodeAttributeKind::LOAD_ORDER.iter() {
            if let Some(ds) = self.display_settings(*kind) {
                scene.add_class(ds.save_scene(&self.column_names(*kind)));
            }
        }
        debug!("Saved scene {} with {} classes", name, scene.classes.len());
        scene
    }

    /// Show a scene. If the scene lists other files than the loaded ones, they are loaded first, replacing the
    /// current data. File names are resolved against the loaded spec file or, if there is none, the scene file.
    /// Returns the problems found, one message per problem.
    pub fn show_scene(&self, scene: &Scene) -> Vec<String> {
        let mut messages = Vec::new();

        if scene.class(SPEC_FILE_SCENE_CLASS).is_some() {
            let mut scene_spec = self.loaded_spec_file();
            if scene_spec.filename.is_empty() {
                scene_spec.filename = self.scene_file.lock().filename.clone();
            }
            let current = selected_file_set(&scene_spec);
            scene_spec.show_scene(scene);
            if selected_file_set(&scene_spec) != current {
                let report = self.read_spec_file(&scene_spec, SpecFileReadMode::Replace, None);
                messages.extend(report.failures.iter().map(|f| f.to_string()));
            }
        }

        if let Some(class) = scene.class(BRAIN_SET_SCENE_CLASS) {
            let mut identity = self.identity.write();
            if let Some(v) = class.value("subject") { identity.subject = Some(v.to_string()); }
            if let Some(v) = class.value("species") { identity.species = Some(v.to_string()); }
            if let Some(v) = class.value("structure") { identity.structure = Some(v.to_string()); }
        }

        for kind in NodeAttributeKind::LOAD_ORDER.iter() {
            let names = self.column_names(*kind);
            let result = self.update_display_settings(*kind, |ds, _| messages.extend(ds.show_scene(scene, &names)));
            if let Err(e) = result {
                messages.push(e.to_string());
            }
        }

        for m in &messages {
            warn!("Scene {}: {}", scene.name, m);
        }
        self.emit(BrainSetEvent::SceneShown(scene.name.clone()));
        messages
    }
}


/// The tags of a spec file, grouped in the order they are loaded.
fn load_phases(spec: &SpecFile) -> Vec<(&'static str, Vec<&SpecEntry>)> {
    const TOPOLOGY_ORDER: [TopologyType; 5] = [
        TopologyType::Unknown,
        TopologyType::LobarCut,
        TopologyType::Cut,
        TopologyType::Open,
        TopologyType::Closed,
    ];
    let of_kinds = move |kinds: Vec<SpecFileKind>| -> Vec<&SpecEntry> {
        kinds.into_iter()
            .flat_map(move |k| spec.entries_of_kind(k))
            .filter(|e| e.number_of_selected_files() > 0)
            .collect()
    };
    vec![
        ("topology", of_kinds(TOPOLOGY_ORDER.iter().map(|t| SpecFileKind::Topology(*t)).collect())),
        ("coordinates", of_kinds(SurfaceType::LOAD_ORDER.iter().map(|t| SpecFileKind::Coordinate(*t)).collect())),
        ("volumes", of_kinds(VolumeType::LOAD_ORDER.iter().map(|t| SpecFileKind::Volume(*t)).collect())),
        ("node attributes", of_kinds(NodeAttributeKind::LOAD_ORDER.iter().map(|k| SpecFileKind::NodeAttribute(*k)).collect())),
        ("scenes", of_kinds(vec![SpecFileKind::Scene])),
        ("other files", of_kinds(vec![SpecFileKind::Auxiliary])),
    ]
}


fn selected_file_set(spec: &SpecFile) -> BTreeSet<(String, String)> {
    spec.entries()
        .iter()
        .filter(|e| e.tag() != SCENE_FILE_TAG)
        .flat_map(|e| e.selected_files().map(move |f| (e.tag().to_string(), f.filename.clone())))
        .collect()
}


fn write_slot<T: NodeValue, P: AsRef<Path>>(slot: &RwLock<NodeDataSlot<T>>, path: P, encoding: FileEncoding, digits: usize) -> Result<()> {
    let mut slot = slot.write();
    if slot.file.is_empty() {
        return Err(BrainSetError::MissingData(format!("{} file", slot.file.kind)));
    }
    slot.file.to_file(&path, encoding, digits)?;
    slot.file.filename = path.as_ref().to_string_lossy().into_owned();
    Ok(())
}


/// Species, subject and structure from a Caret style file name like `Human.colin.L.FIDUCIAL.coord`.
fn identity_from_file_name(name: &str) -> Option<Identity> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() < 4 {
        return None;
    }
    let structure = match parts[2] {
        "L" => Some("left"),
        "R" => Some("right"),
        "LR" => Some("both"),
        _ => None,
    };
    Some(Identity {
        species: Some(parts[0].to_string()),
        subject: Some(parts[1].to_string()),
        structure: structure.map(str::to_string),
    })
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::caret_spec::read_spec;
    use ndarray::Array2;
    use std::sync::Mutex as StdMutex;
    use tempfile::{tempdir, TempDir};

    /// A strip of `n` nodes in two rows, triangulated.
    fn strip_topology(n: usize) -> TopologyFile {
        let half = n / 2;
        let mut tiles = Vec::new();
        for i in 0..half - 1 {
            tiles.push([i, i + 1, half + i]);
            tiles.push([i + 1, half + i + 1, half + i]);
        }
        TopologyFile::new(TopologyType::Open, tiles)
    }

    fn coords(n: usize, surface_type: SurfaceType, name: &str) -> CoordinateFile {
        let mut c = CoordinateFile::new(Array2::zeros((n, 3)));
        c.set_surface_type(surface_type);
        c.filename = name.to_string();
        c
    }

    fn metric(n: usize, name: &str) -> NodeDataFile<f32> {
        let mut m = NodeDataFile::new(NodeAttributeKind::Metric);
        m.add_column(name, vec![1.0; n]).unwrap();
        m.filename = format!("{}.metric", name);
        m
    }

    #[test]
    fn the_first_surface_sets_the_node_count() {
        let bs = BrainSet::default();
        bs.add_coordinate_file(coords(6, SurfaceType::Fiducial, "a.coord"), None).unwrap();
        assert_eq!(6, bs.number_of_nodes());
        assert_eq!(6, bs.node_attributes().len());

        let err = bs.add_coordinate_file(coords(5, SurfaceType::Inflated, "b.coord"), None).unwrap_err();
        assert!(err.to_string().contains("different number of nodes"));
        assert_eq!(1, bs.number_of_brain_models());
    }

    #[test]
    fn mismatched_node_data_leaves_the_loaded_data_alone() {
        let bs = BrainSet::default();
        bs.add_coordinate_file(coords(6, SurfaceType::Fiducial, "a.coord"), None).unwrap();
        let slot = bs.scalar_slot(NodeAttributeKind::Metric).unwrap();
        bs.add_node_data(slot, metric(6, "thickness"), false).unwrap();

        assert!(bs.add_node_data(slot, metric(4, "area"), false).is_err());
        assert!(bs.add_node_data(slot, metric(4, "area"), true).is_err());
        let data = bs.scalar_node_data(NodeAttributeKind::Metric).unwrap();
        assert_eq!(vec!["thickness"], data.column_names);
        assert_eq!(6, data.num_nodes());
    }

    #[test]
    fn appending_adds_columns_and_updates_display_settings() {
        let bs = BrainSet::default();
        let slot = bs.scalar_slot(NodeAttributeKind::Metric).unwrap();
        bs.add_node_data(slot, metric(6, "thickness"), true).unwrap();
        bs.add_node_data(slot, metric(6, "area"), true).unwrap();
        assert_eq!(vec!["thickness", "area"], bs.column_names(NodeAttributeKind::Metric));
        assert_eq!(Some(0), bs.display_settings(NodeAttributeKind::Metric).unwrap().display_column());

        bs.set_display_column_by_name(NodeAttributeKind::Metric, "area").unwrap();
        assert_eq!(Some(1), bs.display_settings(NodeAttributeKind::Metric).unwrap().display_column());
        assert!(bs.set_display_column_by_name(NodeAttributeKind::Metric, "depth").is_err());

        bs.add_node_data(slot, metric(6, "depth"), false).unwrap();
        assert_eq!(Some(0), bs.display_settings(NodeAttributeKind::Metric).unwrap().display_column());
    }

    #[test]
    fn topologies_are_checked_against_the_node_count() {
        let bs = BrainSet::default();
        bs.add_coordinate_file(coords(6, SurfaceType::Fiducial, "a.coord"), None).unwrap();
        assert!(bs.add_topology_file(strip_topology(8)).is_err());
        assert_eq!(0, bs.number_of_topology_files());

        let topo = bs.add_topology_file(strip_topology(6)).unwrap();
        // The fiducial surface wants a closed topology, the open one is its fallback.
        assert!(bs.surface_of_type(SurfaceType::Fiducial).unwrap().uses_topology(&topo));
        assert!(Arc::ptr_eq(&topo, &bs.selected_topology(TopologyType::Closed).unwrap()));

        assert!(bs.delete_topology_file(&topo));
        assert!(!bs.delete_topology_file(&topo));
        assert!(bs.selected_topology(TopologyType::Closed).is_none());
        assert!(bs.surface_of_type(SurfaceType::Fiducial).unwrap().topology.is_none());
    }

    #[test]
    fn classification_is_only_repeated_when_needed() {
        let bs = BrainSet::default();
        let events = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        bs.add_observer(Box::new(move |e: &BrainSetEvent| sink.lock().unwrap().push(e.clone())));

        assert!(!bs.classify_nodes(None, false));
        bs.add_coordinate_file(coords(6, SurfaceType::Fiducial, "a.coord"), None).unwrap();
        bs.add_topology_file(strip_topology(6)).unwrap();

        assert!(bs.classify_nodes(None, true));
        assert!(!bs.classify_nodes(None, true));
        assert!(bs.classify_nodes(None, false));
        assert_eq!(Some(NodeClassification::Corner), bs.node_classification(0));
        assert_eq!(Some(NodeClassification::Edge), bs.node_classification(1));

        let events = events.lock().unwrap();
        assert!(events.contains(&BrainSetEvent::DisplayListsInvalidated));
        assert!(events.contains(&BrainSetEvent::SurfaceOverlaysChanged));
    }

    #[test]
    fn surface_and_volume_models_need_a_fiducial_surface_and_an_anatomy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anat.mgh");
        std::fs::write(&path, crate::fs_mgh::test::tiny_mgh_bytes()).unwrap();

        let bs = BrainSet::default();
        bs.add_coordinate_file(coords(6, SurfaceType::Inflated, "a.coord"), None).unwrap();
        bs.read_volume_file(&path, VolumeType::Anatomy, false).unwrap();
        assert_eq!(2, bs.number_of_brain_models());

        bs.add_coordinate_file(coords(6, SurfaceType::Fiducial, "b.coord"), None).unwrap();
        assert_eq!(4, bs.number_of_brain_models());
        assert!(bs.brain_models()[3].is_surface_and_volume());

        assert!(bs.delete_surface(SurfaceType::Inflated));
        assert!(!bs.delete_surface(SurfaceType::Hull));
        assert_eq!(3, bs.number_of_brain_models());

        let err = bs.read_volume_file(dir.path().join("anat.nii"), VolumeType::Anatomy, false).unwrap_err();
        assert!(matches!(err, BrainSetError::UnsupportedFormat(_, _)));
    }

    #[test]
    fn freesurfer_files_can_be_imported() {
        let dir = tempdir().unwrap();
        let surf = dir.path().join("lh.white");
        let curv = dir.path().join("lh.thickness");
        std::fs::write(&surf, crate::fs_surface::test::tiny_surf_bytes()).unwrap();
        std::fs::write(&curv, crate::fs_curv::test::tiny_curv_bytes(&[1.0, 2.0, 3.0, 4.0])).unwrap();

        let bs = BrainSet::default();
        bs.import_freesurfer_surface(&surf, SurfaceType::Fiducial, TopologyType::Closed).unwrap();
        assert_eq!(4, bs.number_of_nodes());
        assert_eq!(1, bs.number_of_topology_files());
        assert!(bs.surface_of_type(SurfaceType::Fiducial).unwrap().topology.is_some());

        bs.import_freesurfer_curv(&curv, true).unwrap();
        assert_eq!(vec!["lh.thickness"], bs.column_names(NodeAttributeKind::SurfaceShape));

        // The annot has 3 vertices, the surface 4.
        let annot = dir.path().join("lh.aparc.annot");
        std::fs::write(&annot, crate::fs_annot::test::tiny_annot_bytes()).unwrap();
        assert!(bs.import_freesurfer_annot(&annot, true).is_err());
        assert!(bs.label_node_data(NodeAttributeKind::Paint).unwrap().is_empty());
    }

    #[test]
    fn identity_is_guessed_from_file_names() {
        let bs = BrainSet::default();
        bs.add_coordinate_file(coords(3, SurfaceType::Fiducial, "/data/Human.colin.R.FIDUCIAL.coord"), None).unwrap();
        bs.guess_subject_species_structure();
        assert_eq!(Some(String::from("Human")), bs.species());
        assert_eq!(Some(String::from("colin")), bs.subject());
        assert_eq!(Some(String::from("right")), bs.structure());
        assert!(identity_from_file_name("lh.white").is_none());
    }

    fn write_small_spec(dir: &TempDir) -> PathBuf {
        let topo = strip_topology(6);
        topo.to_file(dir.path().join("strip.topo"), FileEncoding::Ascii).unwrap();
        coords(6, SurfaceType::Fiducial, "").to_file(dir.path().join("strip.coord"), FileEncoding::Binary, 3).unwrap();
        metric(6, "thickness").to_file(dir.path().join("strip.metric"), FileEncoding::Ascii, 3).unwrap();
        let spec = dir.path().join("strip.spec");
        std::fs::write(&spec, "BeginHeader\nspecies Macaque\nEndHeader\n\
            OPENtopo_file strip.topo\n\
            FIDUCIALcoord_file strip.coord\n\
            metric_file strip.metric\n\
            foci_file missing.foci\n").unwrap();
        spec
    }

    #[test]
    fn spec_files_load_with_a_failure_list() {
        let dir = tempdir().unwrap();
        let spec = read_spec(write_small_spec(&dir)).unwrap();

        let bs = BrainSet::default();
        let report = bs.read_spec_file(&spec, SpecFileReadMode::Replace, None);
        assert_eq!(3, report.files_loaded);
        assert_eq!(1, report.failures.len());
        assert_eq!("missing.foci", report.failures[0].file_name);
        assert!(report.error_message().starts_with("missing.foci: "));
        assert!(!report.is_success());
        assert_eq!(LoadState::Loaded, bs.load_state());
        assert_eq!(6, bs.number_of_nodes());
        assert!(bs.nodes_classified());
        assert_eq!(Some(String::from("Macaque")), bs.species());
        assert_eq!(3, bs.loaded_spec_file().number_of_files());
    }

    #[test]
    fn cancelled_loads_keep_what_was_loaded() {
        let dir = tempdir().unwrap();
        let spec = read_spec(write_small_spec(&dir)).unwrap();

        let bs = BrainSet::default();
        let stop_after_one = |done: usize, _total: usize, _name: &str| done < 1;
        let report = bs.read_spec_file(&spec, SpecFileReadMode::Replace, Some(&stop_after_one));
        assert!(report.cancelled);
        assert_eq!(1, report.files_loaded);
        assert_eq!(LoadState::PartiallyLoaded, bs.load_state());
        assert_eq!(1, bs.number_of_topology_files());
        assert_eq!(0, bs.number_of_brain_models());

        bs.reset();
        assert_eq!(LoadState::Empty, bs.load_state());
        assert_eq!(0, bs.number_of_topology_files());
    }

    #[test]
    fn scenes_restore_selected_columns() {
        let dir = tempdir().unwrap();
        let spec = read_spec(write_small_spec(&dir)).unwrap();
        let bs = BrainSet::default();
        bs.read_spec_file(&spec, SpecFileReadMode::Replace, None);
        bs.read_node_attribute_file(NodeAttributeKind::Metric, dir.path().join("strip.metric"), true, false).unwrap();
        bs.update_display_settings(NodeAttributeKind::Metric, |ds, n| {
            ds.set_display_column(1, n);
            ds.scalar.display_color_bar = true;
        }).unwrap();
        let scene = bs.save_scene("view");

        bs.update_display_settings(NodeAttributeKind::Metric, |ds, n| {
            ds.set_display_column(0, n);
            ds.scalar.display_color_bar = false;
        }).unwrap();
        // Both columns are called "thickness", the first one matches.
        let messages = bs.show_scene(&scene);
        assert!(messages.is_empty(), "{:?}", messages);
        let ds = bs.display_settings(NodeAttributeKind::Metric).unwrap();
        assert_eq!(Some(0), ds.display_column());
        assert!(ds.scalar.display_color_bar);
    }
}
