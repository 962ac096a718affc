//! Data core of a brain set: the surfaces, topologies, volumes and per-node data of one brain structure.
//!
//! A brain set is usually loaded from a Caret spec file, a manifest that lists the data files by type.
//! All surfaces and per-node files of a brain set share one node count, which is set by the first surface.
//! Files that do not match it are rejected.
//!
//! ```no_run
//! use brainset::{BrainSet, SpecFileReadMode};
//!
//! let spec = brainset::read_spec("Human.colin.L.spec").unwrap();
//! let brain_set = BrainSet::default();
//! let report = brain_set.read_spec_file(&spec, SpecFileReadMode::Replace, None);
//! if !report.is_success() {
//!     eprintln!("{}", report.error_message());
//! }
//! println!("{} nodes", brain_set.number_of_nodes());
//! ```
//!
//! The individual file formats can also be read on their own:
//!
//! ```no_run
//! let topo = brainset::read_topology("Human.colin.L.CLOSED.topo").unwrap();
//! println!("{} topology with {} tiles", topo.topology_type, topo.num_tiles());
//! ```

pub mod brain_model;
pub mod brain_set;
pub mod caret_coord;
pub mod caret_header;
pub mod caret_nodedata;
pub mod caret_scene;
pub mod caret_spec;
pub mod caret_topo;
pub mod context;
pub mod display_settings;
pub mod error;
pub mod events;
pub mod fs_annot;
pub mod fs_curv;
pub mod fs_mgh;
pub mod fs_surface;
pub mod node_attribute;
pub mod node_classification;
pub mod preferences;
pub mod topology_helper;
pub mod topology_selection;
pub mod traits;
pub mod util;

pub use brain_model::{BrainModel, BrainModelSurface, BrainModelVolume, VolumeType};
pub use brain_set::{BrainSet, LoadFailure, LoadState, NodeDataSlot, SpecFileLoadReport, SpecFileReadMode};
pub use caret_coord::{read_coordinates, CoordinateFile, SurfaceType};
pub use caret_header::{CaretHeader, FileEncoding};
pub use caret_nodedata::{read_label_node_data, read_scalar_node_data, NodeAttributeKind, NodeDataFile};
pub use caret_scene::{read_scenes, Scene, SceneClass, SceneFile, SceneInfo};
pub use caret_spec::{read_spec, SpecFile, SpecFileKind};
pub use caret_topo::{read_topology, TopologyFile, TopologyType};
pub use context::CaretContext;
pub use display_settings::DisplaySettings;
pub use error::{BrainSetError, Result};
pub use events::{BrainSetEvent, BrainSetObserver};
pub use fs_annot::{read_annot, FsAnnot};
pub use fs_curv::{read_curv, CurvHeader, FsCurv};
pub use fs_mgh::{read_mgh, FsMgh};
pub use fs_surface::{read_surf, FsSurface};
pub use node_classification::NodeClassification;
pub use preferences::Preferences;
pub use topology_selection::TopologyCollection;
