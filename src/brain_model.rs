//! The brain models of a brain set: surfaces, volumes, and the combination of a fiducial surface with
//! an anatomical volume.

use std::fmt;
use std::sync::Arc;

use crate::caret_coord::{CoordinateFile, SurfaceType};
use crate::caret_topo::TopologyFile;
use crate::fs_mgh::FsMgh;


/// The role of a volume in a brain set, one per `volume_*_file` spec tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeType {
    Anatomy,
    Functional,
    Paint,
    ProbabilisticAtlas,
    Rgb,
    Segmentation,
    Vector,
}

impl VolumeType {
    /// All volume types, in the order they are loaded from a spec file.
    pub const LOAD_ORDER: [VolumeType; 7] = [
        VolumeType::Anatomy,
        VolumeType::Functional,
        VolumeType::Paint,
        VolumeType::ProbabilisticAtlas,
        VolumeType::Rgb,
        VolumeType::Segmentation,
        VolumeType::Vector,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VolumeType::Anatomy => "Anatomy",
            VolumeType::Functional => "Functional",
            VolumeType::Paint => "Paint",
            VolumeType::ProbabilisticAtlas => "Probabilistic Atlas",
            VolumeType::Rgb => "RGB",
            VolumeType::Segmentation => "Segmentation",
            VolumeType::Vector => "Vector",
        }
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}


/// A surface: node positions plus the topology used to draw them.
#[derive(Debug, Clone)]
pub struct BrainModelSurface {
    pub coordinates: CoordinateFile,
    /// Shared with the brain set's topology collection, which owns it.
    pub topology: Option<Arc<TopologyFile>>,
}

impl BrainModelSurface {
    pub fn new(coordinates: CoordinateFile, topology: Option<Arc<TopologyFile>>) -> BrainModelSurface {
        BrainModelSurface { coordinates, topology }
    }

    pub fn surface_type(&self) -> SurfaceType {
        self.coordinates.surface_type()
    }

    pub fn num_nodes(&self) -> usize {
        self.coordinates.num_nodes()
    }

    pub fn filename(&self) -> &str {
        &self.coordinates.filename
    }

    /// Whether this surface draws with the given topology.
    pub fn uses_topology(&self, topology: &Arc<TopologyFile>) -> bool {
        self.topology.as_ref().map(|t| Arc::ptr_eq(t, topology)).unwrap_or(false)
    }
}


/// A volume read from an MGH or MGZ file.
#[derive(Debug, Clone)]
pub struct BrainModelVolume {
    pub volume_type: VolumeType,
    pub filename: String,
    pub volume: FsMgh,
}

impl BrainModelVolume {
    /// The voxel dimensions `[i, j, k]`, ignoring frames.
    pub fn dimensions(&self) -> [usize; 3] {
        let shape = self.volume.data.shape();
        [shape[0], shape[1], shape[2]]
    }
}


/// A brain model. Exactly one variant is active per model.
#[derive(Debug, Clone)]
pub enum BrainModel {
    Surface(BrainModelSurface),
    Volume(BrainModelVolume),
    /// A fiducial surface displayed together with an anatomy or segmentation volume.
    SurfaceAndVolume {
        surface: BrainModelSurface,
        volume: BrainModelVolume,
    },
}

impl BrainModel {

    /// The surface of a [`BrainModel::Surface`]. Use [`BrainModel::as_surface`] to include combined models.
    pub fn surface(&self) -> Option<&BrainModelSurface> {
        match self {
            BrainModel::Surface(s) => Some(s),
            _ => None,
        }
    }

    /// The volume of a [`BrainModel::Volume`].
    pub fn volume(&self) -> Option<&BrainModelVolume> {
        match self {
            BrainModel::Volume(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_surface(&self) -> Option<&BrainModelSurface> {
        match self {
            BrainModel::Surface(s) => Some(s),
            BrainModel::SurfaceAndVolume { surface, .. } => Some(surface),
            BrainModel::Volume(_) => None,
        }
    }

    pub fn as_surface_mut(&mut self) -> Option<&mut BrainModelSurface> {
        match self {
            BrainModel::Surface(s) => Some(s),
            BrainModel::SurfaceAndVolume { surface, .. } => Some(surface),
            BrainModel::Volume(_) => None,
        }
    }

    pub fn as_volume(&self) -> Option<&BrainModelVolume> {
        match self {
            BrainModel::Volume(v) => Some(v),
            BrainModel::SurfaceAndVolume { volume, .. } => Some(volume),
            BrainModel::Surface(_) => None,
        }
    }

    pub fn is_surface(&self) -> bool {
        matches!(self, BrainModel::Surface(_))
    }

    pub fn is_volume(&self) -> bool {
        matches!(self, BrainModel::Volume(_))
    }

    pub fn is_surface_and_volume(&self) -> bool {
        matches!(self, BrainModel::SurfaceAndVolume { .. })
    }

    /// A short description for logs and scene model names.
    pub fn descriptive_name(&self) -> String {
        match self {
            BrainModel::Surface(s) => format!("{} surface {}", s.surface_type(), crate::util::basename(s.filename())),
            BrainModel::Volume(v) => format!("{} volume {}", v.volume_type, crate::util::basename(&v.filename)),
            BrainModel::SurfaceAndVolume { .. } => String::from("Surface and Volume"),
        }
    }
}
