//! Functions for managing Caret spec files, the manifests that list the data files of a brain set.
//!
//! A spec file is a Caret ASCII file: an optional header, followed by one line per data file.
//!
//! ```text
//! BeginHeader
//! species Human
//! structure left
//! EndHeader
//!
//! CLOSEDtopo_file Human.colin.L.CLOSED.topo
//! FIDUCIALcoord_file Human.colin.L.FIDUCIAL.coord
//! volume_anatomy_file colin.mgz
//! metric_file Human.colin.L.thickness.metric
//! ```
//!
//! Each line starts with a tag naming the file type. If the header's `version` is 1 or later, a structure
//! token follows the tag. Then come the file name and, for volumes, an optional data file name. Lines starting
//! with `#` are comments. Lines with tags that are not file types are moved into the header.

use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::brain_model::VolumeType;
use crate::caret_coord::SurfaceType;
use crate::caret_header::{CaretHeader, TAG_SPACE, TAG_SPECIES, TAG_STRUCTURE, TAG_SUBJECT};
use crate::caret_nodedata::NodeAttributeKind;
use crate::caret_scene::{Scene, SceneClass};
use crate::caret_topo::TopologyType;
use crate::error::{BrainSetError, Result};
use crate::util::{basename, next_line, open_input, OutputFile};

pub const TAG_SPEC_VERSION: &str = "version";
pub const SCENE_FILE_TAG: &str = "scene_file";
/// Name of the scene class that stores the files of a spec file.
pub const SPEC_FILE_SCENE_CLASS: &str = "SpecFile";


/// What a brain set does with the files listed under a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecFileKind {
    Topology(TopologyType),
    Coordinate(SurfaceType),
    Volume(VolumeType),
    NodeAttribute(NodeAttributeKind),
    Scene,
    /// Files that are tracked, and checked for existence when loaded, but not parsed.
    Auxiliary,
    /// Files that are listed but never loaded.
    Ignored,
}


/// A known spec file tag.
#[derive(Debug, PartialEq, Eq)]
pub struct SpecTag {
    pub tag: &'static str,
    pub descriptive_name: &'static str,
    pub kind: SpecFileKind,
    /// Pattern tags match every tag that contains them, after all exact tags failed to match.
    pub pattern: bool,
}

const fn exact(tag: &'static str, descriptive_name: &'static str, kind: SpecFileKind) -> SpecTag {
    SpecTag { tag, descriptive_name, kind, pattern: false }
}

const fn pattern(tag: &'static str, descriptive_name: &'static str, kind: SpecFileKind) -> SpecTag {
    SpecTag { tag, descriptive_name, kind, pattern: true }
}

use self::SpecFileKind::{Auxiliary, Coordinate, Ignored, NodeAttribute, Topology, Volume};

/// All known tags, in the order they are written.
pub static SPEC_TAGS: &[SpecTag] = &[
    exact("CLOSEDtopo_file", "Topology File (CLOSED)", Topology(TopologyType::Closed)),
    exact("OPENtopo_file", "Topology File (OPEN)", Topology(TopologyType::Open)),
    exact("CUTtopo_file", "Topology File (CUT)", Topology(TopologyType::Cut)),
    exact("LOBAR_CUTtopo_file", "Topology File (LOBAR CUT)", Topology(TopologyType::LobarCut)),
    exact("RAWcoord_file", "Coordinate File (RAW)", Coordinate(SurfaceType::Raw)),
    exact("FIDUCIALcoord_file", "Coordinate File (FIDUCIAL)", Coordinate(SurfaceType::Fiducial)),
    exact("INFLATEDcoord_file", "Coordinate File (INFLATED)", Coordinate(SurfaceType::Inflated)),
    exact("VERY_INFLATEDcoord_file", "Coordinate File (VERY INFLATED)", Coordinate(SurfaceType::VeryInflated)),
    exact("SPHERICALcoord_file", "Coordinate File (SPHERICAL)", Coordinate(SurfaceType::Spherical)),
    exact("ELLIPSOIDcoord_file", "Coordinate File (ELLIPSOID)", Coordinate(SurfaceType::Ellipsoidal)),
    exact("COMPRESSED_MEDIAL_WALLcoord_file", "Coordinate File (COMPRESSED MEDIAL WALL)", Coordinate(SurfaceType::CompressedMedialWall)),
    exact("FLATcoord_file", "Coordinate File (FLAT)", Coordinate(SurfaceType::Flat)),
    exact("LOBAR_FLATcoord_file", "Coordinate File (LOBAR FLAT)", Coordinate(SurfaceType::FlatLobar)),
    exact("HULLcoord_file", "Coordinate File (HULL)", Coordinate(SurfaceType::Hull)),
    exact("AVERAGE_FIDUCIALcoord_file", "Coordinate File (AVERAGE FIDUCIAL)", Ignored),
    exact("volume_anatomy_file", "Volume File - Anatomy", Volume(VolumeType::Anatomy)),
    exact("volume_functional_file", "Volume File - Functional", Volume(VolumeType::Functional)),
    exact("volume_paint_file", "Volume File - Paint", Volume(VolumeType::Paint)),
    exact("volume_prob_atlas_file", "Volume File - Probabilistic Atlas", Volume(VolumeType::ProbabilisticAtlas)),
    exact("volume_rgb_file", "Volume File - RGB", Volume(VolumeType::Rgb)),
    exact("volume_segmentation_file", "Volume File - Segmentation", Volume(VolumeType::Segmentation)),
    exact("volume_vector_file", "Volume File - Vector", Volume(VolumeType::Vector)),
    exact("paint_file", "Paint File", NodeAttribute(NodeAttributeKind::Paint)),
    exact("metric_file", "Metric File", NodeAttribute(NodeAttributeKind::Metric)),
    exact("surface_shape_file", "Surface Shape File", NodeAttribute(NodeAttributeKind::SurfaceShape)),
    exact("lat_lon_file", "Latitude Longitude File", NodeAttribute(NodeAttributeKind::LatLon)),
    exact("section_file", "Section File", NodeAttribute(NodeAttributeKind::Section)),
    exact("RGBpaint_file", "RGB Paint File", NodeAttribute(NodeAttributeKind::RgbPaint)),
    exact("topography_file", "Topography File", NodeAttribute(NodeAttributeKind::Topography)),
    exact("areal_estimation_file", "Areal Estimation File", NodeAttribute(NodeAttributeKind::ArealEstimation)),
    exact("deform_field_file", "Deformation Field File", NodeAttribute(NodeAttributeKind::DeformationField)),
    exact("geodesic_distance_file", "Geodesic Distance File", NodeAttribute(NodeAttributeKind::GeodesicDistance)),
    exact("atlas_file", "Probabilistic Atlas File", NodeAttribute(NodeAttributeKind::ProbabilisticAtlas)),
    exact(SCENE_FILE_TAG, "Scene File", SpecFileKind::Scene),
    exact("area_color_file", "Area Color File", Auxiliary),
    exact("border_color_file", "Border Color File", Auxiliary),
    exact("borderproj_file", "Border Projection File", Auxiliary),
    exact("VOLUMEborder_file", "Volume Border File", Auxiliary),
    exact("cell_file", "Cell File", Auxiliary),
    exact("cell_color_file", "Cell Color File", Auxiliary),
    exact("cellproj_file", "Cell Projection File", Auxiliary),
    exact("volume_cell_file", "Volume Cell File", Auxiliary),
    exact("cocomac_connect_file", "CoCoMac Connectivity File", Auxiliary),
    exact("contour_file", "Contour File", Auxiliary),
    exact("contour_cell_file", "Contour Cell File", Auxiliary),
    exact("contour_cell_color_file", "Contour Cell Color File", Auxiliary),
    exact("cuts_file", "Cuts File", Auxiliary),
    exact("deform_map_file", "Deformation Map File", Auxiliary),
    exact("document_file", "Document File", Auxiliary),
    exact("foci_file", "Foci File", Auxiliary),
    exact("foci_color_file", "Foci Color File", Auxiliary),
    exact("fociproj_file", "Foci Projection File", Auxiliary),
    exact("foci_search_file", "Foci Search File", Auxiliary),
    exact("image_file", "Image File", Auxiliary),
    exact("palette_file", "Palette File", Auxiliary),
    exact("params_file", "Parameters File", Auxiliary),
    exact("script_file", "Script File", Auxiliary),
    exact("study_collection_file", "Study Collection File", Auxiliary),
    exact("study_metadata_file", "Study Metadata File", Auxiliary),
    exact("surface_vector_file", "Surface Vector File", Auxiliary),
    exact("transformation_matrix_file", "Transformation Matrix File", Auxiliary),
    exact("transformation_data_file", "Transformation Data File", Auxiliary),
    exact("CEREBRAL_HULLvtk_file", "Cerebral Hull VTK File", Auxiliary),
    exact("vtk_model_file", "VTK Model File", Auxiliary),
    exact("vocabulary_file", "Vocabulary File", Auxiliary),
    exact("wustl_region_file", "WUSTL Region File", Auxiliary),
    pattern("topo_file", "Topology File (UNKNOWN)", Topology(TopologyType::Unknown)),
    pattern("coord_file", "Coordinate File (UNKNOWN)", Coordinate(SurfaceType::Unknown)),
    pattern("surface_file", "Surface File (GIFTI)", Auxiliary),
    pattern("border_file", "Border File", Auxiliary),
];


/// Find the known tag for a tag read from a spec file. Exact tags take precedence over pattern tags.
pub fn find_spec_tag(tag: &str) -> Option<&'static SpecTag> {
    SPEC_TAGS.iter()
        .find(|t| !t.pattern && t.tag == tag)
        .or_else(|| SPEC_TAGS.iter().find(|t| t.pattern && tag.contains(t.tag)))
}


/// A file listed in a spec file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecFileEntry {
    pub filename: String,
    /// The separate data file of a volume, if any.
    pub data_file_name: Option<String>,
    pub selected: bool,
    pub structure: Option<String>,
}


/// The files listed under one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecEntry {
    pub spec_tag: &'static SpecTag,
    pub files: Vec<SpecFileEntry>,
}

impl SpecEntry {
    pub fn tag(&self) -> &'static str {
        self.spec_tag.tag
    }

    pub fn kind(&self) -> SpecFileKind {
        self.spec_tag.kind
    }

    pub fn selected_files(&self) -> impl Iterator<Item = &SpecFileEntry> + '_ {
        self.files.iter().filter(|f| f.selected)
    }

    pub fn number_of_selected_files(&self) -> usize {
        self.selected_files().count()
    }

    /// Add a file, or select it and update its data file name if it is already listed.
    /// Returns true if the file was not listed before.
    fn add_file(&mut self, filename: &str, data_file_name: Option<String>, structure: Option<String>) -> bool {
        if let Some(existing) = self.files.iter_mut().find(|f| f.filename == filename) {
            existing.selected = true;
            existing.data_file_name = data_file_name;
            return false;
        }
        self.files.push(SpecFileEntry {
            filename: filename.to_string(),
            data_file_name,
            selected: true,
            structure,
        });
        true
    }
}


/// Models a Caret spec file.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecFile {
    pub header: CaretHeader,
    /// The name of the file this spec was read from or written to. File names in the spec are relative to its directory.
    pub filename: String,
    entries: Vec<SpecEntry>,
}

impl Default for SpecFile {
    fn default() -> SpecFile {
        SpecFile {
            header: CaretHeader::default(),
            filename: String::new(),
            entries: SPEC_TAGS.iter().map(|spec_tag| SpecEntry { spec_tag, files: Vec::new() }).collect(),
        }
    }
}


/// Read a Caret spec file. All listed files are selected.
///
/// # Examples
///
/// ```no_run
/// let spec = brainset::read_spec("Human.colin.L.spec").unwrap();
/// println!("{} files are selected", spec.number_of_selected_files());
/// ```
pub fn read_spec<P: AsRef<Path>>(path: P) -> Result<SpecFile> {
    SpecFile::from_file(path)
}


impl SpecFile {

    pub fn new() -> SpecFile {
        SpecFile::default()
    }

    /// The format version. Version 1 and later store a structure token on every file line.
    pub fn version(&self) -> i32 {
        self.header.get(TAG_SPEC_VERSION)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn structure(&self) -> Option<&str> {
        self.header.get(TAG_STRUCTURE).filter(|s| !s.is_empty())
    }

    pub fn species(&self) -> Option<&str> {
        self.header.get(TAG_SPECIES).filter(|s| !s.is_empty())
    }

    pub fn subject(&self) -> Option<&str> {
        self.header.get(TAG_SUBJECT).filter(|s| !s.is_empty())
    }

    pub fn space(&self) -> Option<&str> {
        self.header.get(TAG_SPACE).filter(|s| !s.is_empty())
    }

    pub fn entries(&self) -> &[SpecEntry] {
        &self.entries
    }

    /// The entry of a known tag, looked up like a tag read from a file.
    pub fn entry(&self, tag: &str) -> Option<&SpecEntry> {
        let spec_tag = find_spec_tag(tag)?;
        self.entries.iter().find(|e| e.spec_tag.tag == spec_tag.tag)
    }

    fn entry_mut(&mut self, spec_tag: &'static SpecTag) -> Option<&mut SpecEntry> {
        self.entries.iter_mut().find(|e| e.spec_tag.tag == spec_tag.tag)
    }

    /// All entries whose files are handled as the given kind.
    pub fn entries_of_kind(&self, kind: SpecFileKind) -> impl Iterator<Item = &SpecEntry> + '_ {
        self.entries.iter().filter(move |e| e.kind() == kind)
    }

    pub fn number_of_files(&self) -> usize {
        self.entries.iter().map(|e| e.files.len()).sum()
    }

    pub fn number_of_selected_files(&self) -> usize {
        self.entries.iter().map(|e| e.number_of_selected_files()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.number_of_files() == 0
    }

    /// Remove all files and the header.
    pub fn clear(&mut self) {
        *self = SpecFile::default();
    }

    /// Remove all files but keep the header and file name.
    pub fn clear_files(&mut self) {
        for entry in &mut self.entries {
            entry.files.clear();
        }
    }

    pub fn set_all_files_selected(&mut self, selected: bool) {
        for entry in &mut self.entries {
            for file in &mut entry.files {
                file.selected = selected;
            }
        }
    }

    /// Set the selection status of the files under `tag` with the same base name as `filename`.
    /// Returns false if no such file is listed.
    pub fn set_file_selected(&mut self, tag: &str, filename: &str, selected: bool) -> bool {
        let spec_tag = match find_spec_tag(tag) {
            Some(t) => t,
            None => return false,
        };
        let name = basename(filename);
        let mut found = false;
        if let Some(entry) = self.entry_mut(spec_tag) {
            for file in entry.files.iter_mut().filter(|f| basename(&f.filename) == name) {
                file.selected = selected;
                found = true;
            }
        }
        found
    }

    /// Remove a file from every tag it is listed under. Files are matched by base name.
    pub fn remove_file(&mut self, filename: &str) -> bool {
        let name = basename(filename);
        let before = self.number_of_files();
        for entry in &mut self.entries {
            entry.files.retain(|f| basename(&f.filename) != name);
        }
        self.number_of_files() != before
    }

    /// The path of a listed file: relative names are resolved against the directory of the spec file.
    pub fn resolve_path(&self, filename: &str) -> PathBuf {
        let path = Path::new(filename);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match Path::new(&self.filename).parent() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Add a file under a tag and select it. The name is stored relative to the spec file's directory if it lies
    /// below it, or as a base name for specs that have no file name yet.
    /// Returns true if the file was not listed before.
    pub fn add_to_spec_file(&mut self, tag: &str, filename: &str, data_file_name: Option<&str>) -> Result<bool> {
        let spec_tag = find_spec_tag(tag).ok_or_else(|| BrainSetError::UnknownSpecTag(tag.to_string()))?;
        let name = self.relative_name(filename);
        let data_file_name = data_file_name.filter(|d| !d.is_empty()).map(basename);
        let structure = self.structure().map(str::to_string);
        let entry = self.entry_mut(spec_tag).ok_or_else(|| BrainSetError::UnknownSpecTag(tag.to_string()))?;
        Ok(entry.add_file(&name, data_file_name, structure))
    }

    fn relative_name(&self, filename: &str) -> String {
        if self.filename.is_empty() {
            return basename(filename);
        }
        match Path::new(&self.filename).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => Path::new(filename)
                .strip_prefix(dir)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| filename.to_string()),
            _ => filename.to_string(),
        }
    }

    /// Handle the tokens of one file line. Returns true if the tag is a known file type.
    fn process_tag(&mut self, tokens: &[&str], version: i32) -> bool {
        if tokens.len() < 2 {
            return false;
        }
        let tag = tokens[0];
        let mut idx = 1;
        let mut structure = None;
        if version >= 1 {
            structure = Some(tokens[idx].to_string());
            idx += 1;
        }
        let filename = match tokens.get(idx) {
            Some(f) => *f,
            None => return false,
        };
        let data_file_name = tokens.get(idx + 1).map(|d| volume_data_file_name(filename, d));

        match find_spec_tag(tag).and_then(|t| self.entry_mut(t)) {
            Some(entry) => {
                entry.add_file(filename, data_file_name, structure);
                true
            }
            None => {
                debug!("Unknown spec file tag moved to header: {}", tag);
                self.header.set(tag, filename);
                false
            }
        }
    }


    /// Read a spec file. If the file's name ends with ".gz", it is GZip decoded.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SpecFile> {
        let mut input = open_input(&path)?;
        let mut spec = SpecFile::from_reader(&mut input).map_err(|e| e.in_file(&path))?;
        spec.filename = path.as_ref().to_string_lossy().into_owned();
        Ok(spec)
    }


    /// Read a spec file from the given stream.
    pub fn from_reader<R: BufRead + ?Sized>(input: &mut R) -> Result<SpecFile> {
        let (header, leftover) = CaretHeader::from_reader(input)?;
        let mut spec = SpecFile { header, ..SpecFile::default() };
        if spec.space() == Some("7112B") {
            spec.header.set(TAG_SPACE, "711-2B");
        }
        let version = spec.version();

        let mut pending = leftover;
        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => match next_line(input)? {
                    Some(line) => line,
                    None => break,
                },
            };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            spec.process_tag(&tokens, version);
        }

        // Files of version 0 specs all belong to the structure of the header.
        if version == 0 {
            let structure = spec.structure().map(str::to_string);
            for entry in &mut spec.entries {
                for file in &mut entry.files {
                    file.structure = structure.clone();
                }
            }
        }
        Ok(spec)
    }


    /// Write the spec file. Names ending with ".gz" are GZip compressed.
    pub fn to_file<P: AsRef<Path>>(&self, path: P, only_selected: bool) -> Result<()> {
        let mut out = OutputFile::create(&path)?;
        self.write_to(&mut out, only_selected).map_err(|e| e.in_file(&path))?;
        out.finish().map_err(|e| e.in_file(&path))
    }

    /// Write the header and one line per file. Files whose names start with `*` are flagged for deletion and
    /// not written.
    pub fn write_to<W: Write>(&self, out: &mut W, only_selected: bool) -> Result<()> {
        self.header.write_to(out)?;
        writeln!(out)?;
        let version = self.version();
        for entry in &self.entries {
            for file in &entry.files {
                if (only_selected && !file.selected) || file.filename.starts_with('*') {
                    continue;
                }
                write!(out, "{} ", entry.tag())?;
                if version > 0 {
                    write!(out, "{} ", file.structure.as_deref().or_else(|| self.structure()).unwrap_or("unknown"))?;
                }
                write!(out, "{}", file.filename)?;
                if let Some(data) = file.data_file_name.as_ref().filter(|d| **d != file.filename) {
                    write!(out, " {}", data)?;
                }
                writeln!(out)?;
            }
        }
        writeln!(out)?;
        Ok(())
    }


    /// The files of the spec as a scene class named "SpecFile", one info per file.
    pub fn save_scene(&self, selected_only: bool) -> SceneClass {
        let mut class = SceneClass::new(SPEC_FILE_SCENE_CLASS);
        for entry in &self.entries {
            for file in entry.files.iter().filter(|f| !selected_only || f.selected) {
                if file.filename.is_empty() {
                    continue;
                }
                let value = match &file.data_file_name {
                    Some(data) if !data.is_empty() => format!("{}:{}", file.filename, data),
                    _ => file.filename.clone(),
                };
                class.add(entry.tag(), value);
            }
        }
        class
    }

    /// Replace the files with those saved in the scene's "SpecFile" class. Scene files are not restored.
    pub fn show_scene(&mut self, scene: &Scene) {
        self.clear_files();
        let structure = self.structure().map(str::to_string);
        let mut seen_unknown: HashSet<String> = HashSet::new();
        for class in scene.classes.iter().filter(|c| c.name == SPEC_FILE_SCENE_CLASS) {
            for info in &class.infos {
                if info.name == SCENE_FILE_TAG {
                    continue;
                }
                let mut parts = info.value.splitn(2, ':');
                let filename = parts.next().unwrap_or("");
                if filename.is_empty() {
                    continue;
                }
                let data_file_name = parts.next().filter(|d| !d.is_empty()).map(str::to_string);
                match find_spec_tag(&info.name).and_then(|t| self.entry_mut(t)) {
                    Some(entry) => {
                        entry.add_file(filename, data_file_name, structure.clone());
                    }
                    None => {
                        if seen_unknown.insert(info.name.clone()) {
                            debug!("Ignoring unknown spec file tag in scene: {}", info.name);
                        }
                    }
                }
            }
        }
    }
}


/// The data file of a volume lives next to its header file unless it names its own directory.
fn volume_data_file_name(filename: &str, data_file_name: &str) -> String {
    let data = Path::new(data_file_name);
    match Path::new(filename).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && data.parent().map(|p| p.as_os_str().is_empty()).unwrap_or(true) => {
            dir.join(data).to_string_lossy().into_owned()
        }
        _ => data_file_name.to_string(),
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    const SPEC: &str = "BeginHeader
species Human
structure left
space 7112B
EndHeader

# a comment line
CLOSEDtopo_file Human.colin.L.CLOSED.topo
FIDUCIALcoord_file Human.colin.L.FIDUCIAL.coord
MYSTERYtopo_file Human.colin.L.other.topo
volume_anatomy_file anat/colin.mgh colin.img
metric_file Human.colin.L.thickness.metric
category INDIVIDUAL
lonely_tag
";

    fn read(text: &str) -> SpecFile {
        SpecFile::from_reader(&mut Cursor::new(text.as_bytes())).unwrap()
    }

    #[test]
    fn exact_tags_win_over_pattern_tags() {
        assert_eq!(SpecFileKind::Topology(TopologyType::Closed), find_spec_tag("CLOSEDtopo_file").unwrap().kind);
        assert_eq!(SpecFileKind::Topology(TopologyType::Unknown), find_spec_tag("MYSTERYtopo_file").unwrap().kind);
        assert_eq!(SpecFileKind::Ignored, find_spec_tag("AVERAGE_FIDUCIALcoord_file").unwrap().kind);
        assert_eq!(SpecFileKind::Auxiliary, find_spec_tag("FIDUCIALsurface_file").unwrap().kind);
        assert_eq!(SpecFileKind::NodeAttribute(NodeAttributeKind::SurfaceShape), find_spec_tag("surface_shape_file").unwrap().kind);
        assert!(find_spec_tag("category").is_none());
    }

    #[test]
    fn a_spec_file_can_be_read() {
        let spec = read(SPEC);
        assert_eq!(5, spec.number_of_files());
        assert_eq!(5, spec.number_of_selected_files());
        assert_eq!(Some("Human"), spec.species());
        assert_eq!(Some("711-2B"), spec.space());
        assert_eq!(Some("INDIVIDUAL"), spec.header.get("category"));

        let unknown_topo = spec.entry("topo_file").unwrap();
        assert_eq!("Human.colin.L.other.topo", unknown_topo.files[0].filename);
        assert_eq!(Some(String::from("left")), unknown_topo.files[0].structure);

        let volume = &spec.entry("volume_anatomy_file").unwrap().files[0];
        assert_eq!(Some(String::from("anat/colin.img")), volume.data_file_name);
    }

    #[test]
    fn versioned_spec_files_carry_a_structure_per_line() {
        let spec = read("BeginHeader\nversion 1\nEndHeader\nmetric_file right rh.metric\npaint_file left lh.paint\n");
        assert_eq!(1, spec.version());
        assert_eq!(Some(String::from("right")), spec.entry("metric_file").unwrap().files[0].structure);
        assert_eq!("lh.paint", spec.entry("paint_file").unwrap().files[0].filename);
    }

    #[test]
    fn adding_a_listed_file_selects_it_again() {
        let mut spec = read(SPEC);
        assert!(spec.set_file_selected("metric_file", "/elsewhere/Human.colin.L.thickness.metric", false));
        assert_eq!(4, spec.number_of_selected_files());
        assert!(!spec.add_to_spec_file("metric_file", "Human.colin.L.thickness.metric", None).unwrap());
        assert_eq!(5, spec.number_of_selected_files());
        assert!(spec.add_to_spec_file("metric_file", "/data/extra.metric", None).unwrap());
        assert_eq!("extra.metric", spec.entry("metric_file").unwrap().files[1].filename);
        assert!(spec.add_to_spec_file("not_a_tag", "x", None).is_err());
    }

    #[test]
    fn files_are_relative_to_the_spec_directory() {
        let mut spec = SpecFile::new();
        spec.filename = String::from("/data/subject/lh.spec");
        assert!(spec.add_to_spec_file("metric_file", "/data/subject/surf/lh.metric", None).unwrap());
        assert_eq!("surf/lh.metric", spec.entry("metric_file").unwrap().files[0].filename);
        assert_eq!(PathBuf::from("/data/subject/surf/lh.metric"), spec.resolve_path("surf/lh.metric"));
        assert_eq!(PathBuf::from("/abs/x.metric"), spec.resolve_path("/abs/x.metric"));
    }

    #[test]
    fn only_selected_and_unflagged_files_are_written() {
        let mut spec = read(SPEC);
        spec.set_file_selected("metric_file", "Human.colin.L.thickness.metric", false);
        spec.add_to_spec_file("paint_file", "*deleted.paint", None).unwrap();

        let mut out: Vec<u8> = Vec::new();
        spec.write_to(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("CLOSEDtopo_file Human.colin.L.CLOSED.topo\n"));
        assert!(text.contains("volume_anatomy_file anat/colin.mgh anat/colin.img\n"));
        assert!(!text.contains("thickness.metric"));
        assert!(!text.contains("deleted.paint"));

        let reread = read(&text);
        assert_eq!(4, reread.number_of_files());
        assert_eq!(Some("Human"), reread.species());
    }

    #[test]
    fn spec_files_can_be_written_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lh.spec");
        let spec = read(SPEC);
        spec.to_file(&path, false).unwrap();
        let reread = read_spec(&path).unwrap();
        assert_eq!(spec.number_of_files(), reread.number_of_files());
        assert_eq!(path.to_string_lossy(), reread.filename);
    }

    #[test]
    fn the_files_survive_a_scene_round_trip() {
        let mut spec = read(SPEC);
        spec.add_to_spec_file(SCENE_FILE_TAG, "views.scene", None).unwrap();
        let class = spec.save_scene(true);
        assert_eq!(SPEC_FILE_SCENE_CLASS, class.name);
        assert_eq!(Some("anat/colin.mgh:anat/colin.img"), class.value("volume_anatomy_file"));

        let mut scene = Scene::new("all");
        scene.add_class(class);

        let mut restored = read(SPEC);
        restored.set_all_files_selected(false);
        restored.show_scene(&scene);
        assert_eq!(5, restored.number_of_selected_files());
        assert_eq!(0, restored.entry(SCENE_FILE_TAG).unwrap().files.len());
        assert_eq!(Some("Human"), restored.species());
    }
}
