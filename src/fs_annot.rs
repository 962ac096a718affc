//! Functions for importing FreeSurfer brain surface parcellations from annot files.
//!
//! These files assign each vertex of a brain surface mesh to exactly one brain region
//! or label. A so-called colortable contains data on the regions, including the region's
//! name, an RGB display color, and a unique identifier. A brain set imports a parcellation
//! as one paint column, with the region names as paint names.

use byteordered::ByteOrdered;

use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::caret_nodedata::{NodeAttributeKind, NodeDataFile};
use crate::util::{basename, capacity_hint, open_input, read_fixed_length_string};
use crate::error::{BrainSetError, Result};


#[derive(Debug, Clone, PartialEq)]
pub struct FsAnnotColortable {
    pub id: Vec<i32>,  // A region index, not really needed. The 'label' is unique as well and more relevant, see below.
    pub name: Vec<String>,
    pub r: Vec<i32>,
    pub g: Vec<i32>,
    pub b: Vec<i32>,
    pub a: Vec<i32>,
    pub label: Vec<i32>, // A unique label computed from r,g,b. Used in annot.vertex_labels to identify the region.
}

impl FsAnnotColortable {

    /// Read a colortable in format version 2 from a reader. The reader must be at the start position of the colortable.
    pub fn from_reader<S>(input: &mut S) -> Result<FsAnnotColortable>
    where
        S: Read,
    {
        let mut input = ByteOrdered::be(input);

        let num_chars_orig_filename: i32 = input.read_i32()?; // Length of following string.
        let _orig_filename = read_fixed_length_string(&mut input, num_chars_orig_filename.max(0) as usize)?;
        let num_entries: i32 = input.read_i32()?; // Yes, it is stored twice. Once here, once before.
        let num_entries = num_entries.max(0) as usize;

        let mut ct = FsAnnotColortable {
            id: Vec::with_capacity(capacity_hint(num_entries)),
            name: Vec::with_capacity(capacity_hint(num_entries)),
            r: Vec::with_capacity(capacity_hint(num_entries)),
            g: Vec::with_capacity(capacity_hint(num_entries)),
            b: Vec::with_capacity(capacity_hint(num_entries)),
            a: Vec::with_capacity(capacity_hint(num_entries)),
            label: Vec::with_capacity(capacity_hint(num_entries)),
        };

        for _ in 0..num_entries {
            ct.id.push(input.read_i32()?);
            let num_chars_region_name: i32 = input.read_i32()?; // Length of following string.
            ct.name.push(read_fixed_length_string(&mut input, num_chars_region_name.max(0) as usize)?);
            let (r, g, b, a) = (input.read_i32()?, input.read_i32()?, input.read_i32()?, input.read_i32()?);
            ct.r.push(r);
            ct.g.push(g);
            ct.b.push(b);
            ct.a.push(a);
            ct.label.push(r + g * (1 << 8) + b * (1 << 16) + a * (1 << 24));
        }

        Ok(ct)
    }
}

impl fmt::Display for FsAnnotColortable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Colortable for {} brain regions.", self.id.len())
    }
}


/// Models a FreeSurfer brain surface parcellation from an annot file. The `vertex_labels` field contains the
/// mesh vertices in order, and assigns to each vertex a brain region using the `label` field (not the `id` field!)
/// from the `colortable`.
#[derive(Debug, Clone, PartialEq)]
pub struct FsAnnot {
    pub vertex_indices: Vec<i32>, // 0-based indices, not really needed as all vertices need to be covered in order.
    pub vertex_labels: Vec<i32>,
    pub colortable: FsAnnotColortable,
}


/// Read a brain parcellation from a FreeSurfer annot file.
pub fn read_annot<P: AsRef<Path>>(path: P) -> Result<FsAnnot> {
    FsAnnot::from_file(path)
}


impl FsAnnot {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FsAnnot> {
        let mut input = open_input(&path)?;
        FsAnnot::from_reader(&mut input, &basename(&path)).map_err(|e| e.in_file(&path))
    }

    pub fn from_reader<S: Read>(input: &mut S, name: &str) -> Result<FsAnnot> {
        let mut file = ByteOrdered::be(input);

        let num_vertices: i32 = file.read_i32()?;
        if num_vertices < 0 {
            return Err(BrainSetError::InvalidFormat(name.to_string(), String::from("negative number of vertices")));
        }

        let mut vertex_indices : Vec<i32> = Vec::with_capacity(capacity_hint(num_vertices as usize));
        let mut vertex_labels : Vec<i32> = Vec::with_capacity(capacity_hint(num_vertices as usize));
        for _ in 0..num_vertices {
            vertex_indices.push(file.read_i32()?);
            vertex_labels.push(file.read_i32()?);
        }

        let has_colortable: i32 = file.read_i32()?;
        let num_colortable_entries: i32 = if has_colortable == 1 { file.read_i32()? } else { 0 };

        // If this is negative, the absolute value encodes the file format version. We only support version 2.
        if num_colortable_entries != -2 {
            return Err(BrainSetError::UnsupportedFormat(name.to_string(), String::from("only annot files with a version 2 colortable are supported")));
        }
        let _num_colortable_entries: i32 = file.read_i32()?;  // For version 2, the next i32 stores the actual number of entries.
        let colortable = FsAnnotColortable::from_reader(&mut file)?;

        Ok(FsAnnot {
            vertex_indices,
            vertex_labels,
            colortable,
        })
    }

    /// Get the region names contained in the [`FsAnnot`] struct.
    pub fn regions(&self) -> &[String] {
        &self.colortable.name
    }

    /// Returns the indices into the colortable fields for each vertex.
    ///
    /// # Parameters
    ///
    /// * `unmatched_region_index`: The region index to use for vertices with a label that does not match any region label. Typically they are assigned to an `unknown` region, which should be at the start of the colortable (at index `0`).
    pub fn vertex_colortable_indices(&self, unmatched_region_index : usize) -> Vec<usize> {
        self.vertex_labels.iter()
            .map(|vlabel| self.colortable.label.iter().position(|l| l == vlabel).unwrap_or(unmatched_region_index))
            .collect()
    }

    /// Convert the parcellation into a paint file with a single column. Region names become the paint names.
    pub fn to_paint_file(&self, column_name: &str) -> Result<NodeDataFile<i32>> {
        let mut paint: NodeDataFile<i32> = NodeDataFile::new(NodeAttributeKind::Paint);
        paint.label_names = self.colortable.name.clone();
        let values = self.vertex_colortable_indices(0).into_iter().map(|i| i as i32).collect();
        paint.add_column(column_name, values)?;
        Ok(paint)
    }
}


impl fmt::Display for FsAnnot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Surface parcellation assigning {} vertices to {} brain regions.", self.vertex_indices.len(), self.colortable.id.len())
    }
}
