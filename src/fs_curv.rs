// Functions for importing FreeSurfer per-vertex data from binary 'curv' files.
// These files store 1 scalar value (typically a morphological descriptor, like cortical thickness at that point)
// for each vertex of the respective brain surface mesh. A brain set imports them as surface shape columns.


use byteordered::ByteOrdered;

use std::io::Read;
use std::path::Path;

use crate::caret_nodedata::{NodeAttributeKind, NodeDataFile};
use crate::error::{BrainSetError, Result};
use crate::util::{basename, capacity_hint, open_input};

pub const CURV_MAGIC_FILE_TYPE_NUMBER: i32 = 16777215;


#[derive(Debug, Clone, PartialEq)]
pub struct CurvHeader {
    pub curv_magic: [u8; 3],
    pub num_vertices: i32,
    pub num_faces: i32,
    pub num_values_per_vertex: i32,
}


impl Default for CurvHeader {
    fn default() -> CurvHeader {
        CurvHeader {
            curv_magic: [255; 3],
            num_vertices: 0,
            num_faces: 0,
            num_values_per_vertex: 1,
        }
    }
}

impl CurvHeader {

    /// Read a Curv header from the given byte stream.
    /// It is assumed that the input is currently at the start of the
    /// Curv header.
    pub fn from_reader<S>(input: &mut S, name: &str) -> Result<CurvHeader>
    where
        S: Read,
    {
        let mut hdr = CurvHeader::default();

        let mut input = ByteOrdered::be(input);

        for v in &mut hdr.curv_magic {
            *v = input.read_u8()?;
        }

        let magic = crate::fs_surface::interpret_fs_int24(hdr.curv_magic[0], hdr.curv_magic[1], hdr.curv_magic[2]);
        if magic != CURV_MAGIC_FILE_TYPE_NUMBER {
            return Err(BrainSetError::InvalidFormat(name.to_string(), String::from("Invalid Curv file")));
        }

        hdr.num_vertices = input.read_i32()?;
        hdr.num_faces = input.read_i32()?;
        hdr.num_values_per_vertex = input.read_i32()?;

        if hdr.num_vertices < 0 || hdr.num_values_per_vertex != 1 {
            return Err(BrainSetError::InvalidFormat(name.to_string(), String::from("Curv files must store one value for each of a non-negative number of vertices")));
        }
        Ok(hdr)
    }
}


/// A FreeSurfer curv file: a header and one value per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct FsCurv {
    pub header: CurvHeader,
    pub data: Vec<f32>,
}


/// Read a FreeSurfer curv file.
/// If the file's name ends with ".gz", the file is assumed to need GZip decoding. This is not typically the case
/// for FreeSurfer Curv files, but very handy (and it helps us to reduce the size of our test data).
pub fn read_curv<P: AsRef<Path>>(path: P) -> Result<FsCurv> {
    let mut input = open_input(&path)?;
    FsCurv::from_reader(&mut input, &basename(&path)).map_err(|e| e.in_file(&path))
}


impl FsCurv {
    pub fn from_reader<S: Read>(input: &mut S, name: &str) -> Result<FsCurv> {
        let header = CurvHeader::from_reader(input, name)?;
        let mut input = ByteOrdered::be(input);
        let mut data = Vec::with_capacity(capacity_hint(header.num_vertices as usize));
        for _ in 0..header.num_vertices {
            data.push(input.read_f32()?);
        }
        Ok(FsCurv { header, data })
    }

    /// A surface shape file with the values as its only column.
    pub fn to_surface_shape_file(&self, column_name: &str) -> Result<NodeDataFile<f32>> {
        let mut shape: NodeDataFile<f32> = NodeDataFile::new(NodeAttributeKind::SurfaceShape);
        shape.add_column(column_name, self.data.clone())?;
        Ok(shape)
    }
}
