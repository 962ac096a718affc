// Functions for importing FreeSurfer brain surface meshes from binary 'surf' files.
// These files store a triangular mesh, where each vertex if defined by its x,y,z coord and
// each face is defined by 3 vertices, stored as 3 indices into the vertices.
// A brain set imports the vertices as a coordinate file and the faces as a topology file.


use byteordered::ByteOrdered;
use ndarray::Array2;

use std::io::Read;
use std::path::Path;

use crate::caret_coord::{CoordinateFile, SurfaceType};
use crate::caret_topo::{TopologyFile, TopologyType};
use crate::error::{BrainSetError, Result};
use crate::util::{basename, capacity_hint, checked_count, open_input};

pub const TRIS_MAGIC_FILE_TYPE_NUMBER: i32 = 16777214;

#[derive(Debug, Clone, PartialEq)]
pub struct FsSurfaceHeader {
    pub surf_magic: [u8; 3],
    pub info_line: String,
    pub num_vertices: i32,
    pub num_faces: i32,
}


impl Default for FsSurfaceHeader {
    fn default() -> FsSurfaceHeader {
        FsSurfaceHeader {
            surf_magic: [255; 3],
            info_line: String::from(""),
            num_vertices: 0,
            num_faces: 0
        }
    }
}

impl FsSurfaceHeader {

    /// Read an FsSurface header from the given byte stream.
    /// It is assumed that the input is currently at the start of the
    /// FsSurface header.
    pub fn from_reader<S>(input: &mut S, name: &str) -> Result<FsSurfaceHeader>
    where
        S: Read,
    {
        let mut hdr = FsSurfaceHeader::default();

        let mut input = ByteOrdered::be(input);

        for v in &mut hdr.surf_magic {
            *v = input.read_u8()?;
        }

        let magic: i32 = interpret_fs_int24(hdr.surf_magic[0], hdr.surf_magic[1], hdr.surf_magic[2]);
        if magic != TRIS_MAGIC_FILE_TYPE_NUMBER {
            return Err(BrainSetError::InvalidFormat(name.to_string(), String::from("Invalid FreeSurfer surf file")));
        }

        // The info line ends with two newline characters.
        let mut info_line = String::new();
        loop {
            let cur_char = input.read_u8()? as char;
            if cur_char == '\n' && info_line.ends_with('\n') {
                info_line.pop();
                break;
            }
            info_line.push(cur_char);
        }

        hdr.info_line = info_line;
        hdr.num_vertices = input.read_i32()?;
        hdr.num_faces = input.read_i32()?;

        if hdr.num_vertices < 0 || hdr.num_faces < 0 {
            return Err(BrainSetError::InvalidFormat(name.to_string(), String::from("negative number of vertices or faces")));
        }
        Ok(hdr)
    }
}


/// Interpret three bytes as a single 24 bit integer, FreeSurfer style.
pub fn interpret_fs_int24(b1: u8, b2:u8, b3:u8) -> i32 {
    ((b1 as i32) << 16) + ((b2 as i32) << 8) + b3 as i32
}


// An FsSurface object
#[derive(Debug, PartialEq, Clone)]
pub struct FsSurface {
    pub header: FsSurfaceHeader,
    pub mesh: BrainMesh,
}

// A Brain Mesh
#[derive(Debug, PartialEq, Clone)]
pub struct BrainMesh {
    pub vertices: Vec<f32>,
    pub faces: Vec<i32>,
}


/// Read a FreeSurfer surface file.
pub fn read_surf<P: AsRef<Path>>(path: P) -> Result<FsSurface> {
    FsSurface::from_file(path)
}


impl FsSurface {
    /// Read an FsSurface instance from a file.
    /// If the file's name ends with ".gz", the file is assumed to need GZip decoding. This is not typically the case
    /// for FreeSurfer Surface files, but very handy (and it helps us to reduce the size of our test data).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FsSurface> {
        let mut input = open_input(&path)?;
        FsSurface::from_reader(&mut input, &basename(&path)).map_err(|e| e.in_file(&path))
    }

    pub fn from_reader<S: Read>(input: &mut S, name: &str) -> Result<FsSurface> {
        let header = FsSurfaceHeader::from_reader(input, name)?;
        let mut input = ByteOrdered::be(input);

        let num_coords = checked_count(name, &[header.num_vertices as usize, 3])?;
        let mut vertices : Vec<f32> = Vec::with_capacity(capacity_hint(num_coords));
        for _ in 0..num_coords {
            vertices.push(input.read_f32()?);
        }

        let num_indices = checked_count(name, &[header.num_faces as usize, 3])?;
        let mut faces : Vec<i32> = Vec::with_capacity(capacity_hint(num_indices));
        for _ in 0..num_indices {
            let f = input.read_i32()?;
            if f < 0 || f >= header.num_vertices {
                return Err(BrainSetError::InvalidFormat(name.to_string(), format!("face references vertex {} of {}", f, header.num_vertices)));
            }
            faces.push(f);
        }

        Ok(FsSurface { header, mesh: BrainMesh { vertices, faces } })
    }

    /// The vertices as a Caret coordinate file of the given surface type.
    pub fn to_coordinate_file(&self, surface_type: SurfaceType) -> Result<CoordinateFile> {
        let coordinates = Array2::from_shape_vec((self.header.num_vertices as usize, 3), self.mesh.vertices.clone())
            .map_err(|e| BrainSetError::InvalidFormat(self.header.info_line.clone(), e.to_string()))?;
        let mut coords = CoordinateFile::new(coordinates);
        coords.set_surface_type(surface_type);
        Ok(coords)
    }

    /// The faces as a Caret topology file of the given type.
    pub fn to_topology_file(&self, topology_type: TopologyType) -> TopologyFile {
        let tiles = self.mesh.faces
            .chunks(3)
            .map(|f| [f[0] as usize, f[1] as usize, f[2] as usize])
            .collect();
        let mut topo = TopologyFile::new(topology_type, tiles);
        topo.num_nodes = topo.num_nodes.max(self.header.num_vertices as usize);
        topo
    }
}
