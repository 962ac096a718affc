//! Functions for managing Caret topology files.
//!
//! A topology file stores the connectivity of a surface mesh: a list of triangles (tiles), each given
//! as three 0-based node indices. It knows nothing about node positions, which live in coordinate files.
//! The `perimeter_id` header tag tells what kind of surface the mesh describes (closed, open, cut, ...).

use byteordered::ByteOrdered;

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::caret_header::{CaretHeader, FileEncoding, TAG_PERIMETER_ID};
use crate::error::{BrainSetError, Result};
use crate::util::{basename, capacity_hint, next_line, next_non_empty_line, open_input, OutputFile};

pub const TOPO_VERSION_TAG: &str = "tag-version";
pub const TOPO_FILE_VERSION: i32 = 1;


/// The kind of surface a topology describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyType {
    Closed,
    Open,
    Cut,
    LobarCut,
    Unknown,
}

impl Default for TopologyType {
    fn default() -> TopologyType {
        TopologyType::Unknown
    }
}

impl TopologyType {
    pub const ALL: [TopologyType; 5] = [
        TopologyType::Closed,
        TopologyType::Open,
        TopologyType::Cut,
        TopologyType::LobarCut,
        TopologyType::Unknown,
    ];

    /// Parse the value of a `perimeter_id` header tag. Unrecognized values (including "UNSPECIFIED") give `Unknown`.
    pub fn from_perimeter_id(value: &str) -> TopologyType {
        match value.trim().to_ascii_uppercase().as_str() {
            "CLOSED" => TopologyType::Closed,
            "OPEN" => TopologyType::Open,
            "CUT" => TopologyType::Cut,
            "LOBAR_CUT" => TopologyType::LobarCut,
            _ => TopologyType::Unknown,
        }
    }

    pub fn perimeter_id(&self) -> &'static str {
        match self {
            TopologyType::Closed => "CLOSED",
            TopologyType::Open => "OPEN",
            TopologyType::Cut => "CUT",
            TopologyType::LobarCut => "LOBAR_CUT",
            TopologyType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TopologyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.perimeter_id())
    }
}


/// Models a Caret topology file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TopologyFile {
    pub header: CaretHeader,
    /// The name of the file this topology was read from or written to. Empty for topologies built in memory.
    pub filename: String,
    pub topology_type: TopologyType,
    pub tiles: Vec<[usize; 3]>,
    /// Number of nodes addressed by this topology. At least the largest node index in the tiles plus one.
    pub num_nodes: usize,
}


/// Read a Caret topology file.
///
/// # Examples
///
/// ```no_run
/// let topo = brainset::read_topology("Human.colin.L.CLOSED.topo").unwrap();
/// println!("{} tiles for {} nodes", topo.num_tiles(), topo.num_nodes);
/// ```
pub fn read_topology<P: AsRef<Path>>(path: P) -> Result<TopologyFile> {
    TopologyFile::from_file(path)
}


impl TopologyFile {

    /// Create a topology from triangles. The number of nodes is derived from the largest node index.
    pub fn new(topology_type: TopologyType, tiles: Vec<[usize; 3]>) -> TopologyFile {
        let num_nodes = max_node_count(&tiles);
        let mut topo = TopologyFile {
            tiles,
            num_nodes,
            ..Default::default()
        };
        topo.set_topology_type(topology_type);
        topo
    }

    pub fn num_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Change the topology type, keeping the `perimeter_id` header tag in sync.
    pub fn set_topology_type(&mut self, topology_type: TopologyType) {
        self.topology_type = topology_type;
        self.header.set(TAG_PERIMETER_ID, topology_type.perimeter_id());
    }


    /// Read a topology from a file. If the file's name ends with ".gz", it is GZip decoded.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TopologyFile> {
        let mut input = open_input(&path)?;
        let mut topo = TopologyFile::from_reader(&mut input, &basename(&path))
            .map_err(|e| e.in_file(&path))?;
        topo.filename = path.as_ref().to_string_lossy().into_owned();
        Ok(topo)
    }


    /// Read a topology from the given stream. The `name` is only used in error messages.
    pub fn from_reader<R: BufRead + ?Sized>(input: &mut R, name: &str) -> Result<TopologyFile> {
        let (header, leftover) = CaretHeader::from_reader(input)?;
        let encoding = header.encoding();
        let topology_type = header.get(TAG_PERIMETER_ID)
            .map(TopologyType::from_perimeter_id)
            .unwrap_or_default();

        let first = match leftover {
            Some(line) => line,
            None => next_non_empty_line(input)?
                .ok_or_else(|| invalid(name, "file contains no topology data"))?,
        };

        let (tiles, declared_nodes) = if first.trim_start().starts_with(TOPO_VERSION_TAG) {
            let version: i32 = first.trim_start()[TOPO_VERSION_TAG.len()..].trim().parse()
                .map_err(|_| invalid(name, &format!("invalid version line '{}'", first)))?;
            if version != TOPO_FILE_VERSION {
                return Err(BrainSetError::UnsupportedFormat(name.to_string(), format!("topology file version {} is not supported", version)));
            }
            let tiles = match encoding {
                FileEncoding::Ascii => read_tiles_ascii(input, name, false)?,
                FileEncoding::Binary => read_tiles_binary(input, name)?,
            };
            (tiles, 0)
        } else {
            if encoding == FileEncoding::Binary {
                return Err(BrainSetError::UnsupportedFormat(name.to_string(), String::from("binary version 0 topology files are not supported")));
            }
            read_version0(input, name, &first)?
        };

        let num_nodes = max_node_count(&tiles).max(declared_nodes);
        Ok(TopologyFile {
            header,
            filename: String::new(),
            topology_type,
            tiles,
            num_nodes,
        })
    }


    /// Write the topology to a file in format version 1. Names ending with ".gz" are GZip compressed.
    pub fn to_file<P: AsRef<Path>>(&self, path: P, encoding: FileEncoding) -> Result<()> {
        let mut out = OutputFile::create(&path)?;
        self.write_to(&mut out, encoding).map_err(|e| e.in_file(&path))?;
        out.finish().map_err(|e| e.in_file(&path))
    }

    pub fn write_to<W: Write>(&self, out: &mut W, encoding: FileEncoding) -> Result<()> {
        let mut header = self.header.clone();
        header.set_encoding(encoding);
        header.set(TAG_PERIMETER_ID, self.topology_type.perimeter_id());
        header.write_to(out)?;
        writeln!(out, "{} {}", TOPO_VERSION_TAG, TOPO_FILE_VERSION)?;
        match encoding {
            FileEncoding::Ascii => {
                writeln!(out, "{}", self.tiles.len())?;
                for t in &self.tiles {
                    writeln!(out, "{} {} {}", t[0], t[1], t[2])?;
                }
            }
            FileEncoding::Binary => {
                let mut out = ByteOrdered::be(out);
                out.write_i32(self.tiles.len() as i32)?;
                for t in &self.tiles {
                    for &n in t {
                        out.write_i32(n as i32)?;
                    }
                }
            }
        }
        Ok(())
    }
}


fn invalid(name: &str, msg: &str) -> BrainSetError {
    BrainSetError::InvalidFormat(name.to_string(), msg.to_string())
}


fn max_node_count(tiles: &[[usize; 3]]) -> usize {
    tiles.iter()
        .flat_map(|t| t.iter())
        .max()
        .map(|m| m + 1)
        .unwrap_or(0)
}


fn parse_node_index(token: &str, name: &str) -> Result<usize> {
    let idx: i64 = token.parse().map_err(|_| invalid(name, &format!("invalid node index '{}'", token)))?;
    if idx < 0 {
        return Err(invalid(name, &format!("negative node index {}", idx)));
    }
    if idx > i32::MAX as i64 {
        return Err(invalid(name, &format!("node index {} is too large", idx)));
    }
    Ok(idx as usize)
}


fn parse_tile_count(line: Option<String>, name: &str) -> Result<usize> {
    let line = line.ok_or_else(|| invalid(name, "missing number of tiles"))?;
    let num_tiles: i64 = line.trim().parse()
        .map_err(|_| invalid(name, &format!("invalid number of tiles '{}'", line)))?;
    if num_tiles < 0 {
        return Err(invalid(name, "Number of tiles is less than zero"));
    }
    Ok(num_tiles as usize)
}


/// Version 0 files store tiles in clockwise order, so they are reversed when `clockwise` is set.
fn read_tiles_ascii<R: BufRead + ?Sized>(input: &mut R, name: &str, clockwise: bool) -> Result<Vec<[usize; 3]>> {
    let num_tiles = parse_tile_count(next_non_empty_line(input)?, name)?;
    let mut tiles = Vec::with_capacity(capacity_hint(num_tiles));
    for i in 0..num_tiles {
        let line = next_line(input)?
            .ok_or_else(|| invalid(name, &format!("expected {} tiles, found {}", num_tiles, i)))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            return Err(invalid(name, &format!("invalid tile line '{}'", line)));
        }
        let t1 = parse_node_index(tokens[0], name)?;
        let t2 = parse_node_index(tokens[1], name)?;
        let t3 = parse_node_index(tokens[2], name)?;
        if clockwise {
            tiles.push([t3, t2, t1]);
        } else {
            tiles.push([t1, t2, t3]);
        }
    }
    Ok(tiles)
}


fn read_tiles_binary<R: BufRead + ?Sized>(input: &mut R, name: &str) -> Result<Vec<[usize; 3]>> {
    let mut input = ByteOrdered::be(input);
    let num_tiles = input.read_i32()?;
    if num_tiles < 0 {
        return Err(invalid(name, "Number of tiles is less than zero"));
    }
    let mut tiles = Vec::with_capacity(capacity_hint(num_tiles as usize));
    for _ in 0..num_tiles {
        let mut tile = [0usize; 3];
        for v in &mut tile {
            let idx = input.read_i32()?;
            if idx < 0 {
                return Err(invalid(name, &format!("negative node index {}", idx)));
            }
            *v = idx as usize;
        }
        tiles.push(tile);
    }
    Ok(tiles)
}


/// Version 0 files start with a node table (one line per node, followed by one line per neighbor), then the tiles.
fn read_version0<R: BufRead + ?Sized>(input: &mut R, name: &str, first: &str) -> Result<(Vec<[usize; 3]>, usize)> {
    let num_nodes: usize = first.trim().parse()
        .map_err(|_| invalid(name, &format!("invalid number of nodes '{}'", first)))?;
    if num_nodes > i32::MAX as usize {
        return Err(invalid(name, &format!("number of nodes {} is too large", num_nodes)));
    }

    for node in 0..num_nodes {
        let line = next_line(input)?
            .ok_or_else(|| invalid(name, &format!("missing node table entry for node {}", node)))?;
        let num_neighbors: usize = line.split_whitespace()
            .nth(1)
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| invalid(name, &format!("invalid node table line '{}'", line)))?;
        for _ in 0..num_neighbors {
            next_line(input)?;
        }
    }

    let tiles = read_tiles_ascii(input, name, true)?;
    Ok((tiles, num_nodes))
}
