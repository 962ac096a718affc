//! Functions for managing Caret coordinate files.
//!
//! A coordinate file stores one 3D position per surface node. Together with a topology file it
//! forms a surface. The `configuration_id` header tag names the geometric role of the surface, see [`SurfaceType`].

use byteordered::ByteOrdered;
use ndarray::{Array2, ArrayView1};

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::caret_header::{CaretHeader, FileEncoding};
use crate::caret_topo::TopologyType;
use crate::error::{BrainSetError, Result};
use crate::util::{basename, capacity_hint, checked_count, format_float, next_line, next_non_empty_line, open_input, OutputFile};

pub const TAG_CONFIGURATION_ID: &str = "configuration_id";


/// The geometric role of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceType {
    Raw,
    Fiducial,
    Inflated,
    VeryInflated,
    Spherical,
    Ellipsoidal,
    CompressedMedialWall,
    Flat,
    FlatLobar,
    Hull,
    Unknown,
}

impl Default for SurfaceType {
    fn default() -> SurfaceType {
        SurfaceType::Unknown
    }
}

impl SurfaceType {
    /// All surface types, in the order coordinate files are loaded from a spec file.
    pub const LOAD_ORDER: [SurfaceType; 11] = [
        SurfaceType::Raw,
        SurfaceType::Fiducial,
        SurfaceType::Inflated,
        SurfaceType::VeryInflated,
        SurfaceType::Spherical,
        SurfaceType::Ellipsoidal,
        SurfaceType::CompressedMedialWall,
        SurfaceType::Flat,
        SurfaceType::FlatLobar,
        SurfaceType::Hull,
        SurfaceType::Unknown,
    ];

    pub fn from_configuration_id(value: &str) -> SurfaceType {
        match value.trim() {
            "RAW" => SurfaceType::Raw,
            "FIDUCIAL" => SurfaceType::Fiducial,
            "INFLATED" => SurfaceType::Inflated,
            "VERY_INFLATED" => SurfaceType::VeryInflated,
            "SPHERICAL" => SurfaceType::Spherical,
            "ELLIPSOIDAL" => SurfaceType::Ellipsoidal,
            "CMW" => SurfaceType::CompressedMedialWall,
            "FLAT" => SurfaceType::Flat,
            "FLAT_LOBAR" => SurfaceType::FlatLobar,
            "HULL" => SurfaceType::Hull,
            _ => SurfaceType::Unknown,
        }
    }

    pub fn configuration_id(&self) -> &'static str {
        match self {
            SurfaceType::Raw => "RAW",
            SurfaceType::Fiducial => "FIDUCIAL",
            SurfaceType::Inflated => "INFLATED",
            SurfaceType::VeryInflated => "VERY_INFLATED",
            SurfaceType::Spherical => "SPHERICAL",
            SurfaceType::Ellipsoidal => "ELLIPSOIDAL",
            SurfaceType::CompressedMedialWall => "CMW",
            SurfaceType::Flat => "FLAT",
            SurfaceType::FlatLobar => "FLAT_LOBAR",
            SurfaceType::Hull => "HULL",
            SurfaceType::Unknown => "UNKNOWN",
        }
    }

    /// The topology a surface of this type is displayed with when none is given explicitly.
    pub fn default_topology_type(&self) -> TopologyType {
        match self {
            SurfaceType::Flat => TopologyType::Cut,
            SurfaceType::FlatLobar => TopologyType::LobarCut,
            _ => TopologyType::Closed,
        }
    }
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.configuration_id())
    }
}


/// Models a Caret coordinate file.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateFile {
    pub header: CaretHeader,
    pub filename: String,
    /// Node positions, one row of x, y, z per node.
    pub coordinates: Array2<f32>,
}

impl Default for CoordinateFile {
    fn default() -> CoordinateFile {
        CoordinateFile {
            header: CaretHeader::default(),
            filename: String::new(),
            coordinates: Array2::zeros((0, 3)),
        }
    }
}


/// Read a Caret coordinate file.
pub fn read_coordinates<P: AsRef<Path>>(path: P) -> Result<CoordinateFile> {
    CoordinateFile::from_file(path)
}


impl CoordinateFile {

    pub fn new(coordinates: Array2<f32>) -> CoordinateFile {
        CoordinateFile {
            coordinates,
            ..Default::default()
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.coordinates.nrows()
    }

    pub fn coordinate(&self, node: usize) -> ArrayView1<f32> {
        self.coordinates.row(node)
    }

    /// The surface type named in the `configuration_id` header tag.
    pub fn surface_type(&self) -> SurfaceType {
        self.header.get(TAG_CONFIGURATION_ID)
            .map(SurfaceType::from_configuration_id)
            .unwrap_or_default()
    }

    pub fn set_surface_type(&mut self, surface_type: SurfaceType) {
        self.header.set(TAG_CONFIGURATION_ID, surface_type.configuration_id());
    }

    /// Minimum and maximum of x, y and z: `[xmin, xmax, ymin, ymax, zmin, zmax]`. All zero for empty files.
    pub fn bounds(&self) -> [f32; 6] {
        if self.num_nodes() == 0 {
            return [0.0; 6];
        }
        let mut b = [f32::MAX, f32::MIN, f32::MAX, f32::MIN, f32::MAX, f32::MIN];
        for row in self.coordinates.outer_iter() {
            for axis in 0..3 {
                b[axis * 2] = b[axis * 2].min(row[axis]);
                b[axis * 2 + 1] = b[axis * 2 + 1].max(row[axis]);
            }
        }
        b
    }


    /// Read coordinates from a file. If the file's name ends with ".gz", it is GZip decoded.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CoordinateFile> {
        let mut input = open_input(&path)?;
        let mut coords = CoordinateFile::from_reader(&mut input, &basename(&path))
            .map_err(|e| e.in_file(&path))?;
        coords.filename = path.as_ref().to_string_lossy().into_owned();
        Ok(coords)
    }


    /// Read coordinates from the given stream. The `name` is only used in error messages.
    pub fn from_reader<R: BufRead + ?Sized>(input: &mut R, name: &str) -> Result<CoordinateFile> {
        let (header, leftover) = CaretHeader::from_reader(input)?;

        let values = match header.encoding() {
            FileEncoding::Ascii => {
                let first = match leftover {
                    Some(line) => Some(line),
                    None => next_non_empty_line(input)?,
                };
                read_coords_ascii(input, name, first)?
            }
            FileEncoding::Binary => read_coords_binary(input, name)?,
        };

        let num_nodes = values.len() / 3;
        let coordinates = Array2::from_shape_vec((num_nodes, 3), values)
            .map_err(|e| BrainSetError::InvalidFormat(name.to_string(), e.to_string()))?;

        Ok(CoordinateFile {
            header,
            filename: String::new(),
            coordinates,
        })
    }


    /// Write the coordinates to a file. Names ending with ".gz" are GZip compressed.
    pub fn to_file<P: AsRef<Path>>(&self, path: P, encoding: FileEncoding, digits: usize) -> Result<()> {
        let mut out = OutputFile::create(&path)?;
        self.write_to(&mut out, encoding, digits).map_err(|e| e.in_file(&path))?;
        out.finish().map_err(|e| e.in_file(&path))
    }

    /// Write the coordinates. ASCII output uses `digits` digits right of the decimal point.
    pub fn write_to<W: Write>(&self, out: &mut W, encoding: FileEncoding, digits: usize) -> Result<()> {
        let mut header = self.header.clone();
        header.set_encoding(encoding);
        header.write_to(out)?;
        match encoding {
            FileEncoding::Ascii => {
                writeln!(out, "{}", self.num_nodes())?;
                for (i, row) in self.coordinates.outer_iter().enumerate() {
                    writeln!(out, "{} {} {} {}", i,
                        format_float(row[0], digits), format_float(row[1], digits), format_float(row[2], digits))?;
                }
            }
            FileEncoding::Binary => {
                let mut out = ByteOrdered::be(out);
                out.write_i32(self.num_nodes() as i32)?;
                for v in self.coordinates.iter() {
                    out.write_f32(*v)?;
                }
            }
        }
        Ok(())
    }
}


fn read_coords_ascii<R: BufRead + ?Sized>(input: &mut R, name: &str, first: Option<String>) -> Result<Vec<f32>> {
    let first = first.ok_or_else(|| BrainSetError::InvalidFormat(name.to_string(), String::from("missing number of coordinates")))?;
    let num: i64 = first.trim().parse()
        .map_err(|_| BrainSetError::InvalidFormat(name.to_string(), format!("invalid number of coordinates '{}'", first)))?;
    if num < 0 {
        return Err(BrainSetError::InvalidFormat(name.to_string(), String::from("Number of coordinates is less than zero.")));
    }

    let num = num as usize;
    let mut values = Vec::with_capacity(capacity_hint(checked_count(name, &[num, 3])?));
    for i in 0..num {
        let line = next_line(input)?
            .ok_or_else(|| BrainSetError::InvalidFormat(name.to_string(), format!("expected {} coordinates, found {}", num, i)))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(BrainSetError::InvalidFormat(name.to_string(), format!("invalid coordinate line '{}'", line)));
        }
        for t in &tokens[1..4] {
            let v: f32 = t.parse()
                .map_err(|_| BrainSetError::InvalidFormat(name.to_string(), format!("invalid coordinate '{}'", t)))?;
            values.push(v);
        }
    }
    Ok(values)
}


fn read_coords_binary<R: BufRead + ?Sized>(input: &mut R, name: &str) -> Result<Vec<f32>> {
    let mut input = ByteOrdered::be(input);
    let num = input.read_i32()?;
    if num < 0 {
        return Err(BrainSetError::InvalidFormat(name.to_string(), String::from("Number of coordinates is less than zero.")));
    }
    let num_values = checked_count(name, &[num as usize, 3])?;
    let mut values = Vec::with_capacity(capacity_hint(num_values));
    for _ in 0..num_values {
        values.push(input.read_f32()?);
    }
    Ok(values)
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn an_ascii_coordinate_file_can_be_read() {
        let text = "BeginHeader\nconfiguration_id FIDUCIAL\nEndHeader\n2\n0 1.0 2.0 3.0\n1 -1.5 0.0 4.25\n";
        let coords = CoordinateFile::from_reader(&mut Cursor::new(text), "test.coord").unwrap();
        assert_eq!(2, coords.num_nodes());
        assert_eq!(SurfaceType::Fiducial, coords.surface_type());
        assert_abs_diff_eq!(coords.coordinates, array![[1.0f32, 2.0, 3.0], [-1.5, 0.0, 4.25]], epsilon = 1e-6);
    }

    #[test]
    fn a_negative_count_is_rejected() {
        let err = CoordinateFile::from_reader(&mut Cursor::new("-2\n"), "bad.coord").unwrap_err();
        assert!(err.to_string().contains("less than zero"));
    }

    #[test]
    fn huge_counts_are_rejected_without_allocating() {
        let err = CoordinateFile::from_reader(&mut Cursor::new("4000000000000000000\n"), "bad.coord").unwrap_err();
        assert!(matches!(err, BrainSetError::InvalidFormat(_, _)));

        let err = CoordinateFile::from_reader(&mut Cursor::new("1000000000000\n0 1.0 2.0 3.0\n"), "bad.coord").unwrap_err();
        assert!(err.to_string().contains("found 1"));

        let mut binary = b"BeginHeader\nencoding BINARY\nEndHeader\n".to_vec();
        binary.extend_from_slice(&i32::MAX.to_be_bytes());
        assert!(CoordinateFile::from_reader(&mut Cursor::new(binary), "bad.coord").is_err());
    }

    #[test]
    fn short_coordinate_lines_are_rejected() {
        let err = CoordinateFile::from_reader(&mut Cursor::new("1\n0 1.0 2.0\n"), "short.coord").unwrap_err();
        assert!(err.to_string().contains("short.coord"));
    }

    #[test]
    fn coordinates_survive_writing_in_both_encodings() {
        let dir = tempdir().unwrap();
        let mut coords = CoordinateFile::new(array![[0.5, 1.5, 2.5], [3.0, -4.0, 5.125]]);
        coords.set_surface_type(SurfaceType::Inflated);

        let ascii = dir.path().join("a.coord");
        coords.to_file(&ascii, FileEncoding::Ascii, 3).unwrap();
        let back = read_coordinates(&ascii).unwrap();
        assert_abs_diff_eq!(coords.coordinates, back.coordinates, epsilon = 1e-3);
        assert_eq!(SurfaceType::Inflated, back.surface_type());

        let binary = dir.path().join("b.coord.gz");
        coords.to_file(&binary, FileEncoding::Binary, 3).unwrap();
        let back = read_coordinates(&binary).unwrap();
        assert_eq!(coords.coordinates, back.coordinates);
    }

    #[test]
    fn bounds_cover_all_nodes() {
        let coords = CoordinateFile::new(array![[0.0, 1.0, 2.0], [-1.0, 5.0, 0.5]]);
        assert_eq!([-1.0f32, 0.0, 1.0, 5.0, 0.5, 2.0], coords.bounds());
    }

    #[test]
    fn flat_surfaces_default_to_cut_topologies() {
        assert_eq!(TopologyType::Cut, SurfaceType::Flat.default_topology_type());
        assert_eq!(TopologyType::LobarCut, SurfaceType::FlatLobar.default_topology_type());
        assert_eq!(TopologyType::Closed, SurfaceType::Spherical.default_topology_type());
    }
}
