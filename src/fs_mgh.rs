//! Functions for reading FreeSurfer brain volumes in binary 'MGH' files, or their GZip compressed 'MGZ' variant.
//!
//! These are the volumes a brain set accepts from `volume_*_file` spec entries.

use byteordered::ByteOrdered;
use ndarray::{Array, Array4, ShapeBuilder};

use std::io::Read;
use std::path::Path;

use crate::error::{BrainSetError, Result};
use crate::util::{basename, capacity_hint, checked_count, open_input};

pub const MGH_VERSION: i32 = 1;

pub const MGH_DATATYPE_NAMES : [&str; 4] = ["MRI_UCHAR", "MRI_INT", "MRI_FLOAT", "MRI_SHORT"];
pub const MGH_DATATYPE_CODES : [i32; 4] = [0, 1, 3, 4];
pub const MGH_DATA_START : usize = 284; // The index in bytes where the data part starts in an MGH file.

const MGH_HEADER_FIXED_SIZE: usize = 7 * 4 + 2;
const MGH_HEADER_RAS_SIZE: usize = 15 * 4;

/// Models the header of a FreeSurfer MGH file containing a brain volume.
#[derive(Debug, Clone, PartialEq)]
pub struct FsMghHeader {
    pub mgh_format_version: i32,
    pub dim1len: i32,
    pub dim2len: i32,
    pub dim3len: i32,
    pub dim4len: i32,  // aka "num_frames"
    pub dtype: i32,
    pub dof: i32,
    pub is_ras_good: i16,
    pub delta: [f32; 3],
    pub mdc_raw: [f32; 9],
    pub p_xyz_c: [f32; 3],
}


/// Models a FreeSurfer MGH file. Voxel values of all data types are converted to `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct FsMgh {
    pub header: FsMghHeader,
    /// Voxel values indexed by `[i, j, k, frame]`.
    pub data: Array4<f32>,
}


impl Default for FsMghHeader {
    fn default() -> FsMghHeader {
        FsMghHeader {
            mgh_format_version: MGH_VERSION,
            dim1len: 0,
            dim2len: 0,
            dim3len: 0,
            dim4len: 0,
            dtype: 1,
            dof: 0,
            is_ras_good: 0,
            delta: [0.; 3],
            mdc_raw: [0.; 9],
            p_xyz_c: [0.; 3],
        }
    }
}

/// The header of an MGH/MGZ file.
impl FsMghHeader {

    /// Read an MGH header from the given byte stream.
    /// It is assumed that the input is currently at the start of the header.
    pub fn from_reader<S>(input: &mut S, name: &str) -> Result<FsMghHeader>
    where
        S: Read,
    {
        let mut hdr = FsMghHeader::default();

        let mut input = ByteOrdered::be(input);

        hdr.mgh_format_version = input.read_i32()?;

        if hdr.mgh_format_version != MGH_VERSION {
            return Err(BrainSetError::InvalidFormat(name.to_string(), format!("unsupported MGH format version {}", hdr.mgh_format_version)));
        }

        hdr.dim1len = input.read_i32()?;
        hdr.dim2len = input.read_i32()?;
        hdr.dim3len = input.read_i32()?;
        hdr.dim4len = input.read_i32()?;

        hdr.dtype = input.read_i32()?;
        hdr.dof = input.read_i32()?;

        hdr.is_ras_good = input.read_i16()?;

        if hdr.is_ras_good == 1 {
            for v in &mut hdr.delta { *v = input.read_f32()?; }
            for v in &mut hdr.mdc_raw { *v = input.read_f32()?; }
            for v in &mut hdr.p_xyz_c { *v = input.read_f32()?; }
        }
        Ok(hdr)
    }

    /// The shape of the data, `[dim1, dim2, dim3, frames]`.
    pub fn dimensions(&self, name: &str) -> Result<[usize; 4]> {
        let dims = [self.dim1len, self.dim2len, self.dim3len, self.dim4len];
        if dims.iter().any(|d| *d < 0) {
            return Err(BrainSetError::InvalidFormat(name.to_string(), format!("negative volume dimension in {:?}", dims)));
        }
        Ok([dims[0] as usize, dims[1] as usize, dims[2] as usize, dims[3] as usize])
    }

    fn size(&self) -> usize {
        if self.is_ras_good == 1 {
            MGH_HEADER_FIXED_SIZE + MGH_HEADER_RAS_SIZE
        } else {
            MGH_HEADER_FIXED_SIZE
        }
    }
}


/// Read an MGH or MGZ file.
pub fn read_mgh<P: AsRef<Path>>(path: P) -> Result<FsMgh> {
    FsMgh::from_file(path)
}


impl FsMgh {

    /// Read an MGH file, or an MGZ file if the file's name ends with ".gz" (FreeSurfer's ".mgz" files must be named accordingly).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FsMgh> {
        let name = basename(&path);
        let gz = name.ends_with(".mgz");
        let mut input: Box<dyn Read> = if gz {
            let file = std::io::BufReader::new(std::fs::File::open(&path).map_err(|e| BrainSetError::from(e).in_file(&path))?);
            Box::new(flate2::bufread::GzDecoder::new(file))
        } else {
            Box::new(open_input(&path)?)
        };
        FsMgh::from_reader(&mut input, &name).map_err(|e| e.in_file(&path))
    }

    /// Read header and data from a stream positioned at the start of an MGH file.
    pub fn from_reader<S: Read>(input: &mut S, name: &str) -> Result<FsMgh> {
        let header = FsMghHeader::from_reader(input, name)?;

        // Skip to the data. Reading instead of seeking, as we cannot seek in a GZ stream.
        let mut skip = vec![0u8; MGH_DATA_START - header.size()];
        input.read_exact(&mut skip)?;

        let [d1, d2, d3, d4] = header.dimensions(name)?;
        let num_voxels = checked_count(name, &[d1, d2, d3, d4])?;
        let mut values: Vec<f32> = Vec::with_capacity(capacity_hint(num_voxels));
        let mut input = ByteOrdered::be(input);
        match header.dtype {
            0 => for _ in 0..num_voxels { values.push(input.read_u8()? as f32); },
            1 => for _ in 0..num_voxels { values.push(input.read_i32()? as f32); },
            3 => for _ in 0..num_voxels { values.push(input.read_f32()?); },
            4 => for _ in 0..num_voxels { values.push(input.read_i16()? as f32); },
            other => {
                return Err(BrainSetError::UnsupportedFormat(name.to_string(), format!("MGH data type {} is not supported, expected one of {:?}", other, MGH_DATATYPE_CODES)));
            }
        }

        // MGH data is stored with the first dimension varying fastest.
        let data = Array::from_shape_vec((d1, d2, d3, d4).f(), values)
            .map_err(|e| BrainSetError::InvalidFormat(name.to_string(), e.to_string()))?;

        Ok(FsMgh { header, data })
    }

    /// The name of the data type of the file, like "MRI_FLOAT".
    pub fn dtype_name(&self) -> Option<&'static str> {
        MGH_DATATYPE_CODES.iter()
            .position(|c| *c == self.header.dtype)
            .map(|i| MGH_DATATYPE_NAMES[i])
    }
}


#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::io::Cursor;

    /// An MGH file of shape 2x2x1x1, data type MRI_SHORT, values 1 to 4 in file order.
    pub(crate) fn tiny_mgh_bytes() -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::new();
        for v in &[1i32, 2, 2, 1, 1, 4, 0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(&0i16.to_be_bytes());
        bytes.resize(MGH_DATA_START, 0);
        for v in &[1i16, 2, 3, 4] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn a_tiny_mgh_volume_can_be_read() {
        let mgh = FsMgh::from_reader(&mut Cursor::new(tiny_mgh_bytes()), "tiny.mgh").unwrap();
        assert_eq!([2, 2, 1, 1], mgh.header.dimensions("tiny.mgh").unwrap());
        assert_eq!(Some("MRI_SHORT"), mgh.dtype_name());
        assert_eq!(2.0, mgh.data[[1, 0, 0, 0]]);
        assert_eq!(3.0, mgh.data[[0, 1, 0, 0]]);
        assert_eq!(4.0, mgh.data[[1, 1, 0, 0]]);
    }

    #[test]
    fn huge_dimensions_fail_without_allocating() {
        let mut bytes = tiny_mgh_bytes();
        for dim in 0..4 {
            bytes[4 + 4 * dim..8 + 4 * dim].copy_from_slice(&i32::MAX.to_be_bytes());
        }
        let err = FsMgh::from_reader(&mut Cursor::new(bytes.clone()), "huge.mgh").unwrap_err();
        assert!(err.to_string().contains("too large"));

        bytes[12..16].copy_from_slice(&1i32.to_be_bytes());
        bytes[16..20].copy_from_slice(&1i32.to_be_bytes());
        assert!(FsMgh::from_reader(&mut Cursor::new(bytes), "huge.mgh").is_err());
    }

    #[test]
    fn wrong_versions_are_rejected() {
        let mut bytes = tiny_mgh_bytes();
        bytes[3] = 7;
        assert!(FsMgh::from_reader(&mut Cursor::new(bytes), "bad.mgh").is_err());
    }
}
