//! Traits for the values stored in per-node data files.

use byteordered::ByteOrdered;

use std::fmt::Debug;
use std::io::{Read, Write};

use crate::error::Result;
use crate::util::format_float;


/// A value that can be stored for a node in a [`crate::NodeDataFile`].
pub trait NodeValue: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    fn parse_value(token: &str) -> Option<Self>;

    /// Text representation. Floats use `digits` digits right of the decimal point.
    fn format_value(&self, digits: usize) -> String;

    fn read_be<R: Read + ?Sized>(input: &mut R) -> Result<Self>;

    fn write_be<W: Write + ?Sized>(&self, out: &mut W) -> Result<()>;

    /// Translate a label index through a table of new indices. Values that are not label indices are returned unchanged.
    fn remap_label(self, _map: &[i32]) -> Self {
        self
    }
}


impl NodeValue for f32 {
    fn parse_value(token: &str) -> Option<f32> {
        token.parse().ok()
    }

    fn format_value(&self, digits: usize) -> String {
        format_float(*self, digits)
    }

    fn read_be<R: Read + ?Sized>(input: &mut R) -> Result<f32> {
        Ok(ByteOrdered::be(input).read_f32()?)
    }

    fn write_be<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        ByteOrdered::be(out).write_f32(*self)?;
        Ok(())
    }
}


/// Label indices into the name table of a paint-like file.
impl NodeValue for i32 {
    fn parse_value(token: &str) -> Option<i32> {
        token.parse().ok()
    }

    fn format_value(&self, _digits: usize) -> String {
        self.to_string()
    }

    fn read_be<R: Read + ?Sized>(input: &mut R) -> Result<i32> {
        Ok(ByteOrdered::be(input).read_i32()?)
    }

    fn write_be<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        ByteOrdered::be(out).write_i32(*self)?;
        Ok(())
    }

    fn remap_label(self, map: &[i32]) -> i32 {
        if self < 0 {
            return self;
        }
        map.get(self as usize).copied().unwrap_or(self)
    }
}
