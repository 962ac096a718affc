//! Utility functions used in all other brainset modules.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteordered::byteorder::ReadBytesExt;
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{BrainSetError, Result};

/// Check whether the file extension ends with ".gz".
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}


/// The file name of a path without its directories, as used in messages and spec files.
pub fn basename<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.as_ref().to_string_lossy().into_owned())
}


/// Open a file for buffered reading. If the file's name ends with ".gz", the content is GZip decoded on the fly.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let file = File::open(&path).map_err(|e| BrainSetError::from(e).in_file(&path))?;
    let reader = BufReader::new(file);
    if is_gz_file(&path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}


/// A buffered output file, GZip compressed if its name ends with ".gz".
///
/// Call [`OutputFile::finish`] when done, so that compression errors are not lost on drop.
pub enum OutputFile {
    Plain(BufWriter<File>),
    Gz(GzEncoder<BufWriter<File>>),
}

impl OutputFile {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<OutputFile> {
        let file = File::create(&path).map_err(|e| BrainSetError::from(e).in_file(&path))?;
        let writer = BufWriter::new(file);
        if is_gz_file(&path) {
            Ok(OutputFile::Gz(GzEncoder::new(writer, Compression::default())))
        } else {
            Ok(OutputFile::Plain(writer))
        }
    }

    /// Flush all buffered data to disk.
    pub fn finish(self) -> Result<()> {
        match self {
            OutputFile::Plain(mut w) => w.flush()?,
            OutputFile::Gz(enc) => enc.finish()?.flush()?,
        }
        Ok(())
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputFile::Plain(w) => w.write(buf),
            OutputFile::Gz(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputFile::Plain(w) => w.flush(),
            OutputFile::Gz(w) => w.flush(),
        }
    }
}


/// Read the next line from the input, without the line terminator. Returns `None` at the end of the input.
pub fn next_line<R: BufRead + ?Sized>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}


/// Read the next line that contains something other than whitespace.
pub fn next_non_empty_line<R: BufRead + ?Sized>(input: &mut R) -> Result<Option<String>> {
    while let Some(line) = next_line(input)? {
        if !line.trim().is_empty() {
            return Ok(Some(line));
        }
    }
    Ok(None)
}


/// Upper bound for the capacity reserved from a count in a file header. Larger data grows as it is read.
pub const MAX_PREALLOCATED_ITEMS: usize = 1 << 20;


/// Capacity to reserve for `count` items announced by a file header.
pub fn capacity_hint(count: usize) -> usize {
    count.min(MAX_PREALLOCATED_ITEMS)
}


/// The product of counts read from a file header, or an `InvalidFormat` error if it does not fit a `usize`.
pub fn checked_count(name: &str, counts: &[usize]) -> Result<usize> {
    counts.iter()
        .try_fold(1usize, |acc, &c| acc.checked_mul(c))
        .ok_or_else(|| BrainSetError::InvalidFormat(name.to_string(), format!("data size {:?} is too large", counts)))
}


/// Format a float with the given number of digits right of the decimal point.
pub fn format_float(value: f32, digits: usize) -> String {
    format!("{:.*}", digits, value)
}


/// Read a fixed length zero-terminated byte string of the given length from the input. Embedded '\0' chars are allowed, but not added to the returned String.
pub fn read_fixed_length_string<S>(input: &mut S, len: usize) -> Result<String>
where
    S: Read,
{
    let mut info_line = String::with_capacity(capacity_hint(len));
    for _  in 0..len   {
        let cur_char = input.read_u8()? as char;
        if cur_char != '\0'  {
            info_line.push(cur_char);
        }
    }
    Ok(info_line)
}
