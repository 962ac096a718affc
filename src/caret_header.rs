//! The text header shared by all Caret data files.
//!
//! A header is a block of `tag value` lines between a `BeginHeader` and an `EndHeader` line.
//! The `encoding` tag tells whether the data part following the header is ASCII text or big endian binary.

use std::io::{BufRead, Write};

use crate::error::Result;
use crate::util::next_non_empty_line;

pub const BEGIN_HEADER: &str = "BeginHeader";
pub const END_HEADER: &str = "EndHeader";

pub const TAG_ENCODING: &str = "encoding";
pub const TAG_PERIMETER_ID: &str = "perimeter_id";
pub const TAG_STRUCTURE: &str = "structure";
pub const TAG_SPECIES: &str = "species";
pub const TAG_SUBJECT: &str = "subject";
pub const TAG_SPACE: &str = "space";
pub const TAG_COMMENT: &str = "comment";


/// How the data part of a Caret file is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEncoding {
    Ascii,
    Binary,
}

impl Default for FileEncoding {
    fn default() -> FileEncoding {
        FileEncoding::Ascii
    }
}

impl FileEncoding {
    pub fn from_tag_value(value: &str) -> Option<FileEncoding> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASCII" => Some(FileEncoding::Ascii),
            "BINARY" => Some(FileEncoding::Binary),
            _ => None,
        }
    }

    pub fn tag_value(&self) -> &'static str {
        match self {
            FileEncoding::Ascii => "ASCII",
            FileEncoding::Binary => "BINARY",
        }
    }
}


/// Ordered `tag value` pairs of a Caret file header. Tags are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaretHeader {
    pub tags: Vec<(String, String)>,
}

impl CaretHeader {

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(tag))
            .map(|(_, v)| v.as_str())
    }

    /// Set a tag, replacing its value if it is already present.
    pub fn set(&mut self, tag: &str, value: &str) {
        match self.tags.iter_mut().find(|(t, _)| t.eq_ignore_ascii_case(tag)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.tags.push((tag.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, tag: &str) {
        self.tags.retain(|(t, _)| !t.eq_ignore_ascii_case(tag));
    }

    /// The encoding of the data part. Files without an encoding tag are ASCII.
    pub fn encoding(&self) -> FileEncoding {
        self.get(TAG_ENCODING)
            .and_then(FileEncoding::from_tag_value)
            .unwrap_or_default()
    }

    pub fn set_encoding(&mut self, encoding: FileEncoding) {
        self.set(TAG_ENCODING, encoding.tag_value());
    }


    /// Read a header from the given text stream.
    ///
    /// Old files may lack a header. In that case an empty header is returned, together with the first
    /// non-empty line of the input, which then belongs to the data part.
    pub fn from_reader<R: BufRead + ?Sized>(input: &mut R) -> Result<(CaretHeader, Option<String>)> {
        let mut hdr = CaretHeader::default();

        let first = match next_non_empty_line(input)? {
            Some(line) => line,
            None => return Ok((hdr, None)),
        };
        if first.trim() != BEGIN_HEADER {
            return Ok((hdr, Some(first)));
        }

        while let Some(line) = next_non_empty_line(input)? {
            let line = line.trim();
            if line == END_HEADER {
                break;
            }
            let mut parts = line.splitn(2, char::is_whitespace);
            if let Some(tag) = parts.next() {
                let value = parts.next().unwrap_or("").trim();
                hdr.tags.push((tag.to_string(), value.to_string()));
            }
        }
        Ok((hdr, None))
    }


    /// Write the header, including the `BeginHeader` and `EndHeader` lines.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", BEGIN_HEADER)?;
        for (tag, value) in &self.tags {
            writeln!(out, "{} {}", tag, value)?;
        }
        writeln!(out, "{}", END_HEADER)?;
        Ok(())
    }
}
