//! Functions for managing Caret per-node data files: metrics, paints, surface shapes and their relatives.
//!
//! All these files store a table with one row per surface node and one or more named columns.
//! Scalar kinds (metric, surface shape, ...) hold floats. Paint-like kinds hold integer indices into a
//! table of label names that is stored with the file.
//!
//! The on-disk layout is the same for all kinds:
//!
//! ```text
//! BeginHeader
//! encoding ASCII
//! EndHeader
//! tag-version 2
//! tag-number-of-nodes 3
//! tag-number-of-columns 2
//! tag-title Thickness
//! tag-column-name 0 left
//! tag-column-name 1 right
//! tag-BEGIN-DATA
//! 0 2.5 2.4
//! 1 2.1 2.0
//! 2 3.0 2.9
//! ```
//!
//! Paint-like files add a `tag-number-of-paint-names` line, and list the label names as `index name` lines
//! directly after `tag-BEGIN-DATA`. In binary files the rows are stored as big endian values, node by node.

use ndarray::{Array2, ArrayView1, Axis};
use ndarray_stats::QuantileExt;

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::caret_header::{CaretHeader, FileEncoding};
use crate::error::{BrainSetError, Result};
use crate::traits::NodeValue;
use crate::util::{basename, capacity_hint, checked_count, next_line, next_non_empty_line, open_input, OutputFile};

pub const TAG_VERSION: &str = "tag-version";
pub const TAG_NUMBER_OF_NODES: &str = "tag-number-of-nodes";
pub const TAG_NUMBER_OF_COLUMNS: &str = "tag-number-of-columns";
pub const TAG_NUMBER_OF_LABELS: &str = "tag-number-of-paint-names";
pub const TAG_TITLE: &str = "tag-title";
pub const TAG_COLUMN_NAME: &str = "tag-column-name";
pub const TAG_BEGIN_DATA: &str = "tag-BEGIN-DATA";
pub const NODE_DATA_FILE_VERSION: i32 = 2;


/// The kinds of per-node attribute files a brain set manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeAttributeKind {
    Paint,
    Metric,
    SurfaceShape,
    LatLon,
    Section,
    RgbPaint,
    Topography,
    ArealEstimation,
    DeformationField,
    GeodesicDistance,
    ProbabilisticAtlas,
}

impl NodeAttributeKind {
    /// All kinds, in the order they are loaded from a spec file.
    pub const LOAD_ORDER: [NodeAttributeKind; 11] = [
        NodeAttributeKind::Paint,
        NodeAttributeKind::Metric,
        NodeAttributeKind::SurfaceShape,
        NodeAttributeKind::LatLon,
        NodeAttributeKind::Section,
        NodeAttributeKind::RgbPaint,
        NodeAttributeKind::Topography,
        NodeAttributeKind::ArealEstimation,
        NodeAttributeKind::DeformationField,
        NodeAttributeKind::GeodesicDistance,
        NodeAttributeKind::ProbabilisticAtlas,
    ];

    /// Whether files of this kind store label indices rather than scalars.
    pub fn is_label_kind(&self) -> bool {
        matches!(self, NodeAttributeKind::Paint | NodeAttributeKind::ProbabilisticAtlas)
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeAttributeKind::Paint => "Paint",
            NodeAttributeKind::Metric => "Metric",
            NodeAttributeKind::SurfaceShape => "Surface Shape",
            NodeAttributeKind::LatLon => "Lat/Lon",
            NodeAttributeKind::Section => "Section",
            NodeAttributeKind::RgbPaint => "RGB Paint",
            NodeAttributeKind::Topography => "Topography",
            NodeAttributeKind::ArealEstimation => "Areal Estimation",
            NodeAttributeKind::DeformationField => "Deformation Field",
            NodeAttributeKind::GeodesicDistance => "Geodesic Distance",
            NodeAttributeKind::ProbabilisticAtlas => "Probabilistic Atlas",
        }
    }
}

impl fmt::Display for NodeAttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}


/// Models a per-node data file. `T` is `f32` for scalar kinds and `i32` (label indices) for paint-like kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDataFile<T> {
    pub header: CaretHeader,
    pub filename: String,
    pub kind: NodeAttributeKind,
    pub title: String,
    pub column_names: Vec<String>,
    /// One row per node, one column per data column.
    pub data: Array2<T>,
    /// Names of the labels that the values of paint-like files index into.
    pub label_names: Vec<String>,
}


/// Read a per-node data file of the given kind with scalar values.
///
/// # Examples
///
/// ```no_run
/// use brainset::{read_scalar_node_data, NodeAttributeKind};
/// let metric = read_scalar_node_data("Human.colin.L.thickness.metric", NodeAttributeKind::Metric).unwrap();
/// println!("{} columns for {} nodes", metric.num_columns(), metric.num_nodes());
/// ```
pub fn read_scalar_node_data<P: AsRef<Path>>(path: P, kind: NodeAttributeKind) -> Result<NodeDataFile<f32>> {
    NodeDataFile::from_file(path, kind)
}


/// Read a paint-like per-node data file.
pub fn read_label_node_data<P: AsRef<Path>>(path: P, kind: NodeAttributeKind) -> Result<NodeDataFile<i32>> {
    NodeDataFile::from_file(path, kind)
}


impl<T: NodeValue> NodeDataFile<T> {

    /// An empty file without nodes or columns.
    pub fn new(kind: NodeAttributeKind) -> NodeDataFile<T> {
        NodeDataFile {
            header: CaretHeader::default(),
            filename: String::new(),
            kind,
            title: String::new(),
            column_names: Vec::new(),
            data: Array2::default((0, 0)),
            label_names: Vec::new(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_columns(&self) -> usize {
        self.data.ncols()
    }

    /// Whether the file holds no data columns.
    pub fn is_empty(&self) -> bool {
        self.num_columns() == 0
    }

    pub fn column(&self, column: usize) -> Option<ArrayView1<T>> {
        if column < self.num_columns() {
            Some(self.data.column(column))
        } else {
            None
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    pub fn value(&self, node: usize, column: usize) -> Option<T> {
        self.data.get((node, column)).copied()
    }

    /// Remove all data. The kind is kept.
    pub fn clear(&mut self) {
        *self = NodeDataFile::new(self.kind);
    }

    /// Index of a label name, adding the name if it is not yet known.
    pub fn add_label_name(&mut self, name: &str) -> i32 {
        match self.label_names.iter().position(|n| n == name) {
            Some(idx) => idx as i32,
            None => {
                self.label_names.push(name.to_string());
                (self.label_names.len() - 1) as i32
            }
        }
    }

    /// Append a column. The first column of an empty file sets its number of nodes.
    pub fn add_column(&mut self, name: &str, values: Vec<T>) -> Result<usize> {
        let num_nodes = values.len();
        if !self.is_empty() && num_nodes != self.num_nodes() {
            return Err(BrainSetError::NodeCountMismatch(name.to_string(), self.num_nodes(), num_nodes));
        }
        let column = Array2::from_shape_vec((num_nodes, 1), values)
            .map_err(|e| BrainSetError::InvalidFormat(name.to_string(), e.to_string()))?;
        self.append_data(column);
        self.column_names.push(name.to_string());
        Ok(self.num_columns() - 1)
    }

    /// Append all columns of another file of the same kind. Label indices of `other` are translated
    /// into this file's label table.
    pub fn append(&mut self, other: NodeDataFile<T>) -> Result<()> {
        if self.is_empty() {
            let filename = self.filename.clone();
            *self = other;
            if self.filename.is_empty() {
                self.filename = filename;
            }
            return Ok(());
        }
        if other.num_nodes() != self.num_nodes() {
            return Err(BrainSetError::NodeCountMismatch(basename(&other.filename), self.num_nodes(), other.num_nodes()));
        }

        let mut data = other.data;
        if !other.label_names.is_empty() {
            let map: Vec<i32> = other.label_names.iter().map(|n| self.add_label_name(n)).collect();
            data.mapv_inplace(|v| v.remap_label(&map));
        }
        self.append_data(data);
        self.column_names.extend(other.column_names);
        Ok(())
    }

    fn append_data(&mut self, extra: Array2<T>) {
        if self.is_empty() {
            self.data = extra;
            return;
        }
        let old_cols = self.num_columns();
        let old = &self.data;
        self.data = Array2::from_shape_fn((old.nrows(), old_cols + extra.ncols()), |(n, c)| {
            if c < old_cols { old[[n, c]] } else { extra[[n, c - old_cols]] }
        });
    }

    /// Remove a column. Returns false if the column does not exist.
    pub fn remove_column(&mut self, column: usize) -> bool {
        if column >= self.num_columns() {
            return false;
        }
        let keep: Vec<usize> = (0..self.num_columns()).filter(|c| *c != column).collect();
        if keep.is_empty() {
            self.clear();
            return true;
        }
        self.data = self.data.select(Axis(1), &keep);
        self.column_names.remove(column);
        true
    }


    /// Read a file. If the file's name ends with ".gz", it is GZip decoded.
    pub fn from_file<P: AsRef<Path>>(path: P, kind: NodeAttributeKind) -> Result<NodeDataFile<T>> {
        let mut input = open_input(&path)?;
        let mut file = NodeDataFile::from_reader(&mut input, kind, &basename(&path))
            .map_err(|e| e.in_file(&path))?;
        file.filename = path.as_ref().to_string_lossy().into_owned();
        Ok(file)
    }


    /// Read a file from the given stream. The `name` is only used in error messages.
    pub fn from_reader<R: BufRead + ?Sized>(input: &mut R, kind: NodeAttributeKind, name: &str) -> Result<NodeDataFile<T>> {
        let invalid = |msg: String| BrainSetError::InvalidFormat(name.to_string(), msg);

        let (header, leftover) = CaretHeader::from_reader(input)?;
        let encoding = header.encoding();

        let mut num_nodes: Option<usize> = None;
        let mut num_columns: Option<usize> = None;
        let mut num_labels = 0usize;
        let mut title = String::new();
        let mut named_columns: Vec<(usize, String)> = Vec::new();

        let mut pending = leftover;
        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => next_non_empty_line(input)?
                    .ok_or_else(|| invalid(format!("missing {} line", TAG_BEGIN_DATA)))?,
            };
            let line = line.trim();
            if line == TAG_BEGIN_DATA {
                break;
            }
            let mut parts = line.splitn(2, char::is_whitespace);
            let tag = parts.next().unwrap_or("");
            let value = parts.next().unwrap_or("").trim();
            match tag {
                TAG_VERSION => {
                    let version: i32 = value.parse().map_err(|_| invalid(format!("invalid version '{}'", value)))?;
                    if version != NODE_DATA_FILE_VERSION {
                        return Err(BrainSetError::UnsupportedFormat(name.to_string(), format!("{} file version {} is not supported", kind, version)));
                    }
                }
                TAG_NUMBER_OF_NODES => {
                    num_nodes = Some(value.parse().map_err(|_| invalid(format!("invalid number of nodes '{}'", value)))?);
                }
                TAG_NUMBER_OF_COLUMNS => {
                    num_columns = Some(value.parse().map_err(|_| invalid(format!("invalid number of columns '{}'", value)))?);
                }
                TAG_NUMBER_OF_LABELS => {
                    num_labels = value.parse().map_err(|_| invalid(format!("invalid number of paint names '{}'", value)))?;
                }
                TAG_TITLE => title = value.to_string(),
                TAG_COLUMN_NAME => {
                    let mut cparts = value.splitn(2, char::is_whitespace);
                    let idx: usize = cparts.next().unwrap_or("").parse()
                        .map_err(|_| invalid(format!("invalid column name line '{}'", line)))?;
                    let cname = cparts.next().unwrap_or("").trim();
                    if let Some(n) = num_columns.filter(|n| idx >= *n) {
                        return Err(invalid(format!("column name for column {} but only {} columns", idx, n)));
                    }
                    named_columns.push((idx, cname.to_string()));
                }
                _ => {}
            }
        }

        let num_nodes = num_nodes.ok_or_else(|| invalid(format!("missing {}", TAG_NUMBER_OF_NODES)))?;
        let num_columns = num_columns.ok_or_else(|| invalid(format!("missing {}", TAG_NUMBER_OF_COLUMNS)))?;
        if let Some((idx, _)) = named_columns.iter().find(|(idx, _)| *idx >= num_columns) {
            return Err(invalid(format!("column name for column {} but only {} columns", idx, num_columns)));
        }
        if num_nodes == 0 && num_columns > 0 {
            return Err(invalid(format!("{} columns but no nodes", num_columns)));
        }
        let num_values = checked_count(name, &[num_nodes, num_columns])?;

        let mut label_names = Vec::with_capacity(capacity_hint(num_labels));
        for i in 0..num_labels {
            let line = next_line(input)?.ok_or_else(|| invalid(format!("expected {} paint names, found {}", num_labels, i)))?;
            let mut lparts = line.trim().splitn(2, char::is_whitespace);
            lparts.next();
            label_names.push(lparts.next().unwrap_or("").trim().to_string());
        }

        let mut values: Vec<T> = Vec::with_capacity(capacity_hint(num_values));
        match encoding {
            FileEncoding::Ascii => {
                for node in 0..num_nodes {
                    let line = next_line(input)?.ok_or_else(|| invalid(format!("expected {} nodes, found {}", num_nodes, node)))?;
                    let tokens: Vec<&str> = line.split_whitespace().collect();
                    if tokens.len() <= num_columns {
                        return Err(invalid(format!("invalid {} line '{}'", kind, line)));
                    }
                    for t in &tokens[1..=num_columns] {
                        values.push(T::parse_value(t).ok_or_else(|| invalid(format!("invalid value '{}'", t)))?);
                    }
                }
            }
            FileEncoding::Binary => {
                for _ in 0..num_values {
                    values.push(T::read_be(input)?);
                }
            }
        }

        let mut data = Array2::from_shape_vec((num_nodes, num_columns), values)
            .map_err(|e| invalid(e.to_string()))?;

        // Names are filled in once the data confirmed the number of columns.
        let mut column_names: Vec<String> = (1..=num_columns).map(|i| format!("column {}", i)).collect();
        for (idx, cname) in named_columns {
            if !cname.is_empty() {
                column_names[idx] = cname;
            }
        }

        // Duplicated label names collapse onto their first occurrence.
        let mut unique: Vec<String> = Vec::with_capacity(label_names.len());
        let map: Vec<i32> = label_names.iter().map(|n| {
            match unique.iter().position(|u| u == n) {
                Some(idx) => idx as i32,
                None => {
                    unique.push(n.clone());
                    (unique.len() - 1) as i32
                }
            }
        }).collect();
        if unique.len() != label_names.len() {
            data.mapv_inplace(|v| v.remap_label(&map));
        }

        Ok(NodeDataFile {
            header,
            filename: String::new(),
            kind,
            title,
            column_names,
            data,
            label_names: unique,
        })
    }


    /// Write the file. Names ending with ".gz" are GZip compressed.
    pub fn to_file<P: AsRef<Path>>(&self, path: P, encoding: FileEncoding, digits: usize) -> Result<()> {
        let mut out = OutputFile::create(&path)?;
        self.write_to(&mut out, encoding, digits).map_err(|e| e.in_file(&path))?;
        out.finish().map_err(|e| e.in_file(&path))
    }

    pub fn write_to<W: Write>(&self, out: &mut W, encoding: FileEncoding, digits: usize) -> Result<()> {
        let mut header = self.header.clone();
        header.set_encoding(encoding);
        header.write_to(out)?;

        writeln!(out, "{} {}", TAG_VERSION, NODE_DATA_FILE_VERSION)?;
        writeln!(out, "{} {}", TAG_NUMBER_OF_NODES, self.num_nodes())?;
        writeln!(out, "{} {}", TAG_NUMBER_OF_COLUMNS, self.num_columns())?;
        writeln!(out, "{} {}", TAG_TITLE, self.title)?;
        if self.kind.is_label_kind() {
            writeln!(out, "{} {}", TAG_NUMBER_OF_LABELS, self.label_names.len())?;
        }
        for (i, name) in self.column_names.iter().enumerate() {
            writeln!(out, "{} {} {}", TAG_COLUMN_NAME, i, name)?;
        }
        writeln!(out, "{}", TAG_BEGIN_DATA)?;
        if self.kind.is_label_kind() {
            for (i, name) in self.label_names.iter().enumerate() {
                writeln!(out, "{} {}", i, name)?;
            }
        }

        match encoding {
            FileEncoding::Ascii => {
                for (node, row) in self.data.outer_iter().enumerate() {
                    let mut line = node.to_string();
                    for v in row.iter() {
                        line.push(' ');
                        line.push_str(&v.format_value(digits));
                    }
                    writeln!(out, "{}", line)?;
                }
            }
            FileEncoding::Binary => {
                for v in self.data.iter() {
                    v.write_be(out)?;
                }
            }
        }
        Ok(())
    }
}


impl NodeDataFile<f32> {
    /// Minimum and maximum of a scalar column. `None` for unknown columns, empty columns and columns containing NaN.
    pub fn column_min_max(&self, column: usize) -> Option<(f32, f32)> {
        let values = self.column(column)?;
        let min = values.min().ok()?;
        let max = values.max().ok()?;
        Some((*min, *max))
    }
}


impl NodeDataFile<i32> {
    /// The name of the label a node has in a column.
    pub fn label_name(&self, node: usize, column: usize) -> Option<&str> {
        let idx = self.value(node, column)?;
        if idx < 0 {
            return None;
        }
        self.label_names.get(idx as usize).map(|n| n.as_str())
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::io::Cursor;
    use tempfile::tempdir;

    const METRIC: &str = "BeginHeader\nencoding ASCII\nEndHeader\ntag-version 2\ntag-number-of-nodes 3\ntag-number-of-columns 2\ntag-title Thickness\ntag-column-name 0 left\ntag-column-name 1 right\ntag-BEGIN-DATA\n0 2.5 2.4\n1 2.1 2.0\n2 3.0 2.9\n";

    const PAINT: &str = "tag-version 2\ntag-number-of-nodes 3\ntag-number-of-columns 1\ntag-number-of-paint-names 3\ntag-column-name 0 lobes\ntag-BEGIN-DATA\n0 ???\n1 FRONTAL\n2 FRONTAL\n0 1\n1 2\n2 0\n";

    #[test]
    fn an_ascii_metric_file_can_be_read() {
        let metric: NodeDataFile<f32> = NodeDataFile::from_reader(&mut Cursor::new(METRIC), NodeAttributeKind::Metric, "m.metric").unwrap();
        assert_eq!(3, metric.num_nodes());
        assert_eq!(2, metric.num_columns());
        assert_eq!("Thickness", metric.title);
        assert_eq!(Some(1), metric.column_index("right"));
        assert_abs_diff_eq!(metric.data, array![[2.5f32, 2.4], [2.1, 2.0], [3.0, 2.9]], epsilon = 1e-6);
    }

    #[test]
    fn short_data_lines_are_rejected() {
        let text = METRIC.replace("1 2.1 2.0", "1 2.1");
        let err = NodeDataFile::<f32>::from_reader(&mut Cursor::new(text), NodeAttributeKind::Metric, "m.metric").unwrap_err();
        assert!(err.to_string().contains("invalid Metric line"));
    }

    #[test]
    fn huge_header_counts_are_rejected_without_allocating() {
        let text = METRIC.replace("tag-number-of-nodes 3", "tag-number-of-nodes 4294967296")
            .replace("tag-number-of-columns 2", "tag-number-of-columns 4294967296");
        let err = NodeDataFile::<f32>::from_reader(&mut Cursor::new(text), NodeAttributeKind::Metric, "m.metric").unwrap_err();
        assert!(matches!(err, BrainSetError::InvalidFormat(_, _)));

        let binary = METRIC.replace("encoding ASCII", "encoding BINARY")
            .replace("tag-number-of-nodes 3", "tag-number-of-nodes 4294967296")
            .replace("tag-number-of-columns 2", "tag-number-of-columns 4294967296");
        let err = NodeDataFile::<f32>::from_reader(&mut Cursor::new(binary), NodeAttributeKind::Metric, "m.metric").unwrap_err();
        assert!(matches!(err, BrainSetError::InvalidFormat(_, _)));

        let labels = PAINT.replace("tag-number-of-paint-names 3", "tag-number-of-paint-names 1000000000000");
        assert!(NodeDataFile::<i32>::from_reader(&mut Cursor::new(labels), NodeAttributeKind::Paint, "p.paint").is_err());

        let no_nodes = METRIC.replace("tag-number-of-nodes 3", "tag-number-of-nodes 0")
            .replace("tag-number-of-columns 2", "tag-number-of-columns 1000000000000");
        assert!(NodeDataFile::<f32>::from_reader(&mut Cursor::new(no_nodes), NodeAttributeKind::Metric, "m.metric").is_err());
    }

    #[test]
    fn column_names_beyond_the_column_count_are_rejected() {
        let text = METRIC.replace("tag-column-name 1 right", "tag-column-name 1000000000000 right");
        let err = NodeDataFile::<f32>::from_reader(&mut Cursor::new(text), NodeAttributeKind::Metric, "m.metric").unwrap_err();
        assert!(err.to_string().contains("only 2 columns"));
    }

    #[test]
    fn duplicate_paint_names_are_merged() {
        let paint: NodeDataFile<i32> = NodeDataFile::from_reader(&mut Cursor::new(PAINT), NodeAttributeKind::Paint, "p.paint").unwrap();
        assert_eq!(vec![String::from("???"), String::from("FRONTAL")], paint.label_names);
        assert_eq!(array![[1], [1], [0]], paint.data);
        assert_eq!(Some("FRONTAL"), paint.label_name(1, 0));
    }

    #[test]
    fn appending_remaps_label_indices() {
        let mut paint: NodeDataFile<i32> = NodeDataFile::new(NodeAttributeKind::Paint);
        paint.label_names = vec![String::from("A"), String::from("B")];
        paint.add_column("first", vec![0, 1]).unwrap();

        let mut other: NodeDataFile<i32> = NodeDataFile::new(NodeAttributeKind::Paint);
        other.label_names = vec![String::from("C"), String::from("A")];
        other.add_column("second", vec![0, 1]).unwrap();

        paint.append(other).unwrap();
        assert_eq!(vec!["A", "B", "C"], paint.label_names);
        assert_eq!(array![[0, 2], [1, 0]], paint.data);
        assert_eq!(vec!["first", "second"], paint.column_names);
    }

    #[test]
    fn appending_a_file_with_other_node_count_fails_and_keeps_the_data() {
        let mut metric: NodeDataFile<f32> = NodeDataFile::new(NodeAttributeKind::Metric);
        metric.add_column("a", vec![1.0, 2.0]).unwrap();
        let mut other: NodeDataFile<f32> = NodeDataFile::new(NodeAttributeKind::Metric);
        other.add_column("b", vec![1.0, 2.0, 3.0]).unwrap();

        assert!(metric.append(other).is_err());
        assert_eq!(1, metric.num_columns());
        assert!(metric.add_column("c", vec![0.0]).is_err());
    }

    #[test]
    fn columns_can_be_removed() {
        let mut metric: NodeDataFile<f32> = NodeDataFile::new(NodeAttributeKind::Metric);
        metric.add_column("a", vec![1.0, 2.0]).unwrap();
        metric.add_column("b", vec![3.0, 4.0]).unwrap();
        assert!(metric.remove_column(0));
        assert_eq!(vec!["b"], metric.column_names);
        assert_eq!(array![[3.0f32], [4.0]], metric.data);
        assert!(!metric.remove_column(5));
        assert!(metric.remove_column(0));
        assert!(metric.is_empty());
    }

    #[test]
    fn column_min_max_is_computed() {
        let metric: NodeDataFile<f32> = NodeDataFile::from_reader(&mut Cursor::new(METRIC), NodeAttributeKind::Metric, "m.metric").unwrap();
        let (min, max) = metric.column_min_max(0).unwrap();
        assert_abs_diff_eq!(2.1f32, min, epsilon = 1e-6);
        assert_abs_diff_eq!(3.0f32, max, epsilon = 1e-6);
        assert!(metric.column_min_max(2).is_none());
    }

    #[test]
    fn files_survive_writing_in_both_encodings() {
        let dir = tempdir().unwrap();
        let paint: NodeDataFile<i32> = NodeDataFile::from_reader(&mut Cursor::new(PAINT), NodeAttributeKind::Paint, "p.paint").unwrap();
        for (name, encoding) in [("p.paint", FileEncoding::Ascii), ("p_bin.paint", FileEncoding::Binary)].iter() {
            let path = dir.path().join(name);
            paint.to_file(&path, *encoding, 6).unwrap();
            let back = read_label_node_data(&path, NodeAttributeKind::Paint).unwrap();
            assert_eq!(paint.data, back.data);
            assert_eq!(paint.label_names, back.label_names);
            assert_eq!(paint.column_names, back.column_names);
        }

        let metric: NodeDataFile<f32> = NodeDataFile::from_reader(&mut Cursor::new(METRIC), NodeAttributeKind::Metric, "m.metric").unwrap();
        let path = dir.path().join("m.metric.gz");
        metric.to_file(&path, FileEncoding::Binary, 6).unwrap();
        let back = read_scalar_node_data(&path, NodeAttributeKind::Metric).unwrap();
        assert_eq!(metric.data, back.data);
        assert_eq!("Thickness", back.title);
    }
}
