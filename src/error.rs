use quick_error::quick_error;
use std::io::Error as IOError;
use std::path::Path;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum BrainSetError {
        /// The content of a file does not follow its format.
        InvalidFormat(file: String, msg: String) {
            display("{}: {}", file, msg)
        }

        /// The file type is known but reading it is not supported.
        UnsupportedFormat(file: String, msg: String) {
            display("{}: {}", file, msg)
        }

        /// A per-node file does not match the node count of the loaded surface(s).
        NodeCountMismatch(file: String, expected: usize, found: usize) {
            display("{} has a different number of nodes ({}) than the current surface(s) ({}).", file, found, expected)
        }

        /// A topology references nodes that the loaded surface(s) do not have.
        TopologyTooLarge(file: String, topology_nodes: usize, num_nodes: usize) {
            display("{} references {} nodes but the current surface(s) have {}.", file, topology_nodes, num_nodes)
        }

        UnknownSpecTag(tag: String) {
            display("Unknown spec file tag: {}", tag)
        }

        NoSuchColumn(name: String) {
            display("No data column named {}", name)
        }

        /// The brain set holds no data of the requested kind.
        MissingData(what: String) {
            display("No {} is loaded", what)
        }

        /// I/O error with the name of the file it happened on.
        FileIo(file: String, err: IOError) {
            display("{}: {}", file, err)
            source(err)
        }

        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
        }

        SceneFormat(err: serde_json::Error) {
            from()
            display("Invalid scene file: {}", err)
            source(err)
        }

        PreferencesFormat(err: toml::de::Error) {
            from()
            display("Invalid preferences file: {}", err)
            source(err)
        }

        PreferencesWrite(err: toml::ser::Error) {
            from()
            display("Unable to encode preferences: {}", err)
            source(err)
        }
    }
}

impl BrainSetError {
    /// Attach a file name to a bare I/O error. Other variants are returned unchanged.
    pub fn in_file<P: AsRef<Path>>(self, path: P) -> BrainSetError {
        match self {
            BrainSetError::Io(err) => BrainSetError::FileIo(path.as_ref().display().to_string(), err),
            other => other,
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, BrainSetError>;


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn node_count_mismatch_mentions_the_node_counts() {
        let err = BrainSetError::NodeCountMismatch(String::from("lh.metric"), 500, 400);
        let msg = err.to_string();
        assert!(msg.contains("different number of nodes"));
        assert!(msg.contains("lh.metric"));
        assert!(msg.contains("400"));
    }

    #[test]
    fn io_errors_can_be_tagged_with_the_file_name() {
        let err = BrainSetError::from(IOError::new(std::io::ErrorKind::NotFound, "gone")).in_file("a.topo");
        assert_eq!("a.topo: gone", err.to_string());
    }
}
