//! User preferences, stored as TOML in `~/.caret5_preferences`.
//!
//! Values are layered: built-in defaults, then the preferences file, then environment variables.
//!
//! - `CARET5_PREFERENCES` names another preferences file.
//! - `CARET_FILE_READING_THREADS` overrides `number_of_file_reading_threads`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BrainSetError, Result};

pub const PREFERENCES_FILE_NAME: &str = ".caret5_preferences";
pub const PREFERENCES_PATH_ENV: &str = "CARET5_PREFERENCES";
pub const FILE_READING_THREADS_ENV: &str = "CARET_FILE_READING_THREADS";


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Digits right of the decimal point when writing floats to text files.
    pub text_file_digits_right_of_decimal: usize,
    /// Seed for random number generation. Random if not set.
    pub random_seed_override: Option<u32>,
    /// Number of threads used to read the files of a spec file. 1 reads them on the calling thread.
    pub number_of_file_reading_threads: usize,
}

impl Default for Preferences {
    fn default() -> Preferences {
        Preferences {
            text_file_digits_right_of_decimal: 6,
            random_seed_override: None,
            number_of_file_reading_threads: 1,
        }
    }
}


/// The preferences file: named by `CARET5_PREFERENCES`, else `.caret5_preferences` in the user's home directory.
pub fn preferences_file_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(PREFERENCES_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(PREFERENCES_FILE_NAME))
}


impl Preferences {

    /// Load the preferences of the current user. A missing preferences file gives the defaults.
    pub fn load() -> Result<Preferences> {
        let mut prefs = match preferences_file_path() {
            Some(path) if path.exists() => Preferences::from_file(&path)?,
            Some(path) => {
                debug!("No preferences file at {}, using defaults", path.display());
                Preferences::default()
            }
            None => Preferences::default(),
        };
        prefs.apply_environment_overrides();
        Ok(prefs)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Preferences> {
        let content = fs::read_to_string(&path).map_err(|e| BrainSetError::from(e).in_file(&path))?;
        let prefs: Preferences = toml::from_str(&content)?;
        Ok(prefs.validated())
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string(self)?;
        fs::write(&path, content).map_err(|e| BrainSetError::from(e).in_file(&path))
    }

    /// Apply the supported environment variables.
    pub fn apply_environment_overrides(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(value) = lookup(FILE_READING_THREADS_ENV) {
            match value.trim().parse::<usize>() {
                Ok(threads) => self.number_of_file_reading_threads = threads,
                Err(_) => warn!("Ignoring {}={}, not a number of threads", FILE_READING_THREADS_ENV, value),
            }
        }
        *self = self.clone().validated();
    }

    fn validated(mut self) -> Preferences {
        if self.number_of_file_reading_threads == 0 {
            self.number_of_file_reading_threads = 1;
        }
        self
    }
}
