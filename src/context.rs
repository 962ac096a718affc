//! Process-wide configuration, built once and shared by every brain set.

use tracing::debug;

use std::env;
use std::path::PathBuf;

use crate::error::Result;
use crate::preferences::Preferences;

pub const CARET_HOME_ENV: &str = "CARET5_HOME";


#[derive(Debug, Clone, Default)]
pub struct CaretContext {
    pub preferences: Preferences,
    /// Installation directory with bundled resources, if known.
    pub caret_home: Option<PathBuf>,
}

impl CaretContext {

    pub fn new(preferences: Preferences, caret_home: Option<PathBuf>) -> CaretContext {
        CaretContext { preferences, caret_home }
    }

    /// Load the user's preferences and locate the installation directory.
    pub fn from_environment() -> Result<CaretContext> {
        let preferences = Preferences::load()?;
        let caret_home = caret_home_directory();
        debug!("Caret home directory: {:?}", caret_home);
        Ok(CaretContext { preferences, caret_home })
    }

    pub fn with_preferences(preferences: Preferences) -> CaretContext {
        CaretContext { preferences, caret_home: None }
    }

    pub fn text_file_digits(&self) -> usize {
        self.preferences.text_file_digits_right_of_decimal
    }

    pub fn file_reading_threads(&self) -> usize {
        self.preferences.number_of_file_reading_threads.max(1)
    }
}


/// The installation directory: `CARET5_HOME` if set, else the directory of the running executable.
pub fn caret_home_directory() -> Option<PathBuf> {
    if let Ok(home) = env::var(CARET_HOME_ENV) {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn the_context_exposes_the_preferences() {
        let prefs = Preferences {
            text_file_digits_right_of_decimal: 2,
            random_seed_override: Some(7),
            number_of_file_reading_threads: 0,
        };
        let ctx = CaretContext::with_preferences(prefs);
        assert_eq!(2, ctx.text_file_digits());
        assert_eq!(1, ctx.file_reading_threads());
        assert!(ctx.caret_home.is_none());
    }

    #[test]
    fn a_home_directory_is_found() {
        // Either from the environment or from the test executable.
        assert!(caret_home_directory().is_some());
    }
}
