//! Code for loading program settings.
use crate::input::read_toml;
use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Name of the directory holding program configuration, within the user's config directory
const CONFIG_DIR_NAME: &str = "ehub";

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push(CONFIG_DIR_NAME);
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Options passed to the solver
#[derive(Debug, Default, Deserialize, PartialEq, Clone)]
pub struct SolverSettings {
    /// Time limit for a solve, in seconds
    pub time_limit: Option<f64>,
    /// Relative gap at which the MIP search stops
    pub mip_rel_gap: Option<f64>,
    /// Whether to print the solver's own log
    #[serde(default)]
    pub solver_output: bool,
}

/// Program settings from config file
#[derive(Debug, Default, Deserialize, PartialEq, Clone)]
pub struct Settings {
    /// The default program log level
    pub log_level: Option<String>,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
    /// Solver options
    #[serde(default)]
    pub solver: SolverSettings,
}

impl Settings {
    /// Read the contents of the settings file.
    ///
    /// If the file is not present, default values for settings will be used
    ///
    /// # Returns
    ///
    /// The program settings as a `Settings` struct or an error if the file is invalid
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read from the specified path, falling back to defaults if there is no file
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }
}
