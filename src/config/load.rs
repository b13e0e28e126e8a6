//! The main config loading module for iaseek.
//!
//! Handles loading and deserializing settings from `iaseek.toml`.
//!
//! Provides the main [Config] struct, as well as the internal [RawConfig] used for parsing.
//! A missing file means internal defaults; a file that exists but does not parse is an error,
//! since iaseek cannot know which of the user's settings to trust.

use crate::config::{Display, Download, General, InternalDownload, InternalGeneral, Keys};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Raw configuration as read from the toml file.
/// It is converted into the main [Config] struct after validation.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct RawConfig {
    general: General,
    download: Download,
    display: Display,
    keys: Keys,
}

/// Validated configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    general: InternalGeneral,
    download: InternalDownload,
    display: Display,
    keys: Keys,
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            general: InternalGeneral::try_from(raw.general)?,
            download: InternalDownload::from(raw.download),
            display: raw.display,
            keys: raw.keys,
        })
    }
}

impl Config {
    /// Loads from `path`, or from [Config::default_path] when `None`.
    ///
    /// A missing file yields the internal defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        if !path.exists() {
            info!(path = %path.display(), "no config file, using internal defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&path, &content)
    }

    /// Parses `content` as if it had been read from `path`.
    pub fn from_toml(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        raw.try_into()
    }

    // Getters

    #[inline]
    pub fn general(&self) -> &InternalGeneral {
        &self.general
    }

    #[inline]
    pub fn download(&self) -> &InternalDownload {
        &self.download
    }

    #[inline]
    pub fn download_mut(&mut self) -> &mut InternalDownload {
        &mut self.download
    }

    #[inline]
    pub fn display(&self) -> &Display {
        &self.display
    }

    #[inline]
    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    /// Determine the default configuration file path.
    /// Checks the IASEEK_CONFIG environment variable first,
    /// Checks for XDG_CONFIG_HOME after,
    /// then defaults to ~/.config/iaseek/iaseek.toml,
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("IASEEK_CONFIG") {
            return PathBuf::from(path);
        }

        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg_config).join("iaseek/iaseek.toml");
        }

        if let Some(home) = dirs::home_dir() {
            return home.join(".config/iaseek/iaseek.toml");
        }
        PathBuf::from("iaseek.toml")
    }

    /// Generate a default configuration file at the specified path.
    /// If the file already exists, returns an error.
    pub fn generate_default(path: &Path) -> io::Result<()> {
        if path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Config file already exists at {:?}", path),
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_TOML)?;
        println!("Default config generated at {:?}", path);
        Ok(())
    }
}

/// Written by `ias --init`. Commented values are the internal defaults.
pub const DEFAULT_TOML: &str = r##"# iaseek.toml - default configuration for iaseek

# Note:
# Commented values are the internal defaults of iaseek
# Use hex codes (eg. "#RRGGBB") or terminal colors ("cyan")

[general]
mediatype = "software"
# rows = 10
# sort = "downloads desc"
# description_terms = []
# files_per_page = 20
# human_sizes = true
# Digest families shown and used for lookups, in order of preference.
# Any of "md5", "sha1", "sha256", "crc32".
digests = ["sha1", "md5"]
# notice_secs = 4
# Show the raw item JSON instead of the file list when an item is selected.
# raw_json = false

[download]
dir = "./downloads"
# max_connections = 16
# aria2_path = "auto"
# use_aria2 = true
# fallback = true
# dry_run = false
# poll_ms = 50

[display]
# border_shape = "rounded"
# titles = true
# zebra = false

# [display.theme]
# accent = "cyan"
# selection = "#303030"
# index = "magenta"
# title = "blue"
# size = "green"
# digest = "darkgray"
# warning = "yellow"
# border = "#444444"

# [keys]
# next = ["n", "Right"]
# prev = ["p", "Left"]
# filter = ["f"]
# reset = ["r"]
# search = ["s"]
# back = ["b", "Backspace", "Esc"]
# open = ["o"]
# copy = ["c"]
# go_up = ["k", "Up"]
# go_down = ["j", "Down"]
# select = ["Enter"]
# command = [":"]
# quit = ["q"]
# download = ["d"]
# hash = ["h"]
# cancel = ["c", "Esc"]
# keybind_help = ["?"]
"##;

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::model::DigestKind;
    use std::error;
    use tempfile::tempdir;

    #[test]
    fn generated_default_parses_back() -> Result<(), Box<dyn error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("iaseek/iaseek.toml");

        Config::generate_default(&path)?;
        let config = Config::load(Some(&path))?;

        assert_eq!(config.general().mediatype(), Some("software"));
        assert_eq!(
            config.general().digests(),
            &[DigestKind::Sha1, DigestKind::Md5]
        );
        assert_eq!(config.download().max_connections(), 16);

        assert!(Config::generate_default(&path).is_err());
        Ok(())
    }

    #[test]
    fn missing_file_is_defaults() -> Result<(), Box<dyn error::Error>> {
        let dir = tempdir()?;
        let config = Config::load(Some(&dir.path().join("absent.toml")))?;
        assert_eq!(config.general().rows(), 10);
        assert_eq!(config.general().files_per_page(), 20);
        Ok(())
    }

    #[test]
    fn broken_file_is_an_error() {
        let err = Config::from_toml(Path::new("x.toml"), "[general\nrows = ");
        assert!(matches!(err, Err(ConfigError::Parse { .. })));

        let err = Config::from_toml(Path::new("x.toml"), "[general]\ndigests = [\"blake9\"]");
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }
}
