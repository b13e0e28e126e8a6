//! The `[download]` section of iaseek.toml.

use crate::core::download::{DownloadSettings, ExternalCommand};
use crate::utils::expand_home_path;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// aria2c refuses more than 16 connections per server.
pub const MAX_CONNECTIONS: usize = 16;

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Download {
    dir: String,
    max_connections: usize,
    aria2_path: Option<String>,
    use_aria2: bool,
    fallback: bool,
    dry_run: bool,
    poll_ms: u64,
}

impl Default for Download {
    fn default() -> Self {
        Download {
            dir: "./downloads".into(),
            max_connections: MAX_CONNECTIONS,
            aria2_path: None,
            use_aria2: true,
            fallback: true,
            dry_run: false,
            poll_ms: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InternalDownload {
    dir: PathBuf,
    max_connections: usize,
    aria2_path: Option<PathBuf>,
    use_aria2: bool,
    fallback: bool,
    dry_run: bool,
    poll_interval: Duration,
}

impl From<Download> for InternalDownload {
    fn from(d: Download) -> Self {
        Self {
            dir: expand_home_path(&d.dir),
            max_connections: d.max_connections.clamp(1, MAX_CONNECTIONS),
            aria2_path: d
                .aria2_path
                .filter(|p| !p.trim().is_empty() && p.trim() != "auto")
                .map(|p| expand_home_path(&p)),
            use_aria2: d.use_aria2,
            fallback: d.fallback,
            dry_run: d.dry_run,
            poll_interval: Duration::from_millis(d.poll_ms.clamp(10, 1000)),
        }
    }
}

impl Default for InternalDownload {
    fn default() -> Self {
        Download::default().into()
    }
}

impl InternalDownload {
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    #[inline]
    pub fn aria2_path(&self) -> Option<&Path> {
        self.aria2_path.as_deref()
    }

    #[inline]
    pub fn use_aria2(&self) -> bool {
        self.use_aria2
    }

    #[inline]
    pub fn fallback(&self) -> bool {
        self.fallback
    }

    #[inline]
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Orchestrator settings for this section.
    pub fn settings(&self, verbose: bool) -> DownloadSettings {
        DownloadSettings {
            aria2: self.aria2_path.clone().map(ExternalCommand::new),
            use_aria2: self.use_aria2,
            fallback: self.fallback,
            verbose,
            poll_interval: self.poll_interval,
            max_connections: self.max_connections,
        }
    }

    pub fn set_dir(&mut self, dir: PathBuf) {
        self.dir = dir;
    }

    pub fn set_max_connections(&mut self, n: usize) {
        self.max_connections = n.clamp(1, MAX_CONNECTIONS);
    }

    pub fn set_aria2_path(&mut self, path: PathBuf) {
        self.aria2_path = Some(path);
    }

    pub fn disable_aria2(&mut self) {
        self.use_aria2 = false;
    }

    pub fn disable_fallback(&mut self) {
        self.fallback = false;
    }

    pub fn enable_dry_run(&mut self) {
        self.dry_run = true;
    }
}
