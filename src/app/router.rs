//! Per-file action dispatch.
//!
//! The [ActionRouter] owns everything a selected file can be handed to: the digest lookup,
//! the clipboard and open-locator provider chains and the download orchestrator. Each
//! one-character action key maps to exactly one branch, and every branch reports what
//! happened as [Notice]s plus where the session goes next.

use crate::app::session::Notice;
use crate::core::download::{DownloadMonitor, DownloadOrchestrator, DownloadTask, Outcome};
use crate::core::launch::ProviderChain;
use crate::core::lookup::DigestLookup;
use crate::core::model::FileInfo;
use crate::utils::shorten_home_path;

use std::path::PathBuf;
use tracing::{info, warn};

/// Actions available on a selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileActionKey {
    Download,
    Hash,
    Open,
    Copy,
    Back,
    Quit,
}

impl FileActionKey {
    pub const ALL: [FileActionKey; 6] = [
        FileActionKey::Download,
        FileActionKey::Hash,
        FileActionKey::Open,
        FileActionKey::Copy,
        FileActionKey::Back,
        FileActionKey::Quit,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'd' => Some(FileActionKey::Download),
            'h' => Some(FileActionKey::Hash),
            'o' => Some(FileActionKey::Open),
            'c' => Some(FileActionKey::Copy),
            'b' => Some(FileActionKey::Back),
            'q' => Some(FileActionKey::Quit),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            FileActionKey::Download => 'd',
            FileActionKey::Hash => 'h',
            FileActionKey::Open => 'o',
            FileActionKey::Copy => 'c',
            FileActionKey::Back => 'b',
            FileActionKey::Quit => 'q',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileActionKey::Download => "download",
            FileActionKey::Hash => "look up digest",
            FileActionKey::Open => "open link",
            FileActionKey::Copy => "copy link",
            FileActionKey::Back => "back",
            FileActionKey::Quit => "quit",
        }
    }
}

/// Where the session goes after a routed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Stay,
    ReturnToFiles,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub next: Next,
    pub notices: Vec<Notice>,
}

impl Routed {
    fn stay(notice: Notice) -> Self {
        Self {
            next: Next::Stay,
            notices: vec![notice],
        }
    }

    fn to_files(notices: Vec<Notice>) -> Self {
        Self {
            next: Next::ReturnToFiles,
            notices,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub download_dir: PathBuf,
    pub dry_run: bool,
}

pub struct ActionRouter {
    lookup: Box<dyn DigestLookup>,
    clipboard: ProviderChain,
    opener: ProviderChain,
    downloader: DownloadOrchestrator,
    settings: RouterSettings,
}

impl ActionRouter {
    pub fn new(
        lookup: Box<dyn DigestLookup>,
        clipboard: ProviderChain,
        opener: ProviderChain,
        downloader: DownloadOrchestrator,
        settings: RouterSettings,
    ) -> Self {
        Self {
            lookup,
            clipboard,
            opener,
            downloader,
            settings,
        }
    }

    #[inline]
    pub fn download_dir(&self) -> &std::path::Path {
        &self.settings.download_dir
    }

    #[inline]
    pub fn dry_run(&self) -> bool {
        self.settings.dry_run
    }

    /// Routes a raw one-character command. Unknown characters are reported, never fatal.
    pub fn route_char(
        &self,
        c: char,
        info: &FileInfo,
        monitor: &mut dyn DownloadMonitor,
    ) -> Routed {
        match FileActionKey::from_char(c) {
            Some(key) => self.route(key, info, monitor),
            None => Routed::stay(Self::unknown_action(c)),
        }
    }

    /// The report for a key that names no file action.
    pub fn unknown_action(c: char) -> Notice {
        Notice::warn(format!("Unknown action '{}'", c))
    }

    pub fn route(
        &self,
        key: FileActionKey,
        info: &FileInfo,
        monitor: &mut dyn DownloadMonitor,
    ) -> Routed {
        match key {
            FileActionKey::Download => self.download(info, monitor),
            FileActionKey::Hash => self.hash(info),
            FileActionKey::Open => Routed::stay(self.open(info.locator(), "file link")),
            FileActionKey::Copy => Routed::stay(self.copy(info.locator(), "file link")),
            FileActionKey::Back => Routed::to_files(Vec::new()),
            FileActionKey::Quit => Routed {
                next: Next::Quit,
                notices: Vec::new(),
            },
        }
    }

    /// Copies `locator` to the clipboard.
    pub fn copy(&self, locator: Option<&str>, what: &str) -> Notice {
        let Some(locator) = locator else {
            return Notice::warn(format!("No {} available", what));
        };
        match self.clipboard.deliver(locator) {
            Ok(provider) => Notice::info(format!("Copied {} ({})", what, provider)),
            Err(e) => Notice::error(format!("Copy failed: {}", e)),
        }
    }

    /// Opens `locator` with the platform opener.
    pub fn open(&self, locator: Option<&str>, what: &str) -> Notice {
        let Some(locator) = locator else {
            return Notice::warn(format!("No {} available", what));
        };
        match self.opener.deliver(locator) {
            Ok(provider) => Notice::info(format!("Opened {} ({})", what, provider)),
            Err(e) => Notice::error(format!("Open failed: {}", e)),
        }
    }

    fn hash(&self, info: &FileInfo) -> Routed {
        let Some((kind, digest)) = info.digest() else {
            return Routed::stay(Notice::warn(format!(
                "{} has no digest to look up",
                info.name()
            )));
        };

        match self.lookup.lookup(digest) {
            Ok(Some(hit)) => {
                info!(digest, name = %hit.name, "digest lookup hit");
                Routed::to_files(vec![
                    Notice::info(format!("{} match: {}", kind.label(), hit.name)),
                    Notice::info(hit.locator),
                ])
            }
            Ok(None) => Routed::to_files(vec![Notice::warn(format!(
                "No file found for {} {}",
                kind.label(),
                digest
            ))]),
            Err(e) => {
                warn!(error = %e, "digest lookup failed");
                Routed::stay(Notice::error(format!("Lookup failed: {}", e)))
            }
        }
    }

    fn download(&self, info: &FileInfo, monitor: &mut dyn DownloadMonitor) -> Routed {
        let Some(locator) = info.locator() else {
            return Routed::stay(Notice::warn(
                "No download link: the item does not report a server and directory",
            ));
        };

        let dest = shorten_home_path(&self.settings.download_dir);
        if self.settings.dry_run {
            return Routed::to_files(vec![Notice::info(format!(
                "Dry run: {} -> {}",
                locator, dest
            ))]);
        }

        let mut task = DownloadTask::new(
            locator,
            self.settings.download_dir.clone(),
            info.name(),
            self.downloader.settings().max_connections,
        );

        match self.downloader.run(&mut task, monitor) {
            Outcome::Succeeded => {
                Routed::to_files(vec![Notice::info(format!("Downloaded {} to {}", info.name(), dest))])
            }
            Outcome::Failed(reason) => Routed::to_files(vec![Notice::error(format!(
                "Download of {} failed: {}",
                info.name(),
                reason
            ))]),
            Outcome::Cancelled => {
                Routed::to_files(vec![Notice::warn(format!("Download of {} cancelled", info.name()))])
            }
            Outcome::Quit => Routed {
                next: Next::Quit,
                notices: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_keys_round_trip_through_chars() {
        for key in FileActionKey::ALL {
            assert_eq!(FileActionKey::from_char(key.as_char()), Some(key));
        }
        assert_eq!(FileActionKey::from_char('D'), Some(FileActionKey::Download));
        assert_eq!(FileActionKey::from_char('x'), None);
    }
}
