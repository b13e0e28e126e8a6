//! Catalog records and the per-selection [FileInfo].
//!
//! Everything in here is already normalised: the catalog client turns the loosely shaped
//! JSON payloads into these types at the boundary, so the rest of iaseek never looks at
//! raw JSON.

use crate::core::formatter::{format_byte_count, format_file_size};

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Suffix which marks a file as a torrent descriptor.
pub const TORRENT_SUFFIX: &str = ".torrent";

/// Base used for item page locators.
pub const DETAILS_BASE: &str = "https://archive.org/details/";

/// A checksum family a catalog file may carry.
///
/// Which families are shown and preferred is configured, see `general.digests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    Md5,
    Sha1,
    Sha256,
    Crc32,
}

impl DigestKind {
    pub const ALL: [DigestKind; 4] = [
        DigestKind::Md5,
        DigestKind::Sha1,
        DigestKind::Sha256,
        DigestKind::Crc32,
    ];

    /// The key used by the catalog payload.
    pub fn key(self) -> &'static str {
        match self {
            DigestKind::Md5 => "md5",
            DigestKind::Sha1 => "sha1",
            DigestKind::Sha256 => "sha256",
            DigestKind::Crc32 => "crc32",
        }
    }

    /// Upper case column label.
    pub fn label(self) -> &'static str {
        match self {
            DigestKind::Md5 => "MD5",
            DigestKind::Sha1 => "SHA1",
            DigestKind::Sha256 => "SHA256",
            DigestKind::Crc32 => "CRC32",
        }
    }
}

impl fmt::Display for DigestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DigestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DigestKind::ALL
            .into_iter()
            .find(|k| k.key() == lower)
            .ok_or_else(|| format!("unknown digest family '{}'", s))
    }
}

/// One row of a catalog search page.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    identifier: String,
    title: Option<String>,
    downloads: Option<u64>,
    date: Option<String>,
}

impl ResultRecord {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            downloads: None,
            date: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_downloads(mut self, downloads: u64) -> Self {
        self.downloads = Some(downloads);
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[inline]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[inline]
    pub fn downloads(&self) -> Option<u64> {
        self.downloads
    }

    #[inline]
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// Text the results filter is matched against.
    pub fn filter_text(&self) -> String {
        match &self.title {
            Some(title) => format!("{} {}", self.identifier, title),
            None => self.identifier.clone(),
        }
    }
}

/// Item level metadata of a detail record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemMeta {
    pub identifier: String,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub date: Option<String>,
    pub item_size: Option<u64>,
    pub files_count: Option<u64>,
    pub server: Option<String>,
    pub dir: Option<String>,
}

impl ItemMeta {
    /// Title for headers, falling back to the identifier.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.identifier)
    }

    /// Public page of the item, if it has an identifier.
    pub fn page_locator(&self) -> Option<String> {
        if self.identifier.is_empty() {
            return None;
        }
        let mut url = Url::parse(DETAILS_BASE).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push(&self.identifier);
        Some(url.to_string())
    }

    /// Direct locator of a file belonging to this item.
    pub fn file_locator(&self, name: &str) -> Option<String> {
        build_file_locator(self.server.as_deref()?, self.dir.as_deref()?, name)
    }
}

/// A detail record: metadata plus the full file list of one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDetail {
    pub meta: ItemMeta,
    pub files: Vec<FileRecord>,
}

/// One file of an item.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    name: String,
    size: Option<u64>,
    checksums: Vec<(DigestKind, String)>,
    format: Option<String>,
    mtime: Option<String>,
}

impl FileRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            checksums: Vec::new(),
            format: None,
            mtime: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_checksum(mut self, kind: DigestKind, value: impl Into<String>) -> Self {
        self.checksums.retain(|(k, _)| *k != kind);
        self.checksums.push((kind, value.into()));
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_mtime(mut self, mtime: impl Into<String>) -> Self {
        self.mtime = Some(mtime.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    #[inline]
    pub fn mtime(&self) -> Option<&str> {
        self.mtime.as_deref()
    }

    #[inline]
    pub fn checksums(&self) -> &[(DigestKind, String)] {
        &self.checksums
    }

    pub fn digest(&self, kind: DigestKind) -> Option<&str> {
        self.checksums
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| v.as_str())
    }

    /// First digest present in the given preference order.
    pub fn preferred_digest(&self, prefs: &[DigestKind]) -> Option<(DigestKind, &str)> {
        prefs
            .iter()
            .find_map(|&kind| self.digest(kind).map(|v| (kind, v)))
    }

    pub fn is_torrent(&self) -> bool {
        self.name.to_lowercase().ends_with(TORRENT_SUFFIX)
    }

    /// True if the name ends in `.ext`, ignoring case and a leading dot on `ext`.
    pub fn has_extension(&self, ext: &str) -> bool {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if ext.is_empty() {
            return true;
        }
        self.name.to_lowercase().ends_with(&format!(".{}", ext))
    }

    /// Text the file filter is matched against.
    pub fn filter_text(&self) -> String {
        self.name.clone()
    }
}

/// Derived, transient view of a selected file.
///
/// Recomputed every time a file is selected and dropped when the file action view is left.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    name: String,
    size: Option<u64>,
    size_label: String,
    locator: Option<String>,
    page_locator: Option<String>,
    digest: Option<(DigestKind, String)>,
    checksums: Vec<(DigestKind, String)>,
    format: Option<String>,
    mtime: Option<String>,
    is_torrent: bool,
}

impl FileInfo {
    /// Resolves locators, size label and chosen digest of `file` inside `meta`.
    pub fn resolve(meta: &ItemMeta, file: &FileRecord, prefs: &[DigestKind], human: bool) -> Self {
        let size_label = match file.size() {
            Some(sz) if human => format_file_size(sz),
            Some(sz) => format_byte_count(sz),
            None => "-".to_string(),
        };

        Self {
            name: file.name().to_string(),
            size: file.size(),
            size_label,
            locator: meta.file_locator(file.name()),
            page_locator: meta.page_locator(),
            digest: file
                .preferred_digest(prefs)
                .map(|(k, v)| (k, v.to_string())),
            checksums: file.checksums().to_vec(),
            format: file.format.clone(),
            mtime: file.mtime.clone(),
            is_torrent: file.is_torrent(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    pub fn size_label(&self) -> &str {
        &self.size_label
    }

    #[inline]
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    #[inline]
    pub fn page_locator(&self) -> Option<&str> {
        self.page_locator.as_deref()
    }

    #[inline]
    pub fn digest(&self) -> Option<(DigestKind, &str)> {
        self.digest.as_ref().map(|(k, v)| (*k, v.as_str()))
    }

    #[inline]
    pub fn checksums(&self) -> &[(DigestKind, String)] {
        &self.checksums
    }

    #[inline]
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    #[inline]
    pub fn mtime(&self) -> Option<&str> {
        self.mtime.as_deref()
    }

    #[inline]
    pub fn is_torrent(&self) -> bool {
        self.is_torrent
    }
}

/// Builds `https://{server}{dir}/{name}` with every path segment percent-encoded.
pub fn build_file_locator(server: &str, dir: &str, name: &str) -> Option<String> {
    let server = server.trim().trim_end_matches('/');
    if server.is_empty() || dir.trim().is_empty() {
        return None;
    }

    let mut url = Url::parse(&format!("https://{}/", server)).ok()?;
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.clear();
        for part in dir.split('/').filter(|s| !s.is_empty()) {
            segments.push(part);
        }
        for part in name.trim_start_matches('/').split('/') {
            segments.push(part);
        }
    }
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ItemMeta {
        ItemMeta {
            identifier: "ubuntu-22.04".into(),
            title: Some("Ubuntu 22.04".into()),
            server: Some("ia800.us.archive.org".into()),
            dir: Some("/12/items/ubuntu-22.04".into()),
            ..ItemMeta::default()
        }
    }

    #[test]
    fn file_locator_encodes_segments() {
        let url = build_file_locator("ia800.us.archive.org", "/12/items/x", "disc one/my file#1.iso");
        assert_eq!(
            url.as_deref(),
            Some("https://ia800.us.archive.org/12/items/x/disc%20one/my%20file%231.iso")
        );
    }

    #[test]
    fn file_locator_requires_server_and_dir() {
        assert!(build_file_locator("", "/1/items/x", "a.iso").is_none());
        assert!(build_file_locator("ia800.us.archive.org", "", "a.iso").is_none());
    }

    #[test]
    fn page_locator_uses_identifier() {
        assert_eq!(
            meta().page_locator().as_deref(),
            Some("https://archive.org/details/ubuntu-22.04")
        );
        assert!(ItemMeta::default().page_locator().is_none());
    }

    #[test]
    fn file_info_prefers_configured_digest() {
        let file = FileRecord::new("ubuntu.iso")
            .with_size(2048)
            .with_checksum(DigestKind::Md5, "aa")
            .with_checksum(DigestKind::Sha1, "bb");

        let info = FileInfo::resolve(&meta(), &file, &[DigestKind::Sha256, DigestKind::Sha1], true);
        assert_eq!(info.digest(), Some((DigestKind::Sha1, "bb")));

        let info = FileInfo::resolve(&meta(), &file, &[DigestKind::Md5], false);
        assert_eq!(info.digest(), Some((DigestKind::Md5, "aa")));
        assert_eq!(info.size_label(), "2,048 bytes");
        assert_eq!(
            info.locator(),
            Some("https://ia800.us.archive.org/12/items/ubuntu-22.04/ubuntu.iso")
        );
        assert!(!info.is_torrent());
    }

    #[test]
    fn torrent_flag_and_extension_match_ignore_case() {
        let file = FileRecord::new("Ubuntu_Archive.TORRENT");
        assert!(file.is_torrent());
        assert!(file.has_extension(".torrent"));
        assert!(file.has_extension("Torrent"));
        assert!(!file.has_extension("iso"));
    }

    #[test]
    fn digest_kind_parses_case_insensitively() {
        assert_eq!("SHA256".parse::<DigestKind>(), Ok(DigestKind::Sha256));
        assert!("blake3".parse::<DigestKind>().is_err());
    }
}
