//! The general configuration settings for iaseek.
//!
//! [General] is deserialized from the `[general]` table of iaseek.toml,
//! [InternalGeneral] is the validated form used at runtime.

use crate::config::ConfigError;
use crate::core::catalog::{DEFAULT_FIELDS, DEFAULT_SORT};
use crate::core::model::DigestKind;
use crate::utils::clamp_rows;

use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct General {
    mediatype: String,
    rows: usize,
    sort: String,
    fields: Vec<String>,
    description_terms: Vec<String>,
    files_per_page: usize,
    human_sizes: bool,
    digests: Vec<String>,
    notice_secs: u64,
    raw_json: bool,
}

impl Default for General {
    fn default() -> Self {
        General {
            mediatype: "software".into(),
            rows: 10,
            sort: DEFAULT_SORT.into(),
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            description_terms: Vec::new(),
            files_per_page: 20,
            human_sizes: true,
            digests: vec!["sha1".into(), "md5".into()],
            notice_secs: 4,
            raw_json: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InternalGeneral {
    mediatype: Option<String>,
    rows: usize,
    sort: String,
    fields: Vec<String>,
    description_terms: Vec<String>,
    files_per_page: usize,
    human_sizes: bool,
    digests: Vec<DigestKind>,
    notice_duration: Duration,
    raw_json: bool,
}

impl TryFrom<General> for InternalGeneral {
    type Error = ConfigError;

    fn try_from(g: General) -> Result<Self, Self::Error> {
        let digests = parse_digests(&g.digests)?;
        Ok(Self {
            mediatype: Some(g.mediatype).filter(|m| !m.trim().is_empty()),
            rows: clamp_rows(g.rows),
            sort: if g.sort.trim().is_empty() {
                DEFAULT_SORT.into()
            } else {
                g.sort
            },
            fields: g.fields,
            description_terms: g.description_terms,
            files_per_page: clamp_rows(g.files_per_page),
            human_sizes: g.human_sizes,
            digests,
            notice_duration: Duration::from_secs(g.notice_secs.clamp(1, 60)),
            raw_json: g.raw_json,
        })
    }
}

impl Default for InternalGeneral {
    fn default() -> Self {
        let g = General::default();
        Self {
            mediatype: Some(g.mediatype),
            rows: g.rows,
            sort: g.sort,
            fields: g.fields,
            description_terms: g.description_terms,
            files_per_page: g.files_per_page,
            human_sizes: g.human_sizes,
            digests: vec![DigestKind::Sha1, DigestKind::Md5],
            notice_duration: Duration::from_secs(g.notice_secs),
            raw_json: g.raw_json,
        }
    }
}

/// Parses an ordered digest preference list, rejecting unknown families and duplicates.
pub fn parse_digests(names: &[String]) -> Result<Vec<DigestKind>, ConfigError> {
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let kind: DigestKind = name.parse().map_err(ConfigError::Invalid)?;
        if !out.contains(&kind) {
            out.push(kind);
        }
    }
    if out.is_empty() {
        return Err(ConfigError::Invalid(
            "general.digests must name at least one digest family".into(),
        ));
    }
    Ok(out)
}

impl InternalGeneral {
    #[inline]
    pub fn mediatype(&self) -> Option<&str> {
        self.mediatype.as_deref()
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn sort(&self) -> &str {
        &self.sort
    }

    #[inline]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[inline]
    pub fn description_terms(&self) -> &[String] {
        &self.description_terms
    }

    #[inline]
    pub fn files_per_page(&self) -> usize {
        self.files_per_page
    }

    #[inline]
    pub fn human_sizes(&self) -> bool {
        self.human_sizes
    }

    #[inline]
    pub fn raw_json(&self) -> bool {
        self.raw_json
    }

    #[inline]
    pub fn digests(&self) -> &[DigestKind] {
        &self.digests
    }

    #[inline]
    pub fn notice_duration(&self) -> Duration {
        self.notice_duration
    }
}
