//! Command-line argument parsing for iaseek.
//!
//! [Cli] is the `ias` command line. Flags override the matching config values; the
//! result of [Cli::bootstrap] is everything the session needs for its first fetch.
//!
//! `--list-sorts` and `--init` are handled by [handle_args] and exit right away.

use crate::app::{RouterSettings, SessionSettings};
use crate::config::Config;
use crate::core::catalog::{QuerySpec, SORT_KEYS, apply_sort_order, sorted_sort_keys};
use crate::core::download::DownloadSettings;
use crate::core::model::DigestKind;
use crate::utils::clamp_rows;

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use thiserror::Error;

const EXAMPLES: &str = r#"Examples:
  ias -q "Ubuntu 22.04 iso" --mediatype software --rows 25
  ias -q "Beatles" --sort "downloads desc" --ext flac
  ias -q "win98" --iso --hash md5 --dry-run"#;

/// Browse archive.org search results, inspect item files and download them.
#[derive(Parser, Debug)]
#[command(name = "ias", version, about, after_help = EXAMPLES)]
pub struct Cli {
    /// Search terms (e.g. "Ubuntu 22.04 iso")
    #[arg(short, long)]
    pub query: Option<String>,

    /// Restrict the mediatype, e.g. software, audio, movies. Empty for any
    #[arg(long)]
    pub mediatype: Option<String>,

    /// Results per page
    #[arg(long)]
    pub rows: Option<usize>,

    /// First page to fetch
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Sort expression, e.g. "downloads desc" or "date"
    #[arg(long)]
    pub sort: Option<String>,

    /// Order appended to a sort given without one
    #[arg(long, value_parser = ["asc", "desc"])]
    pub order: Option<String>,

    /// List the known sort expressions and exit
    #[arg(long)]
    pub list_sorts: bool,

    /// Fields to request, comma separated
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Print the first request URL to stderr before starting
    #[arg(long)]
    pub print_url: bool,

    /// Shortcut for --description-term iso --description-term cd-rom
    #[arg(long)]
    pub iso: bool,

    /// Add a term to the description:(...) clause (repeatable)
    #[arg(long = "description-term", value_name = "TERM")]
    pub description_terms: Vec<String>,

    /// Only list files with this extension (e.g. iso, zip)
    #[arg(long)]
    pub ext: Option<String>,

    /// Initial substring filter of every file list
    #[arg(long, value_name = "TEXT")]
    pub file_contains: Option<String>,

    /// Show raw byte counts instead of human readable sizes
    #[arg(long)]
    pub no_human: bool,

    /// Show an item's raw JSON detail instead of its file list
    #[arg(long)]
    pub json: bool,

    /// Preferred digest family: md5, sha1, sha256 or crc32
    #[arg(long = "hash", visible_alias = "digest", value_name = "FAMILY")]
    pub hash: Option<DigestKind>,

    /// Directory downloads are saved to
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Report what would be downloaded without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Path to the aria2c binary (looked up on PATH otherwise)
    #[arg(long, value_name = "PATH")]
    pub aria2_path: Option<PathBuf>,

    /// aria2c connections per file (1-16)
    #[arg(long, value_name = "N")]
    pub max_connections: Option<usize>,

    /// Never use aria2c; download over plain HTTP
    #[arg(long)]
    pub no_aria2: bool,

    /// Do not fall back to plain HTTP when aria2c is missing
    #[arg(long)]
    pub no_fallback: bool,

    /// More output: -v for info, -vv for debug
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file (IASEEK_LOG works too)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    pub init: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("--query is required unless using --list-sorts or --init")]
    MissingQuery,
}

pub enum CliAction {
    RunApp,
    Exit,
}

/// Everything the first session needs, with flags and config merged.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub query: QuerySpec,
    pub session: SessionSettings,
    pub router: RouterSettings,
    pub download: DownloadSettings,
    /// Non-fatal problems with the command line, shown once the UI is up.
    pub warnings: Vec<String>,
}

/// Handles the flags that do their work and exit.
pub fn handle_args(cli: &Cli) -> CliAction {
    if cli.list_sorts {
        println!("{}", sorted_sort_keys().join("\n"));
        return CliAction::Exit;
    }

    if cli.init {
        let path = cli.config.clone().unwrap_or_else(Config::default_path);
        if let Err(e) = Config::generate_default(&path) {
            eprintln!("Error: {}", e);
        }
        return CliAction::Exit;
    }

    CliAction::RunApp
}

impl Cli {
    /// Merges the flags into `config` and builds the first query.
    pub fn bootstrap(&self, config: &mut Config) -> Result<Bootstrap, CliError> {
        let terms = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or(CliError::MissingQuery)?;

        self.apply_download_overrides(config);
        let general = config.general();
        let mut warnings = Vec::new();

        let sort = self.sort.as_deref().unwrap_or(general.sort());
        let sort = apply_sort_order(sort, self.order.as_deref());
        if !SORT_KEYS.contains(sort.as_str()) {
            warnings.push(format!(
                "sort '{}' is not in the known list; continuing anyway",
                sort
            ));
        }

        let mut description_terms = general.description_terms().to_vec();
        if self.iso {
            description_terms.extend(["iso".to_string(), "cd-rom".to_string()]);
        }
        description_terms.extend(self.description_terms.iter().cloned());

        let fields = if self.fields.is_empty() {
            general.fields().to_vec()
        } else {
            self.fields.clone()
        };

        let mediatype = match &self.mediatype {
            Some(m) => Some(m.clone()),
            None => general.mediatype().map(str::to_string),
        };

        let query = QuerySpec::new(terms)
            .with_mediatype(mediatype)
            .with_description_terms(description_terms)
            .with_sort(sort)
            .with_fields(fields)
            .with_rows(self.rows.map(clamp_rows).unwrap_or(general.rows()))
            .with_page(self.page);

        let mut digests = general.digests().to_vec();
        if let Some(kind) = self.hash {
            digests.retain(|k| *k != kind);
            digests.insert(0, kind);
        }

        let session = SessionSettings {
            files_per_page: general.files_per_page(),
            human_sizes: general.human_sizes() && !self.no_human,
            digests,
            ext_filter: self.ext.clone().filter(|e| !e.trim().is_empty()),
            file_contains: self.file_contains.clone().filter(|s| !s.is_empty()),
            raw_json: general.raw_json() || self.json,
        };

        let download = config.download();
        let router = RouterSettings {
            download_dir: download.dir().to_path_buf(),
            dry_run: download.dry_run(),
        };

        Ok(Bootstrap {
            query,
            session,
            router,
            download: download.settings(self.verbose > 0),
            warnings,
        })
    }

    fn apply_download_overrides(&self, config: &mut Config) {
        let download = config.download_mut();
        if let Some(dir) = &self.download_dir {
            download.set_dir(dir.clone());
        }
        if let Some(n) = self.max_connections {
            download.set_max_connections(n);
        }
        if let Some(path) = &self.aria2_path {
            download.set_aria2_path(path.clone());
        }
        if self.no_aria2 {
            download.disable_aria2();
        }
        if self.no_fallback {
            download.disable_fallback();
        }
        if self.dry_run {
            download.enable_dry_run();
        }
    }
}
