//! Stub collaborators shared by the integration tests.
#![allow(dead_code)]

use iaseek::app::{ActionRouter, RouterSettings, Session, SessionSettings};
use iaseek::core::catalog::{CatalogClient, QuerySpec, SearchPage};
use iaseek::core::download::{DownloadMonitor, DownloadOrchestrator, DownloadSettings, Keystroke};
use iaseek::core::error::{CatalogError, LaunchError};
use iaseek::core::launch::{LocatorProvider, ProviderChain};
use iaseek::core::lookup::{DigestLookup, LookupHit};
use iaseek::core::model::{DigestKind, FileRecord, ItemDetail, ItemMeta, ResultRecord};

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

/// Knobs and counters of a [StubCatalog], shared with the test body.
#[derive(Default)]
pub struct CatalogState {
    pub fail: Cell<bool>,
    pub searches: Cell<usize>,
    pub details: Cell<usize>,
}

/// `count` records named `distro-{i}-iso` (even i) or `distro-{i}-src` (odd i).
pub struct StubCatalog {
    records: Vec<ResultRecord>,
    files: Vec<FileRecord>,
    state: Rc<CatalogState>,
}

impl StubCatalog {
    pub fn new(count: usize, state: Rc<CatalogState>) -> Self {
        let records = (1..=count)
            .map(|i| {
                let kind = if i % 2 == 0 { "iso" } else { "src" };
                ResultRecord::new(format!("distro-{}-{}", i, kind))
                    .with_title(format!("Distro {}", i))
                    .with_downloads(1000 * i as u64)
            })
            .collect();
        Self {
            records,
            files: default_files(),
            state,
        }
    }

    pub fn with_files(mut self, files: Vec<FileRecord>) -> Self {
        self.files = files;
        self
    }
}

pub fn default_files() -> Vec<FileRecord> {
    vec![
        FileRecord::new("disc1.iso")
            .with_size(700_000_000)
            .with_checksum(DigestKind::Sha1, "aaaa")
            .with_checksum(DigestKind::Md5, "bbbb"),
        FileRecord::new("disc2.iso").with_size(650_000_000),
        FileRecord::new("readme.txt").with_size(1200),
        FileRecord::new("disc1_archive.torrent").with_size(20_000),
    ]
}

impl CatalogClient for StubCatalog {
    fn search(&self, query: &QuerySpec) -> Result<SearchPage, CatalogError> {
        self.state.searches.set(self.state.searches.get() + 1);
        if self.state.fail.get() {
            return Err(CatalogError::Status(503));
        }
        let start = (query.page() - 1) * query.rows();
        let records = self
            .records
            .iter()
            .skip(start)
            .take(query.rows())
            .cloned()
            .collect();
        Ok(SearchPage {
            records,
            total: Some(self.records.len()),
        })
    }

    fn detail(&self, identifier: &str) -> Result<ItemDetail, CatalogError> {
        self.state.details.set(self.state.details.get() + 1);
        if self.state.fail.get() {
            return Err(CatalogError::Decode("truncated body".into()));
        }
        Ok(ItemDetail {
            meta: ItemMeta {
                identifier: identifier.to_string(),
                title: Some(format!("Title of {}", identifier)),
                files_count: Some(self.files.len() as u64),
                server: Some("ia800100.us.archive.org".into()),
                dir: Some(format!("/1/items/{}", identifier)),
                ..ItemMeta::default()
            },
            files: self.files.clone(),
        })
    }

    fn raw_detail(&self, identifier: &str) -> Result<serde_json::Value, CatalogError> {
        self.state.details.set(self.state.details.get() + 1);
        if self.state.fail.get() {
            return Err(CatalogError::Status(502));
        }
        let files: Vec<&str> = self.files.iter().map(FileRecord::name).collect();
        Ok(serde_json::json!({
            "metadata": {"identifier": identifier},
            "files": files,
        }))
    }
}

/// Answers every lookup with the same result.
pub struct StubLookup {
    pub hit: Option<LookupHit>,
    pub fail: bool,
}

impl DigestLookup for StubLookup {
    fn lookup(&self, _digest: &str) -> Result<Option<LookupHit>, CatalogError> {
        if self.fail {
            return Err(CatalogError::Status(500));
        }
        Ok(self.hit.clone())
    }
}

/// Provider that records what it was handed.
pub struct RecordingProvider {
    pub delivered: Rc<RefCell<Vec<String>>>,
}

impl LocatorProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recorder"
    }

    fn available(&self) -> bool {
        true
    }

    fn deliver(&self, locator: &str) -> Result<(), LaunchError> {
        self.delivered.borrow_mut().push(locator.to_string());
        Ok(())
    }
}

/// Monitor answering one poll with `interrupt` and keeping every emitted line.
///
/// With `wait_for` set, the interrupt is held back until a line equal to it was emitted.
#[derive(Default)]
pub struct ScriptedMonitor {
    pub interrupt: Option<Keystroke>,
    pub wait_for: Option<String>,
    pub polls: usize,
    pub lines: Vec<String>,
}

impl DownloadMonitor for ScriptedMonitor {
    fn poll_interrupt(&mut self) -> Option<Keystroke> {
        self.polls += 1;
        if let Some(expected) = &self.wait_for
            && !self.lines.iter().any(|l| l == expected)
        {
            return None;
        }
        self.interrupt.take()
    }

    fn emit(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

pub fn router(
    lookup: StubLookup,
    clipboard: Rc<RefCell<Vec<String>>>,
    download_dir: &Path,
    dry_run: bool,
) -> ActionRouter {
    ActionRouter::new(
        Box::new(lookup),
        ProviderChain::new(
            "clipboard",
            vec![Box::new(RecordingProvider {
                delivered: clipboard,
            })],
        ),
        ProviderChain::new("open", Vec::new()),
        DownloadOrchestrator::new(DownloadSettings {
            use_aria2: false,
            fallback: false,
            ..DownloadSettings::default()
        }),
        RouterSettings {
            download_dir: download_dir.to_path_buf(),
            dry_run,
        },
    )
}

/// A session over 25 stub records, 10 per page, in dry-run mode.
pub fn session(state: Rc<CatalogState>) -> Result<Session, CatalogError> {
    session_with(StubCatalog::new(25, state), SessionSettings::default())
}

/// A session over `catalog` whose file actions go through `router`.
pub fn session_routed(
    catalog: StubCatalog,
    router: ActionRouter,
    settings: SessionSettings,
) -> Result<Session, CatalogError> {
    Session::start(
        QuerySpec::new("distro").with_rows(10),
        Box::new(catalog),
        router,
        settings,
    )
}

pub fn session_with(
    catalog: StubCatalog,
    settings: SessionSettings,
) -> Result<Session, CatalogError> {
    let router = router(
        StubLookup {
            hit: Some(LookupHit {
                name: "ubuntu-22.04-desktop-amd64.iso".into(),
                locator: "https://files.example/ubuntu.iso".into(),
            }),
            fail: false,
        },
        Rc::new(RefCell::new(Vec::new())),
        &std::env::temp_dir(),
        true,
    );
    session_routed(catalog, router, settings)
}
