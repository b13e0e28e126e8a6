//! The browse session: results, item files and the file action view.
//!
//! [Session] owns the current [QuerySpec], the fetched results page and, while an item is
//! open, its file list. Every user input arrives as a [Command] through [Session::dispatch],
//! which either pages or filters locally, re-fetches from the catalog, moves between views
//! or hands the selected file to the [ActionRouter].
//!
//! Failures never end the session. A failed fetch leaves the previous data, page and filter
//! exactly as they were and queues a [Notice]; the user can retry the same command.

use crate::app::command::Command;
use crate::app::router::{ActionRouter, FileActionKey, Next};
use crate::core::catalog::{CatalogClient, QuerySpec, SearchPage};
use crate::core::download::DownloadMonitor;
use crate::core::error::CatalogError;
use crate::core::model::{DigestKind, FileInfo, FileRecord, ItemDetail, ItemMeta, ResultRecord};
use crate::core::paging::{PageWindow, PagedFilteredList};

use std::collections::VecDeque;
use std::mem;
use tracing::{debug, info, warn};

/// Severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// A message for the user, shown as a timed overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    level: NoticeLevel,
    text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warn,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    #[inline]
    pub fn level(&self) -> NoticeLevel {
        self.level
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Settings that shape the item file views.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub files_per_page: usize,
    pub human_sizes: bool,
    pub digests: Vec<DigestKind>,
    /// Keep only files with this extension.
    pub ext_filter: Option<String>,
    /// Initial substring filter of every file list.
    pub file_contains: Option<String>,
    /// Show the raw detail payload instead of opening the file list.
    pub raw_json: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            files_per_page: 20,
            human_sizes: true,
            digests: vec![DigestKind::Sha1, DigestKind::Md5],
            ext_filter: None,
            file_contains: None,
            raw_json: false,
        }
    }
}

/// An opened item: its metadata and the windowed file list.
pub struct ItemContext {
    meta: ItemMeta,
    files: PagedFilteredList<FileRecord>,
    /// File count before the extension restriction.
    unrestricted: usize,
}

impl ItemContext {
    fn new(detail: ItemDetail, settings: &SessionSettings) -> Self {
        let unrestricted = detail.files.len();
        let files: Vec<FileRecord> = match &settings.ext_filter {
            Some(ext) => detail
                .files
                .into_iter()
                .filter(|f| f.has_extension(ext))
                .collect(),
            None => detail.files,
        };

        let mut list =
            PagedFilteredList::with_items(settings.files_per_page, FileRecord::filter_text, files);
        list.set_filter(settings.file_contains.clone());

        Self {
            meta: detail.meta,
            files: list,
            unrestricted,
        }
    }

    #[inline]
    pub fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    #[inline]
    pub fn files(&self) -> &PagedFilteredList<FileRecord> {
        &self.files
    }

    #[inline]
    pub fn unrestricted_len(&self) -> usize {
        self.unrestricted
    }
}

/// A pretty-printed detail payload waiting to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDetail {
    pub identifier: String,
    pub text: String,
}

pub enum View {
    Results,
    ItemFiles(ItemContext),
    FileAction(ItemContext, FileInfo),
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Results => "results",
            View::ItemFiles(_) => "files",
            View::FileAction(..) => "file",
        }
    }
}

pub struct Session {
    catalog: Box<dyn CatalogClient>,
    router: ActionRouter,
    settings: SessionSettings,
    query: QuerySpec,
    fetched_page: usize,
    total: Option<usize>,
    results: PagedFilteredList<ResultRecord>,
    view: View,
    notices: VecDeque<Notice>,
    raw: Option<RawDetail>,
}

impl Session {
    /// Fetches the first page of `query` and enters the results view.
    ///
    /// This is the only fetch whose failure is returned instead of reported.
    pub fn start(
        query: QuerySpec,
        catalog: Box<dyn CatalogClient>,
        router: ActionRouter,
        settings: SessionSettings,
    ) -> Result<Self, CatalogError> {
        let page = catalog.search(&query)?;
        info!(query = query.query(), page = query.page(), "session started");

        let results =
            PagedFilteredList::with_items(query.rows(), ResultRecord::filter_text, page.records);
        Ok(Self {
            catalog,
            router,
            settings,
            fetched_page: query.page(),
            total: page.total,
            query,
            results,
            view: View::Results,
            notices: VecDeque::new(),
            raw: None,
        })
    }

    // Getters / accessors

    #[inline]
    pub fn view(&self) -> &View {
        &self.view
    }

    #[inline]
    pub fn query(&self) -> &QuerySpec {
        &self.query
    }

    #[inline]
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    #[inline]
    pub fn results(&self) -> &PagedFilteredList<ResultRecord> {
        &self.results
    }

    #[inline]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[inline]
    pub fn router(&self) -> &ActionRouter {
        &self.router
    }

    /// The results window, positioned on the remote page.
    pub fn results_window(&self) -> PageWindow<'_, ResultRecord> {
        self.results
            .page()
            .with_position(self.query.page(), self.remote_pages())
    }

    /// The file window of the open item, if any.
    pub fn files_window(&self) -> Option<PageWindow<'_, FileRecord>> {
        match &self.view {
            View::ItemFiles(ctx) | View::FileAction(ctx, _) => Some(ctx.files.page()),
            View::Results => None,
        }
    }

    /// Filter active in the current view.
    pub fn active_filter(&self) -> Option<&str> {
        match &self.view {
            View::Results => self.results.filter(),
            View::ItemFiles(ctx) | View::FileAction(ctx, _) => ctx.files.filter(),
        }
    }

    /// Number of remote result pages.
    ///
    /// Without a reported total, a full page hints that another one may follow.
    pub fn remote_pages(&self) -> usize {
        let rows = self.query.rows();
        match self.total {
            Some(total) => total.div_ceil(rows).max(1),
            None if self.results.backing().len() >= rows => self.query.page() + 1,
            None => self.query.page(),
        }
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    /// Takes the raw detail fetched by the last selection, if any.
    pub fn take_raw_detail(&mut self) -> Option<RawDetail> {
        self.raw.take()
    }

    /// Takes all queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    // Dispatch

    /// Applies one command. `monitor` is only used when a download runs.
    pub fn dispatch(&mut self, cmd: Command, monitor: &mut dyn DownloadMonitor) -> Flow {
        debug!(command = %cmd, view = self.view.name(), "dispatch");
        if cmd == Command::Quit {
            return Flow::Quit;
        }

        match mem::replace(&mut self.view, View::Results) {
            View::Results => {
                self.on_results(cmd);
                Flow::Continue
            }
            View::ItemFiles(ctx) => {
                self.view = self.on_item_files(ctx, cmd);
                Flow::Continue
            }
            View::FileAction(ctx, info) => self.on_file_action(ctx, info, cmd, monitor),
        }
    }

    fn on_results(&mut self, cmd: Command) {
        match cmd {
            Command::Select(k) => self.open_item(k),
            Command::Next => {
                if self.query.page() < self.remote_pages() {
                    self.goto_results_page(self.query.page() + 1);
                }
            }
            Command::Prev => {
                if self.query.page() > 1 {
                    self.goto_results_page(self.query.page() - 1);
                }
            }
            Command::Filter(term) => self.results.set_filter(term),
            Command::Reset => {
                let candidate = self.query.clone().with_page(1);
                if self.fetch_into_results(candidate, true) {
                    self.results.reset();
                }
            }
            Command::Search(q) => {
                let q = q.trim();
                if q.is_empty() {
                    return;
                }
                let candidate = self.query.clone().with_query(q);
                if self.fetch_into_results(candidate, true) {
                    self.results.reset();
                }
            }
            Command::Back => {}
            Command::Open | Command::Copy => {
                self.push_notice(Notice::warn("Select an item first"));
            }
            Command::Download | Command::Hash => {
                self.push_notice(Notice::warn("Select a file first"));
            }
            Command::Quit => {}
        }
    }

    fn on_item_files(&mut self, mut ctx: ItemContext, cmd: Command) -> View {
        match cmd {
            Command::Select(k) => {
                let Some(file) = ctx.files.select(k) else {
                    self.push_notice(Notice::warn(format!("No file #{} on this page", k)));
                    return View::ItemFiles(ctx);
                };
                let info = FileInfo::resolve(
                    &ctx.meta,
                    file,
                    &self.settings.digests,
                    self.settings.human_sizes,
                );
                debug!(file = info.name(), "file selected");
                View::FileAction(ctx, info)
            }
            Command::Next => {
                ctx.files.next();
                View::ItemFiles(ctx)
            }
            Command::Prev => {
                ctx.files.prev();
                View::ItemFiles(ctx)
            }
            Command::Filter(term) => {
                ctx.files.set_filter(term);
                View::ItemFiles(ctx)
            }
            Command::Reset => {
                ctx.files.reset();
                View::ItemFiles(ctx)
            }
            Command::Back => View::Results,
            Command::Open => {
                let notice = self.router.open(ctx.meta.page_locator().as_deref(), "item page");
                self.push_notice(notice);
                View::ItemFiles(ctx)
            }
            Command::Copy => {
                let notice = self.router.copy(ctx.meta.page_locator().as_deref(), "item page");
                self.push_notice(notice);
                View::ItemFiles(ctx)
            }
            Command::Search(_) => {
                self.push_notice(Notice::warn("Go back to the results to search"));
                View::ItemFiles(ctx)
            }
            Command::Download | Command::Hash => {
                self.push_notice(Notice::warn("Select a file first"));
                View::ItemFiles(ctx)
            }
            Command::Quit => View::ItemFiles(ctx),
        }
    }

    fn on_file_action(
        &mut self,
        ctx: ItemContext,
        info: FileInfo,
        cmd: Command,
        monitor: &mut dyn DownloadMonitor,
    ) -> Flow {
        let key = match cmd {
            Command::Download => FileActionKey::Download,
            Command::Hash => FileActionKey::Hash,
            Command::Open => FileActionKey::Open,
            Command::Copy => FileActionKey::Copy,
            Command::Back => FileActionKey::Back,
            Command::Quit => FileActionKey::Quit,
            other => {
                self.push_notice(Notice::warn(format!(
                    "'{}' is not a file action (d, h, o, c, b, q)",
                    other
                )));
                self.view = View::FileAction(ctx, info);
                return Flow::Continue;
            }
        };

        let routed = self.router.route(key, &info, monitor);
        self.notices.extend(routed.notices);
        match routed.next {
            Next::Stay => self.view = View::FileAction(ctx, info),
            Next::ReturnToFiles => self.view = View::ItemFiles(ctx),
            Next::Quit => {
                self.view = View::ItemFiles(ctx);
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    fn open_item(&mut self, k: usize) {
        let Some(record) = self.results.select(k) else {
            self.push_notice(Notice::warn(format!("No item #{} on this page", k)));
            return;
        };
        let identifier = record.identifier().to_string();

        if self.settings.raw_json {
            self.show_raw_item(identifier);
            return;
        }

        match self.catalog.detail(&identifier) {
            Ok(detail) => {
                let ctx = ItemContext::new(detail, &self.settings);
                if ctx.files.backing().is_empty() {
                    let msg = if ctx.unrestricted > 0 {
                        "No files match the extension filter"
                    } else {
                        "No file list available"
                    };
                    self.push_notice(Notice::warn(msg));
                }
                self.view = View::ItemFiles(ctx);
            }
            Err(e) => {
                warn!(identifier, error = %e, "detail fetch failed");
                self.push_notice(Notice::error(format!("Could not load {}: {}", identifier, e)));
            }
        }
    }

    /// Raw mode: the payload is shown over the results, which stay the current view.
    fn show_raw_item(&mut self, identifier: String) {
        let pretty = self
            .catalog
            .raw_detail(&identifier)
            .and_then(|value| serde_json::to_string_pretty(&value).map_err(CatalogError::from));
        match pretty {
            Ok(text) => self.raw = Some(RawDetail { identifier, text }),
            Err(e) => {
                warn!(identifier, error = %e, "raw detail fetch failed");
                self.push_notice(Notice::error(format!("Could not load {}: {}", identifier, e)));
            }
        }
    }

    fn goto_results_page(&mut self, page: usize) {
        let candidate = self.query.clone().with_page(page);
        if candidate.page() == self.fetched_page {
            self.query = candidate;
            return;
        }
        self.fetch_into_results(candidate, false);
    }

    /// Fetches `candidate` and, on success, makes it the current query.
    ///
    /// An empty page past the first keeps the current data. With `fresh` an empty result
    /// is accepted, since a new search may legitimately match nothing.
    fn fetch_into_results(&mut self, candidate: QuerySpec, fresh: bool) -> bool {
        match self.catalog.search(&candidate) {
            Ok(SearchPage { records, .. }) if records.is_empty() && !fresh && candidate.page() > 1 => {
                self.push_notice(Notice::info("No more results"));
                false
            }
            Ok(page) => {
                self.fetched_page = candidate.page();
                self.total = page.total;
                self.query = candidate;
                self.results.set_backing(page.records);
                true
            }
            Err(e) => {
                warn!(query = candidate.query(), page = candidate.page(), error = %e, "search failed");
                self.push_notice(Notice::error(format!("Search failed: {}", e)));
                false
            }
        }
    }
}
