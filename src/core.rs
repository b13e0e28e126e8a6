//! Core runtime logic for iaseek.
//!
//! This module contains the non-UI "engine" pieces used by the application:
//! - [model]: catalog records, item details and the resolved [FileInfo].
//! - [paging]: the client side filter and page window over any record list.
//! - [catalog]: query building and the archive.org search/metadata client.
//! - [lookup]: secondary digest lookup.
//! - [launch]: clipboard and open-locator provider chains.
//! - [download]: the download orchestrator and its poll loop.
//! - [formatter]: sizes and exact-width cell text.
//! - [terminal]: terminal setup/teardown and the main crossterm/ratatui event loop.

pub mod catalog;
pub mod download;
pub mod error;
pub mod formatter;
pub mod launch;
pub mod lookup;
pub mod model;
pub mod paging;
pub mod terminal;

pub use catalog::{ArchiveClient, CatalogClient, QuerySpec, SearchPage};
pub use download::{DownloadMonitor, DownloadOrchestrator, DownloadTask, Keystroke, Outcome};
pub use error::{CatalogError, LaunchError};
pub use model::{DigestKind, FileInfo, FileRecord, ItemDetail, ItemMeta, ResultRecord};
pub use paging::{PageWindow, PagedFilteredList};
