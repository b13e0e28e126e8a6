//! Catalog access for iaseek.
//!
//! [QuerySpec] describes one page of an advanced search. [CatalogClient] is the seam the
//! session talks to; [ArchiveClient] is the archive.org implementation over a blocking
//! reqwest client.
//!
//! The remote payloads are loosely shaped (a value may be a string or a list, a number or a
//! numeric string, the file listing may be a map or a list). [parse_search] and [parse_detail]
//! normalise all of that here so the rest of the crate only sees [crate::core::model] types.

use crate::core::error::CatalogError;
use crate::core::model::{DigestKind, FileRecord, ItemDetail, ItemMeta, ResultRecord};

use phf::phf_set;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const SEARCH_BASE: &str = "https://archive.org/advancedsearch.php";
pub const DETAIL_BASE: &str = "https://archive.org/details/";
pub const DEFAULT_SORT: &str = "downloads desc";

/// Single attempt, no retry. A slow catalog should surface as an error, not a hang.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Sort expressions known to work with advanced search.
///
/// Anything else is passed through unchanged, the CLI only warns about it.
pub static SORT_KEYS: phf::Set<&'static str> = phf_set! {
    "downloads desc", "downloads asc",
    "week desc", "week asc",
    "month desc", "month asc",
    "year desc", "year asc",
    "publicdate desc", "publicdate asc",
    "date desc", "date asc",
    "titleSorter desc", "titleSorter asc",
    "creatorSorter desc", "creatorSorter asc",
    "identifier asc", "identifier desc",
    "avg_rating desc", "avg_rating asc",
    "item_size desc", "item_size asc",
    "random desc", "random asc",
};

/// Returns the curated sort keys in a stable order.
pub fn sorted_sort_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = SORT_KEYS.iter().copied().collect();
    keys.sort_unstable();
    keys
}

/// Fields requested from the search endpoint when nothing else is configured.
pub const DEFAULT_FIELDS: &[&str] = &[
    "identifier",
    "title",
    "creator",
    "date",
    "publicdate",
    "downloads",
    "mediatype",
    "item_size",
    "month",
    "week",
    "year",
    "language",
    "num_reviews",
    "subject",
    "publisher",
    "rights",
    "licenseurl",
];

/// One advanced search request. Replaced wholesale, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    query: String,
    mediatype: Option<String>,
    description_terms: Vec<String>,
    sort: String,
    fields: Vec<String>,
    rows: usize,
    page: usize,
}

impl QuerySpec {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mediatype: None,
            description_terms: Vec::new(),
            sort: DEFAULT_SORT.to_string(),
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            rows: 10,
            page: 1,
        }
    }

    pub fn with_mediatype(mut self, mediatype: Option<String>) -> Self {
        self.mediatype = mediatype.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_description_terms(mut self, terms: Vec<String>) -> Self {
        self.description_terms = terms.into_iter().filter(|t| !t.trim().is_empty()).collect();
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        let sort = sort.into();
        self.sort = if sort.trim().is_empty() {
            DEFAULT_SORT.to_string()
        } else {
            sort
        };
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        if !fields.is_empty() {
            self.fields = fields;
        }
        self
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows.max(1);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    /// Same request with different search terms, back on page 1.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self.page = 1;
        self
    }

    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[inline]
    pub fn mediatype(&self) -> Option<&str> {
        self.mediatype.as_deref()
    }

    #[inline]
    pub fn description_terms(&self) -> &[String] {
        &self.description_terms
    }

    #[inline]
    pub fn sort(&self) -> &str {
        &self.sort
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn page(&self) -> usize {
        self.page
    }

    /// The `q` parameter: `(terms) AND mediatype:(m) AND description:(a OR b)`.
    pub fn search_expression(&self) -> String {
        let mut parts = vec![format!("({})", self.query)];
        if let Some(m) = &self.mediatype {
            parts.push(format!("mediatype:({})", m));
        }
        if !self.description_terms.is_empty() {
            parts.push(format!("description:({})", self.description_terms.join(" OR ")));
        }
        parts.join(" AND ")
    }

    /// Full advanced search URL for this page.
    pub fn to_url(&self) -> Result<Url, CatalogError> {
        let mut url = Url::parse(SEARCH_BASE)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &self.search_expression());
            for field in &self.fields {
                pairs.append_pair("fl[]", field);
            }
            pairs.append_pair("sort[]", &self.sort);
            pairs.append_pair("rows", &self.rows.to_string());
            pairs.append_pair("page", &self.page.to_string());
            pairs.append_pair("output", "json");
        }
        Ok(url)
    }
}

/// Appends `order` to a sort expression that carries none.
pub fn apply_sort_order(sort: &str, order: Option<&str>) -> String {
    match order {
        Some(order) if !sort.contains(" asc") && !sort.contains(" desc") => {
            format!("{} {}", sort.trim(), order)
        }
        _ => sort.to_string(),
    }
}

/// One fetched search page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub records: Vec<ResultRecord>,
    /// `numFound` of the whole query, when the catalog reports it.
    pub total: Option<usize>,
}

/// Request/response access to the remote catalog.
pub trait CatalogClient {
    fn search(&self, query: &QuerySpec) -> Result<SearchPage, CatalogError>;
    fn detail(&self, identifier: &str) -> Result<ItemDetail, CatalogError>;
    /// The detail payload exactly as the catalog sent it, for the raw JSON view.
    fn raw_detail(&self, identifier: &str) -> Result<Value, CatalogError>;
}

/// archive.org over HTTPS.
pub struct ArchiveClient {
    http: reqwest::blocking::Client,
}

impl ArchiveClient {
    pub fn new() -> Result<Self, CatalogError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("iaseek/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    fn get_text(&self, url: Url) -> Result<String, CatalogError> {
        debug!(%url, "GET");
        let resp = self.http.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        Ok(resp.text()?)
    }
}

impl CatalogClient for ArchiveClient {
    fn search(&self, query: &QuerySpec) -> Result<SearchPage, CatalogError> {
        let body = self.get_text(query.to_url()?)?;
        let page = parse_search(&body)?;
        info!(
            query = query.query(),
            page = query.page(),
            records = page.records.len(),
            total = ?page.total,
            "search page fetched"
        );
        Ok(page)
    }

    fn detail(&self, identifier: &str) -> Result<ItemDetail, CatalogError> {
        let body = self.get_text(detail_url(identifier)?)?;
        let detail = parse_detail(identifier, &body)?;
        info!(identifier, files = detail.files.len(), "item detail fetched");
        Ok(detail)
    }

    fn raw_detail(&self, identifier: &str) -> Result<Value, CatalogError> {
        let body = self.get_text(detail_url(identifier)?)?;
        let payload: Value = serde_json::from_str(&body)?;
        info!(identifier, "raw item detail fetched");
        Ok(payload)
    }
}

/// `https://archive.org/details/{identifier}?output=json`
pub fn detail_url(identifier: &str) -> Result<Url, CatalogError> {
    let mut url = Url::parse(DETAIL_BASE)?;
    url.path_segments_mut()
        .map_err(|_| CatalogError::Decode("detail base cannot hold a path".into()))?
        .pop_if_empty()
        .push(identifier);
    url.query_pairs_mut().append_pair("output", "json");
    Ok(url)
}

/// Normalises an advanced search payload.
pub fn parse_search(body: &str) -> Result<SearchPage, CatalogError> {
    let payload: Value = serde_json::from_str(body)?;
    let response = payload
        .get("response")
        .and_then(Value::as_object)
        .ok_or_else(|| CatalogError::Decode("missing response object".into()))?;

    let total = response
        .get("numFound")
        .and_then(as_count)
        .and_then(|n| usize::try_from(n).ok());

    let records = response
        .get("docs")
        .and_then(Value::as_array)
        .map(|docs| docs.iter().filter_map(parse_doc).collect())
        .unwrap_or_default();

    Ok(SearchPage { records, total })
}

fn parse_doc(doc: &Value) -> Option<ResultRecord> {
    let identifier = doc.get("identifier").and_then(first_text)?;
    if identifier.is_empty() {
        return None;
    }

    let mut record = ResultRecord::new(identifier);
    if let Some(title) = doc.get("title").and_then(first_text) {
        record = record.with_title(title);
    }
    if let Some(downloads) = doc.get("downloads").and_then(as_count) {
        record = record.with_downloads(downloads);
    }
    if let Some(date) = doc
        .get("date")
        .and_then(first_text)
        .or_else(|| doc.get("publicdate").and_then(first_text))
    {
        record = record.with_date(date);
    }
    Some(record)
}

/// Normalises an item detail payload.
///
/// `requested` is used when the metadata does not carry its own identifier.
pub fn parse_detail(requested: &str, body: &str) -> Result<ItemDetail, CatalogError> {
    let payload: Value = serde_json::from_str(body)?;
    let root = payload
        .as_object()
        .ok_or_else(|| CatalogError::Decode("detail payload is not an object".into()))?;

    let empty = Map::new();
    let metadata = root
        .get("metadata")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let item = root.get("item").and_then(Value::as_object).unwrap_or(&empty);

    let meta_text = |key: &str| metadata.get(key).and_then(first_text);

    let meta = ItemMeta {
        identifier: meta_text("identifier").unwrap_or_else(|| requested.to_string()),
        title: meta_text("title"),
        creator: meta_text("creator"),
        date: meta_text("date").or_else(|| meta_text("publicdate")),
        item_size: item.get("item_size").and_then(as_count),
        files_count: item.get("files_count").and_then(as_count),
        server: root.get("server").and_then(first_text),
        dir: root.get("dir").and_then(first_text),
    };

    let files = match root.get("files") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(path, attrs)| parse_file(Some(path), attrs))
            .collect(),
        Some(Value::Array(list)) => list.iter().filter_map(|f| parse_file(None, f)).collect(),
        _ => Vec::new(),
    };

    Ok(ItemDetail { meta, files })
}

fn parse_file(key: Option<&str>, attrs: &Value) -> Option<FileRecord> {
    let name = key
        .map(str::to_string)
        .or_else(|| attrs.get("name").and_then(first_text))?;
    let name = name.trim_start_matches('/');
    if name.is_empty() {
        return None;
    }

    let mut file = FileRecord::new(name);
    if let Some(size) = attrs.get("size").and_then(as_count) {
        file = file.with_size(size);
    }
    for kind in DigestKind::ALL {
        if let Some(value) = attrs.get(kind.key()).and_then(first_text)
            && !value.is_empty()
        {
            file = file.with_checksum(kind, value);
        }
    }
    if let Some(format) = attrs.get("format").and_then(first_text) {
        file = file.with_format(format);
    }
    if let Some(mtime) = attrs.get("mtime").and_then(first_text) {
        file = file.with_mtime(mtime);
    }
    Some(file)
}

/// A string, a number, or the first element of a list of those.
fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.first().and_then(first_text),
        _ => None,
    }
}

/// A non-negative integer given either as a number or a numeric string.
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) => items.first().and_then(as_count),
        _ => None,
    }
}
