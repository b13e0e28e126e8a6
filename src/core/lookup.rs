//! Secondary digest lookup.
//!
//! Given a file digest, asks an external index for a known file with the same content.
//! An absent hit is a normal answer, only transport failures are errors.

use crate::core::error::CatalogError;
use crate::utils::decode_html_entities;

use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const ADGUARD_BASE: &str = "https://files.rg-adguard.net";
const ADGUARD_SEARCH: &str = "https://files.rg-adguard.net/search";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(20);

/// A file the lookup service knows under the given digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupHit {
    pub name: String,
    pub locator: String,
}

pub trait DigestLookup {
    fn lookup(&self, digest: &str) -> Result<Option<LookupHit>, CatalogError>;
}

/// files.rg-adguard.net search form.
pub struct AdguardLookup {
    http: reqwest::blocking::Client,
}

impl AdguardLookup {
    pub fn new() -> Result<Self, CatalogError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .user_agent(concat!("iaseek/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

impl DigestLookup for AdguardLookup {
    fn lookup(&self, digest: &str) -> Result<Option<LookupHit>, CatalogError> {
        debug!(digest, "digest lookup");
        let resp = self
            .http
            .post(ADGUARD_SEARCH)
            .form(&[("search", digest)])
            .send()?;

        if resp.status() != reqwest::StatusCode::OK {
            warn!(status = resp.status().as_u16(), "digest lookup answered non-200");
            return Ok(None);
        }

        let body = resp.text()?;
        Ok(parse_hit(&body))
    }
}

/// First `<td class="desc"...><a href="X">NAME</a>` of the result table.
pub fn parse_hit(html: &str) -> Option<LookupHit> {
    let mut rest = html;
    while let Some(pos) = rest.find("<td") {
        rest = &rest[pos + 3..];
        let tag_end = rest.find('>')?;
        let attrs = &rest[..tag_end];
        rest = &rest[tag_end + 1..];

        if !has_class(attrs, "desc") {
            continue;
        }

        let body = rest.trim_start();
        let Some(anchor) = body.strip_prefix("<a") else {
            continue;
        };
        let anchor_end = anchor.find('>')?;
        let Some(href) = attr_value(&anchor[..anchor_end], "href") else {
            continue;
        };
        let text = &anchor[anchor_end + 1..];
        let text_end = text.find("</a>")?;
        let name = decode_html_entities(text[..text_end].trim());
        if name.is_empty() {
            continue;
        }

        return Some(LookupHit {
            name,
            locator: absolute_href(&decode_html_entities(href)),
        });
    }
    None
}

fn has_class(attrs: &str, class: &str) -> bool {
    attr_value(attrs, "class")
        .map(|v| v.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{}=\"", name);
    let start = attrs.find(&needle)? + needle.len();
    let len = attrs[start..].find('"')?;
    Some(&attrs[start..start + len])
}

fn absolute_href(href: &str) -> String {
    if href.starts_with('/')
        && let Ok(base) = Url::parse(ADGUARD_BASE)
        && let Ok(joined) = base.join(href)
    {
        return joined.to_string();
    }
    href.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_desc_anchor_is_the_hit() {
        let html = r#"
            <table>
              <tr><td class="name">ignored</td></tr>
              <tr>
                <td class="desc">  <a href="/file/abc?x=1&amp;y=2">en_windows_xp_sp3.iso</a></td>
                <td class="desc"><a href="/file/other">second.iso</a></td>
              </tr>
            </table>"#;

        let hit = parse_hit(html);
        assert_eq!(
            hit,
            Some(LookupHit {
                name: "en_windows_xp_sp3.iso".into(),
                locator: "https://files.rg-adguard.net/file/abc?x=1&y=2".into(),
            })
        );
    }

    #[test]
    fn absolute_links_are_kept() {
        let html = r#"<td class="desc" style="x"><a href="https://mirror.example/f">Tom &amp; Jerry</a></td>"#;
        let hit = parse_hit(html);
        assert_eq!(hit.as_ref().map(|h| h.name.as_str()), Some("Tom & Jerry"));
        assert_eq!(
            hit.map(|h| h.locator),
            Some("https://mirror.example/f".to_string())
        );
    }

    #[test]
    fn no_match_is_none() {
        assert!(parse_hit("<html><body>Nothing found</body></html>").is_none());
        assert!(parse_hit(r#"<td class="description">x</td>"#).is_none());
    }
}
