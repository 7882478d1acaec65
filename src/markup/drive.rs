use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::markup::escape::{decode_unicode_escape, restore_utf8};
use crate::markup::interstitial::resolve_download_url;
use crate::markup::{ChildEntry, EmbeddedEntry, FolderPage, Markup};
use crate::node::{DriveNode, NodeKind};

/// Script variable holding the folder listing.
const PAYLOAD_MARKER: &str = "_DRIVE_ivd";
const TITLE_SEPARATOR: &str = " - ";

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("static selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("static selector"));
static FLIP_ENTRY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.flip-entry").expect("static selector"));
static FLIP_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));
static FLIP_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".flip-entry-title").expect("static selector"));

/// single-quoted JavaScript string literal, escaped quotes allowed
static JS_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'((?:[^'\\]|\\.)*)'").expect("static regex"));
static FILE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://drive\.google\.com/file/d/([-\w]{25,})/view\?usp=drive_web")
        .expect("static regex")
});

/// The folder page contract as currently served by drive.google.com.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveMarkup;

impl Markup for DriveMarkup {
    fn parse_folder_page(&self, url: &str, html: &str) -> Result<FolderPage> {
        let document = Html::parse_document(html);

        let encoded = embedded_payload(&document)?;
        let decoded = decode_unicode_escape(&encoded)
            .map_err(|error| malformed(format!("cannot unescape folder payload: {error}")))?;
        let payload: Value = serde_json::from_str(&decoded)
            .map_err(|error| malformed(format!("folder payload is not JSON: {error}")))?;

        let children = child_entries(&payload)?;
        let name = folder_name(&document)?;
        let id = folder_id(url)?;

        debug!("parsed folder {name:?} ({id}) with {} children", children.len());
        Ok(FolderPage {
            folder: DriveNode::folder(id, name),
            children,
        })
    }

    fn parse_interstitial(&self, html: &str) -> Result<String> {
        resolve_download_url(html)
    }

    fn parse_embedded_listing(&self, html: &str) -> Result<Vec<EmbeddedEntry>> {
        let document = Html::parse_document(html);
        let mut entries = Vec::new();

        for entry in document.select(&FLIP_ENTRY) {
            let title = element_text(entry.select(&FLIP_TITLE).next());
            let Some(name) = title.strip_suffix(".csv") else {
                continue;
            };

            let id = entry
                .select(&FLIP_LINK)
                .filter_map(|link| link.value().attr("href"))
                .find_map(|href| FILE_LINK.captures(href))
                .and_then(|captures| captures.get(1))
                .ok_or_else(|| malformed(format!("embedded entry {title:?} has no file link")))?;

            entries.push(EmbeddedEntry {
                name: name.to_string(),
                id: id.as_str().to_string(),
            });
        }

        Ok(entries)
    }
}

fn malformed(message: impl Into<String>) -> Error {
    Error::MalformedPage(message.into())
}

fn element_text(element: Option<ElementRef<'_>>) -> String {
    element
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// The encoded listing: the second string literal of the script that mentions the marker.
fn embedded_payload(document: &Html) -> Result<String> {
    for script in document.select(&SCRIPT) {
        let source: String = script.text().collect();
        if !source.contains(PAYLOAD_MARKER) {
            continue;
        }

        // the first literal is the marker name itself
        return JS_STRING
            .captures_iter(&source)
            .nth(1)
            .and_then(|captures| captures.get(1))
            .map(|literal| literal.as_str().to_string())
            .ok_or(Error::FolderUnavailable);
    }

    Err(Error::FolderUnavailable)
}

/// Element 0 of the payload is the child list, or null for an empty folder.
/// Each child is positional: 0 = id, 2 = name, 3 = MIME type.
fn child_entries(payload: &Value) -> Result<Vec<ChildEntry>> {
    let listing = payload
        .get(0)
        .ok_or_else(|| malformed("folder payload is not a non-empty array"))?;

    if listing.is_null() {
        return Ok(Vec::new());
    }

    listing
        .as_array()
        .ok_or_else(|| malformed("folder listing is not an array"))?
        .iter()
        .map(child_entry)
        .collect()
}

fn child_entry(entry: &Value) -> Result<ChildEntry> {
    let field = |index: usize| {
        entry
            .get(index)
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(format!("child entry is missing field {index}: {entry}")))
    };

    Ok(ChildEntry {
        id: field(0)?.to_string(),
        name: restore_utf8(field(2)?),
        kind: NodeKind::from_mime(field(3)?),
    })
}

fn folder_name(document: &Html) -> Result<String> {
    let title = document
        .select(&TITLE)
        .next()
        .and_then(|title| title.text().next())
        .ok_or_else(|| malformed("folder page has no title"))?;

    title
        .rsplit_once(TITLE_SEPARATOR)
        .map(|(name, _)| name.to_string())
        .ok_or_else(|| malformed(format!("folder name cannot be extracted from {title:?}")))
}

fn folder_id(url: &str) -> Result<String> {
    let url = Url::parse(url)?;
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| malformed(format!("no folder id in {url}")))
}
