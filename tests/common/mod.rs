//!
//! In-memory Drive used by the integration tests.
//!
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use gdrive_catalog::{ByteStream, Config, Error, HttpClient, Page, Result, folder_url};
use serde_json::json;

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// A folder page child: `(id, name, is_folder)`.
pub type Child<'a> = (&'a str, &'a str, bool);

#[derive(Clone, Default)]
pub struct FixtureDrive {
    pages: HashMap<String, String>,
    redirects: HashMap<String, String>,
    bodies: HashMap<String, Vec<Vec<u8>>>,
    broken_bodies: HashMap<String, usize>,
    failing: HashMap<String, u16>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FixtureDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves a generated listing page for folder `id`.
    pub fn folder(mut self, id: &str, title: &str, children: &[Child<'_>]) -> Self {
        self.pages
            .insert(folder_url(id), folder_page(id, title, children));
        self
    }

    /// Serves `html` verbatim at `url`.
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Requests for `from` end up at `to` (query stripped before matching).
    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Streams `pieces` as the body of `url`.
    pub fn body(mut self, url: &str, pieces: Vec<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), pieces);
        self
    }

    /// Streams the body of `url` but fails after `pieces` pieces.
    pub fn broken_body(mut self, url: &str, pieces: Vec<Vec<u8>>, fail_after: usize) -> Self {
        self.bodies.insert(url.to_string(), pieces);
        self.broken_bodies.insert(url.to_string(), fail_after);
        self
    }

    /// Answers `url` with an HTTP error status.
    pub fn failing(mut self, url: &str, status: u16) -> Self {
        self.failing.insert(url.to_string(), status);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested(&self, url_prefix: &str) -> bool {
        self.requests()
            .iter()
            .any(|request| request.starts_with(url_prefix))
    }

    fn lookup<'a, T>(map: &'a HashMap<String, T>, url: &str) -> Option<&'a T> {
        map.get(url).or_else(|| map.get(strip_query(url)))
    }

    fn check(&self, url: &str) -> Result<()> {
        self.requests.lock().unwrap().push(url.to_string());
        match Self::lookup(&self.failing, url) {
            Some(status) => Err(Error::HttpStatus {
                status: *status,
                url: url.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[async_trait]
impl HttpClient for FixtureDrive {
    async fn get_page(&self, url: &str) -> Result<Page> {
        self.check(url)?;

        let (final_url, key) = match Self::lookup(&self.redirects, url) {
            Some(target) => (format!("{target}?hl=en"), target.clone()),
            None => (url.to_string(), url.to_string()),
        };

        let body = Self::lookup(&self.pages, &key).ok_or_else(|| Error::HttpStatus {
            status: 404,
            url: url.to_string(),
        })?;

        Ok(Page {
            url: final_url,
            body: body.clone(),
        })
    }

    async fn get_stream(&self, url: &str) -> Result<ByteStream> {
        self.check(url)?;

        let pieces = Self::lookup(&self.bodies, url)
            .cloned()
            .ok_or_else(|| Error::HttpStatus {
                status: 404,
                url: url.to_string(),
            })?;
        let fail_after = Self::lookup(&self.broken_bodies, url).copied();

        let mut items: Vec<Result<Vec<u8>>> = pieces.into_iter().map(Ok).collect();
        if let Some(fail_after) = fail_after {
            items.truncate(fail_after);
            items.push(Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))));
        }

        Ok(futures::stream::iter(items).boxed())
    }
}

/// A listing page shaped like the ones Drive serves, with the payload escaped the same way.
pub fn folder_page(id: &str, title: &str, children: &[Child<'_>]) -> String {
    let listing: Vec<serde_json::Value> = children
        .iter()
        .map(|(child_id, name, is_folder)| {
            let mime = if *is_folder { FOLDER_MIME } else { "text/csv" };
            json!([child_id, [id], name, mime, 0, null, 1693526400000_u64])
        })
        .collect();

    let listing = if listing.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::Value::Array(listing)
    };
    let payload = json!([listing, null, [id, title]]).to_string();

    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{title} - Google Drive</title></head><body>\
         <script nonce=\"n0nce\">_docs_flag_initialData={{}};</script>\
         <script nonce=\"n0nce\">window['_DRIVE_ivd'] = '{}';if (window['_DRIVE_ivdc']) {{window['_DRIVE_ivdc']();}}</script>\
         </body></html>",
        js_escape(&payload)
    )
}

fn js_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\x22"),
            '\'' => escaped.push_str("\\x27"),
            '[' => escaped.push_str("\\x5b"),
            ']' => escaped.push_str("\\x5d"),
            '/' => escaped.push_str("\\/"),
            '=' => escaped.push_str("\\u003d"),
            '&' => escaped.push_str("\\u0026"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Config without retry delays.
pub fn test_config() -> Config {
    Config {
        min_retry_delay: Duration::from_millis(1),
        max_retry_delay: Duration::from_millis(2),
        ..Config::default()
    }
}

pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|error| panic!("reading {path}: {error}"))
}

pub const ROOT: &str = "1EP6oEabyZRamveGNyzYU0u6qJ-N43Qfq";
pub const SIGNAL_DOC_ID: &str = "1EReSLb0gwUNv_7m82hoPk6AUlHnud4-s";
pub const DECILES_ID: &str = "1JyrCHWeyQSH4yG64LxxuS-t1FGmwef0k";
pub const PREDICTORS_ID: &str = "1PhzYv4kB1PqJgM9AqnE3iSsA2x7fDdR0";

/// A small copy of the 2023 release layout.
pub fn release_drive() -> FixtureDrive {
    FixtureDrive::new()
        .folder(
            ROOT,
            "Release 2023",
            &[
                (SIGNAL_DOC_ID, "SignalDoc.csv", false),
                ("1Portfolios0000000000000000", "Portfolios", true),
                ("1Characteristics00000000000", "Firm Level Characteristics", true),
                ("1Results0000000000000000000", "Results", true),
            ],
        )
        .folder(
            "1Portfolios0000000000000000",
            "Portfolios",
            &[
                ("1FullSetsOP0000000000000000", "Full Sets OP", true),
                ("1FullSetsAlt000000000000000", "Full Sets Alt", true),
                ("1PortIndividual000000000000", "Individual", true),
            ],
        )
        .folder(
            "1FullSetsOP0000000000000000",
            "Full Sets OP",
            &[
                ("1JvBy6oELvd6lR-GsUyAyI6NhUxTLVNAB", "PredictorPortsFull.csv", false),
                ("1LSretWide00000000000000000", "PredictorLSretWide.csv", false),
            ],
        )
        .folder(
            "1FullSetsAlt000000000000000",
            "Full Sets Alt",
            &[
                (DECILES_ID, "PredictorAltPorts_Deciles.zip", false),
                ("1JzvIEH97bA8iBJRsNG5v6sWPW4jezaOX", "PredictorAltPorts_DecilesVW.zip", false),
            ],
        )
        .folder(
            "1PortIndividual000000000000",
            "Individual",
            &[("1AMports0000000000000000000", "AM_ports.csv", false)],
        )
        .folder(
            "1Characteristics00000000000",
            "Firm Level Characteristics",
            &[
                ("1CharFullSets00000000000000", "Full Sets", true),
                ("1CharIndividual000000000000", "Individual", true),
                ("1VariableDefs00000000000000", "Variable definitions.xlsx", false),
            ],
        )
        .folder(
            "1CharFullSets00000000000000",
            "Full Sets",
            &[("1ETUr7dwJvF8TCiS3hBDEqlrG36pvhKME", "signed_predictors_dl_wide.zip", false)],
        )
        .folder(
            "1CharIndividual000000000000",
            "Individual",
            &[(PREDICTORS_ID, "Predictors", true)],
        )
        .folder(
            PREDICTORS_ID,
            "Predictors",
            &[("1AMsignal000000000000000000", "AM.csv", false)],
        )
        .folder(
            "1Results0000000000000000000",
            "Results",
            &[("1ResultsCsv0000000000000000", "results.csv", false)],
        )
        .page(
            &format!("https://drive.google.com/embeddedfolderview?id={PREDICTORS_ID}"),
            &fixture("predictors_embedded.html"),
        )
}
