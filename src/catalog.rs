use std::collections::BTreeMap;

use log::{info, warn};
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::markup::EmbeddedEntry;
use crate::node::{DriveNode, FlatRow};
use crate::paths;

/// Direct download URL for a file id.
pub const DOWNLOAD_BY_ID: &str = "https://drive.google.com/uc?id=";

pub fn download_url(resource_id: &str) -> String {
    format!("{DOWNLOAD_BY_ID}{resource_id}")
}

/// A file of the release that maps to a known dataset key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    pub raw_name: String,
    pub full_path: String,
    pub resource_id: String,
    pub download_url: String,
    pub download_key: String,
}

impl CatalogRow {
    /// Large archives sit behind the virus-scan confirmation page.
    pub fn is_large_archive(&self) -> bool {
        self.raw_name.ends_with(".zip")
    }
}

/// Dataset key to remote location, built once per crawl.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Catalog {
    rows: Vec<CatalogRow>,
}

impl Catalog {
    /// Builds the catalog from a crawled tree.
    pub fn from_tree(tree: &DriveNode, datasets: &BTreeMap<String, String>, skip: &Regex) -> Self {
        Self::from_rows(&tree.flatten(), datasets, skip)
    }

    /// Builds the catalog from pre-order rows; `skip` removes rows before paths are rebuilt.
    pub fn from_rows(rows: &[FlatRow], datasets: &BTreeMap<String, String>, skip: &Regex) -> Self {
        let rows: Vec<FlatRow> = rows
            .iter()
            .filter(|row| !skip.is_match(&row.name))
            .cloned()
            .collect();
        let full_paths = paths::reconstruct(&rows);

        let rows: Vec<CatalogRow> = rows
            .into_iter()
            .zip(full_paths)
            .filter(|(row, full_path)| paths::is_catalog_eligible(row, full_path))
            .filter_map(|(row, full_path)| {
                let download_key = datasets.get(&row.name)?.clone();
                let resource_id = row.id?;
                Some(CatalogRow {
                    download_url: download_url(&resource_id),
                    raw_name: row.name,
                    full_path,
                    resource_id,
                    download_key,
                })
            })
            .collect();

        info!("catalog holds {} datasets", rows.len());
        Self { rows }
    }

    /// The first row published under `key`.
    pub fn get(&self, key: &str) -> Result<&CatalogRow> {
        self.rows
            .iter()
            .find(|row| row.download_key == key)
            .ok_or_else(|| Error::DatasetUnavailable(key.to_string()))
    }

    /// `download_key -> (resource_id, is_large_archive)`
    pub fn entries(&self) -> BTreeMap<&str, (&str, bool)> {
        let mut entries = BTreeMap::new();
        for row in &self.rows {
            entries
                .entry(row.download_key.as_str())
                .or_insert((row.resource_id.as_str(), row.is_large_archive()));
        }
        entries
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A per-factor signal file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub name: String,
    pub resource_id: String,
    pub download_url: String,
}

/// Signal name to resource id, for the files of the predictors folder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SignalCatalog {
    signals: Vec<Signal>,
}

/// Outcome of looking up several signals at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    pub found: Vec<&'a Signal>,
    pub missing: Vec<String>,
}

impl SignalCatalog {
    pub fn from_entries(entries: Vec<EmbeddedEntry>) -> Self {
        let signals = entries
            .into_iter()
            .map(|entry| Signal {
                download_url: download_url(&entry.id),
                name: entry.name,
                resource_id: entry.id,
            })
            .collect();
        Self { signals }
    }

    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|signal| signal.name == name)
    }

    /// Looks up every name; names that are not published are reported in `missing`.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Selection<'_> {
        let mut found = Vec::new();
        let mut missing = Vec::new();

        for name in names {
            match self.get(name.as_ref()) {
                Some(signal) => found.push(signal),
                None => missing.push(name.as_ref().to_string()),
            }
        }

        if !missing.is_empty() {
            warn!("One or more input predictors are not available: {}", missing.join(", "));
        }

        Selection { found, missing }
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
