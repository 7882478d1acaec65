//! Crawls publicly shared Google Drive data releases into a catalog of downloadable datasets.
//!
//! Drive has no public listing API for shared folders, so folder contents are scraped from
//! the listing pages and large files are resolved through the virus-scan confirmation page.

use std::future::Future;
use std::sync::Arc;

use log::{info, warn};
use regex::Regex;
use tokio::time::sleep;

pub use crate::catalog::{Catalog, CatalogRow, Selection, Signal, SignalCatalog};
pub use crate::config::{Config, ProxyMode, Release};
pub use crate::error::{Error, Result};
pub use crate::fetch::{ArchiveEntry, CHUNK_SIZE, FetchTarget, Fetched};
pub use crate::http::{ByteStream, HttpClient, Page, USER_AGENT, session};
pub use crate::markup::{ChildEntry, DriveMarkup, EmbeddedEntry, FolderPage, Markup};
pub use crate::node::{DriveNode, FlatRow, NodeKind};
use crate::walker::Walker;

pub mod catalog;
pub mod config;
mod error;
mod fetch;
mod http;
pub mod markup;
mod node;
pub mod paths;
mod walker;

pub use crate::walker::folder_url;

/// Embedded view of a folder, listing its files as plain HTML.
pub const EMBEDDED_VIEW_URL: &str = "https://drive.google.com/embeddedfolderview?id=";

/// A builder to initialize a [`Client`] instance.
pub struct ClientBuilder {
    config: Config,
    markup: Arc<dyn Markup>,
}

impl ClientBuilder {
    /// Creates a default [`ClientBuilder`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            markup: Arc::new(DriveMarkup),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the markup contract used to read pages.
    pub fn markup<M: Markup + 'static>(mut self, markup: M) -> Self {
        self.markup = Arc::new(markup);
        self
    }

    /// Builds a [`Client`] on a `reqwest` session made from the current config.
    pub fn build(self) -> Result<Client> {
        let http = session(&self.config)?;
        self.build_with(http)
    }

    /// Builds a [`Client`] on the given transport.
    pub fn build_with<T: HttpClient + 'static>(mut self, http: T) -> Result<Client> {
        self.config.normalize();
        self.config.validate()?;
        let skip = self.config.skip_pattern()?;

        Ok(Client {
            http: Arc::new(http),
            markup: self.markup,
            config: self.config,
            skip,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything published by one data release.
#[derive(Debug, Clone)]
pub struct ReleaseCatalog {
    pub year: u16,
    pub catalog: Catalog,
    pub signals: SignalCatalog,
}

/// The client itself.
#[derive(Clone)]
pub struct Client {
    http: Arc<dyn HttpClient>,
    markup: Arc<dyn Markup>,
    config: Config,
    skip: Regex,
}

impl Client {
    /// Creates a builder to initialize a [`Client`] instance.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn walker(&self) -> Walker<'_> {
        Walker::new(
            self.http.as_ref(),
            self.markup.as_ref(),
            &self.config.pruned_folders,
            self.config.concurrency,
            self.config.max_nodes,
        )
    }

    /// Fetches the complete folder tree under `root_url`. Any failure fails the whole crawl.
    pub async fn crawl(&self, root_url: &str) -> Result<DriveNode> {
        self.walker().walk(root_url).await
    }

    /// Crawls a release and joins its files against the release's name table.
    pub async fn catalog(&self, release: &Release) -> Result<Catalog> {
        let tree = self.crawl(&release.folder_url).await?;
        Ok(Catalog::from_tree(&tree, &release.datasets, &self.skip))
    }

    /// Locates the predictors folder and lists the signal files directly inside it.
    pub async fn signal_catalog(&self, root_url: &str) -> Result<SignalCatalog> {
        let folder_id = self
            .walker()
            .find_folder(root_url, &self.config.predictors_folder)
            .await?
            .ok_or(Error::PredictorsNotFound)?;

        let page = self
            .http
            .get_page(&format!("{EMBEDDED_VIEW_URL}{folder_id}"))
            .await?;
        let entries = self.markup.parse_embedded_listing(&page.body)?;

        info!("predictors folder {folder_id} lists {} signals", entries.len());
        Ok(SignalCatalog::from_entries(entries))
    }

    /// Builds the catalogs of a configured release, the latest when `year` is `None`.
    ///
    /// The crawl is all-or-nothing: on a transient failure it is started over from scratch.
    pub async fn load_release(&self, year: Option<u16>) -> Result<ReleaseCatalog> {
        let (year, release) = self.config.release(year)?;

        self.with_retries(|| async move {
            let catalog = self.catalog(release).await?;
            let signals = self.signal_catalog(&release.folder_url).await?;
            Ok(ReleaseCatalog {
                year,
                catalog,
                signals,
            })
        })
        .await
    }

    /// The URL the bytes of `row` can be read from. Archives go through the confirmation page.
    pub async fn resolve_url(&self, row: &CatalogRow) -> Result<String> {
        if !row.is_large_archive() {
            return Ok(row.download_url.clone());
        }

        let page = self.http.get_page(&row.download_url).await?;
        self.markup.parse_interstitial(&page.body)
    }

    /// Streams `url` in fixed-size chunks into `target`.
    pub async fn fetch(
        &self,
        url: &str,
        target: FetchTarget,
        progress: &(dyn Fn(u64) + Sync),
    ) -> Result<Fetched> {
        fetch::fetch(self.http.as_ref(), url, target, progress).await
    }

    /// Resolves and fetches a catalog row.
    pub async fn download(
        &self,
        row: &CatalogRow,
        target: FetchTarget,
        progress: &(dyn Fn(u64) + Sync),
    ) -> Result<Fetched> {
        let url = self.resolve_url(row).await?;
        self.fetch(&url, target, progress).await
    }

    /// Runs `operation` until it succeeds, fails with a non-transient error, or runs out of
    /// attempts, doubling the delay between attempts.
    async fn with_retries<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delay = self.config.min_retry_delay;
        let mut attempt = 1;

        loop {
            match operation().await {
                Err(error) if error.is_transient() && attempt < self.config.max_retries => {
                    warn!("attempt {attempt} failed: {error}; retrying in {delay:?}");
                    sleep(delay).await;
                    delay = (delay * 2).min(self.config.max_retry_delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
