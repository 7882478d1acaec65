use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt, TryStreamExt, stream};
use log::{debug, info};

use crate::error::{Error, Result};
use crate::http::{HttpClient, Page};
use crate::markup::{ChildEntry, FolderPage, Markup};
use crate::node::DriveNode;

/// Listing URL of a folder id.
pub const FOLDER_URL: &str = "https://drive.google.com/drive/folders/";

pub fn folder_url(id: &str) -> String {
    format!("{FOLDER_URL}{id}")
}

/// Appends the English locale parameter.
fn canonical(url: &str) -> String {
    if url.contains('?') {
        format!("{url}&hl=en")
    } else {
        format!("{url}?hl=en")
    }
}

/// Walks a folder hierarchy page by page. One walker serves one crawl.
pub(crate) struct Walker<'a> {
    http: &'a dyn HttpClient,
    markup: &'a dyn Markup,
    pruned: &'a [String],
    concurrency: usize,
    max_nodes: usize,
    nodes: AtomicUsize,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(
        http: &'a dyn HttpClient,
        markup: &'a dyn Markup,
        pruned: &'a [String],
        concurrency: usize,
        max_nodes: usize,
    ) -> Self {
        Self {
            http,
            markup,
            pruned,
            concurrency: concurrency.max(1),
            max_nodes,
            nodes: AtomicUsize::new(0),
        }
    }

    /// Builds the full tree under `root_url`, skipping pruned folders.
    pub(crate) async fn walk(&self, root_url: &str) -> Result<DriveNode> {
        let tree = self.walk_folder(root_url.to_string()).await?;
        info!(
            "walked {:?}: {} nodes",
            tree.name,
            self.nodes.load(Ordering::Relaxed)
        );
        Ok(tree)
    }

    /// Depth-first search for a folder named `target`; the first match wins. Nothing is pruned.
    pub(crate) async fn find_folder(&self, root_url: &str, target: &str) -> Result<Option<String>> {
        self.search(root_url.to_string(), target).await
    }

    /// Fetches twice: the first response may redirect, and the second request is made from the
    /// final URL, which is also the URL handed to the parser.
    async fn fetch_listing(&self, url: &str) -> Result<FolderPage> {
        let first = self.http.get_page(&canonical(url)).await?;
        let Page { url, body } = self.http.get_page(&canonical(&first.url)).await?;
        self.markup.parse_folder_page(&url, &body)
    }

    fn count_node(&self) -> Result<()> {
        let count = self.nodes.fetch_add(1, Ordering::Relaxed) + 1;
        if count > self.max_nodes {
            return Err(Error::NodeLimit(self.max_nodes));
        }
        Ok(())
    }

    fn walk_folder(&self, url: String) -> BoxFuture<'_, Result<DriveNode>> {
        async move {
            let FolderPage { folder, children } = self.fetch_listing(&url).await?;
            self.count_node()?;

            // ordered buffering keeps page order no matter which fetch finishes first
            let children: Vec<Option<DriveNode>> = stream::iter(children)
                .map(|child| self.visit(child))
                .buffered(self.concurrency)
                .try_collect()
                .await?;

            Ok(folder.with_children(children.into_iter().flatten().collect()))
        }
        .boxed()
    }

    async fn visit(&self, child: ChildEntry) -> Result<Option<DriveNode>> {
        if !child.kind.is_folder() {
            self.count_node()?;
            return Ok(Some(DriveNode::file(child.id, child.name)));
        }

        if self.pruned.iter().any(|name| *name == child.name) {
            debug!("pruning folder {:?} ({})", child.name, child.id);
            return Ok(None);
        }

        // the nested node takes its name from its own page title
        let folder = self.walk_folder(folder_url(&child.id)).await?;
        Ok(Some(folder))
    }

    fn search<'s>(&'s self, url: String, target: &'s str) -> BoxFuture<'s, Result<Option<String>>> {
        async move {
            let page = self.fetch_listing(&url).await?;
            self.count_node()?;

            for child in page.children {
                if !child.kind.is_folder() {
                    continue;
                }

                if child.name == target {
                    debug!("found folder {target:?} ({})", child.id);
                    return Ok(Some(child.id));
                }

                if let Some(id) = self.search(folder_url(&child.id), target).await? {
                    return Ok(Some(id));
                }
            }

            Ok(None)
        }
        .boxed()
    }
}
