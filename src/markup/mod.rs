//! The scraping contract with Drive's HTML pages.
//!
//! Drive exposes no documented listing API, so everything the crate knows about a folder comes
//! from markup that can change without notice. [`Markup`] is the seam: the walker and the client
//! only talk to this trait, and [`DriveMarkup`] implements the current version of the contract.

use crate::error::Result;
use crate::node::{DriveNode, NodeKind};

mod drive;
mod escape;
mod interstitial;

pub use drive::DriveMarkup;

/// An immediate child as listed on its parent's page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
}

/// A parsed folder listing page.
#[derive(Debug, Clone)]
pub struct FolderPage {
    /// The folder itself, without children.
    pub folder: DriveNode,
    pub children: Vec<ChildEntry>,
}

/// One entry of a folder's embedded view: the file name without its `.csv` suffix and its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedEntry {
    pub name: String,
    pub id: String,
}

pub trait Markup: Send + Sync {
    /// Parses a folder listing page served from `url`.
    fn parse_folder_page(&self, url: &str, html: &str) -> Result<FolderPage>;

    /// Extracts the direct download URL from a large-file confirmation page.
    fn parse_interstitial(&self, html: &str) -> Result<String>;

    /// Lists the CSV files of a folder's embedded view page.
    fn parse_embedded_listing(&self, html: &str) -> Result<Vec<EmbeddedEntry>>;
}
