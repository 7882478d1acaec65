use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

mod reqwest;

pub use self::reqwest::session;

/// Desktop browser identity. Drive serves different, unparseable markup to unknown clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36";

/// A fetched HTML document along with the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: String,
    pub body: String,
}

/// Response body delivered piece by piece.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issues a GET request and returns the whole body as text.
    async fn get_page(&self, url: &str) -> Result<Page>;

    /// Issues a GET request and returns the body as a stream of byte pieces.
    async fn get_stream(&self, url: &str) -> Result<ByteStream>;
}
