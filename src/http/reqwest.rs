use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use log::debug;
use reqwest::{Client, Proxy, Response};

use crate::config::{Config, ProxyMode};
use crate::error::{Error, Result};
use crate::http::{ByteStream, HttpClient, Page};

/// build the HTTP session every request of this crate goes through
pub fn session(config: &Config) -> Result<Client> {
    if config.proxy_mode != ProxyMode::None && config.proxies.is_empty() {
        return Err(Error::InvalidConfig("no proxies".to_string()));
    }

    let proxies = config.proxies.clone();
    let proxy_mode = config.proxy_mode;

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .proxy(Proxy::custom(move |_| match proxy_mode {
            ProxyMode::Random => proxies.get(fastrand::usize(..proxies.len())).cloned(),
            ProxyMode::Single => proxies.first().cloned(),
            ProxyMode::None => None,
        }))
        .connect_timeout(config.timeout)
        .read_timeout(config.timeout)
        .build()?;

    Ok(client)
}

#[async_trait]
impl HttpClient for Client {
    async fn get_page(&self, url: &str) -> Result<Page> {
        debug!("GET {url}");
        let response = success(self.get(url).send().await?)?;

        let final_url = response.url().to_string();
        if final_url != url {
            debug!("redirected to {final_url}");
        }

        let body = response.text().await?;
        Ok(Page {
            url: final_url,
            body,
        })
    }

    async fn get_stream(&self, url: &str) -> Result<ByteStream> {
        debug!("GET {url} (streaming)");
        let response = success(self.get(url).send().await?)?;

        let stream = response
            .bytes_stream()
            .map_ok(|bytes| bytes.to_vec())
            .map_err(Error::from);

        Ok(stream.boxed())
    }
}

fn success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::HttpStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}
