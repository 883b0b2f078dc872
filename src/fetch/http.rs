use super::{Fetch, FetchError, FetchResult};
use reqwest::Client;
use std::time::Instant;
use tracing::debug;

/// HTTP fetcher over a pre-built, shared client.
///
/// Proxy, TLS and pooling policy live in the client; this type never
/// touches them. There is no per-request timeout: a hung server holds the
/// caller until the transport gives up.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, addr: &str) -> Result<FetchResult, FetchError> {
        debug!(%addr, "fetching");
        let start = Instant::now();

        let mut resp = self
            .client
            .get(addr)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                addr: addr.to_string(),
                source,
            })?;

        let status = resp.status().as_u16();
        let content_length = resp.content_length();

        // Drain the body; `resp` is dropped on every return path below.
        let mut bytes_read: u64 = 0;
        loop {
            match resp.chunk().await {
                Ok(Some(chunk)) => bytes_read += chunk.len() as u64,
                Ok(None) => break,
                Err(source) => {
                    return Err(FetchError::Body {
                        addr: addr.to_string(),
                        bytes_read,
                        source,
                    })
                }
            }
        }
        let end = Instant::now();

        let res = FetchResult::new(start, end, content_length, bytes_read, status);
        debug!(%addr, status, bytes_read, elapsed = ?res.elapsed(), "fetched");
        Ok(res)
    }
}
