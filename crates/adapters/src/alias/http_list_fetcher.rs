use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use domain::alias::entity::FetchedList;
use domain::alias::error::AliasError;
use ports::secondary::url_fetch_port::UrlFetchPort;
use tracing::debug;

/// Maximum list response size: 100 MiB.
const MAX_LIST_RESPONSE_SIZE: usize = 100 * 1024 * 1024;

/// Default request timeout for hosted lists.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Downloads hosted address lists over HTTP(S) with reqwest.
///
/// Non-2xx responses are returned with their status and no lines so the
/// caller decides how to treat them. Transport failures and oversized
/// bodies are fetch errors.
pub struct HttpListFetcher {
    client: reqwest::Client,
}

impl HttpListFetcher {
    /// Build a fetcher with the given timeout. `ssl_no_verify` disables
    /// certificate validation.
    pub fn new(timeout: Duration, ssl_no_verify: bool) -> Result<Self, AliasError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aliastables/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(ssl_no_verify)
            .build()
            .map_err(|e| AliasError::fetch("http client", format!("init failed: {e}")))?;

        Ok(Self { client })
    }

    /// Create with a custom reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn do_fetch(&self, url: &str) -> Result<FetchedList, AliasError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AliasError::fetch(url, e))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Ok(FetchedList {
                status,
                lines: Vec::new(),
            });
        }

        let content_length: usize = response
            .content_length()
            .unwrap_or(0)
            .try_into()
            .unwrap_or(usize::MAX);

        if content_length > MAX_LIST_RESPONSE_SIZE {
            return Err(AliasError::fetch(
                url,
                format!(
                    "response too large: {content_length} bytes (max {MAX_LIST_RESPONSE_SIZE} bytes)"
                ),
            ));
        }

        let mut body = Vec::with_capacity(content_length);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AliasError::fetch(url, format!("body read failed: {e}")))?
        {
            if body.len() + chunk.len() > MAX_LIST_RESPONSE_SIZE {
                return Err(AliasError::fetch(
                    url,
                    format!("response exceeded {MAX_LIST_RESPONSE_SIZE} byte limit"),
                ));
            }
            body.extend_from_slice(&chunk);
        }

        let lines = split_lines(&body);
        debug!(url, status, lines = lines.len(), "list downloaded");
        Ok(FetchedList { status, lines })
    }
}

fn split_lines(body: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(body)
        .lines()
        .map(str::to_string)
        .collect()
}

impl UrlFetchPort for HttpListFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedList, AliasError>> + Send + 'a>> {
        Box::pin(self.do_fetch(url))
    }
}
