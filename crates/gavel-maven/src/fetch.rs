//! HTTP fetch layer for remote repository sources.
//!
//! A 404, like any other client error (401/403 from a locked-down mirror),
//! is a per-source miss and falls through to the next source in the set.
//! Transient failures (5xx, connect errors, timeouts) are retried with
//! backoff; once retries are exhausted the source is treated as a miss as
//! well, so an unreachable repository surfaces as `NotFound` for the
//! coordinate rather than aborting the whole pass mid-flight.

use std::time::Duration;

use gavel_util::errors::{GavelError, GavelResult};
use reqwest::Client;

use crate::repository::RepositorySource;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Default per-lookup timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a shared HTTP client with the default per-lookup timeout.
pub fn build_client() -> GavelResult<Client> {
    build_client_with_timeout(DEFAULT_TIMEOUT)
}

/// Build a shared HTTP client with a caller-chosen per-lookup timeout.
pub fn build_client_with_timeout(timeout: Duration) -> GavelResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent("gavel/0.1")
        .build()
        .map_err(|e| {
            GavelError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// Download raw bytes from a URL, with authentication and retries.
///
/// Returns `Ok(None)` when the source does not have the file (404) or is
/// unreachable after retries. Non-retryable HTTP failures are errors.
pub async fn download_bytes(
    client: &Client,
    source: &RepositorySource,
    url: &str,
) -> GavelResult<Option<Vec<u8>>> {
    let mut last_err = String::new();

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            tokio::time::sleep(RETRY_DELAY * attempt).await;
        }

        let req = source.apply_auth(client.get(url));

        match req.send().await {
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                // Auth and policy rejections (401/403/...) are per-source
                // misses like a 404, so one locked-down mirror cannot mask
                // an artifact a later source serves.
                if status.is_client_error() {
                    tracing::warn!(
                        source = %source.name,
                        "HTTP {status} from {url}, treating as missing"
                    );
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(GavelError::Network {
                        message: format!("HTTP {status} fetching {url}"),
                    }
                    .into());
                }

                let bytes = resp.bytes().await.map_err(|e| GavelError::Network {
                    message: format!("Failed to read response from {url}: {e}"),
                })?;
                return Ok(Some(bytes.to_vec()));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                last_err = format!("{e}");
                continue;
            }
            Err(e) => {
                return Err(GavelError::Network {
                    message: format!("Request to {url} failed: {e}"),
                }
                .into());
            }
        }
    }

    tracing::warn!(
        source = %source.name,
        "treating {url} as missing after {MAX_RETRIES} attempts: {last_err}"
    );
    Ok(None)
}

/// Download a text file (descriptor, metadata, checksum sidecar).
pub async fn download_text(
    client: &Client,
    source: &RepositorySource,
    url: &str,
) -> GavelResult<Option<String>> {
    match download_bytes(client, source, url).await? {
        Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve every request on a loopback socket with a fixed status line.
    async fn spawn_stub_server(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!("{status_line}\r\ncontent-length: 0\r\n\r\n");
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn forbidden_is_a_per_source_miss() {
        let base = spawn_stub_server("HTTP/1.1 403 Forbidden").await;
        let source = RepositorySource::remote("locked-mirror", &base);
        let client = build_client().unwrap();

        let result = download_bytes(&client, &source, &source.file_url("org/x/y/1.0/y-1.0.pom"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unauthorized_is_a_per_source_miss() {
        let base = spawn_stub_server("HTTP/1.1 401 Unauthorized").await;
        let source = RepositorySource::remote("private", &base);
        let client = build_client().unwrap();

        let result = download_bytes(&client, &source, &source.file_url("org/x/y/1.0/y-1.0.pom"))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
