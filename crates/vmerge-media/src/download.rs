//! Remote clip download over HTTP(S).
//!
//! The fetcher performs exactly one attempt: retry policy belongs to the
//! caller. A failed transfer never leaves a partially-written file behind.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::remove_if_exists;

/// Retrieves a remote asset into a local file.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Write the full body at `url` to `destination`, overwriting it.
    ///
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &str, destination: &Path) -> MediaResult<u64>;
}

/// Parse `raw` as an absolute `http`/`https` URL.
pub fn parse_remote_url(raw: &str) -> MediaResult<Url> {
    let url = Url::parse(raw).map_err(|e| MediaError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(MediaError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{scheme}'"
        ))),
    }
}

/// `MediaFetcher` backed by `reqwest`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with a default client.
    pub fn new() -> MediaResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("vmerge/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MediaError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn stream_to_file(&self, url: Url, destination: &Path) -> MediaResult<u64> {
        let display_url = url.to_string();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("Request to {display_url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!(
                "{display_url} returned HTTP {status}"
            )));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                MediaError::download_failed(format!("Transfer from {display_url} interrupted: {e}"))
            })?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> MediaResult<u64> {
        let parsed = parse_remote_url(url)?;

        info!("Downloading {} to {}", url, destination.display());

        match self.stream_to_file(parsed, destination).await {
            Ok(bytes) => {
                debug!(bytes, "Download complete: {}", destination.display());
                Ok(bytes)
            }
            Err(e) => {
                let _ = remove_if_exists(destination).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_remote_url() {
        assert!(parse_remote_url("https://cdn.example.com/a.mp4").is_ok());
        assert!(parse_remote_url("http://127.0.0.1:8080/a.mp4").is_ok());
        assert!(matches!(
            parse_remote_url("not a url"),
            Err(MediaError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_remote_url("file:///etc/passwd"),
            Err(MediaError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake video bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("clip.mp4");
        tokio::fs::write(&dest, b"stale content that is longer").await.unwrap();

        let fetcher = HttpFetcher::new().unwrap();
        let bytes = fetcher
            .fetch(&format!("{}/clip.mp4", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(bytes, 16);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"fake video bytes");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.mp4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("missing.mp4");

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing.mp4", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(err.is_download());
        assert!(err.to_string().contains("404"));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_interrupted_transfer() {
        use tokio::io::AsyncReadExt;
        use tokio::net::TcpListener;

        // Promises 1000 bytes, sends a few, then hangs up
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\npartial")
                .await;
            let _ = socket.shutdown().await;
        });

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("cut.mp4");

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch(&format!("http://{addr}/cut.mp4"), &dest)
            .await
            .unwrap_err();

        assert!(err.is_download());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_malformed_url() {
        let dir = TempDir::new().unwrap();
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch("relative/path.mp4", &dir.path().join("x.mp4"))
            .await
            .unwrap_err();
        assert!(err.is_download());
    }
}
