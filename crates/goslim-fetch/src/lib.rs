//! # goslim-fetch
//!
//! Downloads the upstream annotation (GAF) and ontology (OBO) files into
//! the run's staging directory.
//!
//! Bodies are streamed to disk chunk by chunk. Sources whose URL ends in
//! `.gz` are decompressed after download so later stages always see the
//! plain tab-delimited text. Transient failures (transport errors, 5xx,
//! 429) are retried with exponential backoff per [`RetryConfig`]; once
//! attempts are exhausted the last error is returned and the caller aborts
//! the run.

mod error;
mod http;
mod retry;

pub use error::FetchError;
pub use retry::RetryConfig;

use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::MultiGzDecoder;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

/// Outcome of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fetched {
    pub url: String,
    /// Final (decompressed) path in staging.
    pub path: PathBuf,
    /// Bytes received over the wire.
    pub bytes: u64,
    pub attempts: u32,
    pub decompressed: bool,
}

// ── Client ─────────────────────────────────────────────────────────

/// HTTP client for pulling upstream files into staging.
pub struct Fetcher {
    http: reqwest::Client,
    retry: RetryConfig,
}

impl Fetcher {
    /// Create a fetcher with the given user agent, per-request timeout, and
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying `reqwest::Client`
    /// fails to build.
    pub fn new(user_agent: &str, timeout: Duration, retry: RetryConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { http, retry })
    }

    #[must_use]
    pub const fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Retrieve `url` and write it at `dest`, creating the parent directory
    /// if absent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::CreateDir`] when the staging directory cannot be
    /// created, [`FetchError::Empty`] when the (decompressed) file holds no
    /// bytes, or the last transport/status/write error once retries are
    /// exhausted.
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<Fetched, FetchError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let gzipped = is_gzip_url(url);
        let download = if gzipped {
            gzip_download_path(dest)
        } else {
            dest.to_path_buf()
        };

        let mut attempt = 1;
        let bytes = loop {
            match self.download_once(url, &download).await {
                Ok(bytes) => break bytes,
                Err(err) => {
                    let Some(delay) = self.retry.delay_after(&err, attempt) else {
                        tracing::debug!(url, attempt, %err, "fetch failed, giving up");
                        return Err(err);
                    };
                    tracing::warn!(
                        url,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %err,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        };

        if gzipped {
            decompress(&download, dest).await?;
            if let Err(e) = tokio::fs::remove_file(&download).await {
                tracing::debug!(path = %download.display(), %e, "could not remove compressed download");
            }
        }

        ensure_not_empty(url, dest).await?;

        tracing::info!(url, path = %dest.display(), bytes, attempt, "fetched");
        Ok(Fetched {
            url: url.to_string(),
            path: dest.to_path_buf(),
            bytes,
            attempts: attempt,
            decompressed: gzipped,
        })
    }

    /// One GET, streamed to `path`. Returns the byte count.
    async fn download_once(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let write_err = |source| FetchError::Write {
            path: path.to_path_buf(),
            source,
        };

        let resp = self.http.get(url).send().await.map_err(http_err)?;
        let mut resp = http::check_response(url, resp).await?;

        let mut file = tokio::fs::File::create(path).await.map_err(write_err)?;
        let mut written = 0_u64;
        while let Some(chunk) = resp.chunk().await.map_err(http_err)? {
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        Ok(written)
    }
}

/// Whether a source URL names a gzip-compressed resource.
#[must_use]
pub fn is_gzip_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.ends_with(".gz")
}

fn gzip_download_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".gz");
    dest.with_file_name(name)
}

/// A zero-length file is never a usable source.
async fn ensure_not_empty(url: &str, path: &Path) -> Result<(), FetchError> {
    let len = tokio::fs::metadata(path)
        .await
        .map_err(|source| FetchError::Write {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if len == 0 {
        return Err(FetchError::Empty {
            url: url.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Inflate `src` into `dest` on the blocking pool.
async fn decompress(src: &Path, dest: &Path) -> Result<(), FetchError> {
    let (src, dest) = (src.to_path_buf(), dest.to_path_buf());
    let err_path = dest.clone();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let input = std::fs::File::open(&src)?;
        let mut decoder = MultiGzDecoder::new(std::io::BufReader::new(input));
        let mut output = std::io::BufWriter::new(std::fs::File::create(&dest)?);
        std::io::copy(&mut decoder, &mut output)?;
        let file = output.into_inner().map_err(std::io::IntoInnerError::into_error)?;
        file.sync_all()
    })
    .await
    .map_err(|e| FetchError::Decompress {
        path: err_path.clone(),
        source: std::io::Error::other(e),
    })?
    .map_err(|source| FetchError::Decompress {
        path: err_path,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::{Compression, write::GzEncoder};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("https://current.geneontology.org/annotations/sgd.gaf.gz", true)]
    #[case("https://example.org/sgd.gaf.gz?download=1", true)]
    #[case("https://purl.obolibrary.org/obo/go.obo", false)]
    #[case("https://example.org/gz/go.obo", false)]
    fn gzip_detection(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_gzip_url(url), expected);
    }

    #[test]
    fn compressed_download_sits_next_to_destination() {
        let path = gzip_download_path(Path::new("/tmp/run/gene_association.sgd"));
        assert_eq!(path, PathBuf::from("/tmp/run/gene_association.sgd.gz"));
    }

    #[tokio::test]
    async fn decompress_inflates_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.gz");
        let dest = dir.path().join("out");

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"!gaf-version: 2.2\nSGD\tS000001\n").unwrap();
        std::fs::write(&src, encoder.finish().unwrap()).unwrap();

        decompress(&src, &dest).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "!gaf-version: 2.2\nSGD\tS000001\n"
        );
    }

    #[tokio::test]
    async fn decompress_rejects_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.gz");
        std::fs::write(&src, b"not gzip at all").unwrap();

        let err = decompress(&src, &dir.path().join("out")).await.unwrap_err();
        assert!(matches!(err, FetchError::Decompress { .. }));
        assert_eq!(err.kind(), goslim_core::ErrorKind::Fetch);
    }

    #[test]
    fn fetcher_builds() {
        let fetcher = Fetcher::new("goslim-test", Duration::from_secs(5), RetryConfig::default())
            .unwrap();
        assert_eq!(fetcher.retry().max_attempts, 3);
    }
}
