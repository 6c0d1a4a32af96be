//! Remote content retrieval for rule and index files.
//!
//! http/https requests advertise gzip support and a `rosdep/<version>` user
//! agent; requests to the trusted raw-content host carry basic authentication
//! derived from the configured GitHub token. `file://` URLs and plain local
//! paths are read from disk.

use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::read::GzDecoder;
use reqwest::Url;
use reqwest::header::{ACCEPT_ENCODING, AUTHORIZATION, CONTENT_ENCODING, HeaderMap, HeaderValue, USER_AGENT};
use std::io::Read;
use std::path::Path;

use crate::config::FetchConfig;
use crate::constants::TRUSTED_RAW_HOST;
use crate::core::RosdepError;

fn fetch_failed(url: &str, reason: impl Into<String>) -> anyhow::Error {
    RosdepError::FetchFailed {
        url: url.to_string(),
        reason: reason.into(),
    }
    .into()
}

/// Request headers for an http/https `url`.
///
/// # Errors
///
/// [`RosdepError::FetchFailed`] if the user agent or token cannot be encoded
/// as a header value.
pub fn build_headers(url: &Url, config: &FetchConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| fetch_failed(url.as_str(), format!("invalid user agent: {e}")))?,
    );

    if url.host_str() == Some(TRUSTED_RAW_HOST) {
        if let Some(token) = &config.github_token {
            let credentials = STANDARD.encode(format!("{token}:"));
            let mut value = HeaderValue::from_str(&format!("Basic {credentials}"))
                .map_err(|e| fetch_failed(url.as_str(), format!("invalid token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
    }
    Ok(headers)
}

/// Decompress a gzip body.
pub fn decode_gzip(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    GzDecoder::new(body).read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

/// Retrieve the content at `url`.
///
/// # Errors
///
/// [`RosdepError::FetchFailed`] for unreachable hosts, non-success statuses,
/// undecodable bodies, unreadable files and unsupported schemes.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<Vec<u8>> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) if Path::new(url).exists() => return read_local(url, Path::new(url)).await,
        Err(e) => return Err(fetch_failed(url, e.to_string())),
    };

    match parsed.scheme() {
        "http" | "https" => fetch_http(&parsed, config).await,
        "file" => {
            let path = parsed
                .to_file_path()
                .map_err(|()| fetch_failed(url, "not a local file URL"))?;
            read_local(url, &path).await
        }
        other => Err(fetch_failed(url, format!("unsupported scheme '{other}'"))),
    }
}

async fn read_local(url: &str, path: &Path) -> Result<Vec<u8>> {
    tracing::debug!(target: "fetch", "Reading {}", path.display());
    tokio::fs::read(path).await.map_err(|e| fetch_failed(url, e.to_string()))
}

async fn fetch_http(url: &Url, config: &FetchConfig) -> Result<Vec<u8>> {
    let headers = build_headers(url, config)?;
    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| fetch_failed(url.as_str(), e.to_string()))?;

    tracing::debug!(target: "fetch", "Fetching {}", url);
    let response = client
        .get(url.clone())
        .headers(headers)
        .send()
        .await
        .map_err(|e| fetch_failed(url.as_str(), e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_failed(url.as_str(), format!("HTTP {status}")));
    }

    let gzipped = response
        .headers()
        .get(CONTENT_ENCODING)
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"gzip"));
    let body = response.bytes().await.map_err(|e| fetch_failed(url.as_str(), e.to_string()))?;

    if gzipped {
        decode_gzip(&body).map_err(|e| fetch_failed(url.as_str(), format!("bad gzip body: {e}")))
    } else {
        Ok(body.to_vec())
    }
}
