//! On-disk copies of fetched tables, revalidated with conditional GETs.
//!
//! Each URL owns two files named by a hash of the URL: the raw body
//! (`<stem>.csv`) and a small JSON sidecar with the validators
//! (`<stem>.meta.json`). A `304 Not Modified` serves the stored body and
//! leaves both files untouched.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, HeaderMap, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::DatasetError;

const APP_DIR: &str = "energy_guessr";
const TABLE_DIR: &str = "tables";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheMeta {
    url: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: i64,
}

#[derive(Debug, Clone)]
struct CachedTable {
    meta: CacheMeta,
    body: String,
}

/// Directory of cached table bodies.
#[derive(Debug, Clone)]
pub struct BodyCache {
    dir: PathBuf,
}

impl BodyCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `tables/` under the app cache dir, if a home or XDG cache is known.
    pub fn default_location() -> Option<Self> {
        app_cache_dir().map(|dir| Self::new(dir.join(TABLE_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn paths(&self, url: &str) -> (PathBuf, PathBuf) {
        let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
        let stem = &digest[..32];
        (
            self.dir.join(format!("{stem}.csv")),
            self.dir.join(format!("{stem}.meta.json")),
        )
    }

    fn lookup(&self, url: &str) -> Option<CachedTable> {
        let (body_path, meta_path) = self.paths(url);
        let meta: CacheMeta = serde_json::from_str(&fs::read_to_string(meta_path).ok()?).ok()?;
        if meta.url != url {
            return None;
        }
        let body = fs::read_to_string(body_path).ok()?;
        Some(CachedTable { meta, body })
    }

    fn store(&self, meta: &CacheMeta, body: &str) -> Result<()> {
        let (body_path, meta_path) = self.paths(&meta.url);
        fs::create_dir_all(&self.dir).context("create table cache dir")?;
        write_atomic(&body_path, body.as_bytes()).context("write cached body")?;
        let json = serde_json::to_vec(meta).context("serialize cache metadata")?;
        write_atomic(&meta_path, &json).context("write cache metadata")?;
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

/// GET `url` as text. With a cache, a stored copy is revalidated with
/// `If-None-Match` / `If-Modified-Since` and a fresh 200 body replaces it.
pub fn fetch_text_cached(
    client: &Client,
    url: &str,
    cache: Option<&BodyCache>,
) -> Result<String, DatasetError> {
    let cached = cache.and_then(|c| c.lookup(url));

    let mut req = client.get(url);
    if let Some(entry) = cached.as_ref() {
        if let Some(etag) = entry.meta.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.meta.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let transport = |source| DatasetError::Transport {
        url: url.to_string(),
        source,
    };

    let resp = req.send().map_err(transport)?;
    let status = resp.status();
    if status == StatusCode::NOT_MODIFIED {
        return match cached {
            Some(entry) => {
                debug!(url, "table not modified, serving cached body");
                Ok(entry.body)
            }
            None => Err(DatasetError::Other(format!(
                "received 304 without a cached body for {url}"
            ))),
        };
    }
    if !status.is_success() {
        return Err(DatasetError::Network {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let meta = CacheMeta {
        url: url.to_string(),
        etag: header_string(resp.headers(), ETAG),
        last_modified: header_string(resp.headers(), LAST_MODIFIED),
        fetched_at: Utc::now().timestamp(),
    };
    let body = resp.text().map_err(transport)?;
    debug!(url, bytes = body.len(), "fetched table");

    if let Some(cache) = cache {
        if meta.etag.is_some() || meta.last_modified.is_some() {
            if let Err(err) = cache.store(&meta, &body) {
                warn!(url, error = %err, "failed to persist table body");
            }
        }
    }
    Ok(body)
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}
