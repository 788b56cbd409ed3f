// src/store/mod.rs
// =============================================================================
// Saves downloaded resources under the output directory.
//
// Layout: <root>/<host>/<path>, e.g.
//   http://x.test/             -> <root>/x.test/index.html
//   http://x.test/docs/        -> <root>/x.test/docs/index.html
//   http://x.test/about        -> <root>/x.test/about.html   (text/html)
//   http://x.test/site.css     -> <root>/x.test/site.css
//   http://x.test:8080/p?q=1   -> <root>/x.test_8080/p_q_1.html
//
// The mapping is deterministic: the same URL and content type always land
// on the same path, so a page fetched twice would overwrite itself instead
// of piling up copies.
// =============================================================================

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::CrawlError;

#[derive(Debug, Clone)]
pub struct PageStore {
    root: PathBuf,
}

impl PageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the output root. Failing here aborts the whole crawl.
    pub async fn ensure_root(&self) -> Result<(), CrawlError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| CrawlError::OutputDir {
                path: self.root.clone(),
                source,
            })
    }

    /// Where `url` with the given Content-Type would be written
    pub fn path_for(&self, url: &Url, content_type: &str) -> PathBuf {
        let mut path = self.root.join(host_dir(url));

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.collect())
            .unwrap_or_default();

        // A trailing "/" leaves an empty last segment, that is a directory index
        let (file, dirs) = match segments.split_last() {
            Some((last, dirs)) if !last.is_empty() => (sanitize(last), dirs),
            Some((_, dirs)) => ("index.html".to_string(), dirs),
            None => ("index.html".to_string(), &[][..]),
        };

        for dir in dirs.iter().filter(|d| !d.is_empty() && **d != "." && **d != "..") {
            path.push(sanitize(dir));
        }

        let mut file = file;
        if let Some(query) = url.query().filter(|q| !q.is_empty()) {
            file = format!("{file}_{}", sanitize(query));
        }
        if !has_extension(&file) {
            file.push_str(extension_for(content_type));
        }

        path.push(file);
        path
    }

    /// Writes `body` to the path derived from `url` and returns that path
    pub async fn save(
        &self,
        url: &Url,
        content_type: &str,
        body: &[u8],
    ) -> Result<PathBuf, CrawlError> {
        let path = self.path_for(url, content_type);
        let persist_error = |source| CrawlError::Persist {
            url: url.to_string(),
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(persist_error)?;
        }
        tokio::fs::write(&path, body).await.map_err(persist_error)?;

        Ok(path)
    }
}

fn host_dir(url: &Url) -> String {
    let host = url.host_str().unwrap_or("unknown-host");
    match url.port() {
        Some(port) => sanitize(&format!("{host}_{port}")),
        None => sanitize(host),
    }
}

// Keeps names portable: anything outside [A-Za-z0-9._-] becomes '_'
fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // "." and ".." must never become path components
    if cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}

fn has_extension(file: &str) -> bool {
    file.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
}

fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime.contains("css") {
        ".css"
    } else if mime.contains("javascript") {
        ".js"
    } else if let Some(subtype) = mime.strip_prefix("image/") {
        match subtype {
            "png" => ".png",
            "gif" => ".gif",
            "webp" => ".webp",
            "svg+xml" => ".svg",
            "x-icon" | "vnd.microsoft.icon" => ".ico",
            _ => ".jpg",
        }
    } else if mime == "application/json" {
        ".json"
    } else if mime == "text/plain" {
        ".txt"
    } else {
        ".html"
    }
}
