//! Static site hosting from a confined public root.
//!
//! [`PathResolver`] turns a URL path into a filesystem path that is provably
//! inside the root: percent-decode, drop any query or fragment, normalise
//! `.`/`..` lexically, join segment by segment, then canonicalise both the
//! result and the root and require the first to sit under the second. The
//! final check follows symlinks, so a link pointing outside the root is
//! rejected even though its name looked harmless.
//!
//! [`StaticFiles`] serves what the resolver accepts. Every failure is a bare
//! `404`; filesystem error details never reach the client.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::response::Response;
use crate::status::Status;

/// Maps URL paths into one public directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the canonical path for `url_path`, or `None` if it would leave
    /// the root or cannot be resolved at all.
    pub fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        let decoded = urlencoding::decode(url_path).ok()?;
        let path = decoded.split(['?', '#']).next().unwrap_or_default();

        let mut joined = self.root.clone();
        for segment in normalize(path) {
            joined.push(segment);
        }

        let real = joined.canonicalize().ok()?;
        let root = self.root.canonicalize().ok()?;
        real.starts_with(&root).then_some(real)
    }
}

/// Lexical normalisation: `/` and `\` both separate, empty and `.` segments
/// vanish, `..` pops (and is dropped at the top). No filesystem access.
fn normalize(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}

/// Serves files found through a [`PathResolver`].
#[derive(Debug, Clone)]
pub struct StaticFiles {
    resolver: PathResolver,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { resolver: PathResolver::new(root) }
    }

    /// `200` with the file body, or `404`. A directory serves its
    /// `index.html`.
    pub async fn serve(&self, url_path: &str) -> Response {
        match self.load(url_path).await {
            Ok((bytes, content_type)) => Response::builder().bytes(content_type, bytes),
            Err(e) => {
                debug!(path = url_path, "static lookup failed: {e}");
                Response::builder().status(Status::NotFound).text("Not Found")
            }
        }
    }

    async fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let mut path = self.resolver
            .resolve(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "outside public root"))?;

        if tokio::fs::metadata(&path).await?.is_dir() {
            let index = format!("{}/index.html", url_path.split(['?', '#']).next().unwrap_or_default());
            path = self.resolver
                .resolve(&index)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no index"))?;
            if !tokio::fs::metadata(&path).await?.is_file() {
                return Err(io::Error::new(io::ErrorKind::NotFound, "index is not a file"));
            }
        }

        let bytes = tokio::fs::read(&path).await?;
        Ok((bytes, content_type(&path)))
    }
}

fn content_type(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css"          => "text/css; charset=utf-8",
        "js" | "mjs"   => "text/javascript; charset=utf-8",
        "json"         => "application/json",
        "txt"          => "text/plain; charset=utf-8",
        "xml"          => "application/xml",
        "svg"          => "image/svg+xml",
        "png"          => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "ico"          => "image/x-icon",
        "woff"         => "font/woff",
        "woff2"        => "font/woff2",
        "wasm"         => "application/wasm",
        "pdf"          => "application/pdf",
        _              => "application/octet-stream",
    }
}
