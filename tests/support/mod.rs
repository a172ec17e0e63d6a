//! Shared fixtures: an app over an in-memory store and a temporary public
//! root, plus a raw HTTP client that talks to it over an in-memory pipe.

#![allow(dead_code)]

use std::fs;

use guestboard::server::handle_connection;
use guestboard::{App, SharedSecret, Store};
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const SECRET: &str = "s3cret";

pub struct Site {
    pub app: App,
    pub tmp: TempDir,
}

/// `<tmp>/public/index.html`, `<tmp>/public/css/site.css`, and
/// `<tmp>/secret.txt` outside the public root.
pub fn site_with(secret: &str, max_body: u64) -> Site {
    let tmp = tempfile::tempdir().unwrap();
    let public = tmp.path().join("public");
    fs::create_dir_all(public.join("css")).unwrap();
    fs::write(public.join("index.html"), "<h1>home</h1>").unwrap();
    fs::write(public.join("css/site.css"), "body{margin:0}").unwrap();
    fs::write(tmp.path().join("secret.txt"), "do not serve").unwrap();

    let app = App::new(Store::open_in_memory().unwrap(), public, SharedSecret::new(secret))
        .with_max_body(max_body);
    Site { app, tmp }
}

pub fn site() -> Site {
    site_with(SECRET, 1024 * 1024)
}

#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub interim: Vec<u16>,
}

impl Reply {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {:?}", String::from_utf8_lossy(&self.body)))
    }
}

/// Sends `raw` as one connection's worth of bytes, half-closes, and parses
/// the reply.
pub async fn exchange(app: &App, raw: &[u8]) -> Reply {
    let (mut client, server) = tokio::io::duplex(256 * 1024);
    let talk = async {
        client.write_all(raw).await.unwrap();
        client.shutdown().await.unwrap();
        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        out
    };
    let ((), out) = tokio::join!(handle_connection(app, server), talk);
    parse_reply(&out)
}

/// A request with a `content-length` body (omitted when `body` is empty).
pub fn request(method: &str, path: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut raw = format!("{method} {path} HTTP/1.1\r\nhost: test\r\n");
    for (k, v) in headers {
        raw.push_str(&format!("{k}: {v}\r\n"));
    }
    if !body.is_empty() {
        raw.push_str(&format!("content-length: {}\r\n", body.len()));
    }
    raw.push_str("\r\n");
    let mut raw = raw.into_bytes();
    raw.extend_from_slice(body);
    raw
}

/// The same request with the body sent as chunks of `chunk` bytes.
pub fn chunked_request(method: &str, path: &str, body: &[u8], chunk: usize) -> Vec<u8> {
    let mut raw = format!("{method} {path} HTTP/1.1\r\nhost: test\r\ntransfer-encoding: chunked\r\n\r\n")
        .into_bytes();
    for part in body.chunks(chunk) {
        raw.extend_from_slice(format!("{:X};part\r\n", part.len()).as_bytes());
        raw.extend_from_slice(part);
        raw.extend_from_slice(b"\r\n");
    }
    raw.extend_from_slice(b"0\r\n\r\n");
    raw
}

pub async fn get(app: &App, path: &str) -> Reply {
    exchange(app, &request("GET", path, &[], b"")).await
}

pub async fn post_json(app: &App, path: &str, body: &Value) -> Reply {
    let body = serde_json::to_vec(body).unwrap();
    exchange(app, &request("POST", path, &[("content-type", "application/json")], &body)).await
}

pub async fn admin(app: &App, method: &str, path: &str, body: Option<&Value>) -> Reply {
    let body = body.map(|b| serde_json::to_vec(b).unwrap()).unwrap_or_default();
    exchange(app, &request(method, path, &[("x-admin-token", SECRET)], &body)).await
}

fn parse_reply(raw: &[u8]) -> Reply {
    let mut rest = raw;
    let mut interim = Vec::new();
    loop {
        let end = rest
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .unwrap_or_else(|| panic!("no header terminator in {:?}", String::from_utf8_lossy(raw)));
        let head = std::str::from_utf8(&rest[..end]).unwrap();
        let body = &rest[end + 4..];

        let mut lines = head.split("\r\n");
        let status: u16 = lines.next().unwrap().split(' ').nth(1).unwrap().parse().unwrap();
        if status == 100 {
            interim.push(status);
            rest = body;
            continue;
        }
        let headers = lines
            .map(|l| {
                let (k, v) = l.split_once(':').unwrap();
                (k.trim().to_owned(), v.trim().to_owned())
            })
            .collect();
        return Reply { status, headers, body: body.to_vec(), interim };
    }
}
