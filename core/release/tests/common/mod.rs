//! Shared helpers for release pipeline tests
//!
//! Provides fast HTTP policies, in-memory archive builders and wiremock
//! helpers for serving a GitHub-style release feed.

#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zitiup_release::HttpPolicy;

/// Feed path segment used by the tests.
pub const FEED: &str = "x";

/// Policy with the production retry count but millisecond backoff.
pub fn fast_policy() -> HttpPolicy {
    HttpPolicy {
        retry_wait: Duration::from_millis(1),
        max_retry_wait: Duration::from_millis(5),
        ..HttpPolicy::feed()
    }
}

/// Builds a ZIP in memory from `(name, mode, content)` triples.
pub fn zip_bytes(files: &[(&str, u32, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, mode, content) in files {
        let options = zip::write::SimpleFileOptions::default().unix_permissions(*mode);
        zip.start_file(*name, options).expect("Should start file");
        zip.write_all(content).expect("Should write");
    }
    zip.finish().expect("Should finish").into_inner()
}

/// Builds a tar.gz in memory from `(name, mode, content)` triples.
pub fn tar_gz_bytes(files: &[(&str, u32, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, mode, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *content)
            .expect("Should append file");
    }
    builder
        .into_inner()
        .expect("Should finish tar")
        .finish()
        .expect("Should finish gzip")
}

/// One release object as the feed serves it.
pub fn release_json(tag: &str, asset_urls: &[String]) -> Value {
    let assets: Vec<Value> = asset_urls
        .iter()
        .map(|url| json!({ "name": url.rsplit('/').next(), "browser_download_url": url }))
        .collect();
    json!({ "tag_name": tag, "draft": false, "assets": assets })
}

/// Serves `releases` as the release list of `feed`.
pub async fn mock_release_list(server: &MockServer, feed: &str, releases: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{feed}/releases")))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases))
        .mount(server)
        .await;
}

/// Serves `release` under `releases/tags/{tag}` of `feed`.
pub async fn mock_release_by_tag(server: &MockServer, feed: &str, tag: &str, release: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{feed}/releases/tags/{tag}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

/// Serves `content` at `asset_path`.
pub async fn mock_asset(server: &MockServer, asset_path: &str, content: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(asset_path.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content))
        .mount(server)
        .await;
}
