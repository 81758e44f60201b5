//! Common test utilities for integration tests

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xray_offline::config::OfflineUpdateConfig;

/// License token accepted by [`mount_update_list`]
#[allow(dead_code)]
pub const LICENSE: &str = "test-license";

/// Serves `body` at `/updates` for requests carrying [`LICENSE`].
#[allow(dead_code)]
pub async fn mount_update_list(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/updates"))
        .and(header("X-Xray-License", LICENSE))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serves `body` as a JSON data file at `file_path`.
#[allow(dead_code)]
pub async fn mount_data_file(server: &MockServer, file_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn list_url(server: &MockServer) -> String {
    format!("{}/updates", server.uri())
}

/// Config writing scratch directories and archives under `base`.
#[allow(dead_code)]
pub fn test_config(base: &Path) -> OfflineUpdateConfig {
    OfflineUpdateConfig {
        scratch_root: base.join("scratch"),
        output_dir: base.join("out"),
        ..OfflineUpdateConfig::default()
    }
}

/// Entries of a zip archive as (name, content), in archive order.
#[allow(dead_code)]
pub fn read_zip_entries(zip_path: &Path) -> Vec<(String, String)> {
    let mut archive = zip::ZipArchive::new(File::open(zip_path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            (entry.name().to_string(), content)
        })
        .collect()
}

/// Direct children of `dir`; empty when it does not exist.
#[allow(dead_code)]
pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
