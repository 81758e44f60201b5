//! Integration tests for the offline update pipeline

#[path = "common/mod.rs"]
mod common;

use common::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xray_offline::errors::AppError;
use xray_offline::offline::{run_offline_update, PipelineState};

#[tokio::test]
async fn test_scenario_one_file_per_category() {
    let server = MockServer::start().await;
    let body = format!(
        r#"{{"last_update":100,"urls":["{0}/a__vuln_1.json","{0}/b__comp_1.json","{0}/c_other.json"]}}"#,
        server.uri()
    );
    mount_update_list(&server, &body).await;
    mount_data_file(&server, "/a__vuln_1.json", r#"{"cve":"CVE-1"}"#).await;
    mount_data_file(&server, "/b__comp_1.json", r#"{"component":"lib"}"#).await;
    Mock::given(method("GET"))
        .and(path("/c_other.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let base = TempDir::new().unwrap();
    let config = test_config(base.path());
    let client = reqwest::Client::new();
    let report = run_offline_update(&client, LICENSE, &list_url(&server), &config)
        .await
        .unwrap();

    assert_eq!(report.state, PipelineState::Done);
    assert_eq!(report.last_update, 100);
    assert_eq!(report.failed_downloads, 0);
    assert_eq!(report.archives.len(), 2);
    assert_eq!(report.archives[0].path, config.output_dir.join("vuln.zip"));
    assert_eq!(report.archives[1].path, config.output_dir.join("comp.zip"));

    assert_eq!(
        read_zip_entries(&config.output_dir.join("vuln.zip")),
        vec![("vuln0.json".to_string(), r#"{"cve":"CVE-1"}"#.to_string())]
    );
    assert_eq!(
        read_zip_entries(&config.output_dir.join("comp.zip")),
        vec![("comp0.json".to_string(), r#"{"component":"lib"}"#.to_string())]
    );

    // Scratch directories are gone once the archives are written
    assert!(dir_entries(&config.scratch_root).is_empty());
}

#[tokio::test]
async fn test_archives_default_to_scratch_root() {
    let server = MockServer::start().await;
    let body = format!(r#"{{"last_update":1,"urls":["{}/x__comp.json"]}}"#, server.uri());
    mount_update_list(&server, &body).await;
    mount_data_file(&server, "/x__comp.json", "{}").await;

    let base = TempDir::new().unwrap();
    let mut config = test_config(base.path());
    config.output_dir = Default::default();
    let client = reqwest::Client::new();
    let report = run_offline_update(&client, LICENSE, &list_url(&server), &config)
        .await
        .unwrap();

    assert_eq!(report.archives.len(), 1);
    assert_eq!(dir_entries(&config.scratch_root), vec![config.scratch_root.join("comp.zip")]);
}

#[tokio::test]
async fn test_empty_manifest_creates_nothing() {
    let server = MockServer::start().await;
    mount_update_list(&server, r#"{"last_update":42,"urls":[]}"#).await;

    let base = TempDir::new().unwrap();
    let config = test_config(base.path());
    let client = reqwest::Client::new();
    let report = run_offline_update(&client, LICENSE, &list_url(&server), &config)
        .await
        .unwrap();

    assert_eq!(report.state, PipelineState::Done);
    assert_eq!(report.last_update, 42);
    assert!(report.archives.is_empty());
    assert!(!config.scratch_root.exists());
    assert!(!config.output_dir.exists());
}

#[tokio::test]
async fn test_unclassified_urls_only_creates_nothing() {
    let server = MockServer::start().await;
    let body = format!(r#"{{"last_update":1,"urls":["{}/readme.json"]}}"#, server.uri());
    mount_update_list(&server, &body).await;

    let base = TempDir::new().unwrap();
    let config = test_config(base.path());
    let client = reqwest::Client::new();
    let report = run_offline_update(&client, LICENSE, &list_url(&server), &config)
        .await
        .unwrap();

    assert!(report.archives.is_empty());
    assert!(!config.scratch_root.exists());
}

#[tokio::test]
async fn test_non_200_list_downloads_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/updates"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let base = TempDir::new().unwrap();
    let config = test_config(base.path());
    let client = reqwest::Client::new();
    let err = run_offline_update(&client, "wrong-license", &list_url(&server), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::HttpStatus { ref status } if status.starts_with("401")));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert!(!config.scratch_root.exists());
    assert!(!config.output_dir.exists());
}

#[tokio::test]
async fn test_malformed_list_aborts() {
    let server = MockServer::start().await;
    mount_update_list(&server, "{\"urls\": [").await;

    let base = TempDir::new().unwrap();
    let config = test_config(base.path());
    let client = reqwest::Client::new();
    let result = run_offline_update(&client, LICENSE, &list_url(&server), &config).await;

    assert!(matches!(result, Err(AppError::ParseError(_))));
    assert!(!config.scratch_root.exists());
}

#[tokio::test]
async fn test_list_transport_error_aborts() {
    let base = TempDir::new().unwrap();
    let config = test_config(base.path());
    let client = reqwest::Client::new();
    let result = run_offline_update(&client, LICENSE, "http://127.0.0.1:1/updates", &config).await;

    assert!(matches!(result, Err(AppError::NetworkError(_))));
    assert!(!config.scratch_root.exists());
}

#[tokio::test]
async fn test_unwritable_output_dir_still_cleans_scratch() {
    let server = MockServer::start().await;
    let body = format!(
        r#"{{"last_update":1,"urls":["{0}/a__vuln.json","{0}/x__comp.json"]}}"#,
        server.uri()
    );
    mount_update_list(&server, &body).await;
    mount_data_file(&server, "/a__vuln.json", "{}").await;
    mount_data_file(&server, "/x__comp.json", "{}").await;

    let base = TempDir::new().unwrap();
    let config = test_config(base.path());
    // A regular file where the output directory should be
    std::fs::write(&config.output_dir, "not a directory").unwrap();
    let client = reqwest::Client::new();
    let result = run_offline_update(&client, LICENSE, &list_url(&server), &config).await;

    assert!(matches!(result, Err(AppError::IoError(ref msg)) if msg.contains("output directory")));
    assert!(dir_entries(&config.scratch_root).is_empty());

    // The component bucket still ran after the vulnerability bucket failed
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().any(|r| r.url.path() == "/x__comp.json"));
}

#[tokio::test]
async fn test_failed_download_is_tolerated_by_default() {
    let server = MockServer::start().await;
    let body = format!(
        r#"{{"last_update":1,"urls":["{0}/gone__vuln.json","{0}/ok__vuln.json"]}}"#,
        server.uri()
    );
    mount_update_list(&server, &body).await;
    mount_data_file(&server, "/ok__vuln.json", r#"{"ok":true}"#).await;
    Mock::given(method("GET"))
        .and(path("/gone__vuln.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let base = TempDir::new().unwrap();
    let config = test_config(base.path());
    let client = reqwest::Client::new();
    let report = run_offline_update(&client, LICENSE, &list_url(&server), &config)
        .await
        .unwrap();

    assert_eq!(report.failed_downloads, 1);
    assert_eq!(report.archives.len(), 1);
    // Index 0 failed, so only vuln1.json made it into the archive
    assert_eq!(
        read_zip_entries(&config.output_dir.join("vuln.zip")),
        vec![("vuln1.json".to_string(), r#"{"ok":true}"#.to_string())]
    );
    assert!(dir_entries(&config.scratch_root).is_empty());
}

#[tokio::test]
async fn test_strict_mode_fails_bucket_but_runs_the_other() {
    let server = MockServer::start().await;
    let body = format!(
        r#"{{"last_update":1,"urls":["{0}/gone__vuln.json","{0}/ok__comp.json"]}}"#,
        server.uri()
    );
    mount_update_list(&server, &body).await;
    mount_data_file(&server, "/ok__comp.json", "{}").await;
    Mock::given(method("GET"))
        .and(path("/gone__vuln.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let base = TempDir::new().unwrap();
    let mut config = test_config(base.path());
    config.fail_on_download_error = true;
    let client = reqwest::Client::new();
    let err = run_offline_update(&client, LICENSE, &list_url(&server), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NetworkError(ref msg) if msg.contains("gone__vuln.json")));
    assert!(!config.output_dir.join("vuln.zip").exists());
    assert_eq!(read_zip_entries(&config.output_dir.join("comp.zip")).len(), 1);
    assert!(dir_entries(&config.scratch_root).is_empty());
}

#[tokio::test]
async fn test_rerun_overwrites_archive() {
    let server = MockServer::start().await;
    let body = format!(
        r#"{{"last_update":1,"urls":["{0}/1__comp.json","{0}/2__comp.json"]}}"#,
        server.uri()
    );
    mount_update_list(&server, &body).await;
    mount_data_file(&server, "/1__comp.json", "1").await;
    mount_data_file(&server, "/2__comp.json", "2").await;

    let base = TempDir::new().unwrap();
    let config = test_config(base.path());
    let client = reqwest::Client::new();
    for _ in 0..2 {
        run_offline_update(&client, LICENSE, &list_url(&server), &config)
            .await
            .unwrap();
    }

    assert_eq!(
        read_zip_entries(&config.output_dir.join("comp.zip")),
        vec![
            ("comp0.json".to_string(), "1".to_string()),
            ("comp1.json".to_string(), "2".to_string()),
        ]
    );
}
