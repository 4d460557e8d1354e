//! Serve an archive locally, download it, extract it, install it

mod common;

use arcdl_errors::{Error, NetworkError};
use arcdl_events::{AppEvent, DownloadEvent, ExtractEvent};
use arcdl_hash::{Hash, HashAlgorithm};
use arcdl_net::{FetchConfig, Fetcher};
use arcdl_ops::{FetchRequest, InstallRequest, OperationResult, ShortcutOutcome};
use arcdl_serve::Artifact;
use common::*;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_serve_fetch_extract() {
    let tmp = TempDir::new().unwrap();
    let body = app_zip();
    let archive = write_file(tmp.path(), "M_PLUS.zip", &body);
    let server = TestServer::start(vec![Artifact::new("zip", &archive)]).await;

    let dest = tmp.path().join("client").join("M_PLUS.zip");
    let expected = Hash::from_data(HashAlgorithm::Sha256, &body);
    let result = arcdl_net::download_file(&server.url("zip"), &dest, Some(&expected))
        .await
        .unwrap();

    assert!(result.verified);
    assert_eq!(result.size, body.len() as u64);
    assert_eq!(result.resumed_from, 0);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert!(!arcdl_net::partial_path(&dest).unwrap().exists());

    let out = tmp.path().join("client").join("app");
    let report = arcdl_extract::extract(&dest, &out, false).await.unwrap();
    assert_eq!(report.files, 3);
    assert_eq!(
        std::fs::read(out.join("M_PLUS/data/config.json")).unwrap(),
        b"{\"fullscreen\":true}"
    );

    server.stop().await;
}

#[tokio::test]
async fn test_install_from_local_server() {
    let tmp = TempDir::new().unwrap();
    let body = app_zip();
    let archive = write_file(tmp.path(), "M_PLUS.zip", &body);
    let server = TestServer::start(vec![Artifact::new("zip", &archive)]).await;

    let launcher = Arc::new(RecordingLauncher::default());
    let (ctx, mut rx) = ops_context(tmp.path(), launcher.clone());

    let mut request = InstallRequest::new(server.url("zip"), tmp.path().join("apps"));
    request.download_to = Some(tmp.path().join("downloads").join("M_PLUS.zip"));
    request.expected_hash = Some(Hash::from_data(HashAlgorithm::Sha256, &body));
    request.executable = Some("*.exe".to_string());
    request.shortcut_args = Some("--windowed".to_string());

    let report = arcdl_ops::install(&ctx, &request).await.unwrap();

    let exe = tmp.path().join("apps/M_PLUS/M_PLUS.exe");
    assert_eq!(report.executable.as_deref(), Some(exe.as_path()));
    assert_eq!(
        report.shortcut,
        ShortcutOutcome::Created {
            path: "/desktop/app.lnk".into()
        }
    );
    {
        let calls = launcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target, exe);
        assert_eq!(calls[0].args.as_deref(), Some("--windowed"));
    }

    // Download finishes before extraction starts
    let events = drain(&mut rx);
    let downloaded = events
        .iter()
        .position(|e| matches!(e, AppEvent::Download(DownloadEvent::Completed { .. })))
        .unwrap();
    let extracting = events
        .iter()
        .position(|e| matches!(e, AppEvent::Extract(ExtractEvent::Started { .. })))
        .unwrap();
    assert!(downloaded < extracting);

    let json = OperationResult::Install(report).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["data"]["extract"]["files"], 3);

    server.stop().await;
}

#[tokio::test]
async fn test_fetch_defaults_to_file_name_in_download_dir() {
    let tmp = TempDir::new().unwrap();
    let archive = write_file(tmp.path(), "served.zip", &app_zip());
    let server = TestServer::start(vec![Artifact::new("M_PLUS.zip", &archive)]).await;

    let (ctx, _rx) = ops_context(tmp.path(), Arc::new(RecordingLauncher::default()));
    let result = arcdl_ops::fetch(&ctx, &FetchRequest::new(server.url("M_PLUS.zip")))
        .await
        .unwrap();

    assert_eq!(result.path, tmp.path().join("downloads").join("M_PLUS.zip"));
    server.stop().await;
}

#[tokio::test]
async fn test_malicious_archive_downloads_but_never_extracts() {
    let tmp = TempDir::new().unwrap();
    let evil = zip_bytes(&[("ok.txt", b"fine"), ("../../evil.txt", b"pwned")]);
    let archive = write_file(tmp.path(), "evil.zip", &evil);
    let server = TestServer::start(vec![Artifact::new("zip", &archive)]).await;

    let launcher = Arc::new(RecordingLauncher::default());
    let (ctx, _rx) = ops_context(tmp.path(), launcher.clone());

    let install_dir = tmp.path().join("nested").join("apps");
    std::fs::create_dir_all(&install_dir).unwrap();
    std::fs::write(install_dir.join("keep.txt"), b"existing").unwrap();

    let mut request = InstallRequest::new(server.url("zip"), &install_dir);
    request.download_to = Some(tmp.path().join("evil-download.zip"));
    request.overwrite = Some(true);

    let err = arcdl_ops::install(&ctx, &request).await.unwrap_err();

    assert!(err.is_security_violation());
    assert!(tmp.path().join("evil-download.zip").exists());
    assert!(!tmp.path().join("evil.txt").exists());
    assert!(!install_dir.join("ok.txt").exists());
    assert_eq!(std::fs::read(install_dir.join("keep.txt")).unwrap(), b"existing");
    assert!(launcher.calls.lock().unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_missing_artifact_is_not_retried() {
    let tmp = TempDir::new().unwrap();
    let server = TestServer::start(vec![Artifact::new(
        "zip",
        tmp.path().join("not-built-yet.zip"),
    )])
    .await;

    let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
    let dest = tmp.path().join("out.zip");
    let err = fetcher
        .fetch(&server.url("zip"), &dest, None, true)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Network(NetworkError::HttpError { status: 404, .. })
    ));
    assert!(!dest.exists());

    server.stop().await;
}
