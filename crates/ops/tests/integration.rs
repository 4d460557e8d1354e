//! Integration tests for ops crate

use arcdl_config::Config;
use arcdl_errors::{Error, LauncherError, NetworkError};
use arcdl_events::{AppEvent, EventReceiver, LauncherEvent};
use arcdl_hash::{Hash, HashAlgorithm};
use arcdl_launcher::{Launcher, ShortcutSpec};
use arcdl_ops::{
    FetchRequest, InstallRequest, OperationResult, OpsContextBuilder, OpsCtx, ShortcutOutcome,
};
use async_trait::async_trait;
use httpmock::prelude::*;
use httpmock::Method::HEAD;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Default)]
struct RecordingLauncher {
    calls: Mutex<Vec<ShortcutSpec>>,
    fail: bool,
}

#[async_trait]
impl Launcher for RecordingLauncher {
    async fn create_shortcut(&self, spec: &ShortcutSpec) -> Result<PathBuf, Error> {
        self.calls.lock().unwrap().push(spec.clone());
        if self.fail {
            return Err(LauncherError::ProcessExecutionFailed {
                command: "powershell".to_string(),
                message: "COM object unavailable".to_string(),
            }
            .into());
        }
        let name = spec.name.clone().unwrap_or_else(|| "app".to_string());
        Ok(PathBuf::from(format!("/desktop/{name}.lnk")))
    }
}

fn app_zip() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("M_PLUS/M_PLUS.exe", options).unwrap();
    writer.write_all(b"MZ executable").unwrap();
    writer.start_file("M_PLUS/data/config.json", options).unwrap();
    writer.write_all(b"{}").unwrap();
    writer.finish().unwrap().into_inner()
}

fn context(tmp: &TempDir, launcher: Arc<dyn Launcher>) -> (OpsCtx, EventReceiver) {
    let (tx, rx) = arcdl_events::channel();
    let mut config = Config::default();
    config.paths.download_dir = Some(tmp.path().join("downloads"));
    config.network.retry_attempts = 1;
    let ctx = OpsContextBuilder::new()
        .with_event_sender(tx)
        .with_config(config)
        .with_launcher(launcher)
        .build()
        .unwrap();
    (ctx, rx)
}

fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_fetch_defaults_to_download_dir() {
    let server = MockServer::start_async().await;
    let body = app_zip();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/M_PLUS.zip");
            then.status(200).body(&body);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(HEAD).path("/files/M_PLUS.zip");
            then.status(200)
                .header("content-length", body.len().to_string().as_str());
        })
        .await;

    let tmp = TempDir::new().unwrap();
    let (ctx, _rx) = context(&tmp, Arc::new(RecordingLauncher::default()));

    let result = arcdl_ops::fetch(&ctx, &FetchRequest::new(server.url("/files/M_PLUS.zip")))
        .await
        .unwrap();

    assert_eq!(result.path, tmp.path().join("downloads").join("M_PLUS.zip"));
    assert_eq!(std::fs::read(&result.path).unwrap(), body);
    assert_eq!(result.hash, Hash::from_data(HashAlgorithm::Sha256, &body));
}

#[tokio::test]
async fn test_install_creates_shortcut() {
    let server = MockServer::start_async().await;
    let body = app_zip();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/zip");
            then.status(200).body(&body);
        })
        .await;

    let tmp = TempDir::new().unwrap();
    let launcher = Arc::new(RecordingLauncher::default());
    let (ctx, mut rx) = context(&tmp, launcher.clone());

    let mut request = InstallRequest::new(server.url("/zip"), tmp.path().join("app"));
    request.download_to = Some(tmp.path().join("M_PLUS.zip"));
    request.expected_hash = Some(Hash::from_data(HashAlgorithm::Sha256, &body));
    request.executable = Some("M_PLUS.exe".to_string());
    request.shortcut_name = Some("M_PLUS_TEST".to_string());

    let report = arcdl_ops::install(&ctx, &request).await.unwrap();

    let exe = tmp.path().join("app").join("M_PLUS").join("M_PLUS.exe");
    assert!(report.download.verified);
    assert_eq!(report.extract.files, 2);
    assert_eq!(report.executable.as_deref(), Some(exe.as_path()));
    assert_eq!(
        report.shortcut,
        ShortcutOutcome::Created {
            path: PathBuf::from("/desktop/M_PLUS_TEST.lnk")
        }
    );

    let calls = launcher.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target, exe);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::Launcher(LauncherEvent::ShortcutCreated { .. })
    )));

    let json = OperationResult::Install(report).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "Install");
    assert_eq!(value["data"]["shortcut"]["status"], "created");
}

#[tokio::test]
async fn test_install_survives_launcher_failure() {
    let server = MockServer::start_async().await;
    let body = app_zip();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/zip");
            then.status(200).body(&body);
        })
        .await;

    let tmp = TempDir::new().unwrap();
    let launcher = Arc::new(RecordingLauncher {
        fail: true,
        ..RecordingLauncher::default()
    });
    let (ctx, mut rx) = context(&tmp, launcher);

    let mut request = InstallRequest::new(server.url("/zip"), tmp.path().join("app"));
    request.download_to = Some(tmp.path().join("app.zip"));
    request.executable = Some("*.exe".to_string());

    let report = arcdl_ops::install(&ctx, &request).await.unwrap();

    assert!(matches!(report.shortcut, ShortcutOutcome::Failed { .. }));
    assert!(tmp.path().join("app/M_PLUS/M_PLUS.exe").exists());
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::Launcher(LauncherEvent::Failed { failure, .. })
            if failure.code.as_deref() == Some("launcher.process_failed")
    )));
}

#[tokio::test]
async fn test_install_without_executable_skips_shortcut() {
    let server = MockServer::start_async().await;
    let body = app_zip();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/zip");
            then.status(200).body(&body);
        })
        .await;

    let tmp = TempDir::new().unwrap();
    let launcher = Arc::new(RecordingLauncher::default());
    let (ctx, mut rx) = context(&tmp, launcher.clone());

    let mut request = InstallRequest::new(server.url("/zip"), tmp.path().join("app"));
    request.download_to = Some(tmp.path().join("app.zip"));
    request.executable = Some("missing.exe".to_string());

    let report = arcdl_ops::install(&ctx, &request).await.unwrap();

    assert_eq!(report.executable, None);
    assert!(matches!(report.shortcut, ShortcutOutcome::Skipped { .. }));
    assert!(launcher.calls.lock().unwrap().is_empty());
    assert!(drain(&mut rx).iter().any(|e| matches!(
        e,
        AppEvent::Launcher(LauncherEvent::ExecutableNotFound { .. })
    )));
}

#[tokio::test]
async fn test_install_fails_on_checksum_mismatch() {
    let server = MockServer::start_async().await;
    let body = app_zip();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/zip");
            then.status(200).body(&body);
        })
        .await;

    let tmp = TempDir::new().unwrap();
    let (ctx, _rx) = context(&tmp, Arc::new(RecordingLauncher::default()));

    let mut request = InstallRequest::new(server.url("/zip"), tmp.path().join("app"));
    request.download_to = Some(tmp.path().join("app.zip"));
    request.expected_hash = Some(Hash::from_data(HashAlgorithm::Sha256, b"something else"));

    let err = arcdl_ops::install(&ctx, &request).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Network(NetworkError::ChecksumMismatch { .. })
    ));
    assert!(!tmp.path().join("app").exists());
}

#[tokio::test]
async fn test_find_and_hash() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("tree/bin");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("tool.exe"), b"abc").unwrap();

    let report = arcdl_ops::find(&tmp.path().join("tree"), "*.exe").unwrap();
    assert_eq!(report.matches, vec![dir.join("tool.exe")]);
    assert!(OperationResult::Find(report).is_success());

    let report = arcdl_ops::hash(&dir.join("tool.exe"), HashAlgorithm::Sha256)
        .await
        .unwrap();
    assert_eq!(
        report.hash,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[tokio::test]
async fn test_extract_operation() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("app.zip");
    std::fs::write(&archive, app_zip()).unwrap();
    let (ctx, _rx) = context(&tmp, Arc::new(RecordingLauncher::default()));

    let report = arcdl_ops::extract(&ctx, &archive, &tmp.path().join("out"), false)
        .await
        .unwrap();
    assert_eq!(report.destination, tmp.path().join("out"));
    assert!(Path::new(&tmp.path().join("out/M_PLUS/data/config.json")).exists());
}
