//! Shared fixtures: archives, a local artifact server and a recording launcher

#![allow(dead_code)]

use arcdl_config::Config;
use arcdl_errors::Error;
use arcdl_events::{AppEvent, EventReceiver};
use arcdl_launcher::{Launcher, ShortcutSpec};
use arcdl_ops::{OpsContextBuilder, OpsCtx};
use arcdl_serve::Artifact;
use async_trait::async_trait;
use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Build an in-memory zip from `(name, contents)` pairs
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Application archive shaped like the one the installer is used for
pub fn app_zip() -> Vec<u8> {
    let filler: Vec<u8> = (0..64 * 1024u32).map(|i| (i % 251) as u8).collect();
    zip_bytes(&[
        ("M_PLUS/M_PLUS.exe", b"MZ executable"),
        ("M_PLUS/data/config.json", b"{\"fullscreen\":true}"),
        ("M_PLUS/data/assets.bin", &filler),
    ])
}

/// Artifact server on an ephemeral port; stops when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<Result<(), Error>>>,
}

impl TestServer {
    pub async fn start(artifacts: Vec<Artifact>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(arcdl_serve::serve_on(listener, artifacts, async move {
            let _ = rx.await;
        }));
        Self {
            addr,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, name: &str) -> String {
        format!("http://{}/{name}", self.addr)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap().unwrap();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Write `bytes` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Launcher that records requests instead of touching the desktop
#[derive(Default)]
pub struct RecordingLauncher {
    pub calls: Mutex<Vec<ShortcutSpec>>,
}

#[async_trait]
impl Launcher for RecordingLauncher {
    async fn create_shortcut(&self, spec: &ShortcutSpec) -> Result<PathBuf, Error> {
        self.calls.lock().unwrap().push(spec.clone());
        let name = spec.name.clone().unwrap_or_else(|| "app".to_string());
        Ok(PathBuf::from(format!("/desktop/{name}.lnk")))
    }
}

/// Operations context writing downloads under `root`
pub fn ops_context(root: &Path, launcher: Arc<dyn Launcher>) -> (OpsCtx, EventReceiver) {
    let (tx, rx) = arcdl_events::channel();
    let mut config = Config::default();
    config.paths.download_dir = Some(root.join("downloads"));
    config.network.retry_attempts = 2;
    config.network.backoff_base_ms = 1;
    let ctx = OpsContextBuilder::new()
        .with_event_sender(tx)
        .with_config(config)
        .with_launcher(launcher)
        .build()
        .unwrap();
    (ctx, rx)
}

pub fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
