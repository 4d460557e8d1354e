//! Integration tests for events

#[cfg(test)]
mod tests {
    use arcdl_events::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_event_sender_emitter() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(
            event1,
            AppEvent::General(GeneralEvent::Error { .. })
        ));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
        EventProgress::new("http://x", tx).on_progress(1, None);
    }

    #[tokio::test]
    async fn test_event_progress_forwards_download_events() {
        let (tx, mut rx) = channel();
        let sink = EventProgress::new("http://example.com/a.zip", tx);
        sink.on_progress(512, Some(1024));

        match rx.recv().await.unwrap() {
            AppEvent::Download(DownloadEvent::Progress {
                url,
                bytes_downloaded,
                total_bytes,
            }) => {
                assert_eq!(url, "http://example.com/a.zip");
                assert_eq!(bytes_downloaded, 512);
                assert_eq!(total_bytes, Some(1024));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_log_levels() {
        let retry = AppEvent::Download(DownloadEvent::Retrying {
            url: "u".into(),
            attempt: 1,
            max_attempts: 4,
            reason: "503".into(),
            backoff_delay: Duration::from_millis(500),
        });
        assert_eq!(retry.log_level(), tracing::Level::WARN);
        assert_eq!(retry.log_target(), "arcdl::events::download");

        let progress = AppEvent::Download(DownloadEvent::Progress {
            url: "u".into(),
            bytes_downloaded: 0,
            total_bytes: None,
        });
        assert_eq!(progress.log_level(), tracing::Level::TRACE);

        let done = AppEvent::Extract(ExtractEvent::Completed {
            destination: "/out".into(),
            files: 2,
            directories: 2,
        });
        assert_eq!(done.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = AppEvent::Launcher(LauncherEvent::ShortcutCreated {
            target: "/out/bin/app".into(),
            shortcut: "/home/u/Desktop/app.desktop".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "launcher");
        assert_eq!(json["event"]["type"], "ShortcutCreated");
    }

    #[test]
    fn test_failure_context_from_error() {
        let err = arcdl_errors::NetworkError::HttpError {
            status: 503,
            message: "Service Unavailable".into(),
        };
        let ctx = FailureContext::from_error(&err);
        assert_eq!(ctx.code.as_deref(), Some("network.http_status"));
        assert!(ctx.retryable);
    }
}
