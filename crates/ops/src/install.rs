//! Install: fetch, extract, locate the executable, link it on the desktop
//!
//! Only the download and the extraction can fail the install. A missing
//! executable or a shortcut that cannot be created is reported as a warning
//! and recorded in the [`InstallReport`].

use crate::small_ops::{default_destination, finish};
use crate::{InstallReport, InstallRequest, OpsCtx, ShortcutOutcome};
use arcdl_errors::{Error, UserFacingError};
use arcdl_events::{AppEvent, EventEmitter, EventProgress, FailureContext, LauncherEvent};
use arcdl_extract::{find_first, ExtractRequest};
use arcdl_launcher::ShortcutSpec;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Install an application archive
///
/// # Errors
///
/// Returns an error if the download, verification or extraction fails, or if
/// the operation is cancelled.
pub async fn install(ctx: &OpsCtx, request: &InstallRequest) -> Result<InstallReport, Error> {
    ctx.emit_operation_started("install");
    let result = run(ctx, request).await;
    finish(ctx, "install", result)
}

async fn run(ctx: &OpsCtx, request: &InstallRequest) -> Result<InstallReport, Error> {
    let start = Instant::now();

    let archive = match &request.download_to {
        Some(path) => path.clone(),
        None => default_destination(ctx, &request.url)?,
    };
    let fetcher = ctx
        .fetcher
        .clone()
        .with_progress(Arc::new(EventProgress::new(&request.url, ctx.tx.clone())));
    let download = fetcher
        .fetch(&request.url, &archive, request.expected_hash.as_ref(), true)
        .await?;

    if ctx.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let overwrite = request.overwrite.unwrap_or(ctx.config.extract.overwrite);
    let extract = ctx
        .extractor
        .extract(ExtractRequest::new(&download.path, &request.install_dir).with_overwrite(overwrite))
        .await?;

    let executable = match &request.executable {
        Some(pattern) => locate(ctx, &extract.destination, pattern),
        None => None,
    };

    let shortcut = shortcut(ctx, request, executable.as_deref()).await;

    Ok(InstallReport {
        download,
        extract,
        executable,
        shortcut,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

fn locate(ctx: &OpsCtx, root: &Path, pattern: &str) -> Option<std::path::PathBuf> {
    match find_first(root, pattern) {
        Ok(Some(path)) => {
            debug!(path = %path.display(), pattern, "executable located");
            Some(path)
        }
        Ok(None) => {
            ctx.emit(AppEvent::Launcher(LauncherEvent::ExecutableNotFound {
                root: root.to_path_buf(),
                pattern: pattern.to_string(),
            }));
            None
        }
        Err(e) => {
            ctx.emit_warning_with_context(
                format!("invalid executable pattern {pattern:?}"),
                e.user_message(),
            );
            None
        }
    }
}

async fn shortcut(ctx: &OpsCtx, request: &InstallRequest, executable: Option<&Path>) -> ShortcutOutcome {
    if !request.shortcut {
        return ShortcutOutcome::Skipped {
            reason: "disabled by request".to_string(),
        };
    }
    if !ctx.config.launcher.enabled {
        return ShortcutOutcome::Skipped {
            reason: "disabled in configuration".to_string(),
        };
    }
    let Some(target) = executable else {
        return ShortcutOutcome::Skipped {
            reason: "no executable located".to_string(),
        };
    };

    let spec = ShortcutSpec {
        target: target.to_path_buf(),
        name: request.shortcut_name.clone(),
        args: request.shortcut_args.clone(),
        working_dir: None,
        icon: None,
        desktop_dir: ctx.config.launcher.desktop_dir.clone(),
    };

    match ctx.launcher.create_shortcut(&spec).await {
        Ok(path) => {
            ctx.emit(AppEvent::Launcher(LauncherEvent::ShortcutCreated {
                target: target.to_path_buf(),
                shortcut: path.clone(),
            }));
            ShortcutOutcome::Created { path }
        }
        Err(e) => {
            warn!(target = %target.display(), error = %e, "shortcut creation failed");
            ctx.emit(AppEvent::Launcher(LauncherEvent::Failed {
                target: target.to_path_buf(),
                failure: FailureContext::from_error(&e),
            }));
            ShortcutOutcome::Failed {
                message: e.user_message().into_owned(),
            }
        }
    }
}
