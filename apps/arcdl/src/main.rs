//! arcdl - resumable downloads, safe zip extraction and desktop shortcuts
//!
//! This is the CLI application; every command is carried out by the ops
//! crate, with progress arriving over the event channel.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use arcdl_config::{ColorChoice, Config};
use arcdl_errors::ConfigError;
use arcdl_events::{EventReceiver, EventSender};
use arcdl_ops::{FetchRequest, InstallRequest, OperationResult, OpsContextBuilder, OpsCtx};
use arcdl_serve::Artifact;
use clap::Parser;
use std::net::SocketAddr;
use std::process;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    let config = load_config(&cli.global).await;
    let log_dir = config
        .as_ref()
        .map_or_else(|_| Config::default().log_dir(), Config::log_dir);
    logging::init_tracing(json_mode, cli.global.debug, &log_dir);

    let outcome = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("Application error: {}", e);
            if json_mode {
                let document = serde_json::json!({
                    "type": "Error",
                    "data": { "code": e.code(), "message": e.to_string() },
                });
                println!("{document:#}");
            } else {
                eprintln!("Error: {e}");
            }
            process::exit(1);
        }
    }
}

/// Load configuration with precedence defaults < file < environment < flags
async fn load_config(global: &GlobalArgs) -> Result<Config, CliError> {
    let mut config = Config::load_or_default(global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, global);
    Ok(config)
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
}

/// Main application logic; `Ok(false)` means the command ran but found nothing
async fn run(cli: Cli, config: Config) -> Result<bool, CliError> {
    info!(
        command = cli.command.name(),
        "Starting arcdl v{}",
        env!("CARGO_PKG_VERSION")
    );

    let (event_sender, event_receiver) = arcdl_events::channel();

    let cancel = CancellationToken::new();
    watch_ctrl_c(cancel.clone());

    let color = config.general.color;
    let ops_ctx = build_ops_context(event_sender, config, cancel)?;

    let renderer = OutputRenderer::new(cli.global.json, color);
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, cli.global.json);

    let result = execute_command_with_events(
        cli.command,
        ops_ctx,
        cli.global.json,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_result(&result)?;

    info!("Command completed");
    Ok(result.is_success())
}

/// Cancel `token` on the first Ctrl-C
fn watch_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping");
            token.cancel();
        }
    });
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ops_ctx: OpsCtx,
    json_mode: bool,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ops_ctx, json_mode));

    // Handle events concurrently with command execution
    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    ctx: OpsCtx,
    json_mode: bool,
) -> Result<OperationResult, CliError> {
    match command {
        Commands::Fetch {
            url,
            output,
            sha256,
            no_resume,
        } => {
            let request = FetchRequest {
                url,
                dest: output,
                expected_hash: sha256,
                resume: !no_resume,
            };
            let result = arcdl_ops::fetch(&ctx, &request).await?;
            Ok(OperationResult::Fetch(result))
        }

        Commands::Extract {
            archive,
            dest,
            overwrite,
        } => {
            let overwrite = overwrite || ctx.config.extract.overwrite;
            let report = arcdl_ops::extract(&ctx, &archive, &dest, overwrite).await?;
            Ok(OperationResult::Extract(report))
        }

        Commands::Install {
            url,
            install_dir,
            download_to,
            sha256,
            overwrite,
            executable,
            shortcut_name,
            shortcut_args,
            no_shortcut,
        } => {
            let request = InstallRequest {
                url,
                install_dir,
                download_to,
                expected_hash: sha256,
                overwrite: overwrite.then_some(true),
                executable,
                shortcut: !no_shortcut,
                shortcut_name,
                shortcut_args,
            };
            let report = arcdl_ops::install(&ctx, &request).await?;
            Ok(OperationResult::Install(report))
        }

        Commands::Find { root, pattern } => {
            let report = arcdl_ops::find(&root, &pattern)?;
            Ok(OperationResult::Find(report))
        }

        Commands::Hash { file, algorithm } => {
            let report = arcdl_ops::hash(&file, algorithm).await?;
            Ok(OperationResult::Hash(report))
        }

        Commands::Serve { files, bind } => {
            let artifacts = files
                .iter()
                .map(|spec| Artifact::parse(spec))
                .collect::<Result<Vec<_>, _>>()?;
            let bind = bind.unwrap_or_else(|| ctx.config.serve.bind.clone());
            let addr: SocketAddr = bind.parse().map_err(|_| ConfigError::InvalidValue {
                field: "bind".to_string(),
                value: bind.clone(),
            })?;

            if !json_mode {
                eprintln!(
                    "Serving {} artifact(s) on http://{addr} (Ctrl-C to stop)",
                    artifacts.len()
                );
            }
            let token = ctx.cancel.clone();
            arcdl_serve::serve(addr, artifacts, async move { token.cancelled().await }).await?;
            Ok(OperationResult::Success("Server stopped".to_string()))
        }
    }
}

/// Build operations context with all required components
fn build_ops_context(
    event_sender: EventSender,
    config: Config,
    cancel: CancellationToken,
) -> Result<OpsCtx, CliError> {
    let ctx = OpsContextBuilder::new()
        .with_event_sender(event_sender)
        .with_config(config)
        .with_cancellation(cancel)
        .build()?;

    Ok(ctx)
}
