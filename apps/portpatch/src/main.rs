//! portpatch - resolve patches from remote sources and apply them
//!
//! This is the CLI application. It merges configuration, wires the
//! operations context and renders the resulting report.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs, RemoteArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use portpatch_config::Config;
use portpatch_events::EventReceiver;
use portpatch_ops::{OperationResult, OpsCtx};
use portpatch_types::ColorChoice;
use std::path::Path;
use std::process;
use tokio::select;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    // Precedence: defaults, then file, then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);
    config.validate()?;

    init_tracing(cli.global.json, cli.global.debug, &config.general.log_dir);
    info!("Starting portpatch v{}", env!("CARGO_PKG_VERSION"));

    let (event_sender, event_receiver) = portpatch_events::channel();
    let color = config.general.color;
    let ctx = OpsCtx::from_config(config, event_sender)?;

    let renderer = OutputRenderer::new(cli.global.json, color);
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let event_handler = EventHandler::new(colors_enabled, cli.global.debug, cli.global.json);

    let result =
        execute_command_with_events(cli.command, &ctx, event_receiver, &event_handler).await?;

    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Drive the command while draining events on the same thread
async fn execute_command_with_events(
    command: Commands,
    ctx: &OpsCtx,
    mut event_receiver: EventReceiver,
    event_handler: &EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx));

    loop {
        select! {
            result = &mut command_future => {
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
async fn execute_command(command: Commands, ctx: &OpsCtx) -> Result<OperationResult, CliError> {
    match command {
        Commands::Run { tree, .. } => {
            let report = portpatch_ops::run(ctx, &tree).await?;
            Ok(OperationResult::Run(report))
        }
        Commands::Resolve { .. } => {
            let report = portpatch_ops::resolve_only(ctx).await?;
            Ok(OperationResult::Resolve(report))
        }
        Commands::Apply { tree, .. } => {
            let report = portpatch_ops::apply_local(ctx, &tree).await?;
            Ok(OperationResult::Apply(report))
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs, command: &Commands) {
    if let Some(color) = global.color {
        config.general.color = color;
    }

    let (remote, local_patches) = match command {
        Commands::Run {
            remote,
            local_patches,
            ..
        } => (Some(remote), local_patches.as_ref()),
        Commands::Resolve { remote } => (Some(remote), None),
        Commands::Apply { local_patches, .. } => (None, local_patches.as_ref()),
    };

    if let Some(RemoteArgs {
        reference,
        sources,
        patch_dir,
        keep_patch_dir,
    }) = remote
    {
        if let Some(reference) = reference {
            config.sources.reference.clone_from(reference);
        }
        if !sources.is_empty() {
            config.sources.names.clone_from(sources);
        }
        if let Some(dir) = patch_dir {
            config.patch.patch_dir.clone_from(dir);
        }
        if *keep_patch_dir {
            config.patch.clean_patch_dir = false;
        }
    }

    if let Some(dir) = local_patches {
        config.patch.local_dir.clone_from(dir);
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled: bool, log_dir: &Path) {
    let filter = |default: &str| {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            if !json_mode {
                eprintln!("Warning: Failed to create log directory: {e}");
            }
        }

        let log_file = log_dir.join(format!(
            "portpatch-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(filter("info,portpatch=debug,portpatch_resolver=debug"))
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
            }
        }
    }

    if json_mode {
        // Keep stdout and stderr clean for the JSON document
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Event records are shown as progress lines already
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter(&format!("warn,{}=off", logging::EVENT_TARGET)))
            .init();
    }
}
