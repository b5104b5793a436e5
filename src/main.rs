//! Render Burst - render every camera of a scene, one still per camera
//!
//! Main entry point for the command line application.
//!
//! # Execution Flow
//!
//! 1. Parse arguments, load `RenderBurst Data/RenderBurst Config.yaml` and
//!    environment overrides, apply command line overrides
//! 2. Initialize logging → logs/renderburst.<date>
//! 3. Create the tokio runtime (render subprocesses, poll timer)
//! 4. Load the scene description and build a [`CommandHost`] over it
//! 5. Start the [`RenderController`] and drive it until the burst stops
//! 6. Optionally write the updated scene back (`--save-scene`)
//! 7. Log the metrics summary and shut the runtime down
//!
//! Ctrl-C is forwarded as a render cancellation: the camera currently
//! rendering finishes, then the burst stops. A render command exiting
//! non-zero also stops the burst, and makes the process exit with an error.

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use clap::Parser;
use renderburst::cli::CliArgs;
use renderburst::logging::{LOG_PREFIX, setup_logging_with_console};
use renderburst::{
    APP_NAME, CommandHost, ConfigManager, ControllerOptions, Metrics, RenderController,
    StartOutcome, StateChange, StateManager, StopReason, VERSION,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let config_manager = ConfigManager::new(&args.config_dir)?;
    let mut user_config = config_manager.load_user_config()?;
    args.apply_overrides(&mut user_config.burst);
    let settings = user_config.burst;

    let _log_guard = setup_logging_with_console(
        Utf8Path::new(&settings.log_dir),
        LOG_PREFIX,
        settings.debug_mode,
        !args.no_console,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("renderburst-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let scene = config_manager.load_scene(&args.scene)?;

    if settings.render_command.trim().is_empty() {
        bail!(
            "No render command configured. Set burst.render_command in {} or pass --command",
            config_manager.user_config_path()
        );
    }

    let host = CommandHost::new(scene, settings.render_command.clone(), runtime.handle().clone());
    let cancel_signal = host.cancel_signal();

    let state_manager = StateManager::new();
    let metrics = Arc::new(Metrics::new());
    let mut controller = RenderController::with_observers(
        host,
        ControllerOptions::from(&settings),
        state_manager.clone(),
        Arc::clone(&metrics),
    );

    let changes = state_manager.subscribe();
    let progress_task = runtime.spawn(log_progress(state_manager.clone(), changes));

    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted - finishing current camera, then stopping");
            cancel_signal.cancel();
        }
    });

    let outcome = runtime.block_on(async {
        match controller.start()? {
            StartOutcome::NoEligibleJobs => Ok(StopReason::NoEligibleJobs),
            StartOutcome::Started { .. } => controller.run().await,
        }
    });

    let summary = state_manager.read(|s| s.progress_summary());
    let left = controller.queue().len();
    let failed_renders = controller.host().failed_renders();
    let saved = if args.save_scene {
        config_manager.save_scene(&args.scene, controller.host().scene())
    } else {
        Ok(())
    };
    drop(controller);

    metrics.log_summary();
    progress_task.abort();
    runtime.shutdown_timeout(Duration::from_secs(5));

    let reason = outcome.context("Burst failed")?;
    tracing::info!("{}", summary);
    saved?;

    if failed_renders > 0 {
        bail!(
            "Render command failed, burst stopped with {} cameras not rendered",
            left
        );
    }

    if reason == StopReason::Cancelled && left > 0 {
        tracing::warn!("{} cameras were not rendered", left);
    }

    tracing::info!("Application shutdown complete");
    Ok(())
}

/// Log burst progress as the controller reports it.
async fn log_progress(state_manager: StateManager, mut changes: Receiver<StateChange>) {
    loop {
        match changes.recv().await {
            Ok(StateChange::BurstStarted { total_jobs }) => {
                tracing::info!("Rendering {} cameras", total_jobs);
            }
            Ok(StateChange::JobDispatched { .. }) => {
                tracing::info!("{}", state_manager.read(|s| s.progress_summary()));
            }
            Ok(StateChange::JobCompleted {
                camera,
                completed,
                total,
            }) => {
                tracing::info!("Camera {} done ({}/{})", camera, completed, total);
            }
            Ok(StateChange::CancelRequested) => {
                tracing::warn!("Cancellation requested");
            }
            Ok(StateChange::Notice { message }) => {
                tracing::info!("{}", message);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Progress log skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
