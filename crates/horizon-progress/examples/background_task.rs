//! A worker thread copies "files" while the UI thread pumps events.
//!
//! The dialog appears after the popup delay and follows the worker until it
//! finishes. Set `RUST_LOG=horizon_progress=debug` to watch the hand-over.
//!
//! Run with: cargo run -p horizon-progress --example background_task

use std::sync::Arc;
use std::time::Duration;

use horizon_progress::{
    DialogSnapshot, ProgressConfig, ProgressMonitor, UiContext,
    create_modal_determinate_progress_monitor_with_config,
};

const FILES: i32 = 20;
const STEP: Duration = Duration::from_millis(80);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let ui = UiContext::new();
    let config = ProgressConfig::default()
        .with_title("Copying files")
        .with_wait(Duration::from_millis(300));

    let quit_ui = ui.clone();
    let progress = create_modal_determinate_progress_monitor_with_config(
        &ui,
        0,
        FILES,
        0,
        Some(Arc::new(move || {
            tracing::info!("copy canceled");
            quit_ui.quit();
        })),
        &config,
    )?;

    let pump = ui.clone();
    progress.popup.dialog_created().connect(move |dialog| {
        dialog.changed().connect(|snapshot: &DialogSnapshot| {
            tracing::info!(
                status = snapshot.status.as_deref().unwrap_or(""),
                percent = snapshot.indicator.percent(),
                "dialog updated"
            );
        });
        let pump = pump.clone();
        dialog.disposed().connect(move |_| pump.quit());
    });

    let worker = progress.monitor.clone();
    let handle = std::thread::spawn(move || {
        worker.start(Some("Scanning source directory"));
        for file in 1..=FILES {
            std::thread::sleep(STEP);
            worker.set_current(file, Some(format!("file_{file:02}.dat").as_str()));
        }
    });

    let processed = ui.run_for(STEP * (FILES as u32 + 10))?;
    tracing::info!(processed, completed = progress.monitor.is_completed(), "event pump finished");

    if handle.join().is_err() {
        tracing::error!("worker thread panicked");
    }
    Ok(())
}
