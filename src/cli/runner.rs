//! One-shot execution: explore a date, open events, optionally export.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::explorer::ExploreDate;
use crate::runtime::{CliRuntime, RuntimeEvent};

use super::bootstrap::CliContext;
use super::output::run_event_loop;

/// Explore `date`, open each `--open` event in turn and wait for its story.
///
/// With `--export` the log is written once every story has arrived.
pub async fn execute_once(ctx: &mut CliContext, date: ExploreDate) -> Result<()> {
    let output_handle = spawn_output(ctx);

    let result = explore(ctx, date).await;

    // Close the channel so the output loop drains and exits
    close_output(ctx);
    match output_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!("Output handler error: {}", e);
        }
        Err(e) => {
            tracing::warn!("Output handler panicked: {}", e);
        }
    }

    let blob = result?;
    if let Some(target) = &ctx.args.export {
        write_export(&blob, target.as_deref()).await?;
    }
    Ok(())
}

async fn explore(ctx: &mut CliContext, date: ExploreDate) -> Result<String> {
    ctx.controller
        .select_date(date)
        .await
        .with_context(|| format!("Failed to load events for {}", date.display_name()))?;

    for number in ctx.args.open.clone() {
        ctx.controller
            .open_event_number(number)
            .with_context(|| format!("Cannot open event {}", number))?;
        ctx.controller.wait_idle().await;
    }

    Ok(ctx.controller.export()?)
}

/// Start the output loop on the context's receiver, or a fresh channel if
/// the receiver was already taken.
pub(crate) fn spawn_output(ctx: &mut CliContext) -> JoinHandle<Result<()>> {
    let event_rx = match ctx.event_rx.take() {
        Some(rx) => rx,
        None => {
            let (event_tx, event_rx) = mpsc::unbounded_channel::<RuntimeEvent>();
            replace_sender(ctx, event_tx);
            event_rx
        }
    };

    let json_mode = ctx.args.json;
    let quiet_mode = ctx.args.quiet;
    tokio::spawn(async move { run_event_loop(event_rx, json_mode, quiet_mode).await })
}

/// Drop the runtime's live sender; late events go nowhere.
pub(crate) fn close_output(ctx: &CliContext) {
    let (event_tx, _) = mpsc::unbounded_channel::<RuntimeEvent>();
    replace_sender(ctx, event_tx);
}

fn replace_sender(ctx: &CliContext, event_tx: mpsc::UnboundedSender<RuntimeEvent>) {
    // We need to downcast to CliRuntime to access replace_event_tx
    if let Some(cli_runtime) = ctx.runtime.as_any().downcast_ref::<CliRuntime>() {
        cli_runtime.replace_event_tx(event_tx);
    } else {
        tracing::warn!("Runtime is not CliRuntime, events may not be received");
    }
}

/// Write the export blob to `path`, or stdout when `None`.
pub(crate) async fn write_export(blob: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            tokio::fs::write(path, blob)
                .await
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            eprintln!("Export written to {}", path.display());
        }
        None => print!("{}", blob),
    }
    Ok(())
}
