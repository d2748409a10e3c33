//! CLI bootstrap - settings, logging, generative client and controller.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::explorer::{
    AnthropicClientConfig, AnthropicGenerativeClient, GenerativeClient, NavigationController,
};
use crate::runtime::{CliRuntime, ExplorerRuntime, RuntimeEvent};
use crate::settings::{get_with_env_fallback, AlmanacSettings, SettingsManager};

use super::args::Args;

/// Everything a CLI run needs, owned by the binary.
pub struct CliContext {
    /// Runtime abstraction for event emission
    pub runtime: Arc<dyn ExplorerRuntime>,

    /// Event receiver for output handling, taken by the first output loop
    pub event_rx: Option<mpsc::UnboundedReceiver<RuntimeEvent>>,

    /// Owner of the exploration session
    pub controller: NavigationController,

    /// Settings manager
    pub settings_manager: Arc<SettingsManager>,

    /// Settings snapshot taken at startup
    pub settings: AlmanacSettings,

    /// Command-line arguments
    pub args: Args,
}

impl CliContext {
    /// Wait for outstanding generations, then shut the runtime down.
    pub async fn shutdown(mut self) -> Result<()> {
        self.controller.wait_idle().await;

        if let Err(e) = self.runtime.shutdown().await {
            tracing::warn!("Runtime shutdown error: {}", e);
        }

        Ok(())
    }
}

/// Initialize the CLI context.
pub async fn initialize(args: &Args) -> Result<CliContext> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        // Only warn on errors other than file not found
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Failed to load .env file: {}", e);
        }
    }

    let settings_manager = Arc::new(
        SettingsManager::new()
            .await
            .context("Failed to initialize settings manager")?,
    );
    let settings = settings_manager.get().await;

    init_logging(args, &settings)?;

    // Ensure settings file exists (creates template on first run)
    match settings_manager.ensure_settings_file().await {
        Ok(true) if !args.quiet => {
            eprintln!(
                "Created settings template at {}",
                settings_manager.path().display()
            );
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Failed to create settings template: {}", e),
    }

    let api_key = resolve_api_key(&settings, args)?;
    let model = resolve_model(&settings, args);

    if args.verbose {
        eprintln!(
            "[cli] Settings loaded from {}",
            settings_manager.path().display()
        );
        eprintln!("[cli] Model: {}", model);
        eprintln!("[cli] Endpoint: {}", settings.ai.base_url);
    }

    let client: Arc<dyn GenerativeClient> =
        Arc::new(AnthropicGenerativeClient::new(AnthropicClientConfig {
            api_key: Some(&api_key),
            model: &model,
            max_tokens: settings.ai.max_tokens,
            base_url: &settings.ai.base_url,
            anthropic_version: &settings.ai.anthropic_version,
            timeout_secs: settings.ai.timeout_secs,
        })?);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<RuntimeEvent>();
    let runtime: Arc<dyn ExplorerRuntime> = Arc::new(CliRuntime::new(event_tx));
    let controller = NavigationController::new(client, runtime.clone());

    Ok(CliContext {
        runtime,
        event_rx: Some(event_rx),
        controller,
        settings_manager,
        settings,
        args: args.clone(),
    })
}

/// Install the stderr tracing subscriber. `RUST_LOG` wins when set.
fn init_logging(args: &Args, settings: &AlmanacSettings) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_directive(args, settings))
            .context("Invalid advanced.log_level in settings")?,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

fn log_directive(args: &Args, settings: &AlmanacSettings) -> String {
    let level = if args.verbose {
        "debug"
    } else {
        settings.advanced.log_level.as_str()
    };
    format!("almanac={}", level)
}

/// Resolve API key from CLI args, settings, or environment variables.
fn resolve_api_key(settings: &AlmanacSettings, args: &Args) -> Result<String> {
    // 1. CLI argument takes precedence
    if let Some(key) = args.api_key.as_ref().filter(|k| !k.is_empty()) {
        return Ok(key.clone());
    }

    // 2. Settings, then environment
    get_with_env_fallback(&settings.ai.api_key, &["ANTHROPIC_API_KEY"], None).ok_or_else(|| {
        anyhow::anyhow!(
            "No Anthropic API key found. Set ai.api_key in ~/.almanac/settings.toml, \
             export ANTHROPIC_API_KEY, or use --api-key"
        )
    })
}

/// Resolve model: CLI arg > settings > built-in default.
fn resolve_model(settings: &AlmanacSettings, args: &Args) -> String {
    args.model
        .iter()
        .chain(std::iter::once(&settings.ai.model))
        .find(|m| !m.is_empty())
        .cloned()
        .unwrap_or_else(|| anthropic_messages::models::CLAUDE_SONNET_4.to_string())
}
