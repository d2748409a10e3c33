//! TOML-based settings for almanac.
//!
//! Settings are loaded from `~/.almanac/settings.toml` with environment
//! variable interpolation support. Values that are absent from the file fall
//! back to environment variables through [`get_with_env_fallback`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use almanac_lib::settings::{SettingsManager, get_with_env_fallback};
//!
//! let manager = SettingsManager::new().await?;
//! let settings = manager.get().await;
//!
//! let api_key = get_with_env_fallback(
//!     &settings.ai.api_key,
//!     &["ANTHROPIC_API_KEY"],
//!     None,
//! );
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_with_env_fallback, settings_path, SettingsManager};
pub use schema::{AdvancedSettings, AiSettings, AlmanacSettings, UiSettings};
