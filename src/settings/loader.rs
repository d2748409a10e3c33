//! Settings loading, saving, and environment variable interpolation.
//!
//! The `SettingsManager` handles:
//! - Loading settings from `~/.almanac/settings.toml`
//! - Resolving `$VAR` and `${VAR}` environment variable references
//! - Atomic file writes with temp file + rename
//! - First-run template generation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::RwLock;

use super::schema::AlmanacSettings;

/// Embedded template for first-run generation.
const TEMPLATE: &str = include_str!("template.toml");

/// Get the path to the global settings file.
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".almanac")
        .join("settings.toml")
}

/// Manages settings loading, interpolation, and persistence.
pub struct SettingsManager {
    /// Cached settings (with env vars resolved)
    settings: RwLock<AlmanacSettings>,

    /// Path to the settings file
    path: PathBuf,
}

impl SettingsManager {
    /// Load from the global settings file, or defaults if it does not exist.
    pub async fn new() -> Result<Self> {
        Self::with_path(settings_path()).await
    }

    /// Load from an explicit settings file.
    pub async fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = Self::load_from_path(&path).await?;

        Ok(Self {
            settings: RwLock::new(settings),
            path,
        })
    }

    async fn load_from_path(path: &Path) -> Result<AlmanacSettings> {
        let mut settings = Self::load_raw(path).await?;
        Self::resolve_env_vars(&mut settings);
        Ok(settings)
    }

    /// Settings as written in the file, with `$VAR` references intact.
    async fn load_raw(path: &Path) -> Result<AlmanacSettings> {
        if !path.exists() {
            tracing::debug!("Settings file not found at {:?}, using defaults", path);
            return Ok(AlmanacSettings::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings file {:?}", path))?;

        let settings: AlmanacSettings =
            toml::from_str(&contents).context("Failed to deserialize settings")?;

        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Resolve $ENV_VAR references in string fields.
    ///
    /// A reference to an unset variable leaves an optional field empty.
    fn resolve_env_vars(settings: &mut AlmanacSettings) {
        fn resolve(value: &mut String) {
            if let Some(resolved) = resolve_env_ref(value) {
                *value = resolved;
            }
        }

        resolve(&mut settings.ai.model);
        resolve(&mut settings.ai.base_url);

        if let Some(key) = settings.ai.api_key.take() {
            settings.ai.api_key = if is_env_ref(&key) {
                resolve_env_ref(&key)
            } else {
                Some(key)
            };
        }
    }

    /// Get the current settings (read-only).
    pub async fn get(&self) -> AlmanacSettings {
        self.settings.read().await.clone()
    }

    /// Persist `new_settings` as given and cache them with env vars resolved.
    pub async fn update(&self, new_settings: AlmanacSettings) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(&new_settings).context("Failed to serialize settings")?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("toml.tmp");
        tokio::fs::write(&temp_path, &toml_string).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        let mut resolved = new_settings;
        Self::resolve_env_vars(&mut resolved);
        *self.settings.write().await = resolved;

        tracing::info!("Saved settings to {:?}", self.path);
        Ok(())
    }

    /// Get a specific setting by dot-notation key (e.g., "ai.model").
    pub async fn get_value(&self, key: &str) -> Result<serde_json::Value> {
        let settings = self.settings.read().await;
        let json = serde_json::to_value(&*settings)?;

        let mut current = &json;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow::anyhow!("Setting '{}' not found", key))?;
        }

        Ok(current.clone())
    }

    /// Set a specific setting by dot-notation key and persist.
    ///
    /// The edit applies to the file's own values, so `$VAR` references in
    /// other fields are written back unresolved.
    pub async fn set_value(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let raw = Self::load_raw(&self.path).await?;
        let mut json = serde_json::to_value(&raw)?;

        let parts: Vec<&str> = key.split('.').collect();
        set_nested_value(&mut json, &parts, value)?;

        let updated: AlmanacSettings = serde_json::from_value(json)
            .with_context(|| format!("Invalid value for setting '{}'", key))?;

        self.update(updated).await
    }

    /// Check if settings file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Get the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure settings file exists, creating from template if needed.
    ///
    /// Returns `true` if a new file was created.
    pub async fn ensure_settings_file(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, TEMPLATE).await?;
        tracing::info!("Generated settings template at {:?}", self.path);
        Ok(true)
    }

    /// Reload settings from disk.
    pub async fn reload(&self) -> Result<()> {
        let settings = Self::load_from_path(&self.path).await?;
        *self.settings.write().await = settings;
        Ok(())
    }
}

/// Set a value in a nested JSON object using a key path.
fn set_nested_value(
    json: &mut serde_json::Value,
    parts: &[&str],
    value: serde_json::Value,
) -> Result<()> {
    let Some((last, parents)) = parts.split_last() else {
        return Err(anyhow::anyhow!("Empty key path"));
    };

    let mut current = json;
    for part in parents {
        current = current
            .get_mut(*part)
            .ok_or_else(|| anyhow::anyhow!("Setting path '{}' not found", parts.join(".")))?;
    }

    let obj = current
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Cannot set value on non-object"))?;
    if !obj.contains_key(*last) {
        return Err(anyhow::anyhow!("Setting '{}' not found", parts.join(".")));
    }
    obj.insert((*last).to_string(), value);
    Ok(())
}

fn is_env_ref(value: &str) -> bool {
    value.trim().starts_with('$')
}

/// Resolve a $ENV_VAR or ${ENV_VAR} reference.
///
/// Returns `Some(resolved)` if the value starts with `$` and the env var exists.
fn resolve_env_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let name = trimmed.strip_prefix('$')?;
    let name = name
        .strip_prefix('{')
        .and_then(|n| n.strip_suffix('}'))
        .unwrap_or(name);

    std::env::var(name).ok()
}

/// Get a setting value with environment variable fallback.
///
/// Priority order:
/// 1. Settings value (if set and non-empty)
/// 2. Environment variable (first match from list)
/// 3. Default value
pub fn get_with_env_fallback(
    setting: &Option<String>,
    env_vars: &[&str],
    default: Option<String>,
) -> Option<String> {
    if let Some(v) = setting {
        if !v.is_empty() {
            return Some(v.clone());
        }
    }

    env_vars
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty())
        .or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_env_ref_formats() {
        std::env::set_var("ALMANAC_TEST_VAR_1", "test_value_1");

        assert_eq!(
            resolve_env_ref("$ALMANAC_TEST_VAR_1"),
            Some("test_value_1".to_string())
        );
        assert_eq!(
            resolve_env_ref("${ALMANAC_TEST_VAR_1}"),
            Some("test_value_1".to_string())
        );

        std::env::remove_var("ALMANAC_TEST_VAR_1");
    }

    #[test]
    fn test_resolve_env_ref_no_match() {
        assert_eq!(resolve_env_ref("regular_value"), None);
        assert_eq!(resolve_env_ref("$NONEXISTENT_VAR_XYZ_12345"), None);
    }

    #[test]
    fn test_get_with_env_fallback_from_setting() {
        let setting = Some("from_settings".to_string());
        let result = get_with_env_fallback(&setting, &["SOME_VAR"], None);
        assert_eq!(result, Some("from_settings".to_string()));
    }

    #[test]
    fn test_get_with_env_fallback_from_env() {
        std::env::set_var("ALMANAC_FALLBACK_TEST_VAR", "from_env");

        let result = get_with_env_fallback(&None, &["ALMANAC_FALLBACK_TEST_VAR"], None);
        assert_eq!(result, Some("from_env".to_string()));

        // Empty string in setting should fall through to env var
        let result =
            get_with_env_fallback(&Some(String::new()), &["ALMANAC_FALLBACK_TEST_VAR"], None);
        assert_eq!(result, Some("from_env".to_string()));

        std::env::remove_var("ALMANAC_FALLBACK_TEST_VAR");
    }

    #[test]
    fn test_get_with_env_fallback_default() {
        let result = get_with_env_fallback(
            &None,
            &["NONEXISTENT_VAR_ABC"],
            Some("default_value".to_string()),
        );
        assert_eq!(result, Some("default_value".to_string()));
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::with_path(dir.path().join("settings.toml"))
            .await
            .unwrap();

        assert!(!manager.exists());
        let settings = manager.get().await;
        assert_eq!(settings.version, 1);
        assert_eq!(settings.ai.model, "claude-sonnet-4-20250514");
    }

    #[tokio::test]
    async fn test_load_resolves_env_refs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::env::set_var("ALMANAC_TEST_KEY", "sk-from-env");
        std::fs::write(
            &path,
            "[ai]\napi_key = \"${ALMANAC_TEST_KEY}\"\nmodel = \"claude-3-5-haiku-20241022\"\n",
        )
        .unwrap();

        let manager = SettingsManager::with_path(&path).await.unwrap();
        let settings = manager.get().await;
        assert_eq!(settings.ai.api_key.as_deref(), Some("sk-from-env"));
        assert_eq!(settings.ai.model, "claude-3-5-haiku-20241022");

        std::env::remove_var("ALMANAC_TEST_KEY");
    }

    #[tokio::test]
    async fn test_unset_env_ref_leaves_key_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[ai]\napi_key = \"$ALMANAC_UNSET_KEY_98765\"\n").unwrap();

        let manager = SettingsManager::with_path(&path).await.unwrap();
        assert!(manager.get().await.ai.api_key.is_none());
    }

    #[tokio::test]
    async fn test_ensure_settings_file_writes_template_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let manager = SettingsManager::with_path(&path).await.unwrap();

        assert!(manager.ensure_settings_file().await.unwrap());
        assert!(!manager.ensure_settings_file().await.unwrap());
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[ai]"));
    }

    #[tokio::test]
    async fn test_get_and_set_value_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        let manager = SettingsManager::with_path(&path).await.unwrap();

        let value = manager.get_value("ai.max_tokens").await.unwrap();
        assert_eq!(value, serde_json::json!(2000));

        manager
            .set_value("ui.hide_banner", serde_json::json!(true))
            .await
            .unwrap();
        assert!(!path.with_extension("toml.tmp").exists());

        manager.reload().await.unwrap();
        assert!(manager.get().await.ui.hide_banner);
    }

    #[tokio::test]
    async fn test_set_value_keeps_env_refs_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::env::set_var("ALMANAC_SAVED_KEY", "sk-never-written");
        std::fs::write(&path, "[ai]\napi_key = \"$ALMANAC_SAVED_KEY\"\n").unwrap();

        let manager = SettingsManager::with_path(&path).await.unwrap();
        manager
            .set_value("ui.show_instructions", serde_json::json!(false))
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("$ALMANAC_SAVED_KEY"));
        assert!(!written.contains("sk-never-written"));

        let settings = manager.get().await;
        assert!(!settings.ui.show_instructions);
        assert_eq!(settings.ai.api_key.as_deref(), Some("sk-never-written"));

        std::env::remove_var("ALMANAC_SAVED_KEY");
    }

    #[tokio::test]
    async fn test_set_value_rejects_unknown_key() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::with_path(dir.path().join("settings.toml"))
            .await
            .unwrap();

        assert!(manager.set_value("ai.nope", serde_json::json!(1)).await.is_err());
        assert!(manager.get_value("ui.missing").await.is_err());
        assert!(manager.set_value("", serde_json::json!(1)).await.is_err());
    }
}
