use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use skipwise_detect::{KeywordDatabase, KindDef};

use crate::error::SkipError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub cache: CacheConfig,
    pub providers: ProvidersConfig,
    pub catalog: CatalogConfig,
    pub chapters: ChaptersConfig,
    /// Free-form table read through `PreferenceStore`.
    #[serde(default)]
    pub preferences: toml::Table,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub deadline_ms: u64,
    pub max_concurrent: usize,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_days: i64,
    pub hit_confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub introhater: ProviderConfig,
    pub introskipper: ProviderConfig,
}

/// A community segment service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub trakt_base_url: String,
    pub trakt_api_key: String,
    pub tmdb_api_key: String,
    pub tvdb_api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaptersConfig {
    pub buffer_capacity: usize,
    /// Keyword sets merged over the embedded marker keywords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<KindDef>,
}

impl ProviderConfig {
    /// Enabled with somewhere to send requests.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.base_url.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl CatalogConfig {
    pub fn has_api_key(&self) -> bool {
        [&self.trakt_api_key, &self.tmdb_api_key, &self.tvdb_api_key]
            .iter()
            .any(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, SkipError> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path, merged over built-in defaults.
    pub fn load_from(path: &Path) -> Result<Self, SkipError> {
        let mut merged: toml::Table =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| SkipError::Config(e.to_string()))?;

        if path.exists() {
            let user_str = std::fs::read_to_string(path)?;
            let user: toml::Table =
                toml::from_str(&user_str).map_err(|e| SkipError::Config(e.to_string()))?;
            merge_tables(&mut merged, user);
            tracing::debug!(path = %path.display(), "loaded user config");
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| SkipError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), SkipError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SkipError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SkipError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the skip cache database.
    pub fn cache_db_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.cache_dir().join("skip_cache.db"))
            .unwrap_or_else(|| PathBuf::from("skip_cache.db"))
    }

    /// Ensure the cache directory exists and return the DB path.
    pub fn ensure_cache_db_path() -> Result<PathBuf, SkipError> {
        let path = Self::cache_db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Embedded marker keywords with any `[[chapters.keywords]]` applied.
    pub fn keyword_database(&self) -> KeywordDatabase {
        let mut db = KeywordDatabase::embedded();
        if !self.chapters.keywords.is_empty() {
            db.merge_user(&KeywordDatabase::from_kinds(self.chapters.keywords.clone()));
        }
        db
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "skipwise")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

/// Recursively overlay `user` onto `base`. Nested tables merge; other values replace.
fn merge_tables(base: &mut toml::Table, user: toml::Table) {
    for (key, value) in user {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.detection.deadline_ms, 10_000);
        assert_eq!(config.detection.max_concurrent, 4);
        assert_eq!(config.detection.poll_interval_ms, 100);
        assert_eq!(config.cache.ttl_days, 30);
        assert!((config.cache.hit_confidence - 0.95).abs() < f32::EPSILON);
        assert!(config.providers.introhater.is_usable());
        assert_eq!(config.providers.introskipper.timeout(), Duration::from_secs(8));
        assert!(!config.catalog.has_api_key());
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.cache.ttl_days, config.cache.ttl_days);
        assert_eq!(
            deserialized.providers.introhater.base_url,
            config.providers.introhater.base_url
        );
    }

    #[test]
    fn test_partial_user_file_merges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [detection]
            deadline_ms = 2500

            [providers.introskipper]
            enabled = false

            [catalog]
            trakt_api_key = "abc"

            [preferences]
            intro_end = 90
            "#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.detection.deadline_ms, 2500);
        assert_eq!(config.detection.max_concurrent, 4);
        assert!(!config.providers.introskipper.is_usable());
        assert!(config.providers.introhater.is_usable());
        assert!(config.catalog.has_api_key());
        assert_eq!(
            config.preferences.get("intro_end").and_then(|v| v.as_integer()),
            Some(90)
        );
        assert!(config.preferences.contains_key("auto_skip_intro"));
    }

    #[test]
    fn test_user_keywords_merge_over_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[[chapters.keywords]]\nname = \"intro\"\nkeywords = [\"Theme Song\"]\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.chapters.buffer_capacity, 32);
        let db = config.keyword_database();
        assert_eq!(db.classify("Main Theme Song"), Some(skipwise_detect::MarkerKind::Intro));
        assert_eq!(db.classify("Opening"), None);
        assert_eq!(db.classify("Previously"), Some(skipwise_detect::MarkerKind::Recap));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.chapters.buffer_capacity, 32);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.providers.introhater.base_url = String::new();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert!(!loaded.providers.introhater.is_usable());
    }

    #[test]
    fn test_invalid_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[detection\n").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(SkipError::Config(_))));
    }
}
