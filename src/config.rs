use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-thread behaviour settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    /// Prefix of the display name given to scripts reported without a URL
    pub synthetic_url_prefix: String,
    /// Whether parsed scripts get their source maps attached
    pub attach_source_maps: bool,
    /// Buffer size of the notification broadcast channel
    pub notification_capacity: usize,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            synthetic_url_prefix: "VM".to_string(),
            attach_source_maps: true,
            notification_capacity: 256,
        }
    }
}

impl ThreadConfig {
    /// Default location: `~/.debug-thread/config.toml`.
    pub fn default_path() -> PathBuf {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home_dir.join(".debug-thread").join("config.toml")
    }

    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(Self::default_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: ThreadConfig = toml::from_str(&content)
                .with_context(|| format!("Invalid config in {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(ThreadConfig::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = path.unwrap_or_else(Self::default_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Display name for a script reported without a URL.
    pub fn synthetic_url(&self, script_id: &str) -> String {
        format!("{}{}", self.synthetic_url_prefix, script_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ThreadConfig::default();
        assert_eq!(config.synthetic_url("7"), "VM7");
        assert!(config.attach_source_maps);
        assert_eq!(config.notification_capacity, 256);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ThreadConfig::load(Some(dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, ThreadConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "attach_source_maps = false\n").unwrap();

        let config = ThreadConfig::load(Some(path)).unwrap();
        assert!(!config.attach_source_maps);
        assert_eq!(config.synthetic_url_prefix, "VM");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ThreadConfig {
            synthetic_url_prefix: "anonymous-".into(),
            ..Default::default()
        };

        config.save(Some(path.clone())).unwrap();
        assert_eq!(ThreadConfig::load(Some(path)).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "attach_source_maps = \"maybe\"").unwrap();

        let err = ThreadConfig::load(Some(path)).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
