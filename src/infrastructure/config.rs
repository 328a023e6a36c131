use std::{path::PathBuf, time::Duration};

use config::{ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{cursor::CursorMode, upload::UploadPolicy},
    model::feed::FeedSettings,
    utils,
};

const CONFIG: &str = include_str!("../../.config/config.json5");

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub _data_dir: PathBuf,
    #[serde(default)]
    pub _config_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    /// Optional domain filter for the jobs listing
    pub domain: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 10_000,
            domain: None,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PagingConfig {
    pub page_size: usize,
    pub window_max_items: usize,
    pub cache_capacity_pages: usize,
    pub poll_interval_ms: u64,
    pub scroll_load_threshold_px: u64,
    pub estimated_row_height_px: u32,
    pub overscan_rows: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            window_max_items: 500,
            cache_capacity_pages: 20,
            poll_interval_ms: 1500,
            scroll_load_threshold_px: 300,
            estimated_row_height_px: 280,
            overscan_rows: 2,
        }
    }
}

impl PagingConfig {
    pub fn feed_settings(&self, cursor_mode: CursorMode) -> FeedSettings {
        FeedSettings {
            page_size: self.page_size,
            window_max_items: self.window_max_items,
            cache_capacity_pages: self.cache_capacity_pages,
            cursor_mode,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutConfig {
    pub columns: usize,
    /// Column count while the detail panel is open
    pub columns_with_panel: usize,
    pub viewport_height_px: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            columns_with_panel: 2,
            viewport_height_px: 800,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub upload: UploadPolicy,
}

impl Config {
    /// Embedded defaults, then `config.*` in the config directory, then
    /// `JOBSCROLL__SECTION__KEY` environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = utils::get_config_dir();
        let mut builder = Self::defaults_builder()?;

        let config_files = [
            ("config.json5", FileFormat::Json5),
            ("config.json", FileFormat::Json),
            ("config.yaml", FileFormat::Yaml),
            ("config.toml", FileFormat::Toml),
            ("config.ini", FileFormat::Ini),
        ];
        let mut found_config = false;
        for (file, format) in &config_files {
            builder = builder.add_source(
                File::from(config_dir.join(file))
                    .format(*format)
                    .required(false),
            );
            if config_dir.join(file).exists() {
                found_config = true
            }
        }
        if !found_config {
            log::info!(
                "No configuration file in {}, using defaults",
                config_dir.display()
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(utils::paths::PROJECT_NAME.as_str())
                .separator("__")
                .try_parsing(true),
        );

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Embedded defaults overlaid with a JSON5 document
    pub fn from_json5(overrides: &str) -> Result<Self, ConfigError> {
        let cfg: Self = Self::defaults_builder()?
            .add_source(File::from_str(overrides, FileFormat::Json5))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn defaults_builder(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let data_dir = utils::get_data_dir();
        let config_dir = utils::get_config_dir();
        Ok(config::Config::builder()
            .set_default("_data_dir", data_dir.display().to_string())?
            .set_default("_config_dir", config_dir.display().to_string())?
            .add_source(File::from_str(CONFIG, FileFormat::Json5)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let paging = &self.paging;
        let counts = [
            ("paging.page_size", paging.page_size),
            ("paging.window_max_items", paging.window_max_items),
            ("paging.cache_capacity_pages", paging.cache_capacity_pages),
            ("layout.columns", self.layout.columns),
            ("layout.columns_with_panel", self.layout.columns_with_panel),
        ];
        for (key, value) in counts {
            if value == 0 {
                return Err(ConfigError::Message(format!("{key} must be at least 1")));
            }
        }
        if paging.window_max_items < paging.page_size {
            return Err(ConfigError::Message(format!(
                "paging.window_max_items ({}) must not be smaller than paging.page_size ({})",
                paging.window_max_items, paging.page_size
            )));
        }
        if self.layout.columns_with_panel > self.layout.columns {
            return Err(ConfigError::Message(
                "layout.columns_with_panel must not exceed layout.columns".to_string(),
            ));
        }
        if paging.estimated_row_height_px == 0 {
            return Err(ConfigError::Message(
                "paging.estimated_row_height_px must be at least 1".to_string(),
            ));
        }
        if self.upload.accepted_extensions.is_empty() {
            return Err(ConfigError::Message(
                "upload.accepted_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::Result;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_embedded_defaults_match_default_impl() -> Result<()> {
        let cfg = Config::from_json5("{}")?;
        assert_eq!(cfg.api, ApiConfig::default());
        assert_eq!(cfg.paging, PagingConfig::default());
        assert_eq!(cfg.layout, LayoutConfig::default());
        assert_eq!(cfg.upload, UploadPolicy::default());
        Ok(())
    }

    #[test]
    fn test_overrides_are_merged() -> Result<()> {
        let cfg = Config::from_json5(
            r#"{ api: { base_url: "https://jobs.example.com", domain: "data" }, paging: { page_size: 25 } }"#,
        )?;
        assert_eq!(cfg.api.base_url, "https://jobs.example.com");
        assert_eq!(cfg.api.domain.as_deref(), Some("data"));
        assert_eq!(cfg.api.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.paging.page_size, 25);
        assert_eq!(cfg.paging.window_max_items, 500);

        let settings = cfg.paging.feed_settings(CursorMode::Offset);
        assert_eq!(settings.page_size, 25);
        assert_eq!(settings.cursor_mode, CursorMode::Offset);
        assert_eq!(cfg.paging.poll_interval(), Duration::from_millis(1500));
        Ok(())
    }

    #[rstest]
    #[case("{ paging: { cache_capacity_pages: 0 } }", "paging.cache_capacity_pages")]
    #[case("{ paging: { page_size: 100, window_max_items: 50 } }", "window_max_items")]
    #[case("{ layout: { columns: 2, columns_with_panel: 3 } }", "columns_with_panel")]
    fn test_invalid_values_are_rejected(#[case] overrides: &str, #[case] key: &str) {
        let err = Config::from_json5(overrides).unwrap_err();
        assert!(err.to_string().contains(key), "{err}");
    }
}
