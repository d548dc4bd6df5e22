//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::document::{DocumentCatalog, DocumentKind, NormalizedRect};
use crate::pipeline::CycleSettings;
use crate::vision::RoiMapper;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Recognition pipeline settings
    pub pipeline: PipelineSettings,
    /// Capture region overrides
    pub roi: RoiOverrides,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// General application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Document type selected at startup
    pub default_document: DocumentKind,
}

/// Recognition pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Frames are rotated upright before they reach the pipeline
    pub assumes_portrait_input: bool,
    /// Languages hinted to the recognizer, in priority order
    pub recognition_languages: Vec<String>,
    /// Produce the cleaned license transcript
    pub noise_filter: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            assumes_portrait_input: false,
            recognition_languages: vec!["ko-KR".to_string(), "en-US".to_string()],
            noise_filter: true,
        }
    }
}

impl PipelineSettings {
    pub fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            mapper: RoiMapper::new(self.assumes_portrait_input),
            languages: self.recognition_languages.clone(),
            noise_filter: self.noise_filter,
        }
    }
}

/// Per-document capture regions replacing the built-in ones
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiOverrides {
    pub card: Option<NormalizedRect>,
    pub license: Option<NormalizedRect>,
}

impl RoiOverrides {
    /// Build the document catalog with overrides applied
    pub fn catalog(&self) -> DocumentCatalog {
        let mut catalog = DocumentCatalog::builtin();
        if let Some(rect) = self.card {
            catalog = catalog.with_roi(DocumentKind::Card, rect);
        }
        if let Some(rect) = self.license {
            catalog = catalog.with_roi(DocumentKind::License, rect);
        }
        catalog
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.general.default_document, DocumentKind::Card);

        assert!(!config.pipeline.assumes_portrait_input);
        assert_eq!(config.pipeline.recognition_languages, vec!["ko-KR", "en-US"]);
        assert!(config.pipeline.noise_filter);

        assert!(config.roi.card.is_none());
        assert!(config.roi.license.is_none());

        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AppConfig::default();
        config.general.default_document = DocumentKind::License;
        config.roi.license = Some(NormalizedRect::new(0.05, 0.25, 0.95, 0.75).unwrap());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.general.default_document, DocumentKind::License);
        assert_eq!(parsed.roi.license, config.roi.license);
        assert!(parsed.roi.card.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [pipeline]
            assumes_portrait_input = true
            "#,
        )
        .unwrap();

        assert!(parsed.pipeline.assumes_portrait_input);
        assert!(parsed.pipeline.noise_filter);
        assert_eq!(parsed.general.default_document, DocumentKind::Card);
    }

    #[test]
    fn test_invalid_roi_rejected() {
        let result = toml::from_str::<AppConfig>(
            r#"
            [roi.card]
            left = 0.9
            top = 0.4
            right = 0.1
            bottom = 0.6
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_roi_override_reaches_catalog() {
        let mut config = AppConfig::default();
        let rect = NormalizedRect::new(0.1, 0.35, 0.9, 0.65).unwrap();
        config.roi.card = Some(rect);

        let catalog = config.roi.catalog();
        assert_eq!(catalog.get(DocumentKind::Card).roi(), rect);
    }

    #[test]
    fn test_cycle_settings_from_pipeline() {
        let mut settings = PipelineSettings::default();
        settings.assumes_portrait_input = true;
        settings.noise_filter = false;

        let cycle = settings.cycle_settings();
        assert!(cycle.mapper.assumes_portrait_input);
        assert!(!cycle.noise_filter);
        assert_eq!(cycle.languages.len(), 2);
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();

        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();

        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config.general.default_document, loaded.general.default_document);
        assert_eq!(
            config.pipeline.recognition_languages,
            loaded.pipeline.recognition_languages
        );
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
