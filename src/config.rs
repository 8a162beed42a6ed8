use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name looked up in the working directory at start-up.
pub const CONFIG_FILE: &str = "predictscore.json";

const MIB: u64 = 1024 * 1024;

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Start-up configuration. Built once in `main` and shared as `Arc<AppConfig>`.
///
/// Every section falls back to its defaults, so a partial JSON file such as
/// `{ "scorer": { "base_url": "http://10.0.0.5:8001" } }` is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scorer: ScorerConfig,
    pub upload: UploadLimits,
    pub view: ViewConfig,
    pub export: ExportConfig,
}

/// External prediction service endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub base_url: String,
    pub predict_path: String,
    pub dataset_path: String,
    /// Upper bound for a single request, batch scoring included.
    pub timeout_secs: u64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8001".to_string(),
            predict_path: "/api/v1/predictions/predict".to_string(),
            dataset_path: "/api/v1/predictions/predict-dataset".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Which upload path a file is arriving through. The two paths have
/// different size ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Whole results dataset, or a raw dataset sent for scoring.
    Dataset,
    /// Student-attribute file cleaned locally before scoring.
    FormBatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    /// Expected extension, without the dot. Compared case-insensitively.
    pub extension: String,
    pub dataset_max_bytes: u64,
    pub form_batch_max_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            extension: "csv".to_string(),
            dataset_max_bytes: 50 * MIB,
            form_batch_max_bytes: 5 * MIB,
        }
    }
}

impl UploadLimits {
    pub fn max_bytes(&self, kind: UploadKind) -> u64 {
        match kind {
            UploadKind::Dataset => self.dataset_max_bytes,
            UploadKind::FormBatch => self.form_batch_max_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub page_sizes: Vec<usize>,
    pub default_page_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_sizes: vec![25, 50, 100, 200],
            default_page_size: 50,
        }
    }
}

impl ViewConfig {
    /// Whether `size` is one of the selectable page sizes.
    pub fn allows(&self, size: usize) -> bool {
        self.page_sizes.contains(&size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Leading part of the suggested export file name.
    pub prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            prefix: "prediction_results".to_string(),
        }
    }
}

impl AppConfig {
    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validated()
    }

    /// Load `path` if it exists, otherwise use defaults. A broken file is
    /// logged and ignored so the viewer still starts.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No {} found, using default configuration", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("Ignoring configuration: {e:#}");
                Self::default()
            }
        }
    }

    fn validated(mut self) -> Result<Self> {
        self.view.page_sizes.retain(|&size| size > 0);
        if self.view.page_sizes.is_empty() {
            anyhow::bail!("view.page_sizes must contain at least one positive size");
        }
        if !self.view.allows(self.view.default_page_size) {
            log::warn!(
                "default_page_size {} is not in {:?}; using {}",
                self.view.default_page_size,
                self.view.page_sizes,
                self.view.page_sizes[0]
            );
            self.view.default_page_size = self.view.page_sizes[0];
        }
        if self.scorer.timeout_secs == 0 {
            anyhow::bail!("scorer.timeout_secs must be positive");
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upload_ceilings() {
        let config = AppConfig::default();
        assert_eq!(config.upload.max_bytes(UploadKind::Dataset), 50 * 1024 * 1024);
        assert_eq!(config.upload.max_bytes(UploadKind::FormBatch), 5 * 1024 * 1024);
        assert_eq!(config.view.default_page_size, 50);
        assert!(config.view.allows(200));
        assert!(!config.view.allows(30));
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "scorer": { "timeout_secs": 30 } }"#).unwrap();
        assert_eq!(config.scorer.timeout_secs, 30);
        assert_eq!(config.scorer.base_url, "http://127.0.0.1:8001");
        assert_eq!(config.export.prefix, "prediction_results");
    }

    #[test]
    fn invalid_default_page_size_falls_back_to_first_choice() {
        let mut config = AppConfig::default();
        config.view.default_page_size = 7;
        let config = config.validated().unwrap();
        assert_eq!(config.view.default_page_size, 25);
    }

    #[test]
    fn empty_page_sizes_are_rejected() {
        let mut config = AppConfig::default();
        config.view.page_sizes = vec![0];
        assert!(config.validated().is_err());
    }
}
