use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::ARCHIVE_NAME;
use crate::billing::{DEFAULT_KEYWORD, DEFAULT_LANG};
use crate::raster::CropBox;

pub const DEFAULT_CONFIG_FILE: &str = "nomor-rename.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub keyword: String,
    pub lang: String,
    pub dpi: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self { keyword: DEFAULT_KEYWORD.to_string(), lang: DEFAULT_LANG.to_string(), dpi: 200 }
    }
}

/// Named crop presets accepted in YAML as `crop: top_band`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CropSetting {
    Preset(CropPreset),
    Box(CropBox),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropPreset {
    Header,
    TopBand,
    FullPage,
}

impl CropSetting {
    pub fn resolve(self) -> CropBox {
        match self {
            CropSetting::Preset(CropPreset::Header) => CropBox::default(),
            CropSetting::Preset(CropPreset::TopBand) => CropBox::top_band(),
            CropSetting::Preset(CropPreset::FullPage) => CropBox::full_page(),
            CropSetting::Box(b) => b,
        }
    }
}

impl Default for CropSetting {
    fn default() -> Self {
        CropSetting::Preset(CropPreset::Header)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    pub inputs: Vec<String>,
    pub output_dir: PathBuf,
    pub archive_name: String,
    pub workspace_dir: Option<PathBuf>,
    pub dpi: u32,
    pub crop: CropSetting,
    pub ocr_lang: String,
    pub ocr_psm: Option<u8>,
    pub split: bool,
    pub billing: BillingConfig,
    pub dump_ocr: bool,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            inputs: vec!["./input/**/*.pdf".to_string()],
            output_dir: PathBuf::from("./output"),
            archive_name: ARCHIVE_NAME.to_string(),
            workspace_dir: None,
            dpi: 400,
            crop: CropSetting::default(),
            ocr_lang: "eng".to_string(),
            ocr_psm: None,
            split: false,
            billing: BillingConfig::default(),
            dump_ocr: false,
        }
    }
}

impl RenameConfig {
    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(&self.archive_name)
    }

    pub fn report_path(&self) -> PathBuf {
        self.archive_path().with_extension("json")
    }

    pub fn crop_box(&self) -> CropBox {
        self.crop.resolve()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dpi == 0 || self.billing.dpi == 0 {
            return Err(ConfigError::Invalid("dpi must be positive".into()));
        }
        if !self.crop_box().is_valid() {
            return Err(ConfigError::Invalid(format!("crop box out of range: {:?}", self.crop_box())));
        }
        let name = self.archive_name.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(ConfigError::Invalid("archive_name must be a bare file name".into()));
        }
        if self.ocr_lang.trim().is_empty() || self.billing.lang.trim().is_empty() {
            return Err(ConfigError::Invalid("ocr language must not be empty".into()));
        }
        if self.billing.keyword.trim().is_empty() {
            return Err(ConfigError::Invalid("billing keyword must not be empty".into()));
        }
        Ok(())
    }
}

/// Load and validate a YAML config. Missing keys fall back to defaults.
pub fn load_config(path: &Path) -> Result<RenameConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Read { path: path.display().to_string(), message: e.to_string() })?;
    parse_config(&raw).map_err(|e| match e {
        ConfigError::Parse { message, .. } => ConfigError::Parse { path: path.display().to_string(), message },
        other => other,
    })
}

pub fn parse_config(raw: &str) -> Result<RenameConfig, ConfigError> {
    let cfg: RenameConfig = if raw.trim().is_empty() {
        RenameConfig::default()
    } else {
        serde_yaml::from_str(raw)
            .map_err(|e| ConfigError::Parse { path: "<inline>".into(), message: e.to_string() })?
    };
    cfg.validate()?;
    Ok(cfg)
}
