use crate::annotator::DEFAULT_CONVERT_BIN;
use crate::template::DEFAULT_CAPTION_FORMAT;
use crate::walker::{
    DEFAULT_BOTTOM_MARGIN, DEFAULT_DEST, DEFAULT_EXTENSIONS, DEFAULT_FONT, DEFAULT_MAX_WORKERS,
    DEFAULT_TEXT_SIZE,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dest: String,
    pub ext: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub format: String,
    pub text_size: i32,
    pub bottom_margin: i32,
    pub font: String,
    pub parallel: bool,
    pub max_workers: usize,
    pub convert_bin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dest: DEFAULT_DEST.to_string(),
            ext: DEFAULT_EXTENSIONS.to_string(),
            location: None,
            format: DEFAULT_CAPTION_FORMAT.to_string(),
            text_size: DEFAULT_TEXT_SIZE,
            bottom_margin: DEFAULT_BOTTOM_MARGIN,
            font: DEFAULT_FONT.to_string(),
            parallel: false,
            max_workers: DEFAULT_MAX_WORKERS,
            convert_bin: DEFAULT_CONVERT_BIN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "pola", "pola-caption")
        .context("could not locate the user configuration directory")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

/// A missing file yields the built-in defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("cannot parse config file: {}", path.display()))?;
    Ok(config)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create config directory: {}", dir.display()))?;
    }
    let body = toml::to_string_pretty(config).context("cannot serialize config")?;
    fs::write(path, body)
        .with_context(|| format!("cannot write config file: {}", path.display()))?;
    Ok(())
}
