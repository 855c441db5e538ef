use crate::schema::HeraldConfig;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Jsonc,
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;

        match ext {
            "jsonc" => Some(Self::Jsonc),
            "json" => Some(Self::Json),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: HeraldConfig,
    pub path: PathBuf,
    pub format: ConfigFormat,
}

pub fn load_config(config_path: Option<&Path>) -> Result<HeraldConfig> {
    resolve_config(config_path).map(|r| r.config)
}

/// Like [`load_config`], but an absent config file yields the defaults.
///
/// An explicit path that cannot be read or parsed is still an error.
pub fn load_config_or_default(config_path: Option<&Path>) -> Result<HeraldConfig> {
    if config_path.is_some() {
        return load_config(config_path);
    }

    match find_config_file() {
        Some(path) => load_config_from_file(&path).map(|r| r.config),
        None => {
            tracing::debug!("No configuration file found, using defaults");
            Ok(HeraldConfig::default())
        }
    }
}

pub fn resolve_config(config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let path = config_path
        .map(|p| p.to_path_buf())
        .or_else(find_config_file)
        .ok_or_else(|| anyhow!("No configuration file found"))?;

    load_config_from_file(&path)
}

pub fn load_config_from_file(path: &Path) -> Result<ResolvedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| anyhow!("Unknown config format for: {}", path.display()))?;

    let config = parse_config_content(&content, format)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    tracing::debug!("Loaded configuration from {}", path.display());

    Ok(ResolvedConfig {
        config,
        path: path.to_path_buf(),
        format,
    })
}

fn parse_config_content(content: &str, format: ConfigFormat) -> Result<HeraldConfig> {
    // An empty YAML document deserializes to unit, not to an empty map.
    if format == ConfigFormat::Yaml && content.trim().is_empty() {
        return Ok(HeraldConfig::default());
    }

    match format {
        ConfigFormat::Jsonc => json5::from_str(content).context("Failed to parse JSONC"),
        ConfigFormat::Json => serde_json::from_str(content).context("Failed to parse JSON"),
        ConfigFormat::Yaml => serde_yaml_ng::from_str(content).context("Failed to parse YAML"),
    }
}

const CONFIG_CANDIDATES: &[&str] = &[
    "herald.jsonc",
    "herald.json",
    "herald.yml",
    "herald.yaml",
    ".herald.jsonc",
    ".herald.json",
    ".herald.yml",
    ".herald.yaml",
];

fn global_config_dir() -> Option<PathBuf> {
    let home = env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config").join("herald"))
}

fn candidate_paths() -> impl Iterator<Item = PathBuf> {
    let local = CONFIG_CANDIDATES.iter().map(PathBuf::from);
    let global = global_config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_CANDIDATES.iter().map(move |c| dir.join(c)));

    local.chain(global)
}

fn find_config_file() -> Option<PathBuf> {
    candidate_paths().find(|path| path.exists())
}

pub fn find_all_config_files() -> Vec<PathBuf> {
    candidate_paths().filter(|path| path.exists()).collect()
}
