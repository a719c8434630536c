use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub data_dir: Option<String>,
    pub storage: Option<String>,

    // Service configs
    pub catalog: Option<CatalogConfig>,
    pub oracle: Option<OracleConfig>,

    #[serde(rename = "rotation_list")]
    pub rotation_lists: Vec<RotationListConfig>,
}

/// Connection settings for the catalog service.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub timeout_sec: Option<u64>,
}

/// Connection settings for the chat-completions oracle.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct OracleConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub suggestion_model: Option<String>,
    pub scoring_model: Option<String>,
    pub timeout_sec: Option<u64>,
}

/// One `[[rotation_list]]` table.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RotationListConfig {
    pub id: Option<String>,
    pub name: Option<String>,
    pub mode: Option<String>,
    pub live_collection: Option<String>,
    pub categories: Vec<String>,
    pub source_collections: Vec<String>,
    pub block_size: Option<usize>,
    pub max_per_performer: Option<usize>,
    pub stale_age_days: Option<i64>,
    /// Inline taste profile text; mutually exclusive with the file variant.
    pub taste_profile: Option<String>,
    pub taste_profile_file: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
