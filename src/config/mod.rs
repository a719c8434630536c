mod file_config;

pub use file_config::{CatalogConfig, FileConfig, OracleConfig, RotationListConfig};

use crate::rotation::{RotationList, RotationMode};
use anyhow::{bail, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub storage: Option<StorageBackend>,
}

/// Which entry store backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Sqlite,
    File,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::File => "file",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sqlite" => Some(StorageBackend::Sqlite),
            "file" => Some(StorageBackend::File),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub data_dir: PathBuf,
    pub storage: StorageBackend,

    // Service settings
    pub catalog: CatalogSettings,
    pub oracle: OracleSettings,

    pub lists: Vec<RotationList>,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub suggestion_model: String,
    pub scoring_model: String,
    pub timeout_sec: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and the TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file: FileConfig) -> Result<Self> {
        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("data_dir must be specified via --data-dir or in config file")
            })?;

        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let storage = match file.storage {
            Some(s) => StorageBackend::from_str(&s)
                .ok_or_else(|| anyhow::anyhow!("Unknown storage backend: {}", s))?,
            None => cli.storage.unwrap_or_default(),
        };

        let catalog_file = file.catalog.unwrap_or_default();
        let catalog = CatalogSettings {
            base_url: catalog_file
                .base_url
                .ok_or_else(|| anyhow::anyhow!("catalog.base_url must be set in config file"))?,
            api_token: catalog_file.api_token,
            timeout_sec: catalog_file.timeout_sec.unwrap_or(30),
        };

        let oracle_file = file.oracle.unwrap_or_default();
        let oracle = OracleSettings {
            base_url: oracle_file
                .base_url
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            api_key: oracle_file
                .api_key
                .or_else(|| std::env::var("ORACLE_API_KEY").ok()),
            suggestion_model: oracle_file
                .suggestion_model
                .unwrap_or_else(|| "gpt-4o".to_string()),
            scoring_model: oracle_file
                .scoring_model
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            timeout_sec: oracle_file.timeout_sec.unwrap_or(120),
        };

        let mut lists = Vec::with_capacity(file.rotation_lists.len());
        let mut seen_ids = HashSet::new();
        for list_config in file.rotation_lists {
            let list = resolve_list(list_config, &data_dir)?;
            if !seen_ids.insert(list.id.clone()) {
                bail!("Duplicate rotation list id: {}", list.id);
            }
            lists.push(list);
        }

        Ok(Self {
            data_dir,
            storage,
            catalog,
            oracle,
            lists,
        })
    }

    pub fn rotation_db_path(&self) -> PathBuf {
        self.data_dir.join("rotation.db")
    }

    pub fn entries_dir(&self) -> PathBuf {
        self.data_dir.join("entries")
    }
}

/// Validate one list table and fill in its defaults.
fn resolve_list(config: RotationListConfig, data_dir: &Path) -> Result<RotationList> {
    let id = config
        .id
        .ok_or_else(|| anyhow::anyhow!("rotation_list.id is required"))?;
    let name = config.name.unwrap_or_else(|| id.clone());

    let mode_str = config
        .mode
        .ok_or_else(|| anyhow::anyhow!("rotation_list.mode is required for list {}", id))?;
    let mode = RotationMode::from_str(&mode_str)
        .ok_or_else(|| anyhow::anyhow!("Unknown mode {} for list {}", mode_str, id))?;

    let live_collection_id = config
        .live_collection
        .ok_or_else(|| anyhow::anyhow!("rotation_list.live_collection is required for list {}", id))?;

    match mode {
        RotationMode::Category => {
            if config.categories.is_empty() {
                bail!("Category list {} has no categories", id);
            }
            if !config.source_collections.is_empty() {
                bail!("Category list {} must not set source_collections", id);
            }
        }
        RotationMode::Discovery => {
            if config.source_collections.is_empty() {
                bail!("Discovery list {} has no source_collections", id);
            }
            if !config.categories.is_empty() {
                bail!("Discovery list {} must not set categories", id);
            }
        }
    }

    // Category block size is one entry per category
    let block_size = match mode {
        RotationMode::Category => config.categories.len(),
        RotationMode::Discovery => config.block_size.unwrap_or(10),
    };
    if block_size == 0 {
        bail!("block_size must be at least 1 for list {}", id);
    }

    let taste_profile = match (config.taste_profile, config.taste_profile_file) {
        (Some(_), Some(_)) => {
            bail!(
                "List {} sets both taste_profile and taste_profile_file",
                id
            );
        }
        (Some(inline), None) => Some(inline),
        (None, Some(file)) => {
            let path = data_dir.join(&file);
            let text = std::fs::read_to_string(&path).map_err(|err| {
                anyhow::anyhow!("Failed to read taste profile {:?} for list {}: {}", path, id, err)
            })?;
            Some(text)
        }
        (None, None) => None,
    };

    Ok(RotationList {
        id,
        name,
        mode,
        live_collection_id,
        categories: config.categories,
        source_collections: config.source_collections,
        block_size,
        max_per_performer: config.max_per_performer.unwrap_or(0),
        stale_age_days: config.stale_age_days.unwrap_or(30),
        taste_profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_temp_data_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn base_file_config(data_dir: &Path) -> FileConfig {
        FileConfig {
            data_dir: Some(data_dir.to_string_lossy().to_string()),
            catalog: Some(CatalogConfig {
                base_url: Some("http://catalog:9000".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn category_list_config() -> RotationListConfig {
        RotationListConfig {
            id: Some("wl1".to_string()),
            name: Some("Decades".to_string()),
            mode: Some("category".to_string()),
            live_collection: Some("col:live".to_string()),
            categories: vec!["80s".to_string(), "90s".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_storage_backend_roundtrip() {
        for backend in [StorageBackend::Sqlite, StorageBackend::File] {
            assert_eq!(StorageBackend::from_str(backend.as_str()), Some(backend));
        }
        assert!(StorageBackend::from_str("postgres").is_none());
    }

    #[test]
    fn test_resolve_minimal() {
        let temp_dir = make_temp_data_dir();
        let config =
            AppConfig::resolve(&CliConfig::default(), base_file_config(temp_dir.path())).unwrap();

        assert_eq!(config.data_dir, temp_dir.path());
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.catalog.base_url, "http://catalog:9000");
        assert_eq!(config.catalog.timeout_sec, 30);
        assert_eq!(config.oracle.suggestion_model, "gpt-4o");
        assert_eq!(config.oracle.scoring_model, "gpt-4o-mini");
        assert!(config.lists.is_empty());
        assert_eq!(
            config.rotation_db_path(),
            temp_dir.path().join("rotation.db")
        );
    }

    #[test]
    fn test_resolve_toml_storage_overrides_cli() {
        let temp_dir = make_temp_data_dir();
        let cli = CliConfig {
            storage: Some(StorageBackend::Sqlite),
            ..Default::default()
        };
        let mut file = base_file_config(temp_dir.path());
        file.storage = Some("file".to_string());

        let config = AppConfig::resolve(&cli, file).unwrap();
        assert_eq!(config.storage, StorageBackend::File);
    }

    #[test]
    fn test_resolve_missing_data_dir_error() {
        let mut file = FileConfig::default();
        file.catalog = Some(CatalogConfig {
            base_url: Some("http://catalog:9000".to_string()),
            ..Default::default()
        });
        let result = AppConfig::resolve(&CliConfig::default(), file);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("data_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_data_dir_error() {
        let cli = CliConfig {
            data_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            ..Default::default()
        };
        let mut file = FileConfig::default();
        file.catalog = Some(CatalogConfig {
            base_url: Some("http://catalog:9000".to_string()),
            ..Default::default()
        });
        let result = AppConfig::resolve(&cli, file);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_missing_catalog_url_error() {
        let temp_dir = make_temp_data_dir();
        let mut file = base_file_config(temp_dir.path());
        file.catalog = None;
        let result = AppConfig::resolve(&CliConfig::default(), file);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("catalog.base_url"));
    }

    #[test]
    fn test_resolve_category_list() {
        let temp_dir = make_temp_data_dir();
        let mut file = base_file_config(temp_dir.path());
        file.rotation_lists = vec![category_list_config()];

        let config = AppConfig::resolve(&CliConfig::default(), file).unwrap();
        let list = &config.lists[0];
        assert_eq!(list.id, "wl1");
        assert_eq!(list.mode, RotationMode::Category);
        // Category block size follows the category count
        assert_eq!(list.block_size, 2);
        assert_eq!(list.stale_age_days, 30);
        assert_eq!(list.max_per_performer, 0);
    }

    #[test]
    fn test_resolve_category_list_without_categories_error() {
        let temp_dir = make_temp_data_dir();
        let mut list = category_list_config();
        list.categories = vec![];
        let mut file = base_file_config(temp_dir.path());
        file.rotation_lists = vec![list];

        let result = AppConfig::resolve(&CliConfig::default(), file);
        assert!(result.unwrap_err().to_string().contains("no categories"));
    }

    #[test]
    fn test_resolve_discovery_list_requires_sources() {
        let temp_dir = make_temp_data_dir();
        let list = RotationListConfig {
            id: Some("wl2".to_string()),
            mode: Some("discovery".to_string()),
            live_collection: Some("col:live".to_string()),
            ..Default::default()
        };
        let mut file = base_file_config(temp_dir.path());
        file.rotation_lists = vec![list];

        let result = AppConfig::resolve(&CliConfig::default(), file);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("no source_collections"));
    }

    #[test]
    fn test_resolve_discovery_list_defaults() {
        let temp_dir = make_temp_data_dir();
        let list = RotationListConfig {
            id: Some("wl2".to_string()),
            mode: Some("discovery".to_string()),
            live_collection: Some("col:live".to_string()),
            source_collections: vec!["col:src".to_string()],
            taste_profile: Some("likes shoegaze".to_string()),
            ..Default::default()
        };
        let mut file = base_file_config(temp_dir.path());
        file.rotation_lists = vec![list];

        let config = AppConfig::resolve(&CliConfig::default(), file).unwrap();
        let list = &config.lists[0];
        assert_eq!(list.block_size, 10);
        assert_eq!(list.name, "wl2");
        assert_eq!(list.taste_profile.as_deref(), Some("likes shoegaze"));
    }

    #[test]
    fn test_resolve_taste_profile_from_file() {
        let temp_dir = make_temp_data_dir();
        std::fs::write(temp_dir.path().join("profile.txt"), "loves jazz fusion").unwrap();
        let list = RotationListConfig {
            id: Some("wl2".to_string()),
            mode: Some("discovery".to_string()),
            live_collection: Some("col:live".to_string()),
            source_collections: vec!["col:src".to_string()],
            taste_profile_file: Some("profile.txt".to_string()),
            ..Default::default()
        };
        let mut file = base_file_config(temp_dir.path());
        file.rotation_lists = vec![list];

        let config = AppConfig::resolve(&CliConfig::default(), file).unwrap();
        assert_eq!(
            config.lists[0].taste_profile.as_deref(),
            Some("loves jazz fusion")
        );
    }

    #[test]
    fn test_resolve_duplicate_list_ids_error() {
        let temp_dir = make_temp_data_dir();
        let mut file = base_file_config(temp_dir.path());
        file.rotation_lists = vec![category_list_config(), category_list_config()];

        let result = AppConfig::resolve(&CliConfig::default(), file);
        assert!(result.unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn test_file_config_parses_list_tables() {
        let toml_text = r#"
            data_dir = "/data"
            storage = "sqlite"

            [catalog]
            base_url = "http://catalog:9000"
            api_token = "secret"

            [oracle]
            suggestion_model = "gpt-4o"

            [[rotation_list]]
            id = "decades"
            mode = "category"
            live_collection = "col:1"
            categories = ["80s", "90s", "00s"]

            [[rotation_list]]
            id = "fresh"
            mode = "discovery"
            live_collection = "col:2"
            source_collections = ["col:a", "col:b"]
            block_size = 15
            stale_age_days = 21
        "#;
        let file: FileConfig = toml::from_str(toml_text).unwrap();
        assert_eq!(file.rotation_lists.len(), 2);
        assert_eq!(file.rotation_lists[0].categories.len(), 3);
        assert_eq!(file.rotation_lists[1].block_size, Some(15));
        assert_eq!(file.rotation_lists[1].stale_age_days, Some(21));
        assert_eq!(
            file.catalog.as_ref().unwrap().api_token.as_deref(),
            Some("secret")
        );
    }
}
