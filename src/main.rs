use anyhow::{bail, Context, Result};
use clap::Parser;
use playlist_rotator::clients::{CatalogClient, ChatOracle};
use playlist_rotator::config::{AppConfig, CliConfig, FileConfig, StorageBackend};
use playlist_rotator::rotation::{
    EntryStore, FileEntryStore, RotationEngine, RotationStatus, SqliteEntryStore,
};
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

fn parse_storage(s: &str) -> Result<StorageBackend> {
    StorageBackend::from_str(s)
        .ok_or_else(|| anyhow::anyhow!("Unknown storage backend: {} (sqlite or file)", s))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the TOML configuration file.
    #[clap(value_parser = parse_path)]
    pub config: PathBuf,

    /// Only run the rotation list with this id.
    #[clap(long)]
    pub list: Option<String>,

    /// Directory for databases and entry files. Overridden by the config file.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// Entry store backend, sqlite or file. Overridden by the config file.
    #[clap(long, value_parser = parse_storage)]
    pub storage: Option<StorageBackend>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = FileConfig::load(&cli_args.config)?;
    let cli_config = CliConfig {
        data_dir: cli_args.data_dir,
        storage: cli_args.storage,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let store: Box<dyn EntryStore> = match config.storage {
        StorageBackend::Sqlite => Box::new(SqliteEntryStore::new(config.rotation_db_path())?),
        StorageBackend::File => Box::new(FileEntryStore::new(config.entries_dir())?),
    };
    let catalog = CatalogClient::new(&config.catalog)?;
    let oracle = ChatOracle::new(&config.oracle)?;
    let engine = RotationEngine::new(store.as_ref(), &catalog, &oracle, &catalog, &catalog, &oracle);

    let lists: Vec<_> = match &cli_args.list {
        Some(id) => {
            let selected: Vec<_> = config.lists.iter().filter(|l| &l.id == id).collect();
            if selected.is_empty() {
                bail!("No rotation list with id {} in config", id);
            }
            selected
        }
        None => config.lists.iter().collect(),
    };
    if lists.is_empty() {
        bail!("No rotation lists configured");
    }

    let mut failures = 0;
    for list in lists {
        match engine.run_list(list) {
            Ok(outcome) => {
                info!(
                    list = %list.name,
                    status = outcome.status.as_str(),
                    evicted = outcome.evicted_count,
                    added = outcome.added_count,
                    regenerated = outcome.regenerated,
                    "Run finished"
                );
                if outcome.status == RotationStatus::Failed {
                    failures += 1;
                }
            }
            Err(err) => {
                error!(list = %list.name, error = %err, "Run failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} rotation run(s) failed", failures);
    }
    Ok(())
}
