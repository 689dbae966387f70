//! Migration configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{MigrationError, MigrationResult};

static DEFAULT_STORE_DIR: &str = "~/calendars";
static DEFAULT_PRODUCT_ID: &str = "-//calport//calport//EN";
static DEFAULT_COLOR: &str = "#0082c9";
static DEFAULT_FALLBACK_NAME: &str = "Migrated calendar ({file})";
const DEFAULT_NAME_ATTEMPTS: u32 = 10;

fn default_store_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_DIR)
}

fn default_product_id() -> String {
    DEFAULT_PRODUCT_ID.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_fallback_name() -> String {
    DEFAULT_FALLBACK_NAME.to_string()
}

fn default_name_attempts() -> u32 {
    DEFAULT_NAME_ATTEMPTS
}

/// Configuration at ~/.config/calport/config.toml, overridable with
/// `CALPORT_*` environment variables.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MigratorConfig {
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// PRODID of merged documents
    #[serde(default = "default_product_id")]
    pub product_id: String,

    /// Color of imported calendars that don't carry one
    #[serde(default = "default_color")]
    pub default_color: String,

    /// Name of imported calendars that don't carry one, `{file}` is
    /// replaced with the imported filename
    #[serde(default = "default_fallback_name")]
    pub fallback_name: String,

    /// How often the importer picks a new uri after the store reports
    /// that the chosen one was taken in the meantime
    #[serde(default = "default_name_attempts")]
    pub name_attempts: u32,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        MigratorConfig {
            store_dir: default_store_dir(),
            product_id: default_product_id(),
            default_color: default_color(),
            fallback_name: default_fallback_name(),
            name_attempts: default_name_attempts(),
        }
    }
}

impl MigratorConfig {
    pub fn config_path() -> MigrationResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MigrationError::Config("Could not determine config directory".into()))?
            .join("calport");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user's config, writing a commented default file first if
    /// there is none.
    pub fn load() -> MigrationResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> MigrationResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("CALPORT"))
            .build()
            .map_err(|e| MigrationError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| MigrationError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> MigrationResult<()> {
        let contents = format!(
            "\
# calport configuration

# Where the local calendar store lives:
# store_dir = \"{}\"

# PRODID written into exported calendars:
# product_id = \"{}\"

# Used for imported calendars without a name or color:
# fallback_name = \"{}\"
# default_color = \"{}\"

# How often to retry when another import takes the chosen calendar uri:
# name_attempts = {}
",
            DEFAULT_STORE_DIR,
            DEFAULT_PRODUCT_ID,
            DEFAULT_FALLBACK_NAME,
            DEFAULT_COLOR,
            DEFAULT_NAME_ATTEMPTS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MigrationError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| MigrationError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The store directory with `~` expanded
    pub fn store_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.store_dir.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }

    pub fn fallback_display_name(&self, file: &str) -> String {
        self.fallback_name.replace("{file}", file)
    }
}
