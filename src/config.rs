//! Generator configuration
//!
//! Loaded from `config/driftguard.toml` (section `[generator]`, optional)
//! overlaid with `DRIFTGUARD__GENERATOR__*` environment variables.

use crate::error::DriftError;
use crate::schema::{Dialect, TableOptions};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config/driftguard.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub dialect: Dialect,
    /// Portable column kinds with default lengths elided
    #[serde(default = "default_general_schema")]
    pub general_schema: bool,
    #[serde(default)]
    pub use_table_prefix: bool,
    #[serde(default)]
    pub table_prefix: String,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
    /// Recorded with each generated version when history recording is on
    #[serde(default)]
    pub namespace: Option<String>,
    /// Migrations left out of history replay (name or `m<version>_<name>`)
    #[serde(default)]
    pub skip_migrations: Vec<String>,
    #[serde(default)]
    pub record_history: bool,
}

fn default_general_schema() -> bool {
    true
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            general_schema: default_general_schema(),
            use_table_prefix: false,
            table_prefix: String::new(),
            migrations_dir: default_migrations_dir(),
            namespace: None,
            skip_migrations: Vec::new(),
            record_history: false,
        }
    }
}

impl GeneratorConfig {
    /// Load from the default file location, falling back to env vars
    pub fn load() -> Result<Self, DriftError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load from `path` (optional) overlaid with environment variables
    ///
    /// # Errors
    ///
    /// Returns `DriftError::Config` if a present file cannot be parsed and
    /// the environment alone does not yield a valid configuration either.
    pub fn load_from(path: &Path) -> Result<Self, DriftError> {
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("DRIFTGUARD").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    log::warn!(
                        "Failed to load {}, falling back to environment: {}",
                        path.display(),
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix("DRIFTGUARD").separator("__"))
                    .build()
                    .map_err(|env_err| {
                        DriftError::Config(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        match settings.get::<GeneratorConfig>("generator") {
            Ok(config) => Ok(config),
            // no [generator] section anywhere
            Err(ConfigError::NotFound(_)) => Ok(GeneratorConfig::default()),
            Err(e) => Err(DriftError::Config(format!(
                "Generator configuration could not be loaded from file or environment: {}",
                e
            ))),
        }
    }

    /// Naming options every table in a run shares
    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            use_prefix: self.use_table_prefix,
            prefix: self.table_prefix.clone(),
            general_schema: self.general_schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = GeneratorConfig::load_from(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.migrations_dir, PathBuf::from("migrations"));
        assert!(config.general_schema);
    }

    #[test]
    fn test_file_values_are_read() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[generator]\ndialect = \"pgsql\"\nuse_table_prefix = true\ntable_prefix = \"app_\"\nskip_migrations = [\"m20240101000000_seed\"]"
        )
        .unwrap();

        let config = GeneratorConfig::load_from(file.path()).unwrap();
        assert_eq!(config.dialect, Dialect::Pgsql);
        assert_eq!(config.skip_migrations, vec!["m20240101000000_seed".to_string()]);

        let options = config.table_options();
        assert!(options.use_prefix);
        assert_eq!(options.prefix, "app_");
    }
}
