//! Host configuration
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `relish.toml` in the working directory, or the file named by
//!    `RELISH_CONFIG_PATH` (set by `--config`)
//! 3. `RELISH_*` environment variables, after loading `.env`
//!
//! `RELISH_PACKAGE_PATH` is a `:`-separated list.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "RELISH";
const CONFIG_PATH_VAR: &str = "RELISH_CONFIG_PATH";
const DEFAULT_CONFIG_FILE: &str = "relish.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory `//./path` references resolve against when evaluating an
    /// inline expression.
    pub source_dir: Option<PathBuf>,

    /// Directories searched for `//name` packages, in order.
    pub package_path: Vec<PathBuf>,

    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: None,
            package_path: Vec::new(),
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the standard sources.
    pub fn load() -> Result<Self> {
        // A missing .env is not an error
        let _ = dotenvy::dotenv();

        match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::load_from(Some(Path::new(&path))),
            Err(_) => Self::load_from(None),
        }
    }

    /// Loads configuration with `path` as the file source. An explicit path
    /// must exist; the default `relish.toml` is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::default();
        let mut builder = config::Config::builder()
            .set_default("log_filter", defaults.log_filter)?
            .set_default("package_path", Vec::<String>::new())?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).format(FileFormat::Toml).required(true)),
            None => builder.add_source(
                File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
            ),
        };

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(":")
                    .with_list_parse_key("package_path"),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// The effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Should create temp file");
        file.write_all(contents.as_bytes()).expect("Should write");
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_filter, "warn");
        assert!(config.package_path.is_empty());
        assert!(config.source_dir.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
source_dir = "/srv/rel"
package_path = ["/usr/lib/relish", "/opt/relish"]
log_filter = "relish_core=debug"
"#,
        );
        let config = Config::load_from(Some(file.path())).expect("Should load");
        assert_eq!(config.source_dir, Some(PathBuf::from("/srv/rel")));
        assert_eq!(
            config.package_path,
            vec![PathBuf::from("/usr/lib/relish"), PathBuf::from("/opt/relish")]
        );
        assert_eq!(config.log_filter, "relish_core=debug");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config("source_dir = \"/srv\"\n");
        let config = Config::load_from(Some(file.path())).expect("Should load");
        assert_eq!(config.log_filter, "warn");
        assert!(config.package_path.is_empty());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        assert!(Config::load_from(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = Config {
            source_dir: Some(PathBuf::from("/src")),
            package_path: vec![PathBuf::from("/lib")],
            log_filter: "info".to_string(),
        };
        let file = write_config(&config.to_toml().expect("Should render"));
        assert_eq!(Config::load_from(Some(file.path())).expect("Should load"), config);
    }
}
