//! Layered configuration: optional TOML file, overridden by CLI flags,
//! falling back to the built-in defaults of the core builder.

use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use vdock::engine::config::{DockingConfig, DockingConfigBuilder};

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub targets_dir: Option<PathBuf>,
    pub vina_binary: Option<PathBuf>,
    pub obabel_binary: Option<PathBuf>,
    pub seed: Option<u64>,
    pub max_embed_attempts: Option<u32>,
    pub max_heavy_atoms: Option<usize>,
    pub ph: Option<f64>,
    pub cpus: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: anyhow::Error::new(e),
        })?;
        debug!(path = %path.display(), "Configuration file loaded");
        Ok(config)
    }

    pub fn load_optional(path: &Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// CLI-level overrides collected from the argument structs.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub targets_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub cpus: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

/// Resolves the effective docking configuration, with CLI flags taking
/// precedence over the file and the file over built-in defaults. The
/// targets directory is the one parameter with no default and must come
/// from one of the two layers.
pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<DockingConfig> {
    let mut builder = DockingConfigBuilder::new();

    match overrides.targets_dir.or(file.targets_dir) {
        Some(dir) => builder = builder.targets_dir(dir),
        None => {
            return Err(CliError::Config(
                "no targets directory configured; pass --targets-dir or set targets-dir in the config file"
                    .to_string(),
            ));
        }
    }
    if let Some(path) = file.vina_binary {
        builder = builder.vina_binary(path);
    }
    if let Some(path) = file.obabel_binary {
        builder = builder.obabel_binary(path);
    }
    if let Some(seed) = overrides.seed.or(file.seed) {
        builder = builder.seed(seed);
    }
    if let Some(attempts) = file.max_embed_attempts {
        builder = builder.max_embed_attempts(attempts);
    }
    if let Some(limit) = file.max_heavy_atoms {
        builder = builder.max_heavy_atoms(limit);
    }
    if let Some(ph) = file.ph {
        builder = builder.ph(ph);
    }
    if let Some(cpus) = overrides.cpus.or(file.cpus) {
        builder = builder.num_cpus(cpus);
    }
    if let Some(seconds) = overrides.timeout_seconds.or(file.timeout_seconds) {
        builder = builder.timeout(Duration::from_secs(seconds));
    }

    builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use vdock::engine::config::DEFAULT_SEED;

    #[test]
    fn file_values_reach_the_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "targets-dir = \"/data/targets\"\nseed = 7\nvina-binary = \"/opt/vina\"\ntimeout-seconds = 30"
        )
        .unwrap();
        let parsed = FileConfig::load(file.path()).unwrap();
        let config = resolve(parsed, Overrides::default()).unwrap();
        assert_eq!(config.targets_dir, PathBuf::from("/data/targets"));
        assert_eq!(config.seed, 7);
        assert_eq!(config.vina_binary, PathBuf::from("/opt/vina"));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn cli_flags_override_the_file() {
        let file = FileConfig {
            targets_dir: Some(PathBuf::from("/from/file")),
            seed: Some(1),
            ..Default::default()
        };
        let overrides = Overrides {
            targets_dir: Some(PathBuf::from("/from/cli")),
            seed: Some(2),
            ..Default::default()
        };
        let config = resolve(file, overrides).unwrap();
        assert_eq!(config.targets_dir, PathBuf::from("/from/cli"));
        assert_eq!(config.seed, 2);
    }

    #[test]
    fn missing_targets_dir_is_a_config_error() {
        let result = resolve(FileConfig::default(), Overrides::default());
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn defaults_fill_unset_values() {
        let file = FileConfig {
            targets_dir: Some(PathBuf::from("/data/targets")),
            ..Default::default()
        };
        let config = resolve(file, Overrides::default()).unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
        assert!((config.ph - 7.4).abs() < 1e-12);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "targets-dir = \"/x\"\nnot-a-key = 1").unwrap();
        assert!(matches!(
            FileConfig::load(file.path()),
            Err(CliError::FileParsing { .. })
        ));
    }
}
