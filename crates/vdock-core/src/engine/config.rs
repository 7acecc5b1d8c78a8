use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Seed handed to both conformer embedding and the docking engine when the
/// caller does not supply one, so repeated runs of the same ligand/target
/// pair reproduce bit-identical poses.
pub const DEFAULT_SEED: u64 = 974_528_263;

/// How many times embedding is retried with incremented seeds before the
/// molecule is declared unembeddable.
pub const DEFAULT_MAX_EMBED_ATTEMPTS: u32 = 10;

/// Ligands above this heavy-atom count are rejected up front; the search
/// degrades badly beyond it and the prepared boxes assume drug-sized input.
pub const DEFAULT_MAX_HEAVY_ATOMS: usize = 100;

/// Assay pH used when protonating the ligand.
pub const DEFAULT_PH: f64 = 7.4;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DockingConfig {
    /// Directory holding the prepared target triples.
    pub targets_dir: PathBuf,
    /// Docking engine executable, resolved through PATH when relative.
    pub vina_binary: PathBuf,
    /// Conversion tool executable, resolved through PATH when relative.
    pub obabel_binary: PathBuf,
    pub seed: u64,
    pub max_embed_attempts: u32,
    pub max_heavy_atoms: usize,
    pub ph: f64,
    /// CPU count forwarded to the engine; `None` lets the engine decide.
    pub num_cpus: Option<u32>,
    /// Wall-clock limit for a single engine invocation.
    pub timeout: Option<Duration>,
}

#[derive(Default)]
pub struct DockingConfigBuilder {
    targets_dir: Option<PathBuf>,
    vina_binary: Option<PathBuf>,
    obabel_binary: Option<PathBuf>,
    seed: Option<u64>,
    max_embed_attempts: Option<u32>,
    max_heavy_atoms: Option<usize>,
    ph: Option<f64>,
    num_cpus: Option<u32>,
    timeout: Option<Duration>,
}

impl DockingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets_dir(mut self, path: PathBuf) -> Self {
        self.targets_dir = Some(path);
        self
    }
    pub fn vina_binary(mut self, path: PathBuf) -> Self {
        self.vina_binary = Some(path);
        self
    }
    pub fn obabel_binary(mut self, path: PathBuf) -> Self {
        self.obabel_binary = Some(path);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn max_embed_attempts(mut self, attempts: u32) -> Self {
        self.max_embed_attempts = Some(attempts);
        self
    }
    pub fn max_heavy_atoms(mut self, limit: usize) -> Self {
        self.max_heavy_atoms = Some(limit);
        self
    }
    pub fn ph(mut self, ph: f64) -> Self {
        self.ph = Some(ph);
        self
    }
    pub fn num_cpus(mut self, cpus: u32) -> Self {
        self.num_cpus = Some(cpus);
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<DockingConfig, ConfigError> {
        let max_embed_attempts = self.max_embed_attempts.unwrap_or(DEFAULT_MAX_EMBED_ATTEMPTS);
        if max_embed_attempts == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_embed_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(DockingConfig {
            targets_dir: self
                .targets_dir
                .ok_or(ConfigError::MissingParameter("targets_dir"))?,
            vina_binary: self.vina_binary.unwrap_or_else(|| PathBuf::from("vina")),
            obabel_binary: self.obabel_binary.unwrap_or_else(|| PathBuf::from("obabel")),
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            max_embed_attempts,
            max_heavy_atoms: self.max_heavy_atoms.unwrap_or(DEFAULT_MAX_HEAVY_ATOMS),
            ph: self.ph.unwrap_or(DEFAULT_PH),
            num_cpus: self.num_cpus,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let config = DockingConfigBuilder::new()
            .targets_dir(PathBuf::from("/data/targets"))
            .build()
            .unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.vina_binary, PathBuf::from("vina"));
        assert_eq!(config.max_heavy_atoms, 100);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn targets_dir_is_required() {
        assert_eq!(
            DockingConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("targets_dir"))
        );
    }

    #[test]
    fn zero_embed_attempts_is_rejected() {
        let result = DockingConfigBuilder::new()
            .targets_dir(PathBuf::from("/data/targets"))
            .max_embed_attempts(0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "max_embed_attempts",
                ..
            })
        ));
    }
}
