//! Prepared docking targets.
//!
//! A target is a receptor prepared ahead of time as a triple of files in
//! the targets directory, keyed by name:
//!
//! ```text
//! {name}_target.pdb     receptor coordinates
//! {name}_target.pdbqt   receptor in engine format
//! {name}_conf.txt       search-box configuration
//! ```
//!
//! Loading validates the whole triple and parses the search box eagerly, so
//! a misprepared target fails before any ligand work is spent on it.

use crate::core::io::conf::{self, ConfError, SearchBox};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Unknown target '{name}': no such target in {dir}")]
    NotFound { name: String, dir: PathBuf },
    #[error("Target '{name}' is incomplete: missing {path}")]
    MissingFile { name: String, path: PathBuf },
    #[error("Search box of target '{name}' is invalid: {source}")]
    Conf {
        name: String,
        #[source]
        source: ConfError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub receptor_pdb: PathBuf,
    pub receptor_pdbqt: PathBuf,
    pub conf_path: PathBuf,
    pub search_box: SearchBox,
}

impl Target {
    /// Loads and validates a target triple from `targets_dir`.
    pub fn load(targets_dir: &Path, name: &str) -> Result<Self, TargetError> {
        let receptor_pdb = targets_dir.join(format!("{name}_target.pdb"));
        let receptor_pdbqt = targets_dir.join(format!("{name}_target.pdbqt"));
        let conf_path = targets_dir.join(format!("{name}_conf.txt"));

        if !receptor_pdb.exists() && !receptor_pdbqt.exists() && !conf_path.exists() {
            return Err(TargetError::NotFound {
                name: name.to_string(),
                dir: targets_dir.to_path_buf(),
            });
        }
        for path in [&receptor_pdb, &receptor_pdbqt, &conf_path] {
            if !path.exists() {
                return Err(TargetError::MissingFile {
                    name: name.to_string(),
                    path: path.clone(),
                });
            }
        }

        let mut reader = BufReader::new(File::open(&conf_path)?);
        let search_box = conf::parse_search_box(&mut reader).map_err(|source| match source {
            ConfError::Io(err) => TargetError::Io(err),
            source => TargetError::Conf {
                name: name.to_string(),
                source,
            },
        })?;

        Ok(Self {
            name: name.to_string(),
            receptor_pdb,
            receptor_pdbqt,
            conf_path,
            search_box,
        })
    }
}

/// Lists the names of all targets in `targets_dir` that have a complete
/// triple, sorted alphabetically.
pub fn list_target_names(targets_dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(targets_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name
            .to_str()
            .and_then(|f| f.strip_suffix("_conf.txt"))
        else {
            continue;
        };
        let complete = targets_dir.join(format!("{name}_target.pdb")).exists()
            && targets_dir.join(format!("{name}_target.pdbqt")).exists();
        if complete {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
