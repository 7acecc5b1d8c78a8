//! Scratch directory management for a single docking run.
//!
//! All intermediate artifacts of one run live in one directory with fixed
//! file names, so a failed run can be inspected by pointing the pipeline at
//! a persistent directory instead of the default self-deleting one.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory holding the intermediate files of one docking run. The
/// temporary variant is removed when dropped; the persistent variant is
/// left on disk for inspection.
#[derive(Debug)]
pub enum WorkingDir {
    Temporary(TempDir),
    Persistent(PathBuf),
}

impl WorkingDir {
    pub fn temporary() -> io::Result<Self> {
        Ok(Self::Temporary(TempDir::with_prefix("vdock-")?))
    }

    pub fn persistent(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        std::fs::create_dir_all(&path)?;
        Ok(Self::Persistent(path))
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Temporary(dir) => dir.path(),
            Self::Persistent(path) => path,
        }
    }

    /// Prepared ligand coordinates, written before conversion.
    pub fn ligand_pdb(&self) -> PathBuf {
        self.path().join("ligand.pdb")
    }

    /// Converted ligand handed to the docking engine.
    pub fn ligand_pdbqt(&self) -> PathBuf {
        self.path().join("ligand.pdbqt")
    }

    /// Engine text log.
    pub fn engine_log(&self) -> PathBuf {
        self.path().join("vina.log")
    }

    /// Raw scored poses emitted by the engine.
    pub fn engine_out(&self) -> PathBuf {
        self.path().join("vina.out")
    }

    /// Poses converted back for verification.
    pub fn docked_ligand_pdb(&self) -> PathBuf {
        self.path().join("docked_ligand.pdb")
    }
}
