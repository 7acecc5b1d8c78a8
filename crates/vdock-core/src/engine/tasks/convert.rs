//! Format bridging through the external conversion tool.
//!
//! Three conversions are needed per run: protonating the written ligand
//! structure in place at assay pH, turning the prepared PDB into the
//! engine's PDBQT input, and turning the scored PDBQT output back into PDB
//! for verification. The tool is only ever reached through the injected
//! [`CommandRunner`], so none of this requires it at test time.

use crate::engine::config::DockingConfig;
use crate::engine::error::DockingError;
use crate::engine::runner::{CommandRunner, CommandSpec};
use crate::engine::workdir::WorkingDir;
use std::path::Path;
use tracing::debug;

fn tool_name(config: &DockingConfig) -> String {
    config.obabel_binary.display().to_string()
}

/// Protonates the written ligand structure in place for the configured pH,
/// adding and adjusting hydrogens on the file itself. The hydrogens removed
/// after embedding come back here, in the states appropriate for the assay.
pub fn protonate_ligand(
    runner: &dyn CommandRunner,
    config: &DockingConfig,
    workdir: &WorkingDir,
) -> Result<(), DockingError> {
    let spec = CommandSpec::new(&config.obabel_binary)
        .arg("-ipdb")
        .arg(workdir.ligand_pdb())
        .arg("-opdb")
        .arg("-O")
        .arg(workdir.ligand_pdb())
        .arg("-p")
        .arg(format!("{}", config.ph))
        .timeout(config.timeout);
    runner.run(&spec)?;
    debug!(ph = config.ph, "Ligand protonated in place");
    require_nonempty(config, &workdir.ligand_pdb())
}

/// Converts the prepared ligand PDB into PDBQT with Gasteiger charges.
pub fn ligand_to_pdbqt(
    runner: &dyn CommandRunner,
    config: &DockingConfig,
    workdir: &WorkingDir,
) -> Result<(), DockingError> {
    let spec = CommandSpec::new(&config.obabel_binary)
        .arg("-ipdb")
        .arg(workdir.ligand_pdb())
        .arg("-opdbqt")
        .arg("-O")
        .arg(workdir.ligand_pdbqt())
        .arg("--partialcharge")
        .arg("gasteiger")
        .timeout(config.timeout);
    runner.run(&spec)?;
    require_nonempty(config, &workdir.ligand_pdbqt())
}

/// Converts the engine's scored PDBQT output back to PDB. Bond perception
/// is disabled (`-ab`); connectivity is recovered afterwards from the input
/// molecule, not guessed from docked geometry.
pub fn poses_to_pdb(
    runner: &dyn CommandRunner,
    config: &DockingConfig,
    workdir: &WorkingDir,
) -> Result<(), DockingError> {
    let spec = CommandSpec::new(&config.obabel_binary)
        .arg("-ipdbqt")
        .arg(workdir.engine_out())
        .arg("-opdb")
        .arg("-O")
        .arg(workdir.docked_ligand_pdb())
        .arg("-ab")
        .timeout(config.timeout);
    runner.run(&spec)?;
    require_nonempty(config, &workdir.docked_ligand_pdb())
}

fn require_nonempty(config: &DockingConfig, path: &Path) -> Result<(), DockingError> {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(DockingError::Conversion {
            tool: tool_name(config),
            detail: format!("expected output file {} is missing or empty", path.display()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::DockingConfigBuilder;
    use crate::engine::runner::{CommandOutput, EngineFailure};
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct ScriptedRunner {
        stdout: &'static str,
        specs: Mutex<Vec<CommandSpec>>,
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, EngineFailure> {
            self.specs.lock().unwrap().push(spec.clone());
            Ok(CommandOutput {
                stdout: self.stdout.to_string(),
                stderr: String::new(),
            })
        }
    }

    fn config() -> DockingConfig {
        DockingConfigBuilder::new()
            .targets_dir(PathBuf::from("/data/targets"))
            .build()
            .unwrap()
    }

    #[test]
    fn protonation_rewrites_the_ligand_file_in_place() {
        let runner = ScriptedRunner {
            stdout: "",
            specs: Mutex::new(Vec::new()),
        };
        let workdir = WorkingDir::temporary().unwrap();
        std::fs::write(workdir.ligand_pdb(), "HETATM ...\nEND\n").unwrap();
        protonate_ligand(&runner, &config(), &workdir).unwrap();

        let specs = runner.specs.lock().unwrap();
        let args: Vec<String> = specs[0]
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let ligand = workdir.ligand_pdb().to_string_lossy().into_owned();
        assert_eq!(
            args,
            vec![
                "-ipdb".to_string(),
                ligand.clone(),
                "-opdb".to_string(),
                "-O".to_string(),
                ligand,
                "-p".to_string(),
                "7.4".to_string(),
            ]
        );
    }

    #[test]
    fn protonation_leaving_no_file_is_a_conversion_error() {
        let runner = ScriptedRunner {
            stdout: "",
            specs: Mutex::new(Vec::new()),
        };
        let workdir = WorkingDir::temporary().unwrap();
        assert!(matches!(
            protonate_ligand(&runner, &config(), &workdir),
            Err(DockingError::Conversion { .. })
        ));
    }

    #[test]
    fn missing_conversion_output_file_is_detected() {
        let runner = ScriptedRunner {
            stdout: "",
            specs: Mutex::new(Vec::new()),
        };
        let workdir = WorkingDir::temporary().unwrap();
        assert!(matches!(
            ligand_to_pdbqt(&runner, &config(), &workdir),
            Err(DockingError::Conversion { .. })
        ));
    }
}
