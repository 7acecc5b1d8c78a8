//! Docking engine invocation.

use crate::engine::config::DockingConfig;
use crate::engine::error::DockingError;
use crate::engine::runner::{CommandRunner, CommandSpec};
use crate::engine::target::Target;
use crate::engine::workdir::WorkingDir;
use tracing::{debug, info};

/// Runs the docking engine for one prepared ligand against one target. The
/// engine writes its own log and pose output into the working directory;
/// an empty pose file after a clean exit is still a failure.
pub fn run(
    runner: &dyn CommandRunner,
    config: &DockingConfig,
    target: &Target,
    workdir: &WorkingDir,
) -> Result<(), DockingError> {
    let mut spec = CommandSpec::new(&config.vina_binary)
        .arg("--receptor")
        .arg(&target.receptor_pdbqt)
        .arg("--config")
        .arg(&target.conf_path)
        .arg("--ligand")
        .arg(workdir.ligand_pdbqt())
        .arg("--log")
        .arg(workdir.engine_log())
        .arg("--out")
        .arg(workdir.engine_out())
        .arg("--seed")
        .arg(format!("{}", config.seed))
        .current_dir(workdir.path())
        .timeout(config.timeout);
    if let Some(cpus) = config.num_cpus {
        spec = spec.arg("--cpu").arg(format!("{cpus}"));
    }

    info!(target = %target.name, seed = config.seed, "Invoking docking engine");
    let output = runner.run(&spec)?;
    debug!(stdout_bytes = output.stdout.len(), "Engine finished");

    let out_size = std::fs::metadata(workdir.engine_out())
        .map(|m| m.len())
        .unwrap_or(0);
    if out_size == 0 {
        return Err(DockingError::EmptyOutput);
    }
    Ok(())
}
