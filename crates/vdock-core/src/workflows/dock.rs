//! The complete docking workflow for one ligand against one target.

use crate::core::io::pdb;
use crate::core::models::Molecule;
use crate::engine::config::DockingConfig;
use crate::engine::error::DockingError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::CommandRunner;
use crate::engine::target::Target;
use crate::engine::tasks::{self, normalize::LigandInput};
use crate::engine::workdir::WorkingDir;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, instrument};

/// A workflow failure, annotated with the identity of the ligand it
/// happened for. The identity is the canonical SMILES once normalization
/// has produced one, and the caller's raw input before that.
#[derive(Debug, Error)]
#[error("An error occurred for ligand '{ligand}': {source}")]
pub struct LigandError {
    pub ligand: String,
    #[source]
    pub source: DockingError,
}

#[derive(Debug, Clone)]
pub struct DockingRequest {
    pub input: LigandInput,
    pub target_name: String,
    /// Keep intermediate files here instead of a self-deleting scratch dir.
    pub working_dir: Option<PathBuf>,
}

/// The outcome of a successful run: the docked ligand with one conformer
/// per pose (best first) and the matching affinity scores.
#[derive(Debug, Clone)]
pub struct DockingResult {
    pub canonical_smiles: String,
    pub target_name: String,
    pub molecule: Molecule,
    pub scores: Vec<f64>,
}

impl DockingResult {
    /// Affinity of the best pose, in kcal/mol. A successful run always has
    /// at least one scored pose.
    pub fn score(&self) -> f64 {
        self.scores[0]
    }
}

#[instrument(skip_all, name = "docking_workflow", fields(target = %request.target_name))]
pub fn run(
    config: &DockingConfig,
    runner: &dyn CommandRunner,
    request: &DockingRequest,
    reporter: &ProgressReporter,
) -> Result<DockingResult, LigandError> {
    let mut ligand_identity = request.input.identity();
    execute(config, runner, request, reporter, &mut ligand_identity).map_err(|source| {
        LigandError {
            ligand: ligand_identity,
            source,
        }
    })
}

fn execute(
    config: &DockingConfig,
    runner: &dyn CommandRunner,
    request: &DockingRequest,
    reporter: &ProgressReporter,
    ligand_identity: &mut String,
) -> Result<DockingResult, DockingError> {
    // The target triple is validated before any ligand work is spent.
    let target = Target::load(&config.targets_dir, &request.target_name)?;
    let workdir = match &request.working_dir {
        Some(path) => WorkingDir::persistent(path)?,
        None => WorkingDir::temporary()?,
    };

    reporter.report(Progress::StageStart { name: "Normalize" });
    let (mut ligand, canonical_smiles) =
        tasks::normalize::run(&request.input, config.max_heavy_atoms)?;
    *ligand_identity = canonical_smiles.clone();
    info!(smiles = %canonical_smiles, "Ligand accepted");
    reporter.report(Progress::StageFinish);

    reporter.report(Progress::StageStart { name: "Embed" });
    let conformer_index =
        tasks::embed::run(&mut ligand, config.seed, config.max_embed_attempts)?;
    reporter.report(Progress::StageFinish);

    reporter.report(Progress::StageStart { name: "Refine" });
    tasks::refine::run(&mut ligand, conformer_index)?;
    reporter.report(Progress::StageFinish);

    // The structure is protonated on the written file, and the result is
    // read back as the reference every docked pose is verified against.
    reporter.report(Progress::StageStart { name: "Protonate" });
    {
        let mut writer = BufWriter::new(File::create(workdir.ligand_pdb())?);
        pdb::write_ligand(&mut writer, &ligand, conformer_index)?;
        writer.flush()?;
    }
    tasks::convert::protonate_ligand(runner, config, &workdir)?;
    let prepared = {
        let mut reader = BufReader::new(File::open(workdir.ligand_pdb())?);
        pdb::read_molecule(&mut reader)?
    };
    reporter.report(Progress::StageFinish);

    reporter.report(Progress::StageStart { name: "Convert" });
    tasks::convert::ligand_to_pdbqt(runner, config, &workdir)?;
    reporter.report(Progress::StageFinish);

    reporter.report(Progress::StageStart { name: "Dock" });
    tasks::invoke::run(runner, config, &target, &workdir)?;
    reporter.report(Progress::StageFinish);

    reporter.report(Progress::StageStart { name: "Verify" });
    tasks::convert::poses_to_pdb(runner, config, &workdir)?;
    let verified = tasks::verify::run(&prepared, &workdir)?;
    reporter.report(Progress::StageFinish);

    info!(score = verified.scores[0], poses = verified.scores.len(), "Docking finished");
    Ok(DockingResult {
        canonical_smiles,
        target_name: target.name,
        molecule: verified.molecule,
        scores: verified.scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles;
    use crate::engine::config::DockingConfigBuilder;
    use crate::engine::runner::{CommandOutput, CommandSpec, EngineFailure};
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const CONF: &str = "\
center_x = 0.0
center_y = 0.0
center_z = 0.0
size_x = 20.0
size_y = 20.0
size_z = 20.0
";

    const DOCKED_ETHANOL: &str = "\
MODEL        1
HETATM    1  C1  UNL A   1       0.000   0.000   0.000  1.00  0.00           C
HETATM    2  C2  UNL A   1       1.520   0.000   0.000  1.00  0.00           C
HETATM    3  O1  UNL A   1       2.180   1.250   0.000  1.00  0.00           O
ENDMDL
MODEL        2
HETATM    1  C1  UNL A   1       0.200   0.100   0.000  1.00  0.00           C
HETATM    2  C2  UNL A   1       1.700   0.100   0.000  1.00  0.00           C
HETATM    3  O1  UNL A   1       2.400   1.300   0.000  1.00  0.00           O
ENDMDL
CONECT    1    2
CONECT    2    3
END
";

    const SCORED_OUT: &str = "\
REMARK VINA RESULT:      -4.9      0.000      0.000
REMARK VINA RESULT:      -4.3      1.100      2.000
";

    /// Plays both external tools from canned output, keyed on the argument
    /// shapes the tasks produce.
    struct FakeTools {
        invocations: Mutex<Vec<String>>,
    }

    impl FakeTools {
        fn new() -> Self {
            Self {
                invocations: Mutex::new(Vec::new()),
            }
        }

        fn output_path(spec: &CommandSpec, flag: &str) -> PathBuf {
            spec.args
                .iter()
                .skip_while(|a| a.to_str() != Some(flag))
                .nth(1)
                .map(PathBuf::from)
                .expect("output flag present")
        }
    }

    impl CommandRunner for FakeTools {
        fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, EngineFailure> {
            let args: Vec<String> = spec
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();
            self.invocations
                .lock()
                .unwrap()
                .push(format!("{} {}", spec.program.display(), args.join(" ")));

            if args.contains(&"-p".to_string()) {
                // In-place protonation; neutral ethanol is left as written.
                return Ok(CommandOutput::default());
            }
            if args.contains(&"-opdbqt".to_string()) {
                fs::write(Self::output_path(spec, "-O"), "fake pdbqt\n").unwrap();
            } else if args.contains(&"-ipdbqt".to_string()) {
                fs::write(Self::output_path(spec, "-O"), DOCKED_ETHANOL).unwrap();
            } else {
                fs::write(Self::output_path(spec, "--out"), SCORED_OUT).unwrap();
                fs::write(Self::output_path(spec, "--log"), "engine log\n").unwrap();
            }
            Ok(CommandOutput::default())
        }
    }

    fn write_target(dir: &Path, name: &str) {
        fs::write(dir.join(format!("{name}_target.pdb")), "END\n").unwrap();
        fs::write(dir.join(format!("{name}_target.pdbqt")), "END\n").unwrap();
        fs::write(dir.join(format!("{name}_conf.txt")), CONF).unwrap();
    }

    fn config(targets: &Path) -> DockingConfig {
        DockingConfigBuilder::new()
            .targets_dir(targets.to_path_buf())
            .build()
            .unwrap()
    }

    #[test]
    fn ethanol_docks_end_to_end_with_fake_tools() {
        let targets = TempDir::new().unwrap();
        write_target(targets.path(), "ABL1");
        let tools = FakeTools::new();
        let request = DockingRequest {
            input: LigandInput::Smiles("OCC".to_string()),
            target_name: "ABL1".to_string(),
            working_dir: None,
        };

        let result = run(
            &config(targets.path()),
            &tools,
            &request,
            &ProgressReporter::new(),
        )
        .unwrap();

        let expected = crate::core::chem::canonical::write(&smiles::parse("OCC").unwrap());
        assert_eq!(result.canonical_smiles, expected);
        assert_eq!(result.scores, vec![-4.9, -4.3]);
        assert!((result.score() - -4.9).abs() < 1e-12);
        assert_eq!(result.molecule.conformer_count(), 2);

        let invocations = tools.invocations.lock().unwrap();
        assert_eq!(invocations.len(), 4);
        // Protonation runs on the written structure, after embedding and
        // refinement, and rewrites the same file in place.
        assert!(invocations[0].contains("-ipdb"));
        assert!(invocations[0].contains("-p 7.4"));
        assert_eq!(invocations[0].matches("ligand.pdb").count(), 2);
        assert!(invocations[1].contains("-opdbqt"));
        assert!(invocations[2].starts_with("vina"));
    }

    #[test]
    fn stage_progress_is_reported_in_order() {
        let targets = TempDir::new().unwrap();
        write_target(targets.path(), "ABL1");
        let tools = FakeTools::new();
        let request = DockingRequest {
            input: LigandInput::Smiles("CCO".to_string()),
            target_name: "ABL1".to_string(),
            working_dir: None,
        };

        let stages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::StageStart { name } = event {
                stages.lock().unwrap().push(name);
            }
        }));
        run(&config(targets.path()), &tools, &request, &reporter).unwrap();
        assert_eq!(
            *stages.lock().unwrap(),
            vec!["Normalize", "Embed", "Refine", "Protonate", "Convert", "Dock", "Verify"]
        );
    }

    #[test]
    fn persistent_working_dir_keeps_artifacts() {
        let targets = TempDir::new().unwrap();
        write_target(targets.path(), "ABL1");
        let scratch = TempDir::new().unwrap();
        let run_dir = scratch.path().join("run");
        let tools = FakeTools::new();
        let request = DockingRequest {
            input: LigandInput::Smiles("CCO".to_string()),
            target_name: "ABL1".to_string(),
            working_dir: Some(run_dir.clone()),
        };

        run(
            &config(targets.path()),
            &tools,
            &request,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(run_dir.join("ligand.pdb").is_file());
        assert!(run_dir.join("vina.out").is_file());
        assert!(run_dir.join("docked_ligand.pdb").is_file());
    }

    #[test]
    fn errors_carry_the_canonical_ligand_identity() {
        let targets = TempDir::new().unwrap();
        write_target(targets.path(), "ABL1");

        struct BrokenEngine;
        impl CommandRunner for BrokenEngine {
            fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, EngineFailure> {
                let args: Vec<String> = spec
                    .args
                    .iter()
                    .map(|a| a.to_string_lossy().into_owned())
                    .collect();
                if args.contains(&"-p".to_string()) {
                    return Ok(CommandOutput::default());
                }
                if args.contains(&"-opdbqt".to_string()) {
                    fs::write(FakeTools::output_path(spec, "-O"), "fake pdbqt\n").unwrap();
                    return Ok(CommandOutput::default());
                }
                Err(EngineFailure::Failed {
                    program: "vina".to_string(),
                    status: 1,
                    stderr: "boom".to_string(),
                })
            }
        }

        let request = DockingRequest {
            input: LigandInput::Smiles("OCC".to_string()),
            target_name: "ABL1".to_string(),
            working_dir: None,
        };
        let error = run(
            &config(targets.path()),
            &BrokenEngine,
            &request,
            &ProgressReporter::new(),
        )
        .unwrap_err();
        let expected = crate::core::chem::canonical::write(&smiles::parse("OCC").unwrap());
        assert_eq!(error.ligand, expected);
        assert!(matches!(error.source, DockingError::Engine(_)));
        assert!(error.to_string().contains("An error occurred for ligand"));
    }

    #[test]
    fn unknown_target_fails_before_any_tool_runs() {
        let targets = TempDir::new().unwrap();
        let tools = FakeTools::new();
        let request = DockingRequest {
            input: LigandInput::Smiles("CCO".to_string()),
            target_name: "NOPE".to_string(),
            working_dir: None,
        };
        let error = run(
            &config(targets.path()),
            &tools,
            &request,
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(error.source, DockingError::Target(_)));
        assert!(tools.invocations.lock().unwrap().is_empty());
    }
}
