use crate::cli::DockArgs;
use crate::config::{self, FileConfig, Overrides};
use crate::error::Result;
use crate::ui::CliProgressHandler;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;
use vdock::core::io::pdb;
use vdock::engine::progress::ProgressReporter;
use vdock::engine::runner::SystemRunner;
use vdock::engine::tasks::normalize::LigandInput;
use vdock::workflows::dock::{self as dock_workflow, DockingRequest, DockingResult};

#[derive(Serialize)]
struct ScoreRecord<'a> {
    target: &'a str,
    smiles: &'a str,
    pose: usize,
    score: f64,
}

pub fn run(args: DockArgs, quiet: bool) -> Result<()> {
    let file_config = FileConfig::load_optional(&args.config)?;
    let overrides = Overrides {
        targets_dir: args.targets_dir.clone(),
        seed: args.seed,
        cpus: args.cpus,
        timeout_seconds: args.timeout,
    };
    let docking_config = config::resolve(file_config, overrides)?;

    let input = if args.inchi {
        LigandInput::Inchi(args.ligand.clone())
    } else {
        LigandInput::detect(&args.ligand)
    };
    let request = DockingRequest {
        input,
        target_name: args.target.clone(),
        working_dir: args.keep.clone(),
    };

    let handler = CliProgressHandler::new(quiet);
    let reporter = ProgressReporter::with_callback(handler.callback());
    let outcome = dock_workflow::run(&docking_config, &SystemRunner, &request, &reporter);
    handler.finalize();
    let result = outcome?;

    print_result(&result, quiet);

    if let Some(path) = &args.output {
        write_poses(path, &result)?;
        info!(path = %path.display(), "Docked poses written");
    }
    if let Some(path) = &args.scores_csv {
        append_scores_csv(path, &result)?;
        info!(path = %path.display(), "Scores appended");
    }
    Ok(())
}

fn print_result(result: &DockingResult, quiet: bool) {
    if quiet {
        // Machine-friendly single line: just the best score.
        println!("{:.2}", result.score());
        return;
    }
    println!("Ligand: {}", result.canonical_smiles);
    println!(
        "Formula: {} ({:.2} g/mol)",
        result.molecule.molecular_formula(),
        result.molecule.molecular_weight()
    );
    println!("Target: {}", result.target_name);
    println!();
    for (index, score) in result.scores.iter().enumerate() {
        println!("  pose {:>2}: {:>8.2} kcal/mol", index + 1, score);
    }
    println!();
    println!("Best score: {:.2} kcal/mol", result.score());
}

fn write_poses(path: &Path, result: &DockingResult) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    pdb::write_poses(&mut writer, &result.molecule).map_err(vdock::engine::error::DockingError::from)?;
    writer.flush()?;
    Ok(())
}

/// Appends one row per pose, creating the file with a header first if it
/// does not exist yet.
fn append_scores_csv(path: &Path, result: &DockingResult) -> Result<()> {
    let fresh = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(fresh)
        .from_writer(file);
    for (index, score) in result.scores.iter().enumerate() {
        writer.serialize(ScoreRecord {
            target: &result.target_name,
            smiles: &result.canonical_smiles,
            pose: index + 1,
            score: *score,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vdock::core::chem::smiles;
    use vdock::core::models::Molecule;

    fn result_fixture() -> DockingResult {
        let mut molecule: Molecule = smiles::parse("CCO").unwrap();
        molecule.add_hydrogens();
        let conformer = vdock::core::chem::embed::generate_conformer(
            &molecule,
            7,
            &vdock::core::chem::embed::EmbedParams::default(),
        )
        .unwrap();
        molecule.add_conformer(conformer);
        DockingResult {
            canonical_smiles: "CCO".to_string(),
            target_name: "ABL1".to_string(),
            molecule,
            scores: vec![-4.9, -4.3],
        }
    }

    #[test]
    fn csv_export_appends_without_duplicate_headers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.csv");
        let result = result_fixture();
        append_scores_csv(&path, &result).unwrap();
        append_scores_csv(&path, &result).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header_lines = content
            .lines()
            .filter(|l| l.starts_with("target,"))
            .count();
        assert_eq!(header_lines, 1);
        assert_eq!(content.lines().count(), 5);
        assert!(content.contains("ABL1,CCO,1,-4.9"));
    }

    #[test]
    fn pose_export_writes_a_model_per_pose() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("poses.pdb");
        write_poses(&path, &result_fixture()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().filter(|l| l.starts_with("MODEL")).count(), 1);
        assert_eq!(content.lines().filter(|l| l.starts_with("ENDMDL")).count(), 1);
        assert!(content.lines().any(|l| l.starts_with("CONECT")));
    }
}
