use crate::cli::TargetsArgs;
use crate::config::{self, FileConfig, Overrides};
use crate::error::Result;
use vdock::engine::target::{self, Target};

pub fn run(args: TargetsArgs) -> Result<()> {
    let file_config = FileConfig::load_optional(&args.config)?;
    let overrides = Overrides {
        targets_dir: args.targets_dir.clone(),
        ..Default::default()
    };
    let docking_config = config::resolve(file_config, overrides)?;

    let names = target::list_target_names(&docking_config.targets_dir)?;
    if names.is_empty() {
        println!(
            "No prepared targets found in {}",
            docking_config.targets_dir.display()
        );
        return Ok(());
    }

    for name in names {
        if args.detail {
            let target = Target::load(&docking_config.targets_dir, &name)
                .map_err(vdock::engine::error::DockingError::from)?;
            let b = &target.search_box;
            println!(
                "{:<12} center ({:7.2}, {:7.2}, {:7.2})  size ({:5.1}, {:5.1}, {:5.1})",
                target.name, b.center.x, b.center.y, b.center.z, b.size.x, b.size.y, b.size.z
            );
        } else {
            println!("{name}");
        }
    }
    Ok(())
}
