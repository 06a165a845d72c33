//! Storage bootstrap command

use anyhow::Result;

use crate::cli::{StorageCommands, StorageInitArgs};
use crate::output;

pub fn run(cmd: StorageCommands) -> Result<()> {
    match cmd {
        StorageCommands::Init(args) => init(args),
    }
}

fn init(args: StorageInitArgs) -> Result<()> {
    let manager = super::load_manager()?;
    let store_path = manager.store().path().display().to_string();

    let init = manager.initialize_storage(args.migrate)?;
    if init.created {
        output::success(&format!("Created component storage at {}", store_path));
    } else {
        output::info(&format!("Component storage already exists at {}", store_path));
    }

    if let Some(report) = init.migration {
        if report.components_migrated == 0 && report.settings_migrated == 0 {
            output::info(&format!(
                "Nothing to migrate from {}",
                manager.store().legacy_path().display()
            ));
        } else {
            output::success("Migrated legacy configuration");
            output::kv("Components", &report.components_migrated.to_string());
            output::kv("Settings", &report.settings_migrated.to_string());
        }
    }

    Ok(())
}
