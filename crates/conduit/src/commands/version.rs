//! `conduit version`

use anyhow::Result;

use crate::cli::VersionArgs;
use crate::output;
use crate::version::BuildInfo;

pub fn run(args: VersionArgs) -> Result<()> {
    let info = BuildInfo::current();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", info.summary());
    if let Some(built_at) = info.built_at {
        output::kv("Built", built_at);
    }
    if let Some(profile) = info.profile {
        output::kv("Profile", profile);
    }
    if info.is_dirty() {
        output::warning("Built from a working tree with uncommitted changes");
    }
    Ok(())
}
