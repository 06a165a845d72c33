//! Component lifecycle commands

use anyhow::Result;
use conduit_components::{
    failure_hint, AutoConfirm, Component, ComponentManager, DiscoveredCandidate, Error,
    InstallOutcome, Prompt, UninstallOutcome,
};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::{
    ComponentNameArgs, ComponentsCommands, ComponentsDiscoverArgs, ComponentsListArgs,
};
use crate::output;
use crate::prompt::DialoguerPrompt;

pub async fn run(cmd: ComponentsCommands, non_interactive: bool) -> Result<()> {
    match cmd {
        ComponentsCommands::List(args) => list(args),
        ComponentsCommands::Discover(args) => discover(args).await,
        ComponentsCommands::Install(args) => install(args, non_interactive).await,
        ComponentsCommands::Uninstall(args) => uninstall(args, non_interactive).await,
        ComponentsCommands::Enable(args) => set_enabled(args, true),
        ComponentsCommands::Disable(args) => set_enabled(args, false),
    }
}

#[derive(Tabled, serde::Serialize)]
struct InstalledRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "PACKAGE")]
    package: String,
    #[tabled(rename = "VERSION")]
    version: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "COMMANDS")]
    commands: String,
    #[tabled(rename = "INSTALLED")]
    installed: String,
}

impl From<&Component> for InstalledRow {
    fn from(component: &Component) -> Self {
        Self {
            name: component.name.clone(),
            package: component.package.clone(),
            version: component.version.clone().unwrap_or_else(|| "-".to_string()),
            status: component.status.to_string(),
            commands: join_or_dash(component.commands.iter().map(String::as_str)),
            installed: component.installed_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Tabled, serde::Serialize)]
struct CandidateRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "PACKAGE")]
    package: String,
    #[tabled(rename = "STARS")]
    stars: u64,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
}

impl From<&DiscoveredCandidate> for CandidateRow {
    fn from(candidate: &DiscoveredCandidate) -> Self {
        Self {
            name: candidate.name.clone(),
            package: candidate.full_name.clone(),
            stars: candidate.star_count,
            description: truncate(&candidate.description, 60),
        }
    }
}

fn join_or_dash<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

fn list(args: ComponentsListArgs) -> Result<()> {
    let manager = super::load_manager()?;
    let components = manager.list_installed()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&components)?);
        return Ok(());
    }

    if components.is_empty() {
        output::info("No components installed");
        output::info("Run: conduit components discover");
        return Ok(());
    }

    output::header("Installed components");
    let rows: Vec<InstalledRow> = components.iter().map(InstalledRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);

    Ok(())
}

async fn discover(args: ComponentsDiscoverArgs) -> Result<()> {
    let manager = super::load_manager()?;

    let pb = (!args.json).then(|| output::spinner("Searching for components..."));
    let result = manager.discover().await;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    let candidates = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    if candidates.is_empty() {
        output::info("No installable components found");
        return Ok(());
    }

    output::header("Available components");
    let rows: Vec<CandidateRow> = candidates.iter().map(CandidateRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
    output::info("Install with: conduit components install <name>");

    Ok(())
}

/// Pick the confirmation strategy and attach it to the manager
fn attach_prompt(
    manager: ComponentManager,
    non_interactive: bool,
    spinner: &indicatif::ProgressBar,
) -> ComponentManager {
    let interactive = !non_interactive
        && manager.interactive_mode().unwrap_or(true)
        && console::user_attended();

    let prompt: Arc<dyn Prompt> = if interactive {
        Arc::new(DialoguerPrompt::new(spinner.clone()))
    } else {
        Arc::new(AutoConfirm)
    };
    manager.with_prompt(prompt)
}

async fn install(args: ComponentNameArgs, non_interactive: bool) -> Result<()> {
    let pb = output::spinner(&format!("Installing {}...", args.name));
    let manager = attach_prompt(super::load_manager()?, non_interactive, &pb);

    let result = manager.install(&args.name).await;
    pb.finish_and_clear();

    match result {
        Ok(InstallOutcome::Installed(component)) => {
            output::success(&format!(
                "Installed {} ({})",
                component.name, component.package
            ));
            if let Some(version) = &component.version {
                output::kv("Version", version);
            }
            output::kv(
                "Commands",
                &join_or_dash(component.commands.iter().map(String::as_str)),
            );
            output::kv(
                "Service hooks",
                &join_or_dash(component.service_hooks.iter().map(String::as_str)),
            );
            Ok(())
        }
        Ok(InstallOutcome::Cancelled) => {
            output::info("Installation cancelled");
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.into())
        }
    }
}

async fn uninstall(args: ComponentNameArgs, non_interactive: bool) -> Result<()> {
    let pb = output::spinner(&format!("Removing {}...", args.name));
    let manager = attach_prompt(super::load_manager()?, non_interactive, &pb);

    let result = manager.uninstall(&args.name).await;
    pb.finish_and_clear();

    match result {
        Ok(UninstallOutcome::Removed(component)) => {
            output::success(&format!(
                "Uninstalled {} ({})",
                component.name, component.package
            ));
            Ok(())
        }
        Ok(UninstallOutcome::Cancelled) => {
            output::info("Uninstall cancelled");
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.into())
        }
    }
}

fn set_enabled(args: ComponentNameArgs, enabled: bool) -> Result<()> {
    let manager = super::load_manager()?;
    let component = manager.set_enabled(&args.name, enabled)?;

    let verb = if enabled { "Enabled" } else { "Disabled" };
    output::success(&format!(
        "{} {} ({})",
        verb, component.name, component.package
    ));
    Ok(())
}

/// Print guidance for failures the user can act on
fn report_failure(err: &Error) {
    if err.is_provenance_failure() {
        output::warning(
            "Only packages tagged as Conduit components on the package index or their repository can be installed",
        );
    }

    if let Error::ProcessFailure { stderr, .. } = err {
        if let Some(hint) = failure_hint(stderr) {
            output::warning(hint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use conduit_components::ComponentStatus;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_long_text() {
        let out = truncate("abcdefghijklmnop", 10);
        assert_eq!(out, "abcdefg...");
        assert_eq!(out.chars().count(), 10);
    }

    #[test]
    fn test_installed_row_placeholders() {
        let component = Component {
            name: "widgets".to_string(),
            package: "acme/widgets".to_string(),
            description: String::new(),
            version: None,
            commands: Default::default(),
            service_hooks: Default::default(),
            topics: Default::default(),
            url: String::new(),
            star_count: 0,
            status: ComponentStatus::Active,
            installed_at: Utc::now(),
            updated_at: None,
        };

        let row = InstalledRow::from(&component);
        assert_eq!(row.version, "-");
        assert_eq!(row.commands, "-");
        assert_eq!(row.status, "active");
    }
}
