//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};

/// Conduit - discover, install and manage CLI components
#[derive(Parser, Debug)]
#[command(name = "conduit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Never prompt for confirmation
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// Component management
    #[command(subcommand)]
    Components(ComponentsCommands),

    /// Component storage management
    #[command(subcommand)]
    Storage(StorageCommands),

    /// Global settings
    #[command(subcommand)]
    Settings(SettingsCommands),
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Component commands
#[derive(Subcommand, Debug)]
pub enum ComponentsCommands {
    /// List installed components
    List(ComponentsListArgs),

    /// Discover installable components
    Discover(ComponentsDiscoverArgs),

    /// Install a discovered component
    Install(ComponentNameArgs),

    /// Uninstall an installed component
    Uninstall(ComponentNameArgs),

    /// Re-activate a disabled component
    Enable(ComponentNameArgs),

    /// Deactivate a component without removing its package
    Disable(ComponentNameArgs),
}

#[derive(Args, Debug)]
pub struct ComponentsListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ComponentsDiscoverArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ComponentNameArgs {
    /// Component name or vendor/package identifier
    pub name: String,
}

// Storage commands
#[derive(Subcommand, Debug)]
pub enum StorageCommands {
    /// Create the component state document
    Init(StorageInitArgs),
}

#[derive(Args, Debug)]
pub struct StorageInitArgs {
    /// Import components and settings from the legacy configuration file
    #[arg(long)]
    pub migrate: bool,
}

// Settings commands
#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Read a setting
    Get(SettingsGetArgs),

    /// Write a setting
    Set(SettingsSetArgs),

    /// Remove a setting
    Delete(SettingsKeyArgs),

    /// Show all settings
    List,
}

#[derive(Args, Debug)]
pub struct SettingsGetArgs {
    /// Setting key
    pub key: String,

    /// Value returned when the key is absent (JSON, or a plain string)
    #[arg(long)]
    pub default: Option<String>,
}

#[derive(Args, Debug)]
pub struct SettingsKeyArgs {
    /// Setting key
    pub key: String,
}

#[derive(Args, Debug)]
pub struct SettingsSetArgs {
    /// Setting key
    pub key: String,

    /// Value (JSON, or a plain string)
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install_non_interactive() {
        let cli = Cli::parse_from(["conduit", "components", "install", "widgets", "--non-interactive"]);
        assert!(cli.non_interactive);
        match cli.command {
            Commands::Components(ComponentsCommands::Install(args)) => {
                assert_eq!(args.name, "widgets")
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_disable() {
        let cli = Cli::parse_from(["conduit", "components", "disable", "acme/widgets"]);
        match cli.command {
            Commands::Components(ComponentsCommands::Disable(args)) => {
                assert_eq!(args.name, "acme/widgets")
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_storage_init_migrate() {
        let cli = Cli::parse_from(["conduit", "storage", "init", "--migrate"]);
        assert!(matches!(
            cli.command,
            Commands::Storage(StorageCommands::Init(StorageInitArgs { migrate: true }))
        ));
    }

    #[test]
    fn test_parse_settings_get_with_default() {
        let cli = Cli::parse_from(["conduit", "settings", "get", "theme", "--default", "\"dark\""]);
        match cli.command {
            Commands::Settings(SettingsCommands::Get(args)) => {
                assert_eq!(args.key, "theme");
                assert_eq!(args.default.as_deref(), Some("\"dark\""));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
