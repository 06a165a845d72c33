//! Global settings commands

use anyhow::Result;
use serde_json::Value;

use crate::cli::{SettingsCommands, SettingsGetArgs, SettingsKeyArgs, SettingsSetArgs};
use crate::output;

pub fn run(cmd: SettingsCommands) -> Result<()> {
    match cmd {
        SettingsCommands::Get(args) => get(args),
        SettingsCommands::Set(args) => set(args),
        SettingsCommands::Delete(args) => delete(args),
        SettingsCommands::List => list(),
    }
}

/// Interpret a command-line value as JSON, falling back to a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn get(args: SettingsGetArgs) -> Result<()> {
    let manager = super::load_manager()?;
    let default = args.default.as_deref().map(parse_value).unwrap_or(Value::Null);
    let value = manager.get_setting(&args.key, default)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn set(args: SettingsSetArgs) -> Result<()> {
    let manager = super::load_manager()?;
    let value = parse_value(&args.value);
    manager.set_setting(&args.key, value.clone())?;
    output::success(&format!("Set {} = {}", args.key, value));
    Ok(())
}

fn delete(args: SettingsKeyArgs) -> Result<()> {
    let manager = super::load_manager()?;
    if manager.store().delete_setting(&args.key)? {
        output::success(&format!("Deleted {}", args.key));
    } else {
        output::warning(&format!("Setting '{}' is not set", args.key));
    }
    Ok(())
}

fn list() -> Result<()> {
    let manager = super::load_manager()?;
    let settings = manager.store().get_all_settings()?;

    if settings.is_empty() {
        output::info("No settings configured");
        return Ok(());
    }

    output::header("Settings");
    for (key, value) in &settings {
        output::kv(key, &value.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value_json() {
        assert_eq!(parse_value("false"), json!(false));
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value(r#"{"a":[1]}"#), json!({"a": [1]}));
    }

    #[test]
    fn test_parse_value_plain_string() {
        assert_eq!(parse_value("dark"), json!("dark"));
        assert_eq!(parse_value("\"quoted\""), json!("quoted"));
    }
}
