use crate::config::Config;
use crate::elements::builtin_registry;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use dashcraft_config::{from_text, to_text, Value};
use dashcraft_editor::Workbench;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// YAML element configuration
    pub input: PathBuf,

    /// Set a field before rendering (KEY=VALUE, VALUE read as JSON when it parses)
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Print the final configuration as well
    #[arg(long)]
    pub show_config: bool,
}

pub async fn preview(args: PreviewArgs, config: &Config) -> Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;
    let element = from_text(&source)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;

    let mut bench = Workbench::new(builtin_registry()?, &config.editor);
    bench.open(element).await;

    println!("👁  {} {}", "Previewing".green().bold(), args.input.display());

    for assignment in &args.set {
        let (key, value) = parse_assignment(assignment)?;
        let current = bench
            .session()
            .config()
            .cloned()
            .context("No configuration loaded")?;
        let updated = current.with_field(key, Some(value))?;
        bench.replace(updated).await?;
        bench.commit();
        println!("   {} {}", "Set".cyan(), assignment);
    }

    let Some(current) = bench.session().config().cloned() else {
        return Err(anyhow::anyhow!("No configuration loaded"));
    };
    let resolution = bench.session().resolver().resolve(current.element_type());
    println!(
        "   Type: {} → {}{}",
        current.element_type(),
        resolution.tag,
        if resolution.is_pending() {
            " (not registered)".yellow().to_string()
        } else {
            String::new()
        }
    );
    println!();

    let rendered = bench.preview().render();
    if bench.preview().is_error() {
        println!("{}", rendered.red());
    } else {
        println!("{}", rendered);
    }

    if args.show_config {
        println!();
        println!("{}", "Configuration:".bright_white().bold());
        print!("{}", to_text(&current)?);
    }

    Ok(())
}

/// Split `key=value`. Values that parse as JSON keep their type; anything
/// else is a string.
pub(crate) fn parse_assignment(assignment: &str) -> Result<(&str, Value)> {
    let (key, raw) = assignment
        .split_once('=')
        .with_context(|| format!("Expected KEY=VALUE, got '{}'", assignment))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow::anyhow!("Empty key in '{}'", assignment));
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assignment_types() {
        assert_eq!(parse_assignment("x=5").unwrap(), ("x", json!(5)));
        assert_eq!(parse_assignment("on=true").unwrap(), ("on", json!(true)));
        assert_eq!(parse_assignment("title=Kitchen").unwrap(), ("title", json!("Kitchen")));
        assert_eq!(
            parse_assignment("entities=[\"a.b\"]").unwrap(),
            ("entities", json!(["a.b"]))
        );
    }

    #[test]
    fn test_parse_assignment_errors() {
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=5").is_err());
    }
}
