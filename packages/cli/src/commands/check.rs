use crate::config::Config;
use crate::elements::builtin_registry;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use dashcraft_config::from_text;
use dashcraft_editor::EditorSession;
use dashcraft_registry::Factory;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// YAML element configuration to check
    pub input: PathBuf,

    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,
}

/// What a check found
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Report {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub async fn check(args: CheckArgs, config: &Config) -> Result<()> {
    println!("🔍 {} {}", "Checking".green().bold(), args.input.display());

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;
    let report = inspect(&source, config).await?;

    for error in &report.errors {
        println!("   {} {}", "✗".red(), error);
    }
    for warning in &report.warnings {
        println!("   {} {}", "⚠".yellow(), warning);
    }

    println!();
    if !report.errors.is_empty() {
        return Err(anyhow::anyhow!("{} has {} error(s)", args.input.display(), report.errors.len()));
    }
    if args.strict && !report.warnings.is_empty() {
        return Err(anyhow::anyhow!(
            "{} has {} warning(s)",
            args.input.display(),
            report.warnings.len()
        ));
    }

    println!("   {} No blocking issues", "✓".green());
    Ok(())
}

/// Open `source` the way the editor would and collect what it reports
pub(crate) async fn inspect(source: &str, config: &Config) -> Result<Report> {
    let mut report = Report::default();

    let element = match from_text(source) {
        Ok(element) => element,
        Err(e) => {
            report.errors.push(e.to_string());
            return Ok(report);
        }
    };

    let registry = builtin_registry()?;
    let resolver = config.editor.resolver(registry.clone());
    let resolution = resolver.resolve(element.element_type());

    let mut session = EditorSession::new(resolver);
    session.open(element.clone()).await;

    println!("   Type: {} → {}", element.element_type(), resolution.tag);
    if resolution.is_pending() {
        report
            .warnings
            .push(format!("No element registered as {}", resolution.tag));
    } else {
        let instance = Factory::new(registry).build(&resolution.tag, &element);
        if let Some(placeholder) = instance.placeholder() {
            report.errors.push(placeholder.message.clone());
        }
    }

    println!("   Mode: {}", session.mode());
    if session.form_available() {
        println!("   {} Visual editor available", "✓".green());
    } else if session.has_form() {
        println!("   {} Visual editor can't show this configuration", "⚠".yellow());
    } else {
        println!("   Visual editor not supported, text only");
    }

    report.errors.extend(session.last_error().map(str::to_string));
    report.warnings.extend(session.warnings().iter().cloned());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_config_has_no_issues() {
        let report = inspect("type: entities\nentities:\n  - light.kitchen\n", &Config::default())
            .await
            .unwrap();
        assert_eq!(report, Report::default());
    }

    #[tokio::test]
    async fn test_parse_error_is_reported() {
        let report = inspect("foo: [", &Config::default()).await.unwrap();
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_key_is_a_warning() {
        let report = inspect(
            "type: entities\nentities: [light.kitchen]\nstyle: fancy\n",
            &Config::default(),
        )
        .await
        .unwrap();
        assert!(report.errors.is_empty());
        assert_eq!(
            report.warnings,
            vec!["Key 'style' is not supported by the visual editor"]
        );
    }

    #[tokio::test]
    async fn test_construction_and_validation_errors() {
        let report = inspect(
            "type: gauge\nentity: sensor.power\nmin: 10\nmax: 5\n",
            &Config::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            report.errors,
            vec!["Invalid configuration: min must be below max", "min must be below max"]
        );
    }

    #[tokio::test]
    async fn test_unknown_type_is_a_warning() {
        let report = inspect("type: custom:weather-radar\n", &Config::default())
            .await
            .unwrap();
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings, vec!["No element registered as weather-radar"]);
    }
}
