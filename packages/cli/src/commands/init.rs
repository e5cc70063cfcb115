use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dashcraft_registry::ElementCategory;
use std::fs;
use std::path::Path;

const EXAMPLE_NAME: &str = "example.yaml";

const EXAMPLE_CONTENT: &str = r#"type: entities
title: Living room
entities:
  - light.ceiling
  - light.floor_lamp
  - entity: switch.tv
show_header: true
"#;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Category of elements edited by default (card, badge, row, header-footer, feature)
    #[arg(short, long, default_value = "card")]
    pub category: String,

    /// Undo levels kept per document (0 disables undo)
    #[arg(long)]
    pub history: Option<usize>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = Config::path_in(cwd);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing dashcraft project...".bright_blue().bold());

    let mut config = Config::default();
    config.editor.category = parse_category(&args.category)?;
    if let Some(history) = args.history {
        config.editor.history_capacity = history;
    }

    let example_file = cwd.join(EXAMPLE_NAME);
    if !example_file.exists() {
        fs::write(&example_file, EXAMPLE_CONTENT)?;
        println!("  {} Created {}", "✓".green(), EXAMPLE_NAME);
    }

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}", EXAMPLE_NAME);
    println!("  2. Run: dashcraft check {}", EXAMPLE_NAME);
    println!("  3. Run: dashcraft preview {}", EXAMPLE_NAME);

    Ok(())
}

fn parse_category(name: &str) -> Result<ElementCategory> {
    ElementCategory::ALL
        .into_iter()
        .find(|category| category.name() == name)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid category: {}. Use: card, badge, row, header-footer, or feature",
                name
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(force: bool) -> InitArgs {
        InitArgs {
            category: "badge".to_string(),
            history: Some(10),
            force,
        }
    }

    #[test]
    fn test_init_writes_config_and_example() {
        let dir = TempDir::new().unwrap();
        init(args(false), dir.path()).unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.editor.category, ElementCategory::Badge);
        assert_eq!(config.editor.history_capacity, 10);

        let example = fs::read_to_string(dir.path().join(EXAMPLE_NAME)).unwrap();
        let parsed = dashcraft_config::from_text(&example).unwrap();
        assert_eq!(parsed.element_type(), "entities");
    }

    #[test]
    fn test_init_keeps_existing_config_without_force() {
        let dir = TempDir::new().unwrap();
        fs::write(Config::path_in(dir.path()), "{}").unwrap();

        init(args(false), dir.path()).unwrap();
        assert_eq!(fs::read_to_string(Config::path_in(dir.path())).unwrap(), "{}");

        init(args(true), dir.path()).unwrap();
        assert_eq!(
            Config::load(dir.path()).unwrap().editor.category,
            ElementCategory::Badge
        );
    }

    #[test]
    fn test_invalid_category() {
        assert!(parse_category("widget").is_err());
        assert_eq!(parse_category("header-footer").unwrap(), ElementCategory::HeaderFooter);
    }
}
