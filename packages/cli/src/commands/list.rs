use crate::config::Config;
use crate::elements::builtin_registry;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// One registered element and what its editor can do
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ElementSummary {
    pub tag: String,
    pub editor: &'static str,
    pub has_stub_config: bool,
}

pub fn list(args: ListArgs, config: &Config) -> Result<()> {
    let summaries = summarize()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!(
        "📦 {} elements ({} category by default)",
        summaries.len().to_string().bright_white().bold(),
        config.editor.category
    );
    for summary in &summaries {
        let stub = if summary.has_stub_config {
            " +stub".dimmed().to_string()
        } else {
            String::new()
        };
        println!("   {} {}{}", summary.tag.cyan(), summary.editor, stub);
    }

    Ok(())
}

pub(crate) fn summarize() -> Result<Vec<ElementSummary>> {
    let registry = builtin_registry()?;

    Ok(registry
        .tags()
        .into_iter()
        .filter_map(|tag| {
            let definition = registry.lookup(&tag)?;
            let editor = if definition.has_editor_form() {
                "custom form"
            } else if definition.has_schema_form() {
                "schema form"
            } else {
                "text only"
            };
            Some(ElementSummary {
                tag: tag.to_string(),
                editor,
                has_stub_config: definition.has_stub_config(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summaries_describe_editors() {
        let summaries = summarize().unwrap();
        let gauge = summaries
            .iter()
            .find(|s| s.tag == "dash-gauge-card")
            .unwrap();
        assert_eq!(gauge.editor, "custom form");
        assert!(!gauge.has_stub_config);

        let entities = summaries
            .iter()
            .find(|s| s.tag == "dash-entities-card")
            .unwrap();
        assert_eq!(entities.editor, "schema form");
        assert!(entities.has_stub_config);

        let row = summaries
            .iter()
            .find(|s| s.tag == "dash-toggle-entity-row")
            .unwrap();
        assert_eq!(row.editor, "text only");
    }

    #[test]
    fn test_summary_json_shape() {
        let json = serde_json::to_value(&summarize().unwrap()[0]).unwrap();
        assert!(json.get("hasStubConfig").is_some());
    }
}
