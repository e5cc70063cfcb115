//! Built-in elements available to the CLI
//!
//! Small text-rendering versions of the common dashboard elements, enough to
//! drive the editing pipeline from the command line.

use dashcraft_config::{ElementConfig, Value};
use dashcraft_registry::{
    EditorSource, Element, ElementDefinition, ElementError, FieldKind, FormEditor, FormRejection,
    Registry, RegistryError, SchemaField, SchemaForm,
};
use serde_json::json;
use std::sync::Arc;

/// Registry holding every built-in element
pub fn builtin_registry() -> Result<Registry, RegistryError> {
    let registry = Registry::new();

    registry.register(
        "dash-entities-card",
        ElementDefinition::new(EntitiesCard::default)
            .with_editor(EditorSource::schema(|| async { Ok(entities_schema()) }))
            .with_stub_config(|| stub(json!({ "type": "entities", "entities": ["sun.sun"] }))),
    )?;

    registry.register(
        "dash-markdown-card",
        ElementDefinition::new(MarkdownCard::default)
            .with_stub_config(|| stub(json!({ "type": "markdown", "content": "Hello" }))),
    )?;

    registry.register(
        "dash-gauge-card",
        ElementDefinition::new(GaugeCard::default).with_editor(EditorSource::form(|| async {
            Ok(Arc::new(GaugeForm) as Arc<dyn FormEditor>)
        })),
    )?;

    registry.register(
        "dash-state-badge",
        ElementDefinition::new(StateBadge::default).with_editor(EditorSource::schema(|| async {
            Ok(SchemaForm::default()
                .field(SchemaField::new("entity", FieldKind::Entity).required())
                .field(SchemaField::new("name", FieldKind::Text)))
        })),
    )?;

    registry.register(
        "dash-toggle-entity-row",
        ElementDefinition::new(ToggleRow::default),
    )?;

    Ok(registry)
}

fn stub(value: Value) -> ElementConfig {
    ElementConfig::from_value(value).unwrap_or_else(|_| ElementConfig::new("unknown"))
}

fn text_field(config: &ElementConfig, key: &str) -> Option<String> {
    config.get(key).and_then(Value::as_str).map(str::to_string)
}

fn entities_schema() -> SchemaForm {
    SchemaForm::default()
        .field(SchemaField::new("title", FieldKind::Text))
        .field(SchemaField::new("entities", FieldKind::List).required())
        .field(SchemaField::new("show_header", FieldKind::Boolean))
}

#[derive(Default)]
struct EntitiesCard {
    title: Option<String>,
    entities: Vec<String>,
}

impl Element for EntitiesCard {
    fn set_config(&mut self, config: &ElementConfig) -> Result<(), ElementError> {
        let entities = config
            .get("entities")
            .ok_or_else(|| ElementError::MissingField("entities".to_string()))?
            .as_array()
            .ok_or_else(|| ElementError::invalid("entities must be a list"))?;

        self.entities = entities
            .iter()
            .map(|entity| match entity {
                Value::String(id) => Ok(id.clone()),
                Value::Object(row) => row
                    .get("entity")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| ElementError::invalid("entity rows need an 'entity'")),
                _ => Err(ElementError::invalid("entities must be entity ids")),
            })
            .collect::<Result<_, _>>()?;
        self.title = text_field(config, "title");
        Ok(())
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(title) = &self.title {
            out.push_str(&format!("[{}]\n", title));
        }
        for entity in &self.entities {
            out.push_str(&format!("  • {}\n", entity));
        }
        out
    }
}

#[derive(Default)]
struct MarkdownCard {
    content: String,
}

impl Element for MarkdownCard {
    fn set_config(&mut self, config: &ElementConfig) -> Result<(), ElementError> {
        self.content =
            text_field(config, "content").ok_or_else(|| ElementError::MissingField("content".to_string()))?;
        Ok(())
    }

    fn render(&self) -> String {
        self.content.clone()
    }
}

#[derive(Default)]
struct GaugeCard {
    entity: String,
    min: f64,
    max: f64,
}

impl Element for GaugeCard {
    fn set_config(&mut self, config: &ElementConfig) -> Result<(), ElementError> {
        self.entity =
            text_field(config, "entity").ok_or_else(|| ElementError::MissingField("entity".to_string()))?;
        self.min = config.get("min").and_then(Value::as_f64).unwrap_or(0.0);
        self.max = config.get("max").and_then(Value::as_f64).unwrap_or(100.0);
        if self.min >= self.max {
            return Err(ElementError::invalid("min must be below max"));
        }
        Ok(())
    }

    fn render(&self) -> String {
        format!("{} [{} .. {}]", self.entity, self.min, self.max)
    }
}

/// Hand-written gauge editor: checks the range, not just field kinds
struct GaugeForm;

const GAUGE_KEYS: [&str; 5] = ["type", "entity", "name", "min", "max"];

impl FormEditor for GaugeForm {
    fn validate(&self, config: &ElementConfig) -> Result<(), FormRejection> {
        let mut rejection = FormRejection::default();

        if text_field(config, "entity").is_none() {
            rejection.errors.push("Required field 'entity' is missing".to_string());
        }

        let min = config.get("min").and_then(Value::as_f64);
        let max = config.get("max").and_then(Value::as_f64);
        if let (Some(min), Some(max)) = (min, max) {
            if min >= max {
                rejection.errors.push("min must be below max".to_string());
            }
        }

        for key in config.keys().filter(|key| !GAUGE_KEYS.contains(key)) {
            rejection
                .warnings
                .push(format!("Key '{}' is not supported by the visual editor", key));
        }

        if rejection.is_empty() {
            Ok(())
        } else {
            Err(rejection)
        }
    }

    fn fields(&self) -> Vec<SchemaField> {
        vec![
            SchemaField::new("entity", FieldKind::Entity).required(),
            SchemaField::new("name", FieldKind::Text),
            SchemaField::new("min", FieldKind::Number),
            SchemaField::new("max", FieldKind::Number),
        ]
    }
}

#[derive(Default)]
struct StateBadge {
    label: String,
}

impl Element for StateBadge {
    fn set_config(&mut self, config: &ElementConfig) -> Result<(), ElementError> {
        let entity =
            text_field(config, "entity").ok_or_else(|| ElementError::MissingField("entity".to_string()))?;
        self.label = text_field(config, "name").unwrap_or(entity);
        Ok(())
    }

    fn render(&self) -> String {
        format!("({})", self.label)
    }
}

#[derive(Default)]
struct ToggleRow {
    entity: String,
}

impl Element for ToggleRow {
    fn set_config(&mut self, config: &ElementConfig) -> Result<(), ElementError> {
        self.entity =
            text_field(config, "entity").ok_or_else(|| ElementError::MissingField("entity".to_string()))?;
        Ok(())
    }

    fn render(&self) -> String {
        format!("{} [on|off]", self.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashcraft_registry::{ElementCategory, Factory, Resolver};

    fn render(category: ElementCategory, value: Value) -> String {
        let registry = builtin_registry().unwrap();
        let resolver = Resolver::new(registry.clone(), category);
        let config = ElementConfig::from_value(value).unwrap();
        let tag = resolver.resolve(config.element_type()).tag;
        Factory::new(registry).build(&tag, &config).render()
    }

    #[test]
    fn test_builtin_tags() {
        let tags: Vec<String> = builtin_registry()
            .unwrap()
            .tags()
            .iter()
            .map(|tag| tag.to_string())
            .collect();
        assert_eq!(
            tags,
            vec![
                "dash-entities-card",
                "dash-gauge-card",
                "dash-markdown-card",
                "dash-state-badge",
                "dash-toggle-entity-row",
            ]
        );
    }

    #[test]
    fn test_entities_card_renders_rows() {
        let out = render(
            ElementCategory::Card,
            json!({
                "type": "entities",
                "title": "Lights",
                "entities": ["light.kitchen", { "entity": "light.porch" }]
            }),
        );
        assert_eq!(out, "[Lights]\n  • light.kitchen\n  • light.porch\n");
    }

    #[test]
    fn test_gauge_rejects_inverted_range() {
        let out = render(
            ElementCategory::Card,
            json!({ "type": "gauge", "entity": "sensor.power", "min": 10, "max": 5 }),
        );
        assert!(out.starts_with("Error: Invalid configuration: min must be below max"));
    }

    #[test]
    fn test_gauge_form_warns_on_unknown_keys() {
        let config = stub(json!({ "type": "gauge", "entity": "sensor.power", "needle": true }));
        let rejection = GaugeForm.validate(&config).unwrap_err();
        assert!(!rejection.has_errors());
        assert_eq!(rejection.warnings.len(), 1);
    }

    #[test]
    fn test_badge_and_row_categories() {
        assert_eq!(
            render(ElementCategory::Badge, json!({ "type": "state", "entity": "person.sam" })),
            "(person.sam)"
        );
        assert_eq!(
            render(ElementCategory::Row, json!({ "type": "toggle", "entity": "switch.fan" })),
            "switch.fan [on|off]"
        );
    }
}
