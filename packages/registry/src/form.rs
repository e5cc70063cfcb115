//! # Form Editors
//!
//! The visual editing capability an element may expose.
//!
//! An element declares one of two editor sources:
//! - **Form**: a custom [`FormEditor`] implementation
//! - **Schema**: a [`SchemaForm`] describing its fields, validated generically
//!
//! Both are produced by async loaders so editor code can be loaded lazily.
//! The editor session resolves the loader once and caches the result.

use dashcraft_config::{ElementConfig, Value, TYPE_FIELD};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Validates configurations for the visual editor
pub trait FormEditor: Send + Sync {
    /// Check that the form can represent `config`
    fn validate(&self, config: &ElementConfig) -> Result<(), FormRejection>;

    /// Fields the form shows, for hosts that render a layout
    fn fields(&self) -> Vec<SchemaField> {
        Vec::new()
    }
}

/// Why a form editor refused a configuration
///
/// `errors` mean the configuration is broken. `warnings` mean it is valid
/// but the visual editor can't represent it; it can still be edited as text
/// and saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormRejection {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl FormRejection {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            warnings: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            errors: Vec::new(),
            warnings: vec![message.into()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Whether the configuration itself is broken
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl fmt::Display for FormRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self
            .errors
            .iter()
            .chain(self.warnings.iter())
            .map(String::as_str)
            .collect();
        write!(f, "{}", messages.join(", "))
    }
}

/// Editor code failed to load
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to load editor: {0}")]
pub struct LoadError(pub String);

pub type EditorFuture = BoxFuture<'static, Result<Arc<dyn FormEditor>, LoadError>>;
pub type EditorLoader = Arc<dyn Fn() -> EditorFuture + Send + Sync>;
pub type SchemaLoader = Arc<dyn Fn() -> BoxFuture<'static, Result<SchemaForm, LoadError>> + Send + Sync>;

/// Where an element's visual editor comes from
#[derive(Clone)]
pub enum EditorSource {
    Form(EditorLoader),
    Schema(SchemaLoader),
}

impl EditorSource {
    pub fn form<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn FormEditor>, LoadError>> + Send + 'static,
    {
        EditorSource::Form(Arc::new(move || -> EditorFuture { Box::pin(loader()) }))
    }

    pub fn schema<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SchemaForm, LoadError>> + Send + 'static,
    {
        EditorSource::Schema(Arc::new(
            move || -> BoxFuture<'static, Result<SchemaForm, LoadError>> { Box::pin(loader()) },
        ))
    }

    /// Start loading the editor
    pub fn load(&self) -> EditorFuture {
        match self {
            EditorSource::Form(loader) => loader(),
            EditorSource::Schema(loader) => {
                let schema = loader();
                Box::pin(async move {
                    let schema = schema.await?;
                    Ok::<_, LoadError>(Arc::new(schema) as Arc<dyn FormEditor>)
                })
            }
        }
    }
}

impl fmt::Debug for EditorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorSource::Form(_) => f.write_str("EditorSource::Form"),
            EditorSource::Schema(_) => f.write_str("EditorSource::Schema"),
        }
    }
}

/// Value kind accepted by a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    /// An entity id such as `light.kitchen`
    Entity,
    List,
    Mapping,
    Any,
}

impl FieldKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Entity => value
                .as_str()
                .and_then(|id| id.split_once('.'))
                .map(|(domain, object)| !domain.is_empty() && !object.is_empty())
                .unwrap_or(false),
            FieldKind::List => value.is_array(),
            FieldKind::Mapping => value.is_object(),
            FieldKind::Any => true,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Entity => "entity",
            FieldKind::List => "list",
            FieldKind::Mapping => "mapping",
            FieldKind::Any => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Generic form built from a field list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaForm {
    pub fields: Vec<SchemaField>,
}

impl SchemaForm {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self { fields }
    }

    pub fn field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    fn find(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl FormEditor for SchemaForm {
    fn validate(&self, config: &ElementConfig) -> Result<(), FormRejection> {
        let mut rejection = FormRejection::default();

        for field in &self.fields {
            match config.get(&field.name) {
                None if field.required => rejection
                    .errors
                    .push(format!("Required field '{}' is missing", field.name)),
                Some(value) if !field.kind.accepts(value) => rejection.errors.push(format!(
                    "Field '{}' expects {}",
                    field.name,
                    field.kind.name()
                )),
                _ => {}
            }
        }

        for key in config.keys() {
            if key != TYPE_FIELD && self.find(key).is_none() {
                rejection
                    .warnings
                    .push(format!("Key '{}' is not supported by the visual editor", key));
            }
        }

        if rejection.is_empty() {
            Ok(())
        } else {
            Err(rejection)
        }
    }

    fn fields(&self) -> Vec<SchemaField> {
        self.fields.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn light_form() -> SchemaForm {
        SchemaForm::default()
            .field(SchemaField::new("entity", FieldKind::Entity).required())
            .field(SchemaField::new("name", FieldKind::Text))
            .field(SchemaField::new("brightness", FieldKind::Number))
    }

    fn config(value: Value) -> ElementConfig {
        ElementConfig::from_value(value).unwrap()
    }

    #[test]
    fn test_schema_accepts_valid_config() {
        let form = light_form();
        let result = form.validate(&config(json!({
            "type": "light",
            "entity": "light.kitchen",
            "brightness": 80
        })));
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_schema_reports_missing_required_field() {
        let result = light_form().validate(&config(json!({ "type": "light" })));
        let rejection = result.unwrap_err();
        assert_eq!(rejection.errors, vec!["Required field 'entity' is missing"]);
        assert!(rejection.has_errors());
    }

    #[test]
    fn test_schema_reports_wrong_kind() {
        let result = light_form().validate(&config(json!({
            "type": "light",
            "entity": "kitchen",
            "brightness": "high"
        })));
        let rejection = result.unwrap_err();
        assert_eq!(
            rejection.errors,
            vec!["Field 'entity' expects entity", "Field 'brightness' expects number"]
        );
    }

    #[test]
    fn test_unknown_keys_are_warnings() {
        let result = light_form().validate(&config(json!({
            "type": "light",
            "entity": "light.kitchen",
            "card_mod": { "style": "x" }
        })));
        let rejection = result.unwrap_err();
        assert!(!rejection.has_errors());
        assert_eq!(
            rejection.warnings,
            vec!["Key 'card_mod' is not supported by the visual editor"]
        );
    }

    #[test]
    fn test_rejection_display_joins_messages() {
        let rejection = FormRejection {
            errors: vec!["a".into()],
            warnings: vec!["b".into(), "c".into()],
        };
        assert_eq!(rejection.to_string(), "a, b, c");
    }

    #[tokio::test]
    async fn test_schema_source_loads_as_form_editor() {
        let source = EditorSource::schema(|| async { Ok(light_form()) });
        let editor = source.load().await.unwrap();
        assert_eq!(editor.fields().len(), 3);
    }
}
