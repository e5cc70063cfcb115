//! Structured-text (YAML) form of a configuration document.

use crate::config::ElementConfig;
use crate::error::{ConfigError, ConfigResult};
use serde_json::Value;

/// Serialize a document to YAML, keeping field order
pub fn to_text(config: &ElementConfig) -> ConfigResult<String> {
    serde_yaml::to_string(config.fields()).map_err(|e| ConfigError::Serialize(e.to_string()))
}

/// Parse YAML text into a document
pub fn from_text(text: &str) -> ConfigResult<ElementConfig> {
    if text.trim().is_empty() {
        return Err(ConfigError::MissingType);
    }

    let value: Value = serde_yaml::from_str(text)?;
    ElementConfig::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_text_keeps_field_order() {
        let config = ElementConfig::from_value(json!({
            "type": "entities",
            "title": "Lights",
            "entities": ["light.kitchen", "light.hall"],
            "show_header_toggle": false
        }))
        .unwrap();

        let text = to_text(&config).unwrap();
        assert_eq!(
            text,
            "type: entities\ntitle: Lights\nentities:\n- light.kitchen\n- light.hall\nshow_header_toggle: false\n"
        );
    }

    #[test]
    fn test_from_text_parses_nested_values() {
        let config = from_text("type: gauge\nseverity:\n  green: 0\n  red: 80\n").unwrap();
        assert_eq!(config.element_type(), "gauge");
        assert_eq!(config.get("severity"), Some(&json!({ "green": 0, "red": 80 })));
    }

    #[test]
    fn test_text_round_trip_is_stable() {
        let source = "type: button\nname: Porch\ntap_action:\n  action: toggle\nicon: mdi:lamp\n";
        let config = from_text(source).unwrap();
        assert_eq!(to_text(&config).unwrap(), source);
    }

    #[test]
    fn test_malformed_text_is_parse_error() {
        let result = from_text("foo: [");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_text_without_type_is_rejected() {
        assert_eq!(from_text("title: Lights\n"), Err(ConfigError::MissingType));
        assert_eq!(from_text("   \n"), Err(ConfigError::MissingType));
    }

    #[test]
    fn test_scalar_document_is_rejected() {
        assert_eq!(from_text("just a string"), Err(ConfigError::NotAnObject("string")));
    }
}
