//! Implementation identifiers and the naming convention that produces them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix marking a third-party element that registers under its own tag
pub const CUSTOM_PREFIX: &str = "custom:";

/// Tag carried by every error placeholder
pub const ERROR_TAG: &str = "dash-error-card";

/// Concrete implementation identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The error placeholder tag
    pub fn error() -> Self {
        Self(ERROR_TAG.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_error(&self) -> bool {
        self.0 == ERROR_TAG
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of element being resolved. Each category has its own tag suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementCategory {
    #[default]
    Card,
    Badge,
    Row,
    HeaderFooter,
    Feature,
}

impl ElementCategory {
    pub const ALL: [ElementCategory; 5] = [
        ElementCategory::Card,
        ElementCategory::Badge,
        ElementCategory::Row,
        ElementCategory::HeaderFooter,
        ElementCategory::Feature,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ElementCategory::Card => "card",
            ElementCategory::Badge => "badge",
            ElementCategory::Row => "row",
            ElementCategory::HeaderFooter => "header-footer",
            ElementCategory::Feature => "feature",
        }
    }

    /// Suffix appended to built-in tags of this category
    pub fn suffix(&self) -> &'static str {
        match self {
            ElementCategory::Card => "card",
            ElementCategory::Badge => "badge",
            ElementCategory::Row => "entity-row",
            ElementCategory::HeaderFooter => "header-footer",
            ElementCategory::Feature => "tile-feature",
        }
    }

    /// Map a type discriminator to a tag.
    ///
    /// `custom:my-card` becomes `my-card`; `entities` becomes
    /// `dash-entities-card` for the card category.
    pub fn tag_for(&self, element_type: &str) -> Tag {
        match element_type.strip_prefix(CUSTOM_PREFIX) {
            Some(custom) => Tag::new(custom),
            None => Tag::new(format!("dash-{}-{}", element_type, self.suffix())),
        }
    }
}

impl fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementCategory::ALL
            .into_iter()
            .find(|category| category.name() == s)
            .ok_or_else(|| format!("Unknown element category: {}", s))
    }
}

/// Whether a discriminator names a self-registering custom element
pub fn is_custom_type(element_type: &str) -> bool {
    element_type.starts_with(CUSTOM_PREFIX)
}
