//! Editor options
//!
//! Loaded from the `editor` section of a project config file. Every field is
//! optional.

use crate::history::DEFAULT_CAPACITY;
use dashcraft_registry::{ElementCategory, Registry, Resolver, DEFAULT_QUIET_AFTER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorOptions {
    /// Undo levels kept by the workbench (0 disables undo)
    pub history_capacity: usize,

    /// How long a placeholder for a missing element shows as an error
    pub placeholder_quiet_ms: u64,

    /// Kind of element being edited
    pub category: ElementCategory,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            placeholder_quiet_ms: DEFAULT_QUIET_AFTER.as_millis() as u64,
            category: ElementCategory::default(),
        }
    }
}

impl EditorOptions {
    pub fn quiet_after(&self) -> Duration {
        Duration::from_millis(self.placeholder_quiet_ms)
    }

    /// Resolver for this category over `registry`
    pub fn resolver(&self, registry: Registry) -> Resolver {
        Resolver::with_quiet_after(registry, self.category, self.quiet_after())
    }
}
