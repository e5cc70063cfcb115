//! # Element Factory
//!
//! Turns a tag and a configuration into something that can be shown.
//!
//! `build` never fails. Unknown tags and implementations that error or panic
//! while being configured all produce an error placeholder carrying the
//! message and the configuration that caused it.

use crate::element::{Element, ElementError};
use crate::registry::Registry;
use crate::tag::{is_custom_type, Tag};
use dashcraft_config::{to_text, ElementConfig};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Visual error flag of a placeholder
///
/// Starts raised. The resolver lowers it when an implementation is merely
/// slow to load, so the placeholder stops looking like a hard failure.
#[derive(Debug, Clone)]
pub struct PlaceholderAlarm(Arc<AtomicBool>);

impl PlaceholderAlarm {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn silence(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for PlaceholderAlarm {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Nothing is registered for the tag (yet)
    Pending,
    /// The implementation failed to build or configure
    Failed,
}

/// Stand-in shown when an element can't be
#[derive(Debug, Clone)]
pub struct Placeholder {
    /// Tag that was asked for
    pub requested: Tag,
    pub kind: PlaceholderKind,
    pub message: String,
    pub alarm: PlaceholderAlarm,
}

enum Body {
    Element(Box<dyn Element>),
    Placeholder(Placeholder),
}

/// A rendered element or its placeholder
pub struct Instance {
    tag: Tag,
    config: ElementConfig,
    body: Body,
}

impl Instance {
    /// Tag of what is actually mounted; the error tag for placeholders
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Configuration last applied
    pub fn config(&self) -> &ElementConfig {
        &self.config
    }

    /// Whether this is an error placeholder, which must be rebuilt rather
    /// than updated
    pub fn is_error(&self) -> bool {
        self.tag.is_error()
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        match &self.body {
            Body::Placeholder(placeholder) => Some(placeholder),
            Body::Element(_) => None,
        }
    }

    pub fn render(&self) -> String {
        match &self.body {
            Body::Element(element) => element.render(),
            Body::Placeholder(placeholder) => {
                let heading = if placeholder.alarm.is_raised() {
                    "Error"
                } else {
                    "Loading"
                };
                let config = to_text(&self.config).unwrap_or_default();
                format!("{}: {}\n{}", heading, placeholder.message, config)
            }
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("tag", &self.tag)
            .field("config", &self.config)
            .field("placeholder", &self.placeholder())
            .finish()
    }
}

/// Builds and updates element instances from the registry
#[derive(Clone, Debug)]
pub struct Factory {
    registry: Registry,
}

impl Factory {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Build an instance. Always returns something renderable.
    pub fn build(&self, tag: &Tag, config: &ElementConfig) -> Instance {
        let Some(definition) = self.registry.lookup(tag) else {
            let message = if is_custom_type(config.element_type()) {
                format!("Custom element doesn't exist: {}", tag)
            } else {
                format!("Unknown type encountered: {}", config.element_type())
            };
            debug!(tag = %tag, "building placeholder for unregistered element");
            return Self::placeholder(tag, config, PlaceholderKind::Pending, message);
        };

        let built = catch_unwind(AssertUnwindSafe(|| {
            let mut element = definition.create();
            element.set_config(config).map(|()| element)
        }));

        match flatten(built) {
            Ok(element) => Instance {
                tag: tag.clone(),
                config: config.clone(),
                body: Body::Element(element),
            },
            Err(e) => {
                warn!(tag = %tag, error = %e, "element failed to build");
                Self::placeholder(tag, config, PlaceholderKind::Failed, e.to_string())
            }
        }
    }

    /// Apply a new configuration in place.
    ///
    /// On failure the instance is replaced by an error placeholder and the
    /// error is returned. Placeholders are rebuilt from the tag they stand in
    /// for.
    pub fn update(&self, instance: &mut Instance, config: &ElementConfig) -> Result<(), ElementError> {
        let element = match &mut instance.body {
            Body::Element(element) => element,
            Body::Placeholder(placeholder) => {
                let requested = placeholder.requested.clone();
                *instance = self.build(&requested, config);
                return Ok(());
            }
        };

        let applied = catch_unwind(AssertUnwindSafe(|| element.set_config(config)));
        match flatten(applied) {
            Ok(()) => {
                instance.config = config.clone();
                Ok(())
            }
            Err(e) => {
                warn!(tag = %instance.tag, error = %e, "element rejected update");
                let tag = instance.tag.clone();
                *instance = Self::placeholder(&tag, config, PlaceholderKind::Failed, e.to_string());
                Err(e)
            }
        }
    }

    /// Build an error placeholder for `tag`
    pub fn placeholder(
        tag: &Tag,
        config: &ElementConfig,
        kind: PlaceholderKind,
        message: impl Into<String>,
    ) -> Instance {
        Instance {
            tag: Tag::error(),
            config: config.clone(),
            body: Body::Placeholder(Placeholder {
                requested: tag.clone(),
                kind,
                message: message.into(),
                alarm: PlaceholderAlarm::new(),
            }),
        }
    }
}

fn flatten<T>(result: Result<Result<T, ElementError>, Box<dyn Any + Send>>) -> Result<T, ElementError> {
    match result {
        Ok(inner) => inner,
        Err(payload) => Err(ElementError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
