//! # Type Resolver
//!
//! Maps type discriminators to tags and tracks implementations that haven't
//! registered yet.
//!
//! ## Pending implementations
//!
//! Resolution never blocks. When a host mounts a placeholder for a pending
//! tag it calls [`Resolver::notify_when_registered`]:
//!
//! - one background wait is armed per tag; later requests for the same tag
//!   join it instead of starting another
//! - after `quiet_after` (two seconds by default) the placeholders stop
//!   signalling an error, since the implementation may just be slow
//! - once the tag registers, every waiting host receives exactly one
//!   [`Rebuild`]
//!
//! If the tag never registers, nobody hears anything.

use crate::factory::PlaceholderAlarm;
use crate::registry::Registry;
use crate::tag::{ElementCategory, Tag};
use dashcraft_config::ElementConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// How long a pending placeholder signals an error before quieting down
pub const DEFAULT_QUIET_AFTER: Duration = Duration::from_secs(2);

/// Request to recreate the instance currently showing `tag`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rebuild {
    pub tag: Tag,
}

pub type RebuildSender = UnboundedSender<Rebuild>;

/// Outcome of resolving one discriminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub element_type: String,
    pub tag: Tag,
    /// Whether an implementation was registered at resolution time
    pub registered: bool,
}

impl Resolution {
    pub fn is_pending(&self) -> bool {
        !self.registered
    }
}

/// Tag plus declared capabilities of a registered implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDescriptor {
    pub tag: Tag,
    pub has_editor_form: bool,
    pub has_schema_form: bool,
    pub has_stub_config: bool,
}

impl ElementDescriptor {
    /// Whether any visual editor is declared
    pub fn has_form(&self) -> bool {
        self.has_editor_form || self.has_schema_form
    }
}

/// What `notify_when_registered` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// A new background wait was started
    Armed,
    /// Joined the wait already running for this tag
    Queued,
    /// The tag was registered in the meantime; a rebuild was sent right away
    AlreadyRegistered,
    /// No async runtime to wait on
    Unavailable,
}

struct Waiter {
    rebuild: RebuildSender,
    alarm: Option<PlaceholderAlarm>,
}

#[derive(Default)]
struct PendingWait {
    waiters: Vec<Waiter>,
    quieted: bool,
}

struct ResolverInner {
    registry: Registry,
    category: ElementCategory,
    quiet_after: Duration,
    tags: Mutex<HashMap<String, Tag>>,
    descriptors: Mutex<HashMap<String, ElementDescriptor>>,
    pending: Mutex<HashMap<Tag, PendingWait>>,
}

/// Resolver for one element category
///
/// Cloning is cheap; clones share caches and pending waits.
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<ResolverInner>,
}

impl Resolver {
    pub fn new(registry: Registry, category: ElementCategory) -> Self {
        Self::with_quiet_after(registry, category, DEFAULT_QUIET_AFTER)
    }

    pub fn with_quiet_after(registry: Registry, category: ElementCategory, quiet_after: Duration) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                registry,
                category,
                quiet_after,
                tags: Mutex::new(HashMap::new()),
                descriptors: Mutex::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn category(&self) -> ElementCategory {
        self.inner.category
    }

    /// Tag for a discriminator. Cached; always the same for the same input.
    pub fn tag_for(&self, element_type: &str) -> Tag {
        let mut tags = self.inner.tags.lock();
        if let Some(tag) = tags.get(element_type) {
            return tag.clone();
        }

        let tag = self.inner.category.tag_for(element_type);
        debug!(element_type, tag = %tag, "resolved element type");
        tags.insert(element_type.to_string(), tag.clone());
        tag
    }

    /// Resolve a discriminator against the registry
    pub fn resolve(&self, element_type: &str) -> Resolution {
        let tag = self.tag_for(element_type);
        let registered = self.inner.registry.is_registered(&tag);
        Resolution {
            element_type: element_type.to_string(),
            tag,
            registered,
        }
    }

    /// Capabilities of the implementation behind a discriminator, or `None`
    /// while it is pending. Cached once known.
    pub fn describe(&self, element_type: &str) -> Option<ElementDescriptor> {
        if let Some(descriptor) = self.inner.descriptors.lock().get(element_type) {
            return Some(descriptor.clone());
        }

        let tag = self.tag_for(element_type);
        let definition = self.inner.registry.lookup(&tag)?;
        let descriptor = ElementDescriptor {
            tag,
            has_editor_form: definition.has_editor_form(),
            has_schema_form: definition.has_schema_form(),
            has_stub_config: definition.has_stub_config(),
        };

        self.inner
            .descriptors
            .lock()
            .insert(element_type.to_string(), descriptor.clone());
        Some(descriptor)
    }

    /// Default configuration for a fresh element of `element_type`.
    ///
    /// Uses the implementation's stub when it has one, with `type` forced to
    /// the requested discriminator. Falls back to `{type}`.
    pub fn stub_config(&self, element_type: &str) -> ElementConfig {
        let tag = self.tag_for(element_type);
        self.inner
            .registry
            .lookup(&tag)
            .and_then(|definition| definition.stub_config())
            .map(|stub| stub.with_type(element_type))
            .unwrap_or_else(|| ElementConfig::new(element_type))
    }

    /// Ask for a [`Rebuild`] on `rebuild` once `tag` registers.
    ///
    /// A host that asks again for the same tag before registration keeps a
    /// single place in the queue; only its alarm handle is refreshed.
    pub fn notify_when_registered(
        &self,
        tag: &Tag,
        rebuild: RebuildSender,
        alarm: Option<PlaceholderAlarm>,
    ) -> WaitStatus {
        if self.inner.registry.is_registered(tag) {
            let _ = rebuild.send(Rebuild { tag: tag.clone() });
            return WaitStatus::AlreadyRegistered;
        }

        let mut pending = self.inner.pending.lock();
        if let Some(wait) = pending.get_mut(tag) {
            if wait.quieted {
                if let Some(alarm) = &alarm {
                    alarm.silence();
                }
            }

            match wait
                .waiters
                .iter_mut()
                .find(|waiter| waiter.rebuild.same_channel(&rebuild))
            {
                Some(existing) => existing.alarm = alarm,
                None => wait.waiters.push(Waiter { rebuild, alarm }),
            }

            debug!(tag = %tag, "joined pending registration wait");
            return WaitStatus::Queued;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(tag = %tag, "no async runtime; element will not be rebuilt when it registers");
            return WaitStatus::Unavailable;
        };

        pending.insert(
            tag.clone(),
            PendingWait {
                waiters: vec![Waiter { rebuild, alarm }],
                quieted: false,
            },
        );
        drop(pending);

        let registered = self.inner.registry.when_registered(tag);
        runtime.spawn(wait_for_registration(Arc::clone(&self.inner), tag.clone(), registered));

        debug!(tag = %tag, "waiting for element to register");
        WaitStatus::Armed
    }

    /// Number of tags with an outstanding registration wait
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

async fn wait_for_registration(
    inner: Arc<ResolverInner>,
    tag: Tag,
    registered: impl std::future::Future<Output = bool>,
) {
    tokio::pin!(registered);
    let quiet = tokio::time::sleep(inner.quiet_after);
    tokio::pin!(quiet);

    let arrived = tokio::select! {
        arrived = &mut registered => arrived,
        _ = &mut quiet => {
            inner.quiet_placeholders(&tag);
            registered.await
        }
    };

    let waiters = inner
        .pending
        .lock()
        .remove(&tag)
        .map(|wait| wait.waiters)
        .unwrap_or_default();

    if !arrived {
        debug!(tag = %tag, "registry dropped before element registered");
        return;
    }

    debug!(tag = %tag, hosts = waiters.len(), "element registered, requesting rebuilds");
    for waiter in waiters {
        let _ = waiter.rebuild.send(Rebuild { tag: tag.clone() });
    }
}

impl ResolverInner {
    fn quiet_placeholders(&self, tag: &Tag) {
        let mut pending = self.pending.lock();
        if let Some(wait) = pending.get_mut(tag) {
            wait.quieted = true;
            for alarm in wait.waiters.iter().filter_map(|waiter| waiter.alarm.as_ref()) {
                alarm.silence();
            }
            debug!(tag = %tag, "placeholder quieted while waiting for element");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementError};
    use crate::form::{EditorSource, FieldKind, SchemaField, SchemaForm};
    use crate::registry::ElementDefinition;
    use serde_json::json;

    struct Blank;

    impl Element for Blank {
        fn set_config(&mut self, _config: &ElementConfig) -> Result<(), ElementError> {
            Ok(())
        }

        fn render(&self) -> String {
            String::new()
        }
    }

    #[test]
    fn test_resolve_is_cached_and_deterministic() {
        let resolver = Resolver::new(Registry::new(), ElementCategory::Card);
        for element_type in ["entities", "custom:my-card", "grid", ""] {
            let first = resolver.resolve(element_type);
            let second = resolver.resolve(element_type);
            assert_eq!(first, second);
        }
        assert_eq!(resolver.tag_for("entities"), Tag::new("dash-entities-card"));
        assert_eq!(resolver.tag_for("custom:my-card"), Tag::new("my-card"));
    }

    #[test]
    fn test_resolve_reports_pending() {
        let registry = Registry::new();
        let resolver = Resolver::new(registry.clone(), ElementCategory::Card);

        let resolution = resolver.resolve("grid");
        assert!(resolution.is_pending());
        assert_eq!(resolution.tag, Tag::new("dash-grid-card"));

        registry
            .register("dash-grid-card", ElementDefinition::new(|| Blank))
            .unwrap();
        assert!(!resolver.resolve("grid").is_pending());
    }

    #[test]
    fn test_describe_reports_capabilities() {
        let registry = Registry::new();
        let resolver = Resolver::new(registry.clone(), ElementCategory::Badge);
        assert_eq!(resolver.describe("state"), None);

        let schema = SchemaForm::default().field(SchemaField::new("entity", FieldKind::Entity));
        registry
            .register(
                "dash-state-badge",
                ElementDefinition::new(|| Blank).with_editor(EditorSource::schema(move || {
                    let schema = schema.clone();
                    async move { Ok(schema) }
                })),
            )
            .unwrap();

        let descriptor = resolver.describe("state").unwrap();
        assert_eq!(descriptor.tag, Tag::new("dash-state-badge"));
        assert!(descriptor.has_schema_form);
        assert!(!descriptor.has_editor_form);
        assert!(!descriptor.has_stub_config);
        assert!(descriptor.has_form());
    }

    #[test]
    fn test_stub_config_forces_type() {
        let registry = Registry::new();
        registry
            .register(
                "my-card",
                ElementDefinition::new(|| Blank).with_stub_config(|| {
                    ElementConfig::from_value(json!({ "type": "my-card", "title": "Hello" })).unwrap()
                }),
            )
            .unwrap();
        let resolver = Resolver::new(registry, ElementCategory::Card);

        let stub = resolver.stub_config("custom:my-card");
        assert_eq!(stub.element_type(), "custom:my-card");
        assert_eq!(stub.get("title"), Some(&json!("Hello")));

        assert_eq!(resolver.stub_config("unknown"), ElementConfig::new("unknown"));
    }

    #[test]
    fn test_notify_without_runtime_is_unavailable() {
        let resolver = Resolver::new(Registry::new(), ElementCategory::Card);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let status = resolver.notify_when_registered(&Tag::new("late"), tx, None);
        assert_eq!(status, WaitStatus::Unavailable);
        assert_eq!(resolver.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_notify_for_registered_tag_rebuilds_immediately() {
        let registry = Registry::new();
        registry.register("ready", ElementDefinition::new(|| Blank)).unwrap();
        let resolver = Resolver::new(registry, ElementCategory::Card);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let status = resolver.notify_when_registered(&Tag::new("ready"), tx, None);
        assert_eq!(status, WaitStatus::AlreadyRegistered);
        assert_eq!(rx.try_recv(), Ok(Rebuild { tag: Tag::new("ready") }));
    }
}
