//! # Implementation Registry
//!
//! Append-only map from tag to element definition.
//!
//! Element modules register themselves as they load, possibly long after a
//! dashboard first asked for them. Consumers that need an implementation
//! that isn't there yet wait on [`Registry::when_registered`].

use crate::element::Element;
use crate::form::EditorSource;
use crate::tag::Tag;
use dashcraft_config::ElementConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

type CreateFn = Arc<dyn Fn() -> Box<dyn Element> + Send + Sync>;
type StubFn = Arc<dyn Fn() -> ElementConfig + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Element '{0}' is already registered")]
    AlreadyRegistered(Tag),
}

/// Everything the pipeline needs to know about one implementation
#[derive(Clone)]
pub struct ElementDefinition {
    create: CreateFn,
    editor: Option<EditorSource>,
    stub_config: Option<StubFn>,
}

impl ElementDefinition {
    /// Define an element from its constructor
    pub fn new<F, E>(create: F) -> Self
    where
        F: Fn() -> E + Send + Sync + 'static,
        E: Element + 'static,
    {
        Self {
            create: Arc::new(move || Box::new(create()) as Box<dyn Element>),
            editor: None,
            stub_config: None,
        }
    }

    /// Attach a visual editor
    pub fn with_editor(mut self, editor: EditorSource) -> Self {
        self.editor = Some(editor);
        self
    }

    /// Attach a default configuration for fresh instances
    pub fn with_stub_config<F>(mut self, stub: F) -> Self
    where
        F: Fn() -> ElementConfig + Send + Sync + 'static,
    {
        self.stub_config = Some(Arc::new(stub));
        self
    }

    pub(crate) fn create(&self) -> Box<dyn Element> {
        (self.create)()
    }

    pub fn editor(&self) -> Option<&EditorSource> {
        self.editor.as_ref()
    }

    pub fn stub_config(&self) -> Option<ElementConfig> {
        self.stub_config.as_ref().map(|stub| stub())
    }

    pub fn has_editor_form(&self) -> bool {
        matches!(self.editor, Some(EditorSource::Form(_)))
    }

    pub fn has_schema_form(&self) -> bool {
        matches!(self.editor, Some(EditorSource::Schema(_)))
    }

    pub fn has_stub_config(&self) -> bool {
        self.stub_config.is_some()
    }
}

impl fmt::Debug for ElementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDefinition")
            .field("editor", &self.editor)
            .field("stub_config", &self.has_stub_config())
            .finish()
    }
}

#[derive(Default)]
struct RegistryInner {
    definitions: HashMap<Tag, Arc<ElementDefinition>>,
    /// One registration flag per tag someone has waited on
    signals: HashMap<Tag, watch::Sender<bool>>,
}

/// Shared, append-only element registry
///
/// Cloning is cheap; all clones see the same registrations.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation. A tag can only be registered once.
    pub fn register(
        &self,
        tag: impl Into<Tag>,
        definition: ElementDefinition,
    ) -> Result<(), RegistryError> {
        let tag = tag.into();
        let mut inner = self.inner.write();

        if inner.definitions.contains_key(&tag) {
            return Err(RegistryError::AlreadyRegistered(tag));
        }

        debug!(tag = %tag, "registered element");
        inner.definitions.insert(tag.clone(), Arc::new(definition));

        // Waiters check the value before noticing the sender is gone
        if let Some(signal) = inner.signals.remove(&tag) {
            signal.send_replace(true);
        }

        Ok(())
    }

    pub fn lookup(&self, tag: &Tag) -> Option<Arc<ElementDefinition>> {
        self.inner.read().definitions.get(tag).cloned()
    }

    pub fn is_registered(&self, tag: &Tag) -> bool {
        self.inner.read().definitions.contains_key(tag)
    }

    /// All registered tags, sorted
    pub fn tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.inner.read().definitions.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Resolves to `true` once `tag` is registered (immediately if it
    /// already is). Never times out. Resolves to `false` only if the
    /// registry itself goes away first.
    pub fn when_registered(&self, tag: &Tag) -> impl Future<Output = bool> + Send + 'static {
        let receiver = {
            let mut inner = self.inner.write();
            if inner.definitions.contains_key(tag) {
                None
            } else {
                let signal = inner
                    .signals
                    .entry(tag.clone())
                    .or_insert_with(|| watch::channel(false).0);
                Some(signal.subscribe())
            }
        };

        async move {
            match receiver {
                None => true,
                Some(mut receiver) => {
                    let registered = receiver.wait_for(|registered| *registered).await.is_ok();
                    registered
                }
            }
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("tags", &self.tags()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementError;
    use crate::form::{FieldKind, SchemaField, SchemaForm};

    struct Label(String);

    impl Element for Label {
        fn set_config(&mut self, config: &ElementConfig) -> Result<(), ElementError> {
            self.0 = config.element_type().to_string();
            Ok(())
        }

        fn render(&self) -> String {
            self.0.clone()
        }
    }

    fn label() -> ElementDefinition {
        ElementDefinition::new(|| Label(String::new()))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::new();
        assert!(registry.lookup(&Tag::new("dash-label-card")).is_none());

        registry.register("dash-label-card", label()).unwrap();
        assert!(registry.is_registered(&Tag::new("dash-label-card")));
        assert_eq!(registry.tags(), vec![Tag::new("dash-label-card")]);
    }

    #[test]
    fn test_registration_is_append_only() {
        let registry = Registry::new();
        registry.register("dash-label-card", label()).unwrap();

        let result = registry.register("dash-label-card", label());
        assert_eq!(
            result,
            Err(RegistryError::AlreadyRegistered(Tag::new("dash-label-card")))
        );
    }

    #[test]
    fn test_capability_flags() {
        let plain = label();
        assert!(!plain.has_editor_form());
        assert!(!plain.has_schema_form());
        assert!(!plain.has_stub_config());

        let schema = SchemaForm::default().field(SchemaField::new("name", FieldKind::Text));
        let rich = label()
            .with_editor(EditorSource::schema(move || {
                let schema = schema.clone();
                async move { Ok(schema) }
            }))
            .with_stub_config(|| ElementConfig::new("label"));
        assert!(rich.has_schema_form());
        assert!(!rich.has_editor_form());
        assert_eq!(rich.stub_config(), Some(ElementConfig::new("label")));
    }

    #[test]
    fn test_clones_share_registrations() {
        let registry = Registry::new();
        let other = registry.clone();
        registry.register("dash-label-card", label()).unwrap();
        assert!(other.is_registered(&Tag::new("dash-label-card")));
    }

    #[tokio::test]
    async fn test_when_registered_resolves_after_registration() {
        let registry = Registry::new();
        let tag = Tag::new("late-card");

        let waiting = registry.when_registered(&tag);
        registry.register(tag.clone(), label()).unwrap();

        assert!(waiting.await);
    }

    #[tokio::test]
    async fn test_registration_drops_its_signal() {
        let registry = Registry::new();
        let tag = Tag::new("late-card");

        let first = registry.when_registered(&tag);
        let second = registry.when_registered(&tag);
        assert_eq!(registry.inner.read().signals.len(), 1);

        registry.register(tag.clone(), label()).unwrap();
        assert!(registry.inner.read().signals.is_empty());

        assert!(first.await);
        assert!(second.await);
    }

    #[tokio::test]
    async fn test_when_registered_is_immediate_for_known_tags() {
        let registry = Registry::new();
        registry.register("known-card", label()).unwrap();
        assert!(registry.when_registered(&Tag::new("known-card")).await);
    }
}
