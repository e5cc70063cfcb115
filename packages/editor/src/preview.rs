//! # Live Preview
//!
//! Keeps one rendered instance in step with the editor's configuration.
//!
//! Each new configuration is applied in place when the instance can take it
//! (same tag, not a placeholder), which keeps element-local state. Anything
//! else is rebuilt from scratch. Placeholders for elements that haven't
//! registered yet ask the resolver for a rebuild signal and are replaced
//! when it arrives.

use crate::channel::ConfigChanged;
use dashcraft_config::ElementConfig;
use dashcraft_registry::{Factory, Instance, PlaceholderKind, Rebuild, RebuildSender, Resolver};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::debug;

/// What `apply` did with a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewAction {
    /// Same configuration as before
    Unchanged,
    /// Passed to the mounted element
    Updated,
    /// Mounted a freshly built instance
    Built,
}

pub struct PreviewHost {
    resolver: Resolver,
    factory: Factory,
    instance: Option<Instance>,
    rebuild_tx: RebuildSender,
    rebuild_rx: UnboundedReceiver<Rebuild>,
    builds: usize,
}

impl PreviewHost {
    pub fn new(resolver: Resolver) -> Self {
        let factory = Factory::new(resolver.registry().clone());
        let (rebuild_tx, rebuild_rx) = unbounded_channel();
        Self {
            resolver,
            factory,
            instance: None,
            rebuild_tx,
            rebuild_rx,
            builds: 0,
        }
    }

    /// Show `config`
    pub fn apply(&mut self, config: &ElementConfig) -> PreviewAction {
        let tag = self.resolver.resolve(config.element_type()).tag;

        let action = match &self.instance {
            Some(instance) if instance.config() == config => PreviewAction::Unchanged,
            Some(instance) if !instance.is_error() && instance.tag() == &tag => PreviewAction::Updated,
            _ => PreviewAction::Built,
        };

        match action {
            PreviewAction::Unchanged => {}
            PreviewAction::Updated => {
                if let Some(instance) = self.instance.as_mut() {
                    // A failed update leaves a placeholder behind; the next change rebuilds
                    let _ = self.factory.update(instance, config);
                }
            }
            PreviewAction::Built => self.mount(config),
        }

        action
    }

    /// Rebuild from the current configuration, unconditionally
    pub fn rebuild(&mut self) -> bool {
        let Some(config) = self.instance.as_ref().map(|i| i.config().clone()) else {
            return false;
        };
        self.mount(&config);
        true
    }

    /// Act on one rebuild signal. Signals for a tag the preview no longer
    /// shows are ignored.
    pub fn handle_rebuild(&mut self, rebuild: &Rebuild) -> bool {
        let Some(config) = self.instance.as_ref().map(|i| i.config().clone()) else {
            return false;
        };

        if self.resolver.tag_for(config.element_type()) != rebuild.tag {
            debug!(tag = %rebuild.tag, "ignoring rebuild for an element no longer shown");
            return false;
        }

        debug!(tag = %rebuild.tag, "rebuilding preview");
        self.mount(&config);
        true
    }

    /// Handle every rebuild signal already queued. Returns how many caused a
    /// rebuild.
    pub fn process_rebuilds(&mut self) -> usize {
        let mut rebuilt = 0;
        while let Ok(rebuild) = self.rebuild_rx.try_recv() {
            if self.handle_rebuild(&rebuild) {
                rebuilt += 1;
            }
        }
        rebuilt
    }

    /// Wait for the next rebuild signal
    pub async fn next_rebuild(&mut self) -> Option<Rebuild> {
        self.rebuild_rx.recv().await
    }

    /// Follow a session's notifications until it goes away
    pub async fn run(&mut self, mut changes: UnboundedReceiver<ConfigChanged>) {
        enum Event {
            Changed(Option<ConfigChanged>),
            Rebuild(Option<Rebuild>),
        }

        loop {
            let event = tokio::select! {
                changed = changes.recv() => Event::Changed(changed),
                rebuild = self.rebuild_rx.recv() => Event::Rebuild(rebuild),
            };

            match event {
                Event::Changed(Some(changed)) => {
                    self.apply(&changed.config);
                }
                Event::Changed(None) => break,
                Event::Rebuild(Some(rebuild)) => {
                    self.handle_rebuild(&rebuild);
                }
                Event::Rebuild(None) => break,
            }
        }
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// What the preview currently shows
    pub fn render(&self) -> String {
        self.instance
            .as_ref()
            .map(Instance::render)
            .unwrap_or_default()
    }

    pub fn is_error(&self) -> bool {
        self.instance.as_ref().map(Instance::is_error).unwrap_or(false)
    }

    /// Number of full builds so far
    pub fn build_count(&self) -> usize {
        self.builds
    }

    fn mount(&mut self, config: &ElementConfig) {
        let tag = self.resolver.resolve(config.element_type()).tag;
        let instance = self.factory.build(&tag, config);
        self.builds += 1;

        if let Some(placeholder) = instance.placeholder() {
            if placeholder.kind == PlaceholderKind::Pending {
                self.resolver.notify_when_registered(
                    &placeholder.requested,
                    self.rebuild_tx.clone(),
                    Some(placeholder.alarm.clone()),
                );
            }
        }

        self.instance = Some(instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashcraft_registry::{Element, ElementCategory, ElementDefinition, ElementError, Registry};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts how many times it has been configured since creation
    struct Counter {
        configured: usize,
    }

    impl Element for Counter {
        fn set_config(&mut self, config: &ElementConfig) -> Result<(), ElementError> {
            if config.get("fail") == Some(&json!(true)) {
                return Err(ElementError::invalid("asked to fail"));
            }
            self.configured += 1;
            Ok(())
        }

        fn render(&self) -> String {
            format!("configured {}", self.configured)
        }
    }

    fn host() -> (PreviewHost, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let registry = Registry::new();
        registry
            .register(
                "dash-counter-card",
                ElementDefinition::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Counter { configured: 0 }
                }),
            )
            .unwrap();
        registry
            .register("dash-other-card", ElementDefinition::new(|| Counter { configured: 0 }))
            .unwrap();
        (PreviewHost::new(Resolver::new(registry, ElementCategory::Card)), created)
    }

    fn config(value: serde_json::Value) -> ElementConfig {
        ElementConfig::from_value(value).unwrap()
    }

    #[test]
    fn test_first_config_builds() {
        let (mut host, created) = host();
        assert_eq!(host.apply(&config(json!({ "type": "counter" }))), PreviewAction::Built);
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(host.render(), "configured 1");
    }

    #[test]
    fn test_same_tag_updates_in_place() {
        let (mut host, created) = host();
        host.apply(&config(json!({ "type": "counter" })));

        let action = host.apply(&config(json!({ "type": "counter", "title": "x" })));
        assert_eq!(action, PreviewAction::Updated);
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(host.render(), "configured 2");
    }

    #[test]
    fn test_equal_config_is_unchanged() {
        let (mut host, _) = host();
        host.apply(&config(json!({ "type": "counter" })));
        assert_eq!(host.apply(&config(json!({ "type": "counter" }))), PreviewAction::Unchanged);
    }

    #[test]
    fn test_type_change_rebuilds() {
        let (mut host, _) = host();
        host.apply(&config(json!({ "type": "counter" })));
        assert_eq!(host.apply(&config(json!({ "type": "other" }))), PreviewAction::Built);
        assert_eq!(host.build_count(), 2);
    }

    #[test]
    fn test_failed_update_then_rebuild_on_next_change() {
        let (mut host, created) = host();
        host.apply(&config(json!({ "type": "counter" })));

        host.apply(&config(json!({ "type": "counter", "fail": true })));
        assert!(host.is_error());
        assert!(host.render().starts_with("Error: Invalid configuration: asked to fail"));

        let action = host.apply(&config(json!({ "type": "counter", "fail": false })));
        assert_eq!(action, PreviewAction::Built);
        assert!(!host.is_error());
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rebuild_for_other_tag_is_ignored() {
        let (mut host, _) = host();
        host.apply(&config(json!({ "type": "counter" })));
        let stale = Rebuild {
            tag: dashcraft_registry::Tag::new("dash-grid-card"),
        };
        assert!(!host.handle_rebuild(&stale));
        assert_eq!(host.build_count(), 1);
    }
}
