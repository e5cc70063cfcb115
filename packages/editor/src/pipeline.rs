//! # Editing Workbench
//!
//! Wires one edit session to a live preview and an undo/redo timeline.
//!
//! The workbench manages:
//! - Routing session notifications to the preview, in order
//! - Running form-editor reloads after type changes
//! - Committing snapshots and replaying them on undo/redo

use crate::channel::ConfigChanged;
use crate::errors::EditorError;
use crate::history::Timeline;
use crate::options::EditorOptions;
use crate::preview::PreviewHost;
use crate::session::{Edit, EditorMode, EditorSession, Saver};
use dashcraft_config::{ElementConfig, Value};
use dashcraft_registry::Registry;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

pub struct Workbench {
    session: EditorSession,
    preview: PreviewHost,
    timeline: Timeline<ElementConfig>,
    changes: UnboundedReceiver<ConfigChanged>,
}

impl Workbench {
    pub fn new(registry: Registry, options: &EditorOptions) -> Self {
        let resolver = options.resolver(registry);
        let mut session = EditorSession::new(resolver.clone());
        let changes = session.subscribe();

        Self {
            session,
            preview: PreviewHost::new(resolver),
            timeline: Timeline::new(options.history_capacity),
            changes,
        }
    }

    /// Open `config`, show it, and start a fresh history at it
    pub async fn open(&mut self, config: ElementConfig) {
        self.session.open(config.clone()).await;
        self.pump();
        self.timeline = Timeline::starting_at(config, self.timeline.history().capacity());
    }

    /// Open a new element from its stub config
    pub async fn open_new(&mut self, element_type: &str) {
        self.session.open_new(element_type).await;
        self.pump();
        if let Some(config) = self.session.config() {
            self.timeline = Timeline::starting_at(config.clone(), self.timeline.history().capacity());
        }
    }

    /// Deliver pending notifications and rebuild signals to the preview.
    /// Returns how many notifications were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(changed) = self.changes.try_recv() {
            self.preview.apply(&changed.config);
            applied += 1;
        }
        self.preview.process_rebuilds();
        applied
    }

    pub async fn edit_field(&mut self, key: &str, value: Option<Value>) -> Result<bool, EditorError> {
        let edit = self.session.edit_field(key, value)?;
        Ok(self.settle(edit).await)
    }

    pub async fn edit_text(&mut self, text: &str) -> Result<bool, EditorError> {
        let edit = self.session.edit_text(text)?;
        Ok(self.settle(edit).await)
    }

    /// Replace the whole document, whatever the mode
    pub async fn replace(&mut self, config: ElementConfig) -> Result<bool, EditorError> {
        let edit = self.session.replace_config(config)?;
        Ok(self.settle(edit).await)
    }

    pub fn toggle_mode(&mut self) -> Result<EditorMode, EditorError> {
        self.session.toggle_mode()
    }

    pub async fn save(&mut self, saver: &dyn Saver) -> Result<(), EditorError> {
        self.session.save(saver).await
    }

    /// Record the session's current document in the history. Returns
    /// `false` if it is already the latest snapshot.
    pub fn commit(&mut self) -> bool {
        let Some(config) = self.session.config() else {
            return false;
        };
        if self.timeline.current() == Some(config) {
            return false;
        }

        debug!(element_type = %config.element_type(), "committing snapshot");
        self.timeline.commit(config.clone());
        true
    }

    /// Step back to the previous snapshot. Returns `false` when there is
    /// nothing to undo. The timeline doesn't move if the session refuses
    /// the snapshot.
    pub async fn undo(&mut self) -> Result<bool, EditorError> {
        if self.session.is_busy() {
            return Err(EditorError::Busy);
        }
        let Some(snapshot) = self.timeline.undo().cloned() else {
            return Ok(false);
        };
        if let Err(e) = self.restore(snapshot).await {
            self.timeline.redo();
            return Err(e);
        }
        Ok(true)
    }

    pub async fn redo(&mut self) -> Result<bool, EditorError> {
        if self.session.is_busy() {
            return Err(EditorError::Busy);
        }
        let Some(snapshot) = self.timeline.redo().cloned() else {
            return Ok(false);
        };
        if let Err(e) = self.restore(snapshot).await {
            self.timeline.undo();
            return Err(e);
        }
        Ok(true)
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    pub fn preview(&self) -> &PreviewHost {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut PreviewHost {
        &mut self.preview
    }

    pub fn timeline(&self) -> &Timeline<ElementConfig> {
        &self.timeline
    }

    async fn restore(&mut self, snapshot: ElementConfig) -> Result<(), EditorError> {
        self.replace(snapshot).await?;
        Ok(())
    }

    async fn settle(&mut self, edit: Edit) -> bool {
        let applied = edit.is_applied();
        edit.settle(&mut self.session).await;
        self.pump();
        applied
    }
}
