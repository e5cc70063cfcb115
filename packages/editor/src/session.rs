//! # Edit Session
//!
//! One configuration document, edited either through the element's visual
//! form or as YAML text.
//!
//! ```text
//!             ┌──────────┐
//!   open ───▶ │ Loading  │ ◀──── type changed
//!             └────┬─────┘
//!          form ok │ no form / rejected
//!        ┌─────────┴─────────┐
//!        ▼                   ▼
//!   FormReady ◀─toggle─▶ TextReady
//!        │                   │
//!        ▼                   ▼
//!   FormError            TextError
//!
//!   any ready/error state ──save──▶ Saving ──▶ back
//! ```
//!
//! Loading an element's form editor is the only suspension point inside the
//! session. It is split into [`EditorSession::begin_load`], which hands back
//! a [`PendingLoad`] that borrows nothing, and
//! [`EditorSession::finish_load`], which ignores results that were overtaken
//! by a newer load.

use crate::channel::{ConfigChannel, ConfigChanged};
use crate::errors::{EditorError, SaveError};
use dashcraft_config::{from_text, to_text, ConfigError, ElementConfig, Value};
use dashcraft_registry::{EditorSource, FormEditor, FormRejection, LoadError, Resolver, SchemaField};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the element's form editor; input is refused
    Loading,
    FormReady,
    TextReady,
    /// The form produced a configuration its own validator rejects
    FormError,
    /// The text doesn't parse
    TextError,
    /// Waiting for the persistence collaborator
    Saving,
}

impl Phase {
    fn is_busy(self) -> bool {
        matches!(self, Phase::Loading | Phase::Saving)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Form,
    Text,
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorMode::Form => write!(f, "form"),
            EditorMode::Text => write!(f, "text"),
        }
    }
}

/// Snapshot of the session for hosts
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub phase: Phase,
    pub config: Option<ElementConfig>,
    pub mode: EditorMode,
    pub form_available: bool,
    pub last_error: Option<String>,
    pub warnings: Vec<String>,
    pub dirty: bool,
}

/// Result of an edit
#[must_use]
pub enum Edit {
    /// Equal to what the session already had
    Unchanged,
    Applied,
    /// The discriminator changed; the session is `Loading` until the
    /// returned load is run and handed back to `finish_load`
    TypeChanged(PendingLoad),
}

impl Edit {
    pub fn is_applied(&self) -> bool {
        !matches!(self, Edit::Unchanged)
    }

    /// Run the reload a type change started, if any
    pub async fn settle(self, session: &mut EditorSession) {
        if let Edit::TypeChanged(load) = self {
            let loaded = load.run().await;
            session.finish_load(loaded);
        }
    }
}

impl fmt::Debug for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Unchanged => f.write_str("Unchanged"),
            Edit::Applied => f.write_str("Applied"),
            Edit::TypeChanged(load) => f.debug_tuple("TypeChanged").field(load).finish(),
        }
    }
}

enum LoadSource {
    None,
    Cached(Arc<dyn FormEditor>),
    Loader(EditorSource),
}

/// A form-editor load in flight
pub struct PendingLoad {
    generation: u64,
    element_type: String,
    source: LoadSource,
}

impl PendingLoad {
    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    pub async fn run(self) -> LoadedEditor {
        let editor = match self.source {
            LoadSource::None => Ok(None),
            LoadSource::Cached(editor) => Ok(Some(editor)),
            LoadSource::Loader(source) => source.load().await.map(Some),
        };

        LoadedEditor {
            generation: self.generation,
            element_type: self.element_type,
            editor,
        }
    }
}

impl fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLoad")
            .field("generation", &self.generation)
            .field("element_type", &self.element_type)
            .finish()
    }
}

/// Outcome of a [`PendingLoad`]
pub struct LoadedEditor {
    generation: u64,
    element_type: String,
    editor: Result<Option<Arc<dyn FormEditor>>, LoadError>,
}

/// Persistence collaborator
pub trait Saver: Send + Sync {
    fn save(&self, config: ElementConfig) -> BoxFuture<'static, Result<(), SaveError>>;
}

impl<F, Fut> Saver for F
where
    F: Fn(ElementConfig) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), SaveError>> + Send + 'static,
{
    fn save(&self, config: ElementConfig) -> BoxFuture<'static, Result<(), SaveError>> {
        Box::pin(self(config))
    }
}

enum Verdict {
    NoForm,
    Accepted,
    Rejected(FormRejection),
}

pub struct EditorSession {
    resolver: Resolver,
    channel: ConfigChannel,

    phase: Phase,
    /// Phase to return to when a save finishes
    resume: Phase,
    mode: EditorMode,

    config: Option<ElementConfig>,
    /// Text buffer; `None` until text mode needs it
    text: Option<String>,

    /// Type the active form editor belongs to
    editor_type: Option<String>,
    form: Option<Arc<dyn FormEditor>>,
    /// Loaded editors, by discriminator
    editors: HashMap<String, Arc<dyn FormEditor>>,

    form_available: bool,
    last_error: Option<String>,
    parse_error: Option<ConfigError>,
    warnings: Vec<String>,
    dirty: bool,

    generation: u64,
}

impl EditorSession {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            channel: ConfigChannel::new(),
            phase: Phase::Loading,
            resume: Phase::Loading,
            mode: EditorMode::Form,
            config: None,
            text: None,
            editor_type: None,
            form: None,
            editors: HashMap::new(),
            form_available: false,
            last_error: None,
            parse_error: None,
            warnings: Vec::new(),
            dirty: false,
            generation: 0,
        }
    }

    /// Receive every configuration the session accepts from now on
    pub fn subscribe(&mut self) -> UnboundedReceiver<ConfigChanged> {
        self.channel.subscribe()
    }

    /// Open `config` and wait for its form editor
    pub async fn open(&mut self, config: ElementConfig) {
        let load = self.begin_load(config);
        let loaded = load.run().await;
        self.finish_load(loaded);
    }

    /// Open a fresh element of `element_type`, starting from its stub config
    pub async fn open_new(&mut self, element_type: &str) {
        let config = self.resolver.stub_config(element_type);
        self.open(config).await;
        self.dirty = true;
    }

    /// Replace the document and start loading its form editor.
    ///
    /// Any load still in flight becomes stale.
    pub fn begin_load(&mut self, config: ElementConfig) -> PendingLoad {
        self.config = Some(config);
        self.text = None;
        self.mode = EditorMode::Form;
        self.dirty = false;
        self.start_load()
    }

    fn start_load(&mut self) -> PendingLoad {
        let element_type = self
            .config
            .as_ref()
            .map(|config| config.element_type().to_string())
            .unwrap_or_default();

        self.generation += 1;
        self.phase = Phase::Loading;
        self.form = None;
        self.form_available = false;
        self.editor_type = Some(element_type.clone());
        self.clear_issues();

        let source = match self.editors.get(&element_type) {
            Some(editor) => LoadSource::Cached(Arc::clone(editor)),
            None => {
                let tag = self.resolver.tag_for(&element_type);
                self.resolver
                    .registry()
                    .lookup(&tag)
                    .and_then(|definition| definition.editor().cloned())
                    .map(LoadSource::Loader)
                    .unwrap_or(LoadSource::None)
            }
        };

        debug!(element_type = %element_type, generation = self.generation, "loading form editor");
        PendingLoad {
            generation: self.generation,
            element_type,
            source,
        }
    }

    /// Install a loaded form editor. Returns `false` and changes nothing if
    /// the load was overtaken by a newer one.
    pub fn finish_load(&mut self, loaded: LoadedEditor) -> bool {
        if loaded.generation != self.generation || self.phase != Phase::Loading {
            debug!(element_type = %loaded.element_type, "discarding stale form editor load");
            return false;
        }

        match loaded.editor {
            Ok(editor) => {
                if let Some(editor) = &editor {
                    self.editors
                        .insert(loaded.element_type.clone(), Arc::clone(editor));
                }
                self.form = editor;
            }
            Err(e) => {
                warn!(element_type = %loaded.element_type, error = %e, "form editor failed to load");
                self.form = None;
                self.last_error = Some(e.to_string());
            }
        }

        match self.verdict() {
            Verdict::Accepted => {
                self.form_available = true;
                self.phase = match self.mode {
                    EditorMode::Form => Phase::FormReady,
                    EditorMode::Text => Phase::TextReady,
                };
            }
            Verdict::NoForm => self.pin_to_text(),
            Verdict::Rejected(rejection) => {
                self.record_rejection(rejection);
                self.pin_to_text();
            }
        }

        info!(element_type = %loaded.element_type, phase = ?self.phase, "editor ready");
        self.notify();
        true
    }

    /// Set one field through the form. `None` removes it.
    pub fn edit_field(&mut self, key: &str, value: Option<Value>) -> Result<Edit, EditorError> {
        let config = self.current()?.with_field(key, value)?;
        self.submit_form(config)
    }

    /// Accept a full configuration produced by the form
    pub fn submit_form(&mut self, config: ElementConfig) -> Result<Edit, EditorError> {
        self.ensure_idle()?;
        if self.mode != EditorMode::Form {
            return Err(EditorError::WrongMode(EditorMode::Form));
        }
        if !self.form_available {
            return Err(EditorError::FormUnavailable(self.unavailable_reason()));
        }

        if self.config.as_ref() == Some(&config) {
            return Ok(Edit::Unchanged);
        }

        if self.type_changed(&config) {
            return Ok(self.change_type(config));
        }

        self.config = Some(config);
        self.text = None;
        self.dirty = true;

        match self.verdict() {
            Verdict::Accepted => {
                self.clear_issues();
                self.phase = Phase::FormReady;
            }
            Verdict::Rejected(rejection) if rejection.has_errors() => {
                debug!(error = %rejection, "form produced an invalid configuration");
                self.record_rejection(rejection);
                self.form_available = false;
                self.phase = Phase::FormError;
            }
            Verdict::Rejected(rejection) => {
                debug!(warnings = %rejection, "form can't represent the configuration, switching to text");
                self.record_rejection(rejection);
                self.pin_to_text();
            }
            Verdict::NoForm => self.pin_to_text(),
        }

        self.notify();
        Ok(Edit::Applied)
    }

    /// Replace the text buffer and re-parse it
    pub fn edit_text(&mut self, text: &str) -> Result<Edit, EditorError> {
        self.ensure_idle()?;
        if self.mode != EditorMode::Text {
            return Err(EditorError::WrongMode(EditorMode::Text));
        }
        if self.text.as_deref() == Some(text) {
            return Ok(Edit::Unchanged);
        }

        self.text = Some(text.to_string());

        let config = match from_text(text) {
            Ok(config) => config,
            Err(e) => {
                debug!(error = %e, "text does not parse");
                self.phase = Phase::TextError;
                self.last_error = Some(e.to_string());
                self.parse_error = Some(e.clone());
                self.form_available = false;
                return Err(EditorError::Parse(e));
            }
        };

        self.parse_error = None;
        self.dirty = true;

        if self.type_changed(&config) {
            return Ok(self.change_type(config));
        }

        self.config = Some(config);
        self.clear_issues();
        self.phase = Phase::TextReady;

        match self.verdict() {
            Verdict::Accepted => self.form_available = true,
            Verdict::NoForm => self.form_available = false,
            Verdict::Rejected(rejection) => {
                self.record_rejection(rejection);
                self.form_available = false;
            }
        }

        self.notify();
        Ok(Edit::Applied)
    }

    /// Replace the whole document from outside, e.g. when undoing
    pub fn replace_config(&mut self, config: ElementConfig) -> Result<Edit, EditorError> {
        self.ensure_idle()?;
        if self.config.as_ref() == Some(&config) {
            return Ok(Edit::Unchanged);
        }

        self.dirty = true;
        self.parse_error = None;

        if self.type_changed(&config) {
            return Ok(self.change_type(config));
        }

        self.config = Some(config);
        self.text = None;
        self.clear_issues();

        match self.verdict() {
            Verdict::Accepted => {
                self.form_available = true;
                self.phase = match self.mode {
                    EditorMode::Form => Phase::FormReady,
                    EditorMode::Text => Phase::TextReady,
                };
            }
            Verdict::NoForm => self.pin_to_text(),
            Verdict::Rejected(rejection) => {
                self.record_rejection(rejection);
                self.pin_to_text();
            }
        }

        self.notify();
        Ok(Edit::Applied)
    }

    /// Switch between form and text. Returns the new mode.
    ///
    /// Leaving the form always works. Entering it is refused, and the
    /// session stays in text mode, when the form can't represent the
    /// current document.
    pub fn toggle_mode(&mut self) -> Result<EditorMode, EditorError> {
        self.ensure_idle()?;
        let config = self.current()?.clone();

        match self.mode {
            EditorMode::Form => {
                self.text = Some(to_text(&config)?);
                self.mode = EditorMode::Text;
                if matches!(self.phase, Phase::FormReady | Phase::FormError) {
                    self.phase = Phase::TextReady;
                }
            }
            EditorMode::Text => {
                if let Some(e) = &self.parse_error {
                    return Err(EditorError::FormUnavailable(e.to_string()));
                }

                match self.verdict() {
                    Verdict::Accepted => {
                        self.clear_issues();
                        self.form_available = true;
                        self.mode = EditorMode::Form;
                        self.phase = Phase::FormReady;
                        self.text = None;
                    }
                    Verdict::NoForm => {
                        return Err(EditorError::FormUnavailable(self.unavailable_reason()));
                    }
                    Verdict::Rejected(rejection) => {
                        let reason = rejection.to_string();
                        self.record_rejection(rejection);
                        self.form_available = false;
                        return Err(EditorError::FormUnavailable(reason));
                    }
                }
            }
        }

        debug!(mode = %self.mode, "editor mode changed");
        Ok(self.mode)
    }

    /// Enter `Saving` and return the document to persist
    pub fn begin_save(&mut self) -> Result<ElementConfig, EditorError> {
        self.ensure_idle()?;
        if let Some(e) = &self.parse_error {
            return Err(EditorError::Parse(e.clone()));
        }
        if self.phase == Phase::FormError {
            let reason = self.last_error.clone().unwrap_or_default();
            return Err(EditorError::Invalid(reason));
        }
        let config = self.current()?.clone();

        self.resume = self.phase;
        self.phase = Phase::Saving;
        Ok(config)
    }

    /// Leave `Saving`. Edits are kept whatever the outcome.
    pub fn finish_save(&mut self, result: Result<(), SaveError>) -> Result<(), EditorError> {
        if self.phase != Phase::Saving {
            return Ok(());
        }
        self.phase = self.resume;

        match result {
            Ok(()) => {
                self.dirty = false;
                info!("configuration saved");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "save failed, keeping edits");
                Err(EditorError::Save(e))
            }
        }
    }

    pub async fn save(&mut self, saver: &dyn Saver) -> Result<(), EditorError> {
        let config = self.begin_save()?;
        let result = saver.save(config).await;
        self.finish_save(result)
    }

    pub fn state(&self) -> EditorState {
        EditorState {
            phase: self.phase,
            config: self.config.clone(),
            mode: self.mode,
            form_available: self.form_available,
            last_error: self.last_error.clone(),
            warnings: self.warnings.clone(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Last valid document
    pub fn config(&self) -> Option<&ElementConfig> {
        self.config.as_ref()
    }

    /// Text as shown in text mode
    pub fn text(&self) -> Result<String, EditorError> {
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => Ok(to_text(self.current()?)?),
        }
    }

    /// Loading or saving; edits are refused with [`EditorError::Busy`]
    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    pub fn form_available(&self) -> bool {
        self.form_available
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the current element has a form editor at all
    pub fn has_form(&self) -> bool {
        self.form.is_some()
    }

    /// Fields of the active form editor
    pub fn form_fields(&self) -> Vec<SchemaField> {
        self.form
            .as_ref()
            .map(|form| form.fields())
            .unwrap_or_default()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    fn current(&self) -> Result<&ElementConfig, EditorError> {
        self.config.as_ref().ok_or(EditorError::NoDocument)
    }

    fn ensure_idle(&self) -> Result<(), EditorError> {
        if self.phase.is_busy() {
            return Err(EditorError::Busy);
        }
        Ok(())
    }

    fn type_changed(&self, config: &ElementConfig) -> bool {
        self.editor_type.as_deref() != Some(config.element_type())
    }

    /// Accept a document of another type and restart from `Loading`. The
    /// text buffer survives so the user keeps typing where they were.
    fn change_type(&mut self, config: ElementConfig) -> Edit {
        info!(
            from = ?self.editor_type,
            to = %config.element_type(),
            "element type changed"
        );

        self.config = Some(config.clone());
        self.dirty = true;
        self.channel.emit(ConfigChanged {
            config,
            error: None,
            form_available: false,
        });

        Edit::TypeChanged(self.start_load())
    }

    fn verdict(&self) -> Verdict {
        let (Some(form), Some(config)) = (&self.form, &self.config) else {
            return Verdict::NoForm;
        };

        match form.validate(config) {
            Ok(()) => Verdict::Accepted,
            Err(rejection) => Verdict::Rejected(rejection),
        }
    }

    fn record_rejection(&mut self, rejection: FormRejection) {
        self.last_error = if rejection.has_errors() {
            Some(rejection.errors.join(", "))
        } else {
            None
        };
        self.warnings = rejection.warnings;
    }

    fn clear_issues(&mut self) {
        self.last_error = None;
        self.parse_error = None;
        self.warnings.clear();
    }

    fn pin_to_text(&mut self) {
        self.form_available = false;
        self.mode = EditorMode::Text;
        self.phase = Phase::TextReady;
    }

    fn unavailable_reason(&self) -> String {
        if self.form.is_none() {
            return format!(
                "Visual editor not supported for type '{}'",
                self.editor_type.as_deref().unwrap_or_default()
            );
        }
        let mut messages: Vec<&str> = self.last_error.iter().map(String::as_str).collect();
        messages.extend(self.warnings.iter().map(String::as_str));
        messages.join(", ")
    }

    fn notify(&mut self) {
        let Some(config) = self.config.clone() else {
            return;
        };
        let error = self.last_error.clone();
        self.channel.emit(ConfigChanged {
            config,
            error,
            form_available: self.form_available,
        });
    }
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("phase", &self.phase)
            .field("mode", &self.mode)
            .field("config", &self.config)
            .field("form_available", &self.form_available)
            .field("dirty", &self.dirty)
            .finish()
    }
}
