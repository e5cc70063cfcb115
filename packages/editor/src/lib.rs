//! # Dashcraft Editor
//!
//! Editing pipeline for one dashboard element.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ session: form ⇄ text editing of one config  │
//! │  - loads the element's form editor          │
//! │  - validates, parses, tracks errors         │
//! │  - emits config-changed notifications       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ preview: config → live instance             │
//! │  - update in place or rebuild               │
//! │  - self-heals when late elements register   │
//! └─────────────────────────────────────────────┘
//!
//!   history: bounded undo/redo of snapshots, committed by the host
//! ```
//!
//! ## Core Principles
//!
//! 1. **Config is a value**: every edit produces a new document
//! 2. **Nothing escapes**: parse, validation and element failures stay inside
//!    the session or become placeholders
//! 3. **Last valid config wins**: text that doesn't parse never reaches the
//!    preview
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dashcraft_editor::{EditorOptions, Workbench};
//!
//! let mut bench = Workbench::new(registry, &EditorOptions::default());
//! bench.open(config).await;
//!
//! bench.edit_field("title", Some("Kitchen".into())).await?;
//! bench.commit();
//!
//! bench.undo().await?;
//! println!("{}", bench.preview().render());
//! ```

mod channel;
mod errors;
mod history;
mod options;
mod pipeline;
mod preview;
mod session;

pub use channel::{ConfigChannel, ConfigChanged};
pub use errors::{EditorError, SaveError};
pub use history::{History, Timeline, DEFAULT_CAPACITY};
pub use options::EditorOptions;
pub use pipeline::Workbench;
pub use preview::{PreviewAction, PreviewHost};
pub use session::{
    Edit, EditorMode, EditorSession, EditorState, LoadedEditor, PendingLoad, Phase, Saver,
};

// Re-export common types for convenience
pub use dashcraft_config::ElementConfig;
pub use dashcraft_registry::{ElementCategory, Registry, Resolver};
