//! # Dashcraft Config
//!
//! The configuration document shared by every stage of the element pipeline.
//!
//! An [`ElementConfig`] is an opaque mapping with one required field, `type`,
//! the discriminator used to pick an element implementation. Everything else
//! belongs to the implementation and is carried through untouched.
//!
//! Documents are immutable values. Each transformation returns a new document
//! that shares unchanged state with its parent, so history snapshots and the
//! live preview can hold on to old versions without defensive copies.
//!
//! ```rust,ignore
//! use dashcraft_config::{from_text, to_text, ElementConfig};
//!
//! let config = from_text("type: entities\ntitle: Lights\n")?;
//! let renamed = config.with_field("title", Some("Kitchen".into()))?;
//!
//! assert_eq!(config.get("title"), Some(&"Lights".into()));
//! assert_eq!(to_text(&renamed)?, "type: entities\ntitle: Kitchen\n");
//! ```

mod config;
mod error;
mod text;

pub use config::{ElementConfig, TYPE_FIELD};
pub use error::{ConfigError, ConfigResult};
pub use text::{from_text, to_text};

// Re-export the value types so element crates don't need their own serde_json
pub use serde_json::{Map, Value};
