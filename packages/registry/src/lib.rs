//! # Dashcraft Registry
//!
//! Resolution and construction of dashboard elements.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ registry: tag → definition (append-only)    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ resolver: type → tag + capabilities         │
//! │  - deterministic, cached                    │
//! │  - waits for pending implementations        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ factory: tag + config → instance            │
//! │  - never fails, errors become placeholders  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dashcraft_registry::{ElementCategory, ElementDefinition, Factory, Registry, Resolver};
//!
//! let registry = Registry::new();
//! registry.register("dash-entities-card", ElementDefinition::new(EntitiesCard::default))?;
//!
//! let resolver = Resolver::new(registry.clone(), ElementCategory::Card);
//! let factory = Factory::new(registry);
//!
//! let resolution = resolver.resolve(config.element_type());
//! let instance = factory.build(&resolution.tag, &config);
//! println!("{}", instance.render());
//! ```

mod element;
mod factory;
mod form;
mod registry;
mod resolver;
mod tag;

pub use element::{Element, ElementError};
pub use factory::{Factory, Instance, Placeholder, PlaceholderAlarm, PlaceholderKind};
pub use form::{
    EditorFuture, EditorLoader, EditorSource, FieldKind, FormEditor, FormRejection, LoadError,
    SchemaField, SchemaForm, SchemaLoader,
};
pub use registry::{ElementDefinition, Registry, RegistryError};
pub use resolver::{
    ElementDescriptor, Rebuild, RebuildSender, Resolution, Resolver, WaitStatus,
    DEFAULT_QUIET_AFTER,
};
pub use tag::{is_custom_type, ElementCategory, Tag, CUSTOM_PREFIX, ERROR_TAG};
