//! Streaming record-to-XML transformation.
//!
//! A component consumes ordered batches of flat entity rows from a data
//! pipeline and renders each batch into one XML document by populating a
//! user-supplied template through XPath bindings. Entity paths anchor
//! repeating groups: the first row of an entity fills its anchor element in
//! place, every further row clones the anchor's subtree and appends it as a
//! new sibling. Namespaced templates can be addressed with prefix-free
//! paths because namespaces are stripped around evaluation and restored in
//! the output.
//!
//! The tree and path machinery live in their own crates: `xmlflow-dom`
//! (arena document, parse/serialize, namespace strip/restore) and
//! `xmlflow-xpath` (the XPath 1.0 subset engine).

pub mod binder;
pub mod component;
pub mod config;
pub mod error;
pub mod message;
pub mod model;
pub mod render;

pub use binder::{AttributeBinding, Bindings, EntityBinding};
pub use component::XmlFormatter;
pub use config::{AttributePathSetting, EntityPathSetting, FormatterSettings, RepeatScope};
pub use error::FormatterError;
pub use message::{ComponentStatistics, EntityData, Message, MessageTarget, TextMessage};
pub use model::{Model, ModelAttribute};
pub use render::RenderPass;
