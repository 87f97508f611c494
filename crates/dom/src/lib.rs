pub mod document;
pub mod error;
mod parse;
pub mod source;
mod write;

pub use document::{Document, Namespace, NamespaceMap, NodeId};
pub use error::XmlError;
pub use source::NodeRef;
