//! DOM Module - Arena-based destination document
//!
//! Implements the converted document using:
//! - Arena allocation for nodes, attributes and namespace bindings
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for names, values and text
//! - Scoped namespace bindings with ancestor lookup

pub mod document;
pub mod namespace;
pub mod node;
pub mod serialize;
pub mod strings;

pub use document::{DoctypeDecl, XmlDocument, DOCUMENT_NODE};
pub use namespace::XmlNs;
pub use node::{AttrId, NodeId, NodeKind, NsId, XmlAttribute, XmlNode};
pub use serialize::{node_to_xml, to_xml};
pub use strings::{StrId, StringPool};
