//! Source Module - parsed HTML input
//!
//! The tree an external HTML5 tree builder hands to the converter.

pub mod tree;

pub use tree::{
    AttrNamespace, SourceAttribute, SourceDoctype, SourceElement, SourceId, SourceKind, SourceNode, SourceTree,
    SOURCE_DOCUMENT,
};
