//! DOM Node representation
//!
//! Uses u32 ids for compact, cache-friendly node references into the
//! document arenas.

use super::strings::StrId;

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Attribute identifier (index into attribute arena)
pub type AttrId = u32;

/// Namespace binding identifier (index into namespace arena)
pub type NsId = u32;

/// Type of DOM node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// `<!DOCTYPE ...>` declaration
    DocumentType,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the document and for nodes not yet attached)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Element or doctype name; content for text, CDATA and comment nodes
    pub name_id: StrId,
    /// Namespace of this element
    pub ns: Option<NsId>,
    /// First namespace binding declared on this element
    pub ns_def: Option<NsId>,
    /// First attribute
    pub first_attr: Option<AttrId>,
    /// Last attribute (for O(1) append)
    pub last_attr: Option<AttrId>,
    /// Source line the element started on, 0 when unknown
    pub line: u32,
}

impl XmlNode {
    fn with_kind(kind: NodeKind, name_id: StrId) -> Self {
        XmlNode {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id,
            ns: None,
            ns_def: None,
            first_attr: None,
            last_attr: None,
            line: 0,
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document, 0)
    }

    /// Create a doctype node
    pub fn doctype(name_id: StrId) -> Self {
        Self::with_kind(NodeKind::DocumentType, name_id)
    }

    /// Create a new, unattached element node
    pub fn element(name_id: StrId, line: u32) -> Self {
        let mut node = Self::with_kind(NodeKind::Element, name_id);
        node.line = line;
        node
    }

    /// Create a new text node
    pub fn text(content_id: StrId) -> Self {
        Self::with_kind(NodeKind::Text, content_id)
    }

    /// Create a new comment node
    pub fn comment(content_id: StrId) -> Self {
        Self::with_kind(NodeKind::Comment, content_id)
    }

    /// Create a new CDATA node
    pub fn cdata(content_id: StrId) -> Self {
        Self::with_kind(NodeKind::CData, content_id)
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this node carries character content
    #[inline]
    pub fn is_character_data(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData | NodeKind::Comment)
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Check if this node has attributes
    #[inline]
    pub fn has_attributes(&self) -> bool {
        self.first_attr.is_some()
    }
}

/// Stored attribute
#[derive(Debug, Clone)]
pub struct XmlAttribute {
    /// Interned attribute name (local part when namespaced)
    pub name_id: StrId,
    /// Namespace binding, if any
    pub ns: Option<NsId>,
    /// Interned attribute value
    pub value_id: StrId,
    /// Next attribute on the same element
    pub next: Option<AttrId>,
}

impl XmlAttribute {
    pub fn new(name_id: StrId, ns: Option<NsId>, value_id: StrId) -> Self {
        XmlAttribute {
            name_id,
            ns,
            value_id,
            next: None,
        }
    }
}
