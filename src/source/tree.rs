//! Source Tree
//!
//! The read-only input of a conversion: the tree an HTML5 tree builder
//! produced. Nodes live in one arena and refer to each other by
//! [`SourceId`]; every node except the document keeps a back-reference to
//! its parent.

use crate::core::tags::{Tag, TagNamespace};

/// Index into the source arena
pub type SourceId = u32;

/// Id of the document node, always present
pub const SOURCE_DOCUMENT: SourceId = 0;

/// Which XML namespace the tree builder assigned to an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttrNamespace {
    #[default]
    None,
    Xlink,
    Xml,
    Xmlns,
}

/// One source attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttribute {
    /// Name as classified by the tree builder. For the `xlink`, `xml` and
    /// `xmlns` buckets this is the local part.
    pub name: String,
    pub value: String,
    pub namespace: AttrNamespace,
    /// Name as written in the markup
    pub original_name: String,
}

impl SourceAttribute {
    /// An attribute with no namespace classification
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        SourceAttribute {
            original_name: name.clone(),
            name,
            value: value.into(),
            namespace: AttrNamespace::None,
        }
    }

    /// An attribute the tree builder placed in a foreign namespace
    pub fn namespaced(namespace: AttrNamespace, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let original_name = match namespace {
            AttrNamespace::None => name.clone(),
            AttrNamespace::Xlink => format!("xlink:{name}"),
            AttrNamespace::Xml => format!("xml:{name}"),
            AttrNamespace::Xmlns if name == "xmlns" => name.clone(),
            AttrNamespace::Xmlns => format!("xmlns:{name}"),
        };
        SourceAttribute {
            name,
            value: value.into(),
            namespace,
            original_name,
        }
    }
}

/// Element payload shared by elements and templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceElement {
    pub tag: Tag,
    /// Tag name as written in the markup
    pub original_tag: String,
    pub namespace: TagNamespace,
    pub attributes: Vec<SourceAttribute>,
    /// Line the start tag was on
    pub line: u32,
}

impl SourceElement {
    /// Element named `name`, classified against the standard tag table
    pub fn new(name: impl Into<String>, namespace: TagNamespace) -> Self {
        let original_tag = name.into();
        SourceElement {
            tag: Tag::from_name(&original_tag),
            original_tag,
            namespace,
            attributes: Vec::new(),
            line: 0,
        }
    }

    pub fn html(name: impl Into<String>) -> Self {
        Self::new(name, TagNamespace::Html)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(SourceAttribute::new(name, value));
        self
    }

    pub fn ns_attr(mut self, namespace: AttrNamespace, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(SourceAttribute::namespaced(namespace, name, value));
        self
    }

    pub fn line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

/// Doctype carried by the document node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceDoctype {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Document { doctype: Option<SourceDoctype> },
    Element(SourceElement),
    Template(SourceElement),
    Text(String),
    Whitespace(String),
    Comment(String),
    CData(String),
}

impl SourceKind {
    /// Element payload of an element or template
    #[inline]
    pub fn as_element(&self) -> Option<&SourceElement> {
        match self {
            SourceKind::Element(e) | SourceKind::Template(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    fn holds_children(&self) -> bool {
        matches!(self, SourceKind::Document { .. } | SourceKind::Element(_) | SourceKind::Template(_))
    }
}

/// A node in the source arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNode {
    pub kind: SourceKind,
    /// Non-owning back-reference, `None` for the document
    pub parent: Option<SourceId>,
    pub children: Vec<SourceId>,
}

/// Arena holding a parsed HTML tree
#[derive(Debug, Clone)]
pub struct SourceTree {
    nodes: Vec<SourceNode>,
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceTree {
    /// A tree holding only a document node without doctype
    pub fn new() -> Self {
        SourceTree {
            nodes: vec![SourceNode {
                kind: SourceKind::Document { doctype: None },
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Set or clear the document's doctype
    pub fn set_doctype(&mut self, decl: Option<SourceDoctype>) {
        if let SourceKind::Document { doctype } = &mut self.nodes[SOURCE_DOCUMENT as usize].kind {
            *doctype = decl;
        }
    }

    /// The document's doctype
    pub fn doctype(&self) -> Option<&SourceDoctype> {
        match &self.nodes[SOURCE_DOCUMENT as usize].kind {
            SourceKind::Document { doctype } => doctype.as_ref(),
            _ => None,
        }
    }

    /// Append a node as the last child of `parent`.
    ///
    /// Returns `None` when `parent` does not exist or cannot hold children.
    pub fn append(&mut self, parent: SourceId, kind: SourceKind) -> Option<SourceId> {
        if !self.get(parent)?.kind.holds_children() {
            return None;
        }
        let id = SourceId::try_from(self.nodes.len()).ok()?;
        self.nodes.push(SourceNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent as usize].children.push(id);
        Some(id)
    }

    pub fn append_element(&mut self, parent: SourceId, element: SourceElement) -> Option<SourceId> {
        self.append(parent, SourceKind::Element(element))
    }

    pub fn append_template(&mut self, parent: SourceId, element: SourceElement) -> Option<SourceId> {
        self.append(parent, SourceKind::Template(element))
    }

    pub fn append_text(&mut self, parent: SourceId, text: impl Into<String>) -> Option<SourceId> {
        self.append(parent, SourceKind::Text(text.into()))
    }

    pub fn append_whitespace(&mut self, parent: SourceId, text: impl Into<String>) -> Option<SourceId> {
        self.append(parent, SourceKind::Whitespace(text.into()))
    }

    pub fn append_comment(&mut self, parent: SourceId, text: impl Into<String>) -> Option<SourceId> {
        self.append(parent, SourceKind::Comment(text.into()))
    }

    pub fn append_cdata(&mut self, parent: SourceId, text: impl Into<String>) -> Option<SourceId> {
        self.append(parent, SourceKind::CData(text.into()))
    }

    /// Get a node by id
    #[inline]
    pub fn get(&self, id: SourceId) -> Option<&SourceNode> {
        self.nodes.get(id as usize)
    }

    /// Children of a node in document order
    pub fn children(&self, id: SourceId) -> &[SourceId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// The root element: the first element or template child of the document
    pub fn root(&self) -> Option<SourceId> {
        self.children(SOURCE_DOCUMENT)
            .iter()
            .copied()
            .find(|&id| self.get(id).is_some_and(|n| n.kind.as_element().is_some()))
    }

    /// Number of nodes, the document included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}
