//! DOM Document - Arena-based tree representation
//!
//! Efficient DOM storage with:
//! - Arena allocation for nodes, attributes and namespace bindings
//! - NodeId indices for traversal
//! - String interning for names, values and text
//!
//! All arena growth is fallible. Dropping the document releases every node,
//! attached or not, in one go.

use super::namespace::XmlNs;
use super::node::{AttrId, NodeId, NodeKind, NsId, XmlAttribute, XmlNode};
use super::strings::{StrId, StringPool};
use crate::error::{next_id, reserve_one, ConvertError, Result};

/// Node id of the document node
pub const DOCUMENT_NODE: NodeId = 0;

/// `<!DOCTYPE name PUBLIC "public_id" "system_id">`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctypeDecl {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

/// A DOM document stored in arena format
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Arena of nodes; index 0 is the document node
    pub(crate) nodes: Vec<XmlNode>,
    /// Arena of attributes
    pub(crate) attributes: Vec<XmlAttribute>,
    /// Arena of namespace bindings
    pub(crate) namespaces: Vec<XmlNs>,
    /// Interned strings
    pub strings: StringPool,
    /// Root element node ID (not document node)
    pub(crate) root_element: Option<NodeId>,
    /// Doctype, if one was attached
    pub(crate) doctype: Option<DoctypeDecl>,
    /// Document-owned binding for the `xml` prefix, created on first use
    pub(crate) xml_ns: Option<NsId>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// Create an empty document holding only the document node
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(256);
        nodes.push(XmlNode::document());
        XmlDocument {
            nodes,
            attributes: Vec::with_capacity(128),
            namespaces: Vec::with_capacity(8),
            strings: StringPool::new(),
            root_element: None,
            doctype: None,
            xml_ns: None,
        }
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    fn push_node(&mut self, node: XmlNode) -> Result<NodeId> {
        reserve_one(&mut self.nodes, crate::site!("Out of memory allocating node"))?;
        let id: NodeId = next_id(self.nodes.len(), crate::site!("Node arena is full"))?;
        self.nodes.push(node);
        Ok(id)
    }

    /// Create an unattached element with an already interned name
    pub fn new_element_named(&mut self, name_id: StrId, line: u32) -> Result<NodeId> {
        self.push_node(XmlNode::element(name_id, line))
    }

    /// Create an unattached element
    pub fn new_element(&mut self, name: &[u8], line: u32) -> Result<NodeId> {
        let name_id = self.strings.intern(name)?;
        self.new_element_named(name_id, line)
    }

    /// Create an unattached text node
    pub fn new_text(&mut self, content: &[u8]) -> Result<NodeId> {
        let id = self.strings.intern(content)?;
        self.push_node(XmlNode::text(id))
    }

    /// Create an unattached comment node
    pub fn new_comment(&mut self, content: &[u8]) -> Result<NodeId> {
        let id = self.strings.intern(content)?;
        self.push_node(XmlNode::comment(id))
    }

    /// Create an unattached CDATA section
    pub fn new_cdata(&mut self, content: &[u8]) -> Result<NodeId> {
        let id = self.strings.intern(content)?;
        self.push_node(XmlNode::cdata(id))
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    /// Append `child` as the last child of `parent`.
    ///
    /// `child` must be unattached and `parent` must be an element or the
    /// document node.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_link(parent, child)?;
        self.link_child(parent, child);
        Ok(())
    }

    fn check_link(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let (Some(p), Some(c)) = (self.get_node(parent), self.get_node(child)) else {
            return Err(ConvertError::Structure(crate::site!("Failed to add child: no such node")));
        };
        if parent == child || c.parent.is_some() || c.kind == NodeKind::Document {
            return Err(ConvertError::Structure(crate::site!("Failed to add child: node already linked")));
        }
        if !matches!(p.kind, NodeKind::Element | NodeKind::Document) {
            return Err(ConvertError::Structure(crate::site!("Failed to add child: parent cannot hold children")));
        }
        Ok(())
    }

    /// Link a child node to its parent
    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let last_child_opt = self.nodes[parent_id as usize].last_child;

        if let Some(last_child_id) = last_child_opt {
            // Link to previous sibling
            self.nodes[child_id as usize].prev_sibling = Some(last_child_id);
            self.nodes[last_child_id as usize].next_sibling = Some(child_id);
        } else {
            // First child
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
        self.nodes[child_id as usize].parent = Some(parent_id);
    }

    /// Insert `node` immediately before the attached node `reference`
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        let Some(parent) = self.get_node(reference).and_then(|n| n.parent) else {
            return Err(ConvertError::Structure(crate::site!("Failed to add sibling: reference is detached")));
        };
        self.check_link(parent, node)?;

        let prev = self.nodes[reference as usize].prev_sibling;
        {
            let n = &mut self.nodes[node as usize];
            n.parent = Some(parent);
            n.prev_sibling = prev;
            n.next_sibling = Some(reference);
        }
        self.nodes[reference as usize].prev_sibling = Some(node);
        match prev {
            Some(p) => self.nodes[p as usize].next_sibling = Some(node),
            None => self.nodes[parent as usize].first_child = Some(node),
        }
        Ok(())
    }

    /// Make `element` the document's root element
    pub fn set_root(&mut self, element: NodeId) -> Result<()> {
        if self.root_element.is_some() {
            return Err(ConvertError::Structure(crate::site!("Document already has a root element")));
        }
        if !self.get_node(element).is_some_and(XmlNode::is_element) {
            return Err(ConvertError::Structure(crate::site!("Root node is not an element")));
        }
        self.append_child(DOCUMENT_NODE, element)?;
        self.root_element = Some(element);
        Ok(())
    }

    /// Attach a doctype declaration as a child of the document node
    pub fn set_doctype(&mut self, decl: DoctypeDecl) -> Result<NodeId> {
        if self.doctype.is_some() {
            return Err(ConvertError::Structure(crate::site!("Document already has a doctype")));
        }
        let name_id = self.strings.intern(decl.name.as_bytes())?;
        let id = self.push_node(XmlNode::doctype(name_id))?;
        match self.nodes[DOCUMENT_NODE as usize].first_child {
            Some(first) => self.insert_before(first, id)?,
            None => self.append_child(DOCUMENT_NODE, id)?,
        }
        self.doctype = Some(decl);
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    /// Append an attribute with an interned name to an element
    pub fn new_attribute(&mut self, node: NodeId, ns: Option<NsId>, name_id: StrId, value: &[u8]) -> Result<AttrId> {
        if !self.get_node(node).is_some_and(XmlNode::is_element) {
            return Err(ConvertError::Structure(crate::site!("Attributes need an element")));
        }
        let value_id = self.strings.intern(value)?;
        self.new_attribute_interned(node, ns, name_id, value_id)
    }

    /// Append an attribute whose value is already interned
    pub fn new_attribute_interned(
        &mut self,
        node: NodeId,
        ns: Option<NsId>,
        name_id: StrId,
        value_id: StrId,
    ) -> Result<AttrId> {
        if !self.get_node(node).is_some_and(XmlNode::is_element) {
            return Err(ConvertError::Structure(crate::site!("Attributes need an element")));
        }
        reserve_one(&mut self.attributes, crate::site!("Out of memory allocating attribute"))?;
        let id: AttrId = next_id(self.attributes.len(), crate::site!("Attribute arena is full"))?;
        self.attributes.push(XmlAttribute::new(name_id, ns, value_id));

        let n = &mut self.nodes[node as usize];
        match n.last_attr {
            Some(last) => self.attributes[last as usize].next = Some(id),
            None => n.first_attr = Some(id),
        }
        n.last_attr = Some(id);
        Ok(id)
    }

    /// Set an attribute without a namespace, replacing the value if present
    pub fn set_attribute(&mut self, node: NodeId, name_id: StrId, value: &[u8]) -> Result<AttrId> {
        match self.find_attribute(node, name_id, None) {
            Some(id) => {
                let value_id = self.strings.intern(value)?;
                self.attributes[id as usize].value_id = value_id;
                Ok(id)
            }
            None => self.new_attribute(node, None, name_id, value),
        }
    }

    /// Find an attribute by interned name and exact binding
    pub fn find_attribute(&self, node: NodeId, name_id: StrId, ns: Option<NsId>) -> Option<AttrId> {
        self.attribute_ids(node).find(|&id| {
            let attr = &self.attributes[id as usize];
            attr.name_id == name_id && attr.ns == ns
        })
    }

    /// Get an attribute by id
    pub fn get_attr(&self, id: AttrId) -> Option<&XmlAttribute> {
        self.attributes.get(id as usize)
    }

    /// Iterate over the attribute ids of an element in document order
    pub fn attribute_ids(&self, node: NodeId) -> AttrIter<'_> {
        let first = self.get_node(node).and_then(|n| n.first_attr);
        AttrIter { doc: self, next: first }
    }

    /// Get a namespace-less attribute value by name
    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attribute_ids(node)
            .map(|id| &self.attributes[id as usize])
            .find(|a| a.ns.is_none() && self.strings.get_str(a.name_id) == Some(name))
            .and_then(|a| self.strings.get_str(a.value_id))
    }

    /// Get an attribute value by local name and namespace URI
    pub fn get_attribute_ns(&self, node: NodeId, name: &str, uri: &str) -> Option<&str> {
        self.attribute_ids(node)
            .map(|id| &self.attributes[id as usize])
            .find(|a| {
                a.ns.and_then(|ns| self.ns_uri(ns)) == Some(uri)
                    && self.strings.get_str(a.name_id) == Some(name)
            })
            .and_then(|a| self.strings.get_str(a.value_id))
    }

    /// All attributes of a node as (qualified name, value) pairs
    pub fn get_attribute_values(&self, node: NodeId) -> Vec<(String, &str)> {
        self.attribute_ids(node)
            .filter_map(|id| {
                let attr = &self.attributes[id as usize];
                let value = self.strings.get_str(attr.value_id)?;
                Some((self.qualified_name(attr.name_id, attr.ns)?, value))
            })
            .collect()
    }

    /// `prefix:name` for prefixed bindings, `name` otherwise
    pub fn qualified_name(&self, name_id: StrId, ns: Option<NsId>) -> Option<String> {
        let name = self.strings.get_str(name_id)?;
        Some(match ns.and_then(|id| self.ns_prefix(id)) {
            Some(prefix) => format!("{prefix}:{name}"),
            None => name.to_string(),
        })
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    /// Get the document node (index 0)
    pub fn document_node(&self) -> &XmlNode {
        &self.nodes[DOCUMENT_NODE as usize]
    }

    /// Get the root element
    pub fn root_element(&self) -> Option<&XmlNode> {
        self.root_element.map(|id| &self.nodes[id as usize])
    }

    /// Get root element ID
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Get the doctype declaration
    pub fn doctype(&self) -> Option<&DoctypeDecl> {
        self.doctype.as_ref()
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    /// Get node name as string (local part for namespaced elements)
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::DocumentType => self.strings.get_str(node.name_id),
            _ => None,
        }
    }

    /// Get text content of a text, CDATA or comment node
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if node.is_character_data() {
            self.strings.get_str(node.name_id)
        } else {
            None
        }
    }

    /// Namespace URI of an element
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.get_node(id)?.ns.and_then(|ns| self.ns_uri(ns))
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over all descendants of a node
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        // Initialize stack with all children in reverse order (so first is processed first)
        let mut stack = Vec::new();
        if let Some(node) = self.get_node(id) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                stack.push(cid);
                child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
            }
        }
        DescendantIter { doc: self, stack }
    }

    /// Get total number of nodes, including the document node
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get total number of attributes
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

/// Iterator over the attributes of one element
pub struct AttrIter<'d> {
    doc: &'d XmlDocument,
    next: Option<AttrId>,
}

impl<'d> Iterator for AttrIter<'d> {
    type Item = AttrId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_attr(current).and_then(|a| a.next);
        Some(current)
    }
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d XmlDocument,
    next: Option<NodeId>,
}

impl<'d> Iterator for ChildIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes (depth-first)
pub struct DescendantIter<'d> {
    doc: &'d XmlDocument,
    stack: Vec<NodeId>,
}

impl<'d> Iterator for DescendantIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Add children to stack in reverse order (so first child is processed first)
        if let Some(node) = self.doc.get_node(current) {
            let mut child_id = node.last_child;
            while let Some(id) = child_id {
                self.stack.push(id);
                child_id = self.doc.get_node(id).and_then(|n| n.prev_sibling);
            }
        }

        Some(current)
    }
}
