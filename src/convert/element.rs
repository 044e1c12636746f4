//! Element/Node Converter
//!
//! Builds one destination node per source node inside an [`XmlDocument`].
//! Elements get their name, optional line stamp, namespace and attributes
//! before they are attached.

use super::attributes::convert_attributes;
use super::options::ConvertOptions;
use super::resolver::resolve_prefix;
use super::scratch::{load_name, ParseData};
use super::walk::TreeBuilder;
use crate::core::names::{sanitize_name, split_prefix};
use crate::core::tags::{normalize_svg_tag, TagNamespace};
use crate::dom::{NodeId, StrId, XmlDocument};
use crate::error::{ConvertError, Result};
use crate::source::{SourceElement, SourceKind, SourceNode, SourceTree};

/// Builds the native document during a walk
pub(crate) struct DomBuilder {
    pub doc: XmlDocument,
    pub pd: ParseData,
    namespace_elements: bool,
}

impl DomBuilder {
    pub fn new(mut doc: XmlDocument, opts: &ConvertOptions) -> Result<Self> {
        let pd = ParseData::new(&mut doc, opts)?;
        Ok(DomBuilder {
            doc,
            pd,
            namespace_elements: opts.namespace_elements,
        })
    }

    /// Interned element name. Leaves the explicit prefix of an unknown tag in
    /// `pd.prefix_buf` and reports whether there was one.
    fn element_name(&mut self, elem: &SourceElement) -> Result<(StrId, bool)> {
        let doc = &mut self.doc;
        let pd = &mut self.pd;

        // SVG case is restored for any listed name, known tag or not
        if elem.namespace == TagNamespace::Svg {
            if let Some(adjusted) = normalize_svg_tag(elem.original_tag.as_bytes()) {
                return Ok((doc.strings.intern(adjusted.as_bytes())?, false));
            }
        }

        if elem.tag.is_unknown() {
            load_name(&mut pd.name_buf, elem.original_tag.as_bytes())?;
            let mut start = 0;
            let mut has_prefix = false;
            if pd.maybe_xhtml {
                if let Some((prefix, _)) = split_prefix(&pd.name_buf) {
                    start = prefix.len() + 1;
                    load_name(&mut pd.prefix_buf, prefix)?;
                    has_prefix = true;
                }
            }
            let local = &mut pd.name_buf[start..];
            if pd.sanitize_names {
                sanitize_name(local);
            }
            return Ok((doc.strings.intern(local)?, has_prefix));
        }

        Ok((pd.standard_tag(doc, elem.tag)?, false))
    }

    fn create_element(
        &mut self,
        tree: &SourceTree,
        node: &SourceNode,
        elem: &SourceElement,
        xml_parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let (name_id, has_prefix) = self.element_name(elem)?;
        let el = self.doc.new_element_named(name_id, elem.line)?;

        if let Some(attr) = self.pd.line_attr {
            self.doc.new_attribute(el, None, attr, elem.line.to_string().as_bytes())?;
        }

        if self.namespace_elements {
            let parent_namespace = node
                .parent
                .and_then(|p| tree.get(p))
                .and_then(|p| p.kind.as_element())
                .map(|p| p.namespace);
            let ns = if parent_namespace != Some(elem.namespace) {
                // Default namespace changes here, or this is the top of the tree
                let declared = self
                    .doc
                    .new_ns(el, elem.namespace.uri(), None)?
                    .ok_or(ConvertError::Namespace(crate::site!("Failed to declare element namespace")))?;
                Some(declared)
            } else {
                xml_parent.and_then(|p| self.doc.get_node(p)).and_then(|p| p.ns)
            };
            self.doc.set_ns(el, ns);
        }

        convert_attributes(&mut self.doc, &mut self.pd, el, elem, xml_parent)?;

        if has_prefix {
            // Honor an explicit tag prefix once the attributes declared theirs
            let prefix = std::mem::take(&mut self.pd.prefix_buf);
            let found = resolve_prefix(&mut self.doc, el, xml_parent, &prefix);
            self.pd.prefix_buf = prefix;
            if let Some(ns) = found? {
                self.doc.set_ns(el, Some(ns));
            }
        }

        Ok(el)
    }
}

impl TreeBuilder for DomBuilder {
    type Handle = NodeId;

    fn create(&mut self, tree: &SourceTree, node: &SourceNode, parent: Option<NodeId>) -> Result<NodeId> {
        match &node.kind {
            SourceKind::Element(elem) | SourceKind::Template(elem) => self.create_element(tree, node, elem, parent),
            SourceKind::Text(text) | SourceKind::Whitespace(text) => self.doc.new_text(text.as_bytes()),
            SourceKind::Comment(text) => self.doc.new_comment(text.as_bytes()),
            SourceKind::CData(text) => self.doc.new_cdata(text.as_bytes()),
            SourceKind::Document { .. } => Err(ConvertError::UnknownNode(crate::site!("unknown source node type"))),
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.doc.append_child(parent, child)
    }

    fn set_root(&mut self, root: NodeId) {
        self.pd.root = Some(root);
    }
}
