//! Elixir Term Conversion Utilities
//!
//! Decodes host source trees into [`SourceTree`]s and encodes documents and
//! factory-built trees back into Elixir terms. Both directions use explicit
//! stacks, so hostile nesting depth cannot overflow the native stack.

use rustler::types::tuple::get_tuple;
use rustler::{Atom, Binary, Encoder, Env, NewBinary, NifMap, Term};

use crate::convert::{ConvertOptions, NodeFactory};
use crate::dom::{NodeId, NodeKind, XmlDocument};
use crate::error::{ConvertError, Result};
use crate::source::{
    AttrNamespace, SourceAttribute, SourceDoctype, SourceElement, SourceId, SourceKind, SourceTree, SOURCE_DOCUMENT,
};
use crate::core::tags::TagNamespace;

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    nil,
    document,
    element,
    template,
    comment,
    whitespace,
    cdata,
    html,
    svg,
    math,
    xlink,
    xml,
    xmlns,
}

// ============================================================================
// Options
// ============================================================================

/// Conversion options as an Elixir map; every key must be present
#[derive(NifMap)]
pub struct HostOptions {
    pub stack_size: usize,
    pub keep_doctype: bool,
    pub namespace_elements: bool,
    pub sanitize_names: bool,
    pub line_number_attr: Option<String>,
    pub use_xhtml_rules: bool,
}

impl From<HostOptions> for ConvertOptions {
    fn from(o: HostOptions) -> Self {
        ConvertOptions {
            stack_size: o.stack_size,
            keep_doctype: o.keep_doctype,
            namespace_elements: o.namespace_elements,
            sanitize_names: o.sanitize_names,
            line_number_attr: o.line_number_attr,
            use_xhtml_rules: o.use_xhtml_rules,
        }
    }
}

// ============================================================================
// Source tree decoding
// ============================================================================

/// Decode `{:document, doctype | nil, children}` into a source tree
pub fn decode_tree(term: Term) -> Result<SourceTree> {
    let parts = get_tuple(term).map_err(|_| ConvertError::Decode(crate::site!("Document must be a tuple")))?;
    let [kind, doctype, children] = parts.as_slice() else {
        return Err(ConvertError::Decode(crate::site!("Document must be a 3-tuple")));
    };
    if decode_atom(*kind)? != document() {
        return Err(ConvertError::Decode(crate::site!("Expected :document")));
    }

    let mut tree = SourceTree::new();
    if !is_nil(*doctype) {
        tree.set_doctype(Some(decode_doctype(*doctype)?));
    }

    let mut stack: Vec<(Term, SourceId)> = Vec::with_capacity(64);
    push_children(&mut stack, *children, SOURCE_DOCUMENT)?;

    while let Some((node, parent)) = stack.pop() {
        let (kind, children) = decode_node(node)?;
        let id = tree
            .append(parent, kind)
            .ok_or(ConvertError::Decode(crate::site!("Node cannot hold children")))?;
        if let Some(children) = children {
            push_children(&mut stack, children, id)?;
        }
    }

    Ok(tree)
}

/// Push list items in reverse so they pop in document order
fn push_children<'a>(stack: &mut Vec<(Term<'a>, SourceId)>, list: Term<'a>, parent: SourceId) -> Result<()> {
    let items: Vec<Term<'a>> = list
        .decode()
        .map_err(|_| ConvertError::Decode(crate::site!("Children must be a list")))?;
    stack.extend(items.into_iter().rev().map(|t| (t, parent)));
    Ok(())
}

fn decode_doctype(term: Term) -> Result<SourceDoctype> {
    let parts = get_tuple(term).map_err(|_| ConvertError::Decode(crate::site!("Doctype must be a tuple")))?;
    let [name, public_id, system_id] = parts.as_slice() else {
        return Err(ConvertError::Decode(crate::site!("Doctype must be a 3-tuple")));
    };
    Ok(SourceDoctype {
        name: decode_text(*name)?,
        public_id: decode_text(*public_id)?,
        system_id: decode_text(*system_id)?,
    })
}

/// One node, plus its children list for elements and templates
fn decode_node(term: Term) -> Result<(SourceKind, Option<Term>)> {
    if term.is_binary() {
        return Ok((SourceKind::Text(decode_text(term)?), None));
    }
    let parts = get_tuple(term).map_err(|_| ConvertError::Decode(crate::site!("Node must be a binary or tuple")))?;
    match parts.as_slice() {
        [kind, text] => {
            let kind = decode_atom(*kind)?;
            let text = decode_text(*text)?;
            if kind == whitespace() {
                Ok((SourceKind::Whitespace(text), None))
            } else if kind == comment() {
                Ok((SourceKind::Comment(text), None))
            } else if kind == cdata() {
                Ok((SourceKind::CData(text), None))
            } else {
                Err(ConvertError::Decode(crate::site!("Unknown text node kind")))
            }
        }
        [kind, tag, namespace, attrs, children, line] => {
            let kind = decode_atom(*kind)?;
            let mut elem = SourceElement::new(decode_text(*tag)?, decode_namespace(*namespace)?);
            elem.attributes = decode_attributes(*attrs)?;
            elem.line = line
                .decode()
                .map_err(|_| ConvertError::Decode(crate::site!("Line must be a non-negative integer")))?;
            if kind == element() {
                Ok((SourceKind::Element(elem), Some(*children)))
            } else if kind == template() {
                Ok((SourceKind::Template(elem), Some(*children)))
            } else {
                Err(ConvertError::Decode(crate::site!("Unknown element node kind")))
            }
        }
        _ => Err(ConvertError::Decode(crate::site!("Malformed node tuple"))),
    }
}

fn decode_namespace(term: Term) -> Result<TagNamespace> {
    let ns = decode_atom(term)?;
    if ns == html() {
        Ok(TagNamespace::Html)
    } else if ns == svg() {
        Ok(TagNamespace::Svg)
    } else if ns == math() {
        Ok(TagNamespace::MathMl)
    } else {
        Err(ConvertError::Decode(crate::site!("Namespace must be :html, :svg or :math")))
    }
}

fn decode_attributes(term: Term) -> Result<Vec<SourceAttribute>> {
    let items: Vec<Term> = term
        .decode()
        .map_err(|_| ConvertError::Decode(crate::site!("Attributes must be a list")))?;
    items
        .into_iter()
        .map(|item| {
            let parts =
                get_tuple(item).map_err(|_| ConvertError::Decode(crate::site!("Attribute must be a tuple")))?;
            match parts.as_slice() {
                [name, value] => Ok(SourceAttribute::new(decode_text(*name)?, decode_text(*value)?)),
                [ns, name, value] => {
                    let ns = decode_atom(*ns)?;
                    let namespace = if ns == xlink() {
                        AttrNamespace::Xlink
                    } else if ns == xml() {
                        AttrNamespace::Xml
                    } else if ns == xmlns() {
                        AttrNamespace::Xmlns
                    } else {
                        return Err(ConvertError::Decode(crate::site!("Unknown attribute namespace")));
                    };
                    Ok(SourceAttribute::namespaced(namespace, decode_text(*name)?, decode_text(*value)?))
                }
                _ => Err(ConvertError::Decode(crate::site!("Malformed attribute tuple"))),
            }
        })
        .collect()
}

#[inline]
fn decode_atom(term: Term) -> Result<Atom> {
    term.decode()
        .map_err(|_| ConvertError::Decode(crate::site!("Expected an atom")))
}

#[inline]
fn decode_text(term: Term) -> Result<String> {
    let bin: Binary = term
        .decode()
        .map_err(|_| ConvertError::Decode(crate::site!("Expected a binary")))?;
    Ok(String::from_utf8_lossy(bin.as_slice()).into_owned())
}

#[inline]
fn is_nil(term: Term) -> bool {
    term.decode::<Atom>().is_ok_and(|a| a == nil())
}

// ============================================================================
// Document encoding
// ============================================================================

enum Step {
    Enter(NodeId),
    Build(NodeId, usize),
}

/// Convert a node to an Elixir term.
///
/// Elements become `{:element, name, attrs, children}` with qualified
/// names, text and CDATA become binaries, comments `{:comment, text}`.
pub fn node_to_term<'a>(env: Env<'a>, doc: &XmlDocument, node_id: NodeId) -> Term<'a> {
    let mut out: Vec<Term<'a>> = Vec::with_capacity(64);
    let mut stack = vec![Step::Enter(node_id)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                let Some(node) = doc.get_node(id) else {
                    out.push(nil().encode(env));
                    continue;
                };
                match node.kind {
                    NodeKind::Element => {
                        let count = doc.children(id).count();
                        stack.push(Step::Build(id, count));
                        // Reverse push so children land in `out` in document order
                        let mut child_id = node.last_child;
                        while let Some(cid) = child_id {
                            stack.push(Step::Enter(cid));
                            child_id = doc.get_node(cid).and_then(|n| n.prev_sibling);
                        }
                    }
                    NodeKind::Text | NodeKind::CData => {
                        out.push(str_to_binary(env, doc.text_content(id).unwrap_or("")));
                    }
                    NodeKind::Comment => {
                        let text = str_to_binary(env, doc.text_content(id).unwrap_or(""));
                        out.push((comment(), text).encode(env));
                    }
                    NodeKind::Document => match doc.root_element_id() {
                        Some(root_id) => stack.push(Step::Enter(root_id)),
                        None => out.push(nil().encode(env)),
                    },
                    NodeKind::DocumentType => out.push(nil().encode(env)),
                }
            }
            Step::Build(id, count) => {
                let mut children = Term::list_new_empty(env);
                for child in out.drain(out.len() - count..).rev() {
                    children = children.list_prepend(child);
                }

                let mut attrs = Term::list_new_empty(env);
                for (name, value) in doc.get_attribute_values(id).into_iter().rev() {
                    let pair = (str_to_binary(env, &name), str_to_binary(env, value));
                    attrs = attrs.list_prepend(pair.encode(env));
                }

                let name = doc
                    .get_node(id)
                    .and_then(|n| doc.qualified_name(n.name_id, n.ns))
                    .unwrap_or_default();
                out.push((element(), str_to_binary(env, &name), attrs, children).encode(env));
            }
        }
    }

    out.pop().unwrap_or_else(|| nil().encode(env))
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

// ============================================================================
// Term factory
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
enum Pending {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<usize>,
    },
    Text(String),
    Comment(String),
}

/// Node factory that stages a tree natively and encodes it in one go.
///
/// Terms cannot be appended to in place, so objects are indices into a
/// staging arena until [`TermFactory::into_term`].
#[derive(Debug, Default)]
pub struct TermFactory {
    nodes: Vec<Pending>,
    /// References the builder still holds
    held: usize,
}

impl TermFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage(&mut self, node: Pending) -> Result<usize> {
        crate::error::reserve_one(&mut self.nodes, crate::site!("Out of memory staging node"))?;
        self.nodes.push(node);
        self.held += 1;
        Ok(self.nodes.len() - 1)
    }

    /// Encode the staged subtree at `root`
    pub fn into_term<'a>(self, env: Env<'a>, root: usize) -> Term<'a> {
        let mut out: Vec<Term<'a>> = Vec::with_capacity(64);
        let mut stack = vec![(root, false)];

        while let Some((id, built)) = stack.pop() {
            match self.nodes.get(id) {
                Some(Pending::Element { name, attrs, children }) => {
                    if !built {
                        stack.push((id, true));
                        stack.extend(children.iter().rev().map(|&c| (c, false)));
                        continue;
                    }
                    let mut list = Term::list_new_empty(env);
                    for child in out.drain(out.len() - children.len()..).rev() {
                        list = list.list_prepend(child);
                    }
                    let mut attr_list = Term::list_new_empty(env);
                    for (k, v) in attrs.iter().rev() {
                        attr_list = attr_list.list_prepend((str_to_binary(env, k), str_to_binary(env, v)).encode(env));
                    }
                    out.push((element(), str_to_binary(env, name), attr_list, list).encode(env));
                }
                Some(Pending::Text(text)) => out.push(str_to_binary(env, text)),
                Some(Pending::Comment(text)) => out.push((comment(), str_to_binary(env, text)).encode(env)),
                None => out.push(nil().encode(env)),
            }
        }

        out.pop().unwrap_or_else(|| nil().encode(env))
    }
}

impl NodeFactory for TermFactory {
    type Object = usize;

    fn create_element(&mut self, name: &str, attributes: &[(String, String)]) -> Result<usize> {
        self.stage(Pending::Element {
            name: name.to_string(),
            attrs: attributes.to_vec(),
            children: Vec::new(),
        })
    }

    fn create_comment(&mut self, text: &str) -> Result<usize> {
        self.stage(Pending::Comment(text.to_string()))
    }

    fn create_text(&mut self, text: &str) -> Result<usize> {
        self.stage(Pending::Text(text.to_string()))
    }

    fn append(&mut self, parent: &usize, child: &usize) -> Result<()> {
        match self.nodes.get_mut(*parent) {
            Some(Pending::Element { children, .. }) => {
                crate::error::reserve_one(children, crate::site!("Out of memory appending child"))?;
                children.push(*child);
                Ok(())
            }
            _ => Err(ConvertError::Structure(crate::site!("Failed to append: parent is not an element"))),
        }
    }

    fn release(&mut self, _object: usize) {
        self.held = self.held.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert_with_factory;
    use crate::source::SourceElement;

    #[test]
    fn test_term_factory_stages_tree() {
        let mut tree = SourceTree::new();
        let html = tree.append_element(SOURCE_DOCUMENT, SourceElement::html("html")).unwrap();
        let body = tree.append_element(html, SourceElement::html("body").attr("id", "b")).unwrap();
        tree.append_text(body, "hi").unwrap();
        tree.append_comment(body, "c").unwrap();

        let mut factory = TermFactory::new();
        let root = convert_with_factory(&tree, &ConvertOptions::default(), &mut factory).unwrap();
        assert_eq!(root, 0);
        assert_eq!(factory.held, 1);
        assert_eq!(
            factory.nodes[1],
            Pending::Element {
                name: "body".into(),
                attrs: vec![("id".into(), "b".into())],
                children: vec![2, 3],
            }
        );
        assert_eq!(factory.nodes[2], Pending::Text("hi".into()));
        assert_eq!(factory.nodes[3], Pending::Comment("c".into()));
    }

    #[test]
    fn test_term_factory_append_to_text_fails() {
        let mut factory = TermFactory::new();
        let t = factory.create_text("x").unwrap();
        let c = factory.create_text("y").unwrap();
        assert!(factory.append(&t, &c).is_err());
    }

    #[test]
    fn test_term_factory_failure_releases_all() {
        let mut tree = SourceTree::new();
        let html = tree.append_element(SOURCE_DOCUMENT, SourceElement::html("html")).unwrap();
        for _ in 0..5 {
            tree.append_element(html, SourceElement::html("p")).unwrap();
        }
        let mut factory = TermFactory::new();
        let _armed = crate::error::failpoint::arm(4);
        assert!(convert_with_factory(&tree, &ConvertOptions::default(), &mut factory).is_err());
        assert_eq!(factory.held, 0);
    }
}
