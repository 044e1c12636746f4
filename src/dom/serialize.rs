//! XML Serialization
//!
//! Writes a document or subtree as XML text. Namespace declarations are
//! emitted on the element that owns them; the implicit `xml` binding is
//! never declared. Uses an explicit stack, so depth is bounded only by
//! memory.

use super::document::{XmlDocument, DOCUMENT_NODE};
use super::node::{NodeId, NodeKind, NsId};
use super::strings::StrId;

enum StackEntry {
    Enter(NodeId),
    Close(NodeId),
}

/// Serialize the whole document: doctype, root-adjacent comments and root
pub fn to_xml(doc: &XmlDocument) -> String {
    let mut buf = String::with_capacity(1024);
    for id in doc.children(DOCUMENT_NODE) {
        write_node(doc, id, &mut buf);
        buf.push('\n');
    }
    buf
}

/// Serialize one node and its descendants
pub fn node_to_xml(doc: &XmlDocument, node_id: NodeId) -> String {
    let mut buf = String::with_capacity(256);
    write_node(doc, node_id, &mut buf);
    buf
}

fn write_node(doc: &XmlDocument, node_id: NodeId, buf: &mut String) {
    let mut stack: Vec<StackEntry> = Vec::with_capacity(64);
    stack.push(StackEntry::Enter(node_id));

    while let Some(entry) = stack.pop() {
        match entry {
            StackEntry::Close(id) => {
                if let Some(node) = doc.get_node(id) {
                    buf.push_str("</");
                    push_qname(doc, node.name_id, node.ns, buf);
                    buf.push('>');
                }
            }
            StackEntry::Enter(current_id) => {
                let Some(node) = doc.get_node(current_id) else {
                    continue;
                };

                match node.kind {
                    NodeKind::Element => {
                        buf.push('<');
                        push_qname(doc, node.name_id, node.ns, buf);

                        for ns_id in doc.ns_defs(current_id) {
                            buf.push_str(" xmlns");
                            if let Some(prefix) = doc.ns_prefix(ns_id) {
                                buf.push(':');
                                buf.push_str(prefix);
                            }
                            buf.push_str("=\"");
                            escape_attr_to_buf(doc.ns_uri(ns_id).unwrap_or(""), buf);
                            buf.push('"');
                        }

                        for attr_id in doc.attribute_ids(current_id) {
                            let Some(attr) = doc.get_attr(attr_id) else {
                                continue;
                            };
                            buf.push(' ');
                            push_qname(doc, attr.name_id, attr.ns, buf);
                            buf.push_str("=\"");
                            escape_attr_to_buf(doc.strings.get_str(attr.value_id).unwrap_or(""), buf);
                            buf.push('"');
                        }

                        if node.first_child.is_none() {
                            buf.push_str("/>");
                        } else {
                            buf.push('>');
                            stack.push(StackEntry::Close(current_id));

                            // Reverse push so the first child is written first
                            let mut child_id = node.last_child;
                            while let Some(cid) = child_id {
                                stack.push(StackEntry::Enter(cid));
                                child_id = doc.get_node(cid).and_then(|n| n.prev_sibling);
                            }
                        }
                    }
                    NodeKind::Text => {
                        escape_text_to_buf(doc.text_content(current_id).unwrap_or(""), buf);
                    }
                    NodeKind::CData => {
                        let content = doc.text_content(current_id).unwrap_or("");
                        buf.push_str("<![CDATA[");
                        // A literal "]]>" has to be split across two sections
                        buf.push_str(&content.replace("]]>", "]]]]><![CDATA[>"));
                        buf.push_str("]]>");
                    }
                    NodeKind::Comment => {
                        buf.push_str("<!--");
                        buf.push_str(doc.text_content(current_id).unwrap_or(""));
                        buf.push_str("-->");
                    }
                    NodeKind::DocumentType => {
                        if let Some(decl) = doc.doctype() {
                            buf.push_str("<!DOCTYPE ");
                            buf.push_str(&decl.name);
                            if !decl.public_id.is_empty() {
                                buf.push_str(" PUBLIC \"");
                                buf.push_str(&decl.public_id);
                                buf.push('"');
                                if !decl.system_id.is_empty() {
                                    buf.push_str(" \"");
                                    buf.push_str(&decl.system_id);
                                    buf.push('"');
                                }
                            } else if !decl.system_id.is_empty() {
                                buf.push_str(" SYSTEM \"");
                                buf.push_str(&decl.system_id);
                                buf.push('"');
                            }
                            buf.push('>');
                        }
                    }
                    NodeKind::Document => {
                        if let Some(root_id) = doc.root_element_id() {
                            stack.push(StackEntry::Enter(root_id));
                        }
                    }
                }
            }
        }
    }
}

#[inline]
fn push_qname(doc: &XmlDocument, name_id: StrId, ns: Option<NsId>, buf: &mut String) {
    if let Some(prefix) = ns.and_then(|id| doc.ns_prefix(id)) {
        buf.push_str(prefix);
        buf.push(':');
    }
    buf.push_str(doc.strings.get_str(name_id).unwrap_or(""));
}

#[inline]
fn escape_text_to_buf(s: &str, buf: &mut String) {
    for c in s.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            _ => buf.push(c),
        }
    }
}

#[inline]
fn escape_attr_to_buf(s: &str, buf: &mut String) {
    for c in s.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' => buf.push_str("&quot;"),
            '\n' => buf.push_str("&#10;"),
            '\t' => buf.push_str("&#9;"),
            _ => buf.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::document::DoctypeDecl;

    #[test]
    fn test_simple_element() {
        let mut doc = XmlDocument::new();
        let root = doc.new_element(b"p", 1).unwrap();
        let t = doc.new_text(b"a < b & c").unwrap();
        doc.append_child(root, t).unwrap();
        doc.set_root(root).unwrap();
        assert_eq!(to_xml(&doc), "<p>a &lt; b &amp; c</p>\n");
    }

    #[test]
    fn test_empty_element_self_closes() {
        let mut doc = XmlDocument::new();
        let root = doc.new_element(b"br", 1).unwrap();
        doc.set_root(root).unwrap();
        assert_eq!(node_to_xml(&doc, root), "<br/>");
    }

    #[test]
    fn test_namespaces_and_prefixes() {
        let mut doc = XmlDocument::new();
        let root = doc.new_element(b"html", 1).unwrap();
        let html = doc.new_ns(root, b"http://www.w3.org/1999/xhtml", None).unwrap();
        doc.set_ns(root, html);
        let xlink = doc.new_ns(root, b"http://www.w3.org/1999/xlink", Some(b"xlink")).unwrap();
        let href = doc.strings.intern(b"href").unwrap();
        doc.new_attribute(root, xlink, href, b"#x").unwrap();
        let xml = doc.ensure_xml_decl().unwrap();
        let lang = doc.strings.intern(b"lang").unwrap();
        doc.new_attribute(root, Some(xml), lang, b"en").unwrap();
        doc.set_root(root).unwrap();

        let out = node_to_xml(&doc, root);
        assert_eq!(
            out,
            "<html xmlns=\"http://www.w3.org/1999/xhtml\" \
             xmlns:xlink=\"http://www.w3.org/1999/xlink\" xlink:href=\"#x\" xml:lang=\"en\"/>"
        );
    }

    #[test]
    fn test_doctype_and_comments() {
        let mut doc = XmlDocument::new();
        let root = doc.new_element(b"html", 1).unwrap();
        doc.set_root(root).unwrap();
        let before = doc.new_comment(b" a ").unwrap();
        doc.insert_before(root, before).unwrap();
        let after = doc.new_comment(b" b ").unwrap();
        doc.append_child(DOCUMENT_NODE, after).unwrap();
        doc.set_doctype(DoctypeDecl {
            name: "html".into(),
            public_id: String::new(),
            system_id: String::new(),
        })
        .unwrap();
        assert_eq!(to_xml(&doc), "<!DOCTYPE html>\n<!-- a -->\n<html/>\n<!-- b -->\n");
    }

    #[test]
    fn test_public_doctype() {
        let mut doc = XmlDocument::new();
        doc.set_doctype(DoctypeDecl {
            name: "html".into(),
            public_id: "-//W3C//DTD XHTML 1.0 Strict//EN".into(),
            system_id: "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd".into(),
        })
        .unwrap();
        assert!(to_xml(&doc).starts_with("<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \"http"));
    }

    #[test]
    fn test_cdata_split() {
        let mut doc = XmlDocument::new();
        let c = doc.new_cdata(b"x]]>y").unwrap();
        assert_eq!(node_to_xml(&doc, c), "<![CDATA[x]]]]><![CDATA[>y]]>");
    }

    #[test]
    fn test_attribute_escaping() {
        let mut doc = XmlDocument::new();
        let el = doc.new_element(b"a", 1).unwrap();
        let title = doc.strings.intern(b"title").unwrap();
        doc.new_attribute(el, None, title, b"say \"hi\"\n").unwrap();
        assert_eq!(node_to_xml(&doc, el), "<a title=\"say &quot;hi&quot;&#10;\"/>");
    }

    #[test]
    fn test_deep_nesting_is_iterative() {
        let mut doc = XmlDocument::new();
        let root = doc.new_element(b"div", 1).unwrap();
        doc.set_root(root).unwrap();
        let mut parent = root;
        for _ in 0..100_000 {
            let child = doc.new_element(b"div", 1).unwrap();
            doc.append_child(parent, child).unwrap();
            parent = child;
        }
        let out = to_xml(&doc);
        assert!(out.starts_with("<div><div>"));
        assert!(out.ends_with("</div></div>\n"));
    }
}
