//! Namespace Bindings
//!
//! A binding is a (URI, prefix) pair declared on one element. Elements and
//! attributes reference bindings by id; the declaring element owns them.
//! Lookup walks the ancestor chain the way XML scoping does. The `xml`
//! prefix is always bound, through a binding owned by the document itself.

use super::document::XmlDocument;
use super::node::{NodeId, NsId};
use super::strings::StrId;
use crate::error::{next_id, reserve_one, Result};

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &[u8] = b"http://www.w3.org/XML/1998/namespace";
    pub const XLINK: &[u8] = b"http://www.w3.org/1999/xlink";
}

/// Namespace binding (prefix -> URI)
#[derive(Debug, Clone)]
pub struct XmlNs {
    /// Interned namespace URI
    pub href_id: StrId,
    /// Interned prefix; 0 declares the default namespace
    pub prefix_id: StrId,
    /// Next binding declared on the same element
    pub next: Option<NsId>,
}

impl XmlNs {
    #[inline]
    pub fn is_default(&self) -> bool {
        self.prefix_id == 0
    }
}

/// Iterator over the bindings declared directly on one element
pub struct NsDefIter<'d> {
    doc: &'d XmlDocument,
    next: Option<NsId>,
}

impl<'d> Iterator for NsDefIter<'d> {
    type Item = NsId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_ns(current).and_then(|b| b.next);
        Some(current)
    }
}

impl XmlDocument {
    /// Get a binding by id
    pub fn get_ns(&self, id: NsId) -> Option<&XmlNs> {
        self.namespaces.get(id as usize)
    }

    /// Bindings declared directly on `node`
    pub fn ns_defs(&self, node: NodeId) -> NsDefIter<'_> {
        let first = self.get_node(node).and_then(|n| n.ns_def);
        NsDefIter { doc: self, next: first }
    }

    /// URI of a binding
    pub fn ns_uri(&self, id: NsId) -> Option<&str> {
        self.get_ns(id).and_then(|b| self.strings.get_str(b.href_id))
    }

    /// Prefix of a binding, `None` for a default-namespace binding
    pub fn ns_prefix(&self, id: NsId) -> Option<&str> {
        let binding = self.get_ns(id)?;
        if binding.is_default() {
            None
        } else {
            self.strings.get_str(binding.prefix_id)
        }
    }

    /// The document-owned binding for the reserved `xml` prefix.
    pub fn ensure_xml_decl(&mut self) -> Result<NsId> {
        if let Some(id) = self.xml_ns {
            return Ok(id);
        }
        let href_id = self.strings.intern(ns::XML)?;
        let prefix_id = self.strings.intern(b"xml")?;
        let id = self.push_ns(XmlNs {
            href_id,
            prefix_id,
            next: None,
        })?;
        self.xml_ns = Some(id);
        Ok(id)
    }

    /// Whether `id` is the document-owned `xml` binding
    #[inline]
    pub fn is_xml_decl(&self, id: NsId) -> bool {
        self.xml_ns == Some(id)
    }

    /// Find the binding for `prefix` in scope at `node`.
    ///
    /// Searches `node` and then its ancestors. An empty prefix finds the
    /// default namespace. `xml` always resolves.
    pub fn search_ns(&mut self, node: NodeId, prefix: &[u8]) -> Result<Option<NsId>> {
        if prefix == b"xml" {
            return self.ensure_xml_decl().map(Some);
        }
        let Some(prefix_id) = self.strings.lookup(prefix) else {
            // Never interned, so no binding can use it
            return Ok(None);
        };
        Ok(self.search_ns_id(node, prefix_id))
    }

    fn search_ns_id(&self, node: NodeId, prefix_id: StrId) -> Option<NsId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.get_node(id)?;
            if n.is_element() {
                for ns_id in self.ns_defs(id) {
                    if self.namespaces[ns_id as usize].prefix_id == prefix_id {
                        return Some(ns_id);
                    }
                }
            }
            current = n.parent;
        }
        None
    }

    /// Declare a binding on `node`.
    ///
    /// Returns `Ok(None)` without declaring anything when `prefix` is `xml`
    /// or `node` already declares the same prefix.
    pub fn new_ns(&mut self, node: NodeId, href: &[u8], prefix: Option<&[u8]>) -> Result<Option<NsId>> {
        if prefix == Some(b"xml".as_slice()) {
            return Ok(None);
        }
        let prefix_id = match prefix {
            Some(p) => self.strings.intern(p)?,
            None => 0,
        };
        let mut last = None;
        for ns_id in self.ns_defs(node) {
            if self.namespaces[ns_id as usize].prefix_id == prefix_id {
                return Ok(None);
            }
            last = Some(ns_id);
        }

        let href_id = self.strings.intern(href)?;
        let id = self.push_ns(XmlNs {
            href_id,
            prefix_id,
            next: None,
        })?;
        match last {
            Some(prev) => self.namespaces[prev as usize].next = Some(id),
            None => {
                if let Some(n) = self.nodes.get_mut(node as usize) {
                    n.ns_def = Some(id);
                }
            }
        }
        Ok(Some(id))
    }

    /// Set the namespace of an element
    pub fn set_ns(&mut self, node: NodeId, ns: Option<NsId>) {
        if let Some(n) = self.nodes.get_mut(node as usize) {
            n.ns = ns;
        }
    }

    pub(crate) fn push_ns(&mut self, binding: XmlNs) -> Result<NsId> {
        reserve_one(&mut self.namespaces, crate::site!("Out of memory allocating namespace"))?;
        let id: NsId = next_id(self.namespaces.len(), crate::site!("Namespace arena is full"))?;
        self.namespaces.push(binding);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_prefix_always_resolves() {
        let mut doc = XmlDocument::new();
        let el = doc.new_element(b"p", 1).unwrap();
        let xml = doc.search_ns(el, b"xml").unwrap().unwrap();
        assert_eq!(doc.ns_uri(xml).unwrap().as_bytes(), ns::XML);
        assert!(doc.is_xml_decl(xml));
        // Same binding every time
        assert_eq!(doc.search_ns(el, b"xml").unwrap(), Some(xml));
    }

    #[test]
    fn test_declare_and_resolve() {
        let mut doc = XmlDocument::new();
        let el = doc.new_element(b"svg", 1).unwrap();
        let id = doc.new_ns(el, b"http://www.w3.org/2000/svg", Some(b"svg")).unwrap().unwrap();
        assert_eq!(doc.search_ns(el, b"svg").unwrap(), Some(id));
        assert_eq!(doc.ns_prefix(id), Some("svg"));
    }

    #[test]
    fn test_search_walks_ancestors() {
        let mut doc = XmlDocument::new();
        let parent = doc.new_element(b"div", 1).unwrap();
        let child = doc.new_element(b"span", 2).unwrap();
        let id = doc.new_ns(parent, b"urn:foo", Some(b"foo")).unwrap().unwrap();

        // Not attached yet: not in scope
        assert_eq!(doc.search_ns(child, b"foo").unwrap(), None);

        doc.append_child(parent, child).unwrap();
        assert_eq!(doc.search_ns(child, b"foo").unwrap(), Some(id));
    }

    #[test]
    fn test_shadow_binding() {
        let mut doc = XmlDocument::new();
        let outer = doc.new_element(b"a", 1).unwrap();
        let inner = doc.new_element(b"b", 1).unwrap();
        doc.append_child(outer, inner).unwrap();
        let ns1 = doc.new_ns(outer, b"urn:1", Some(b"ns")).unwrap().unwrap();
        let ns2 = doc.new_ns(inner, b"urn:2", Some(b"ns")).unwrap().unwrap();
        assert_eq!(doc.search_ns(inner, b"ns").unwrap(), Some(ns2));
        assert_eq!(doc.search_ns(outer, b"ns").unwrap(), Some(ns1));
    }

    #[test]
    fn test_duplicate_prefix_refused() {
        let mut doc = XmlDocument::new();
        let el = doc.new_element(b"a", 1).unwrap();
        let first = doc.new_ns(el, b"urn:1", Some(b"p")).unwrap();
        assert!(first.is_some());
        assert_eq!(doc.new_ns(el, b"urn:2", Some(b"p")).unwrap(), None);
        assert_eq!(doc.new_ns(el, b"urn:3", Some(b"xml")).unwrap(), None);
        assert_eq!(doc.ns_defs(el).count(), 1);
    }

    #[test]
    fn test_default_namespace() {
        let mut doc = XmlDocument::new();
        let el = doc.new_element(b"html", 1).unwrap();
        let id = doc.new_ns(el, b"http://www.w3.org/1999/xhtml", None).unwrap().unwrap();
        assert!(doc.get_ns(id).unwrap().is_default());
        assert_eq!(doc.ns_prefix(id), None);
        assert_eq!(doc.search_ns(el, b"").unwrap(), Some(id));
    }
}
