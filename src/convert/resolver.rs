//! Namespace Resolver
//!
//! The `xml` and `xlink` bindings are looked up at most once per conversion
//! and cached. Arbitrary prefixes are searched at the node, then at a
//! fallback ancestor: during construction the node is not attached yet, so
//! its own ancestor chain ends at itself.

use log::trace;

use crate::dom::namespace::ns;
use crate::dom::{NodeId, NsId, XmlDocument};
use crate::error::{ConvertError, Result};

/// Cached `xml` and `xlink` bindings for one conversion
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    xml: Option<NsId>,
    xlink: Option<NsId>,
}

impl Bindings {
    /// The `xml` binding as seen from `scope` (the root, or the node being
    /// built while there is no root yet).
    pub fn ensure_xml(&mut self, doc: &mut XmlDocument, scope: NodeId) -> Result<NsId> {
        if let Some(id) = self.xml {
            return Ok(id);
        }
        let id = doc
            .search_ns(scope, b"xml")?
            .ok_or(ConvertError::Namespace(crate::site!("Failed to find the xml namespace")))?;
        trace!("xml binding resolved as ns {id}");
        self.xml = Some(id);
        Ok(id)
    }

    /// The `xlink` binding as seen from `scope`, declared on `scope` when
    /// nothing binds the prefix there.
    pub fn ensure_xlink(&mut self, doc: &mut XmlDocument, scope: NodeId) -> Result<NsId> {
        if let Some(id) = self.xlink {
            return Ok(id);
        }
        let id = match doc.search_ns(scope, b"xlink")? {
            Some(id) => id,
            None => {
                trace!("declaring xlink binding on node {scope}");
                doc.new_ns(scope, ns::XLINK, Some(b"xlink"))?
                    .ok_or(ConvertError::Namespace(crate::site!("Failed to declare the xlink namespace")))?
            }
        };
        self.xlink = Some(id);
        Ok(id)
    }
}

/// Resolve `prefix` at `node`, then at `fallback`. Not finding it is not an error.
pub(crate) fn resolve_prefix(
    doc: &mut XmlDocument,
    node: NodeId,
    fallback: Option<NodeId>,
    prefix: &[u8],
) -> Result<Option<NsId>> {
    // An empty prefix never names the default namespace
    if prefix.is_empty() {
        return Ok(None);
    }
    if let Some(id) = doc.search_ns(node, prefix)? {
        return Ok(Some(id));
    }
    match fallback {
        Some(parent) => doc.search_ns(parent, prefix),
        None => Ok(None),
    }
}
