//! Attribute Converter
//!
//! Sorts each source attribute into the `xlink`, `xml`, `xmlns` or plain
//! bucket and attaches it to the element being built. Under XHTML rules a
//! `p:name` attribute whose prefix is not in scope yet is skipped on the
//! first pass and retried on a second one, after every `xmlns:p` on the
//! same element has been declared. If it still does not resolve, the colon
//! becomes `_`.

use log::trace;

use super::resolver::resolve_prefix;
use super::scratch::{load_name, ParseData};
use crate::core::names::{flatten_prefix, sanitize_name, split_prefix};
use crate::dom::{NodeId, XmlDocument};
use crate::error::{ConvertError, Result};
use crate::source::{AttrNamespace, SourceElement};

/// How far `lang` mirroring got on the current pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LangState {
    None,
    /// Written from `xml:lang`
    Mirrored,
    /// Written from a plain `lang`; later ones are dropped
    Plain,
}

/// Convert the attributes of `elem` onto `node`, running the second pass when needed.
pub(crate) fn convert_attributes(
    doc: &mut XmlDocument,
    pd: &mut ParseData,
    node: NodeId,
    elem: &SourceElement,
    xml_parent: Option<NodeId>,
) -> Result<()> {
    if elem.attributes.is_empty() {
        return Ok(());
    }
    pd.reprocess.clear();
    pd.reprocess
        .try_reserve(elem.attributes.len())
        .map_err(|_| ConvertError::OutOfMemory(crate::site!("Out of memory allocating attribute flags")))?;
    pd.reprocess.resize(elem.attributes.len(), false);

    if create_attributes(doc, pd, node, elem, xml_parent, false)? {
        trace!("reprocessing attributes with unresolved prefixes on node {node}");
        create_attributes(doc, pd, node, elem, xml_parent, true)?;
    }
    Ok(())
}

/// One pass over the attributes. Returns whether any were marked for the second pass.
fn create_attributes(
    doc: &mut XmlDocument,
    pd: &mut ParseData,
    node: NodeId,
    elem: &SourceElement,
    xml_parent: Option<NodeId>,
    reprocess: bool,
) -> Result<bool> {
    let mut needs_reprocess = false;
    let mut lang_state = LangState::None;

    for (i, attr) in elem.attributes.iter().enumerate() {
        if reprocess && !pd.reprocess[i] {
            continue;
        }

        let value = attr.value.as_bytes();
        let name = attr.name.as_bytes();
        let mut ns = None;
        let mut shimmed = false;

        match attr.namespace {
            AttrNamespace::Xlink => {
                let scope = pd.binding_scope(node);
                ns = Some(pd.bindings.ensure_xlink(doc, scope)?);
            }
            AttrNamespace::Xml => {
                let scope = pd.binding_scope(node);
                ns = Some(pd.bindings.ensure_xml(doc, scope)?);
                if pd.maybe_xhtml && name == b"lang" {
                    if lang_state == LangState::None {
                        lang_state = LangState::Mirrored;
                        doc.new_attribute(node, None, pd.lang, value)?;
                    }
                    continue;
                }
            }
            AttrNamespace::Xmlns => {
                // Authors cannot rebind xlink, and tag names decide the default namespace
                if name.starts_with(b"xlink") {
                    let scope = pd.binding_scope(node);
                    pd.bindings.ensure_xlink(doc, scope)?;
                    continue;
                } else if name.starts_with(b"xmlns") {
                    continue;
                }
            }
            AttrNamespace::None => {
                if pd.maybe_xhtml && name.starts_with(b"xml:lang") {
                    if lang_state == LangState::None {
                        lang_state = LangState::Mirrored;
                        doc.new_attribute(node, None, pd.lang, value)?;
                    }
                    continue;
                } else if let Some(rest) = name.strip_prefix(b"xmlns") {
                    match rest {
                        [] | [b':'] => continue,
                        [b':', prefix @ ..] => {
                            if pd.maybe_xhtml {
                                if prefix == b"xlink" {
                                    // The value is ignored; xlink always means the XLink URI
                                    let scope = pd.binding_scope(node);
                                    pd.bindings.ensure_xlink(doc, scope)?;
                                } else if resolve_prefix(doc, node, xml_parent, prefix)?.is_none() {
                                    // The in-scope binding wins over a redeclaration
                                    doc.new_ns(node, value, Some(prefix))?;
                                }
                                continue;
                            }
                            load_name(&mut pd.name_buf, b"xmlns_")?;
                            pd.name_buf
                                .try_reserve(prefix.len())
                                .map_err(|_| ConvertError::OutOfMemory(crate::site!("Out of memory copying name")))?;
                            pd.name_buf.extend_from_slice(prefix);
                            shimmed = true;
                        }
                        _ => {}
                    }
                }
            }
        }

        if !shimmed {
            load_name(&mut pd.name_buf, name)?;
        }

        let mut start = 0;
        if pd.maybe_xhtml {
            if let Some((prefix, _)) = split_prefix(&pd.name_buf) {
                let prefix_len = prefix.len();
                match resolve_prefix(doc, node, xml_parent, prefix)? {
                    Some(found) => {
                        ns = Some(found);
                        start = prefix_len + 1;
                    }
                    None if !reprocess => {
                        pd.reprocess[i] = true;
                        needs_reprocess = true;
                        continue;
                    }
                    None => flatten_prefix(&mut pd.name_buf),
                }
            }
        }

        let local = &mut pd.name_buf[start..];
        if pd.sanitize_names {
            sanitize_name(local);
        }
        let name_id = doc.strings.intern(local)?;

        if pd.maybe_xhtml && name_id == pd.lang {
            if lang_state == LangState::Plain {
                continue;
            }
            lang_state = LangState::Plain;
            doc.set_attribute(node, name_id, value)?;
        } else {
            doc.new_attribute(node, ns, name_id, value)?;
        }
    }
    Ok(needs_reprocess)
}
