//! Conversion Module - source tree to namespace-correct document
//!
//! [`convert`] is all or nothing: it either returns a finished document or
//! drops everything it built and returns the diagnostic of the first
//! failure.

mod attributes;
mod element;
pub mod factory;
pub mod options;
mod resolver;
mod scratch;
pub mod walk;

use log::debug;

use crate::dom::{DoctypeDecl, NodeId, XmlDocument, DOCUMENT_NODE};
use crate::error::{ConvertError, Result};
use crate::source::{SourceId, SourceKind, SourceTree, SOURCE_DOCUMENT};
use element::DomBuilder;
use walk::walk;

pub use factory::{convert_with_factory, NodeFactory};
pub use options::ConvertOptions;
pub use walk::TreeBuilder;

/// Convert a parsed HTML tree into a new document
pub fn convert(tree: &SourceTree, opts: &ConvertOptions) -> Result<XmlDocument> {
    let result = assemble(tree, opts);
    if let Err(err) = &result {
        debug!("conversion aborted, document discarded: {err}");
    }
    result
}

fn assemble(tree: &SourceTree, opts: &ConvertOptions) -> Result<XmlDocument> {
    let source_root = tree
        .root()
        .ok_or(ConvertError::Structure(crate::site!("Source tree has no root element")))?;

    let mut doc = XmlDocument::new();
    if opts.keep_doctype {
        if let Some(decl) = tree.doctype() {
            doc.set_doctype(DoctypeDecl {
                name: decl.name.clone(),
                public_id: decl.public_id.clone(),
                system_id: decl.system_id.clone(),
            })?;
        }
    }

    let mut builder = DomBuilder::new(doc, opts)?;
    let root = walk(tree, source_root, opts.stack_size, &mut builder)?;
    let DomBuilder { mut doc, mut pd, .. } = builder;

    if pd.maybe_xhtml {
        // Mirror a root lang into xml:lang
        if let Some(lang) = doc.find_attribute(root, pd.lang, None) {
            let value_id = doc
                .get_attr(lang)
                .map(|a| a.value_id)
                .ok_or(ConvertError::Structure(crate::site!("Root lang attribute went missing")))?;
            let xml = pd.bindings.ensure_xml(&mut doc, root)?;
            doc.new_attribute_interned(root, Some(xml), pd.lang, value_id)?;
        }
    }

    doc.set_root(root)?;
    add_root_comments(&mut doc, tree, source_root, root)?;
    Ok(doc)
}

/// Re-create document-level comments around the root, in source order
fn add_root_comments(doc: &mut XmlDocument, tree: &SourceTree, source_root: SourceId, root: NodeId) -> Result<()> {
    let mut before_root = true;
    for &id in tree.children(SOURCE_DOCUMENT) {
        if id == source_root {
            before_root = false;
            continue;
        }
        let Some(SourceKind::Comment(text)) = tree.get(id).map(|n| &n.kind) else {
            continue;
        };
        let comment = doc.new_comment(text.as_bytes())?;
        if before_root {
            doc.insert_before(root, comment)?;
        } else {
            doc.append_child(DOCUMENT_NODE, comment)?;
        }
    }
    Ok(())
}
