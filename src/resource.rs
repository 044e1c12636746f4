//! ResourceArc Wrappers
//!
//! Persistent state for converted documents.

use crate::dom::XmlDocument;
use rustler::ResourceArc;
use std::sync::Mutex;

/// Wrapper for XmlDocument that can be stored in a ResourceArc
/// Holds the converted document so later calls never re-run the conversion.
pub struct DocumentResource {
    pub doc: Mutex<Option<XmlDocument>>,
}

impl DocumentResource {
    pub fn from_document(doc: XmlDocument) -> Self {
        DocumentResource {
            doc: Mutex::new(Some(doc)),
        }
    }

    /// Run `f` against the stored document.
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if the document mutex is poisoned,
    /// or `"no_document"` if no document is present.
    pub fn with_doc<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&XmlDocument) -> R,
    {
        let guard = self.doc.lock().map_err(|_| "mutex_poisoned")?;
        let doc = guard.as_ref().ok_or("no_document")?;
        Ok(f(doc))
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DocumentResource {}

impl Default for DocumentResource {
    fn default() -> Self {
        DocumentResource {
            doc: Mutex::new(None),
        }
    }
}

/// Type alias for document ResourceArc
pub type DocumentRef = ResourceArc<DocumentResource>;
