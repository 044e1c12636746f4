//! Per-conversion scratch state

use strum::EnumCount;

use super::options::ConvertOptions;
use super::resolver::Bindings;
use crate::core::tags::Tag;
use crate::dom::{NodeId, StrId, XmlDocument};
use crate::error::{ConvertError, Result};

/// State that lives for exactly one conversion
pub(crate) struct ParseData {
    pub bindings: Bindings,
    /// Destination root, set once the root element is built
    pub root: Option<NodeId>,
    pub maybe_xhtml: bool,
    pub sanitize_names: bool,
    /// Interned `lang`
    pub lang: StrId,
    /// Interned line-number attribute name
    pub line_attr: Option<StrId>,
    /// Interned names of standard tags, filled on first use
    standard_tags: [Option<StrId>; Tag::COUNT],
    /// Attributes marked for the second pass
    pub reprocess: Vec<bool>,
    /// Scratch copy of the name being munged
    pub name_buf: Vec<u8>,
    /// Explicit prefix of the element being built
    pub prefix_buf: Vec<u8>,
}

impl ParseData {
    pub fn new(doc: &mut XmlDocument, opts: &ConvertOptions) -> Result<Self> {
        let lang = doc.strings.intern(b"lang")?;
        let line_attr = match &opts.line_number_attr {
            Some(name) => Some(doc.strings.intern(name.as_bytes())?),
            None => None,
        };
        Ok(ParseData {
            bindings: Bindings::default(),
            root: None,
            maybe_xhtml: opts.use_xhtml_rules,
            sanitize_names: opts.sanitize_names,
            lang,
            line_attr,
            standard_tags: [None; Tag::COUNT],
            reprocess: Vec::new(),
            name_buf: Vec::with_capacity(64),
            prefix_buf: Vec::with_capacity(16),
        })
    }

    /// Interned normalized name of a standard tag
    pub fn standard_tag(&mut self, doc: &mut XmlDocument, tag: Tag) -> Result<StrId> {
        let Some(slot) = self.standard_tags.get_mut(tag.index()) else {
            return Err(ConvertError::UnknownNode(crate::site!("Tag outside the standard table")));
        };
        if let Some(id) = *slot {
            return Ok(id);
        }
        let name = tag
            .name()
            .ok_or(ConvertError::UnknownNode(crate::site!("Unknown tag has no standard name")))?;
        let id = doc.strings.intern(name.as_bytes())?;
        *slot = Some(id);
        Ok(id)
    }

    /// The scope the `xml`/`xlink` bindings are looked up from
    #[inline]
    pub fn binding_scope(&self, node: NodeId) -> NodeId {
        self.root.unwrap_or(node)
    }
}

/// Copy `name` into a reusable buffer, reporting allocation failure
pub(crate) fn load_name(buf: &mut Vec<u8>, name: &[u8]) -> Result<()> {
    buf.clear();
    buf.try_reserve(name.len())
        .map_err(|_| ConvertError::OutOfMemory(crate::site!("Out of memory copying name")))?;
    buf.extend_from_slice(name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tag_cached() {
        let mut doc = XmlDocument::new();
        let mut pd = ParseData::new(&mut doc, &ConvertOptions::default()).unwrap();
        let a = pd.standard_tag(&mut doc, Tag::Div).unwrap();
        let used = doc.strings.len();
        let b = pd.standard_tag(&mut doc, Tag::Div).unwrap();
        assert_eq!(a, b);
        assert_eq!(doc.strings.len(), used);
        assert_eq!(doc.strings.get_str(a), Some("div"));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut doc = XmlDocument::new();
        let mut pd = ParseData::new(&mut doc, &ConvertOptions::default()).unwrap();
        assert!(pd.standard_tag(&mut doc, Tag::Unknown).is_err());
    }

    #[test]
    fn test_line_attr_interned() {
        let mut doc = XmlDocument::new();
        let opts = ConvertOptions {
            line_number_attr: Some("data-line".into()),
            ..ConvertOptions::default()
        };
        let pd = ParseData::new(&mut doc, &opts).unwrap();
        assert_eq!(doc.strings.get_str(pd.line_attr.unwrap()), Some("data-line"));
        assert_eq!(doc.strings.get_str(pd.lang), Some("lang"));
    }

    #[test]
    fn test_load_name_reuses_buffer() {
        let mut buf = Vec::new();
        load_name(&mut buf, b"first").unwrap();
        load_name(&mut buf, b"ab").unwrap();
        assert_eq!(buf, b"ab");
    }
}
