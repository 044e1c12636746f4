//! Conversion Options

/// Knobs for one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Initial capacity of the walk stack, in entries. The stack grows past it on demand.
    pub stack_size: usize,
    /// Copy the source doctype into the document
    pub keep_doctype: bool,
    /// Give every element a namespace, declaring a default binding where the namespace changes
    pub namespace_elements: bool,
    /// Clamp tag and attribute names to the safe ASCII subset
    pub sanitize_names: bool,
    /// When set, stamp each element's source line into an attribute of this name
    pub line_number_attr: Option<String>,
    /// XHTML compatibility rules: prefix resolution, `xmlns:p` declarations, `lang` mirroring
    pub use_xhtml_rules: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            stack_size: 16 * 1024,
            keep_doctype: true,
            namespace_elements: false,
            sanitize_names: true,
            line_number_attr: None,
            use_xhtml_rules: false,
        }
    }
}

impl ConvertOptions {
    /// Options with XHTML compatibility rules switched on
    pub fn xhtml() -> Self {
        ConvertOptions {
            use_xhtml_rules: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ConvertOptions::default();
        assert_eq!(opts.stack_size, 16 * 1024);
        assert!(opts.keep_doctype);
        assert!(!opts.namespace_elements);
        assert!(opts.sanitize_names);
        assert!(opts.line_number_attr.is_none());
        assert!(!opts.use_xhtml_rules);
    }

    #[test]
    fn test_xhtml() {
        let opts = ConvertOptions::xhtml();
        assert!(opts.use_xhtml_rules);
        assert!(opts.sanitize_names);
    }
}
