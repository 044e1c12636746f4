//! Parallel Batch Conversion
//!
//! Uses Rayon to convert independent source trees concurrently. Every tree
//! gets its own document and scratch state, so nothing is shared between
//! workers.

use rayon::prelude::*;

use crate::convert::{convert, ConvertOptions};
use crate::dom::XmlDocument;
use crate::error::Result;
use crate::source::SourceTree;

/// Convert many trees in parallel, one result per tree in input order
pub fn convert_many(trees: &[SourceTree], opts: &ConvertOptions) -> Vec<Result<XmlDocument>> {
    trees.par_iter().map(|tree| convert(tree, opts)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::source::{SourceElement, SOURCE_DOCUMENT};

    fn page(root: &str) -> SourceTree {
        let mut tree = SourceTree::new();
        let html = tree.append_element(SOURCE_DOCUMENT, SourceElement::html(root)).unwrap();
        tree.append_text(html, root).unwrap();
        tree
    }

    #[test]
    fn test_convert_many_keeps_order() {
        let names = ["html", "div", "p", "span", "section", "article"];
        let trees: Vec<_> = names.iter().map(|n| page(n)).collect();

        let results = convert_many(&trees, &ConvertOptions::default());
        assert_eq!(results.len(), names.len());
        for (result, name) in results.iter().zip(names) {
            let doc = result.as_ref().unwrap();
            assert_eq!(doc.node_name(doc.root_element_id().unwrap()), Some(name));
        }
    }

    #[test]
    fn test_failures_are_independent() {
        let mut empty = SourceTree::new();
        empty.append_comment(SOURCE_DOCUMENT, "no root").unwrap();
        let trees = vec![page("p"), empty, page("div")];

        let results = convert_many(&trees, &ConvertOptions::default());
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ConvertError::Structure(_))));
        assert!(results[2].is_ok());
    }
}
