//! Iterative Tree Walk
//!
//! Depth-first, pre-order walk over a source tree with an explicit stack of
//! (source node, destination parent) pairs. Children are pushed in reverse
//! so they pop in document order. Nesting depth is bounded by memory, never
//! by the call stack.

use crate::error::{reserve_one, ConvertError, Result};
use crate::source::{SourceId, SourceNode, SourceTree};

/// Destination side of a walk
pub trait TreeBuilder {
    /// Cheap reference to a destination node
    type Handle: Copy;

    /// Build the destination node for `node`. `parent` is the destination
    /// parent, `None` for the walk's root. The new node is not attached yet.
    fn create(&mut self, tree: &SourceTree, node: &SourceNode, parent: Option<Self::Handle>) -> Result<Self::Handle>;

    /// Attach `child` as the last child of `parent`
    fn append(&mut self, parent: Self::Handle, child: Self::Handle) -> Result<()>;

    /// Record the walk's root as soon as it exists
    fn set_root(&mut self, root: Self::Handle);
}

/// Walk the subtree at `root`, returning the destination root.
///
/// `capacity` is the initial stack size; the stack grows on demand. The
/// first failure stops the walk and is returned as is.
pub fn walk<B: TreeBuilder>(tree: &SourceTree, root: SourceId, capacity: usize, builder: &mut B) -> Result<B::Handle> {
    let mut stack: Vec<(SourceId, Option<B::Handle>)> = Vec::new();
    stack
        .try_reserve(capacity.max(1))
        .map_err(|_| ConvertError::OutOfMemory(crate::site!("Out of memory allocating stack")))?;
    stack.push((root, None));

    let mut result = None;
    while let Some((id, parent)) = stack.pop() {
        let node = tree
            .get(id)
            .ok_or(ConvertError::UnknownNode(crate::site!("Source node does not exist")))?;
        let child = builder.create(tree, node, parent)?;

        match parent {
            Some(p) => builder.append(p, child)?,
            None => {
                builder.set_root(child);
                result = Some(child);
            }
        }

        if node.kind.as_element().is_some() {
            for &cid in node.children.iter().rev() {
                reserve_one(&mut stack, crate::site!("Out of memory growing stack"))?;
                stack.push((cid, Some(child)));
            }
        }
    }

    result.ok_or(ConvertError::Structure(crate::site!("Walk produced no root")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceElement, SourceKind, SOURCE_DOCUMENT};

    /// Records (label, parent label) in creation order
    #[derive(Default)]
    struct Recorder {
        labels: Vec<String>,
        edges: Vec<(usize, usize)>,
        root: Option<usize>,
        fail_at: Option<usize>,
    }

    impl TreeBuilder for Recorder {
        type Handle = usize;

        fn create(&mut self, _tree: &SourceTree, node: &SourceNode, _parent: Option<usize>) -> Result<usize> {
            if self.fail_at == Some(self.labels.len()) {
                return Err(ConvertError::Structure("injected"));
            }
            let label = match &node.kind {
                SourceKind::Element(e) | SourceKind::Template(e) => e.original_tag.clone(),
                SourceKind::Text(t) | SourceKind::Whitespace(t) => format!("#{t}"),
                SourceKind::Comment(t) => format!("!{t}"),
                SourceKind::CData(t) => format!("[{t}]"),
                SourceKind::Document { .. } => "document".into(),
            };
            self.labels.push(label);
            Ok(self.labels.len() - 1)
        }

        fn append(&mut self, parent: usize, child: usize) -> Result<()> {
            self.edges.push((parent, child));
            Ok(())
        }

        fn set_root(&mut self, root: usize) {
            self.root = Some(root);
        }
    }

    fn sample() -> (SourceTree, SourceId) {
        let mut tree = SourceTree::new();
        let html = tree.append_element(SOURCE_DOCUMENT, SourceElement::html("html")).unwrap();
        let head = tree.append_element(html, SourceElement::html("head")).unwrap();
        tree.append_element(head, SourceElement::html("title")).unwrap();
        let body = tree.append_element(html, SourceElement::html("body")).unwrap();
        tree.append_text(body, "a").unwrap();
        let p = tree.append_element(body, SourceElement::html("p")).unwrap();
        tree.append_comment(p, "c").unwrap();
        tree.append_text(body, "b").unwrap();
        (tree, html)
    }

    #[test]
    fn test_preorder_document_order() {
        let (tree, root) = sample();
        let mut rec = Recorder::default();
        let out = walk(&tree, root, 4, &mut rec).unwrap();
        assert_eq!(out, 0);
        assert_eq!(rec.root, Some(0));
        assert_eq!(rec.labels, vec!["html", "head", "title", "body", "#a", "p", "!c", "#b"]);
        // Every parent is created before its children
        assert!(rec.edges.iter().all(|&(p, c)| p < c));
    }

    #[test]
    fn test_children_appended_in_order() {
        let (tree, root) = sample();
        let mut rec = Recorder::default();
        walk(&tree, root, 1, &mut rec).unwrap();
        let body_children: Vec<_> = rec.edges.iter().filter(|&&(p, _)| p == 3).map(|&(_, c)| c).collect();
        assert_eq!(body_children, vec![4, 5, 7]);
    }

    #[test]
    fn test_first_failure_stops() {
        let (tree, root) = sample();
        let mut rec = Recorder {
            fail_at: Some(3),
            ..Default::default()
        };
        assert_eq!(walk(&tree, root, 16, &mut rec), Err(ConvertError::Structure("injected")));
        assert_eq!(rec.labels.len(), 3);
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut tree = SourceTree::new();
        let root = tree.append_element(SOURCE_DOCUMENT, SourceElement::html("div")).unwrap();
        let mut parent = root;
        for _ in 0..200_000 {
            parent = tree.append_element(parent, SourceElement::html("div")).unwrap();
        }
        let mut rec = Recorder::default();
        walk(&tree, root, 2, &mut rec).unwrap();
        assert_eq!(rec.labels.len(), 200_001);
    }

    #[test]
    fn test_stack_growth_failure() {
        let (tree, root) = sample();
        let mut rec = Recorder::default();
        let _armed = crate::error::failpoint::arm(1);
        assert!(matches!(walk(&tree, root, 16, &mut rec), Err(ConvertError::OutOfMemory(_))));
    }
}
