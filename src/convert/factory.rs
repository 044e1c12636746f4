//! Factory Builder
//!
//! Drives the same walk against a host object model exposed as four
//! operations. Element names follow the native rules without namespacing;
//! namespaced attributes keep a qualified `xlink:`/`xml:`/`xmlns:` name.
//!
//! The builder holds one reference to every object it creates. On success
//! it gives up all of them except the root, which it returns; `append`
//! must make the parent retain the child. On failure it gives up every
//! reference in reverse creation order.

use super::options::ConvertOptions;
use super::scratch::load_name;
use super::walk::{walk, TreeBuilder};
use crate::core::names::{name_str, sanitize_name};
use crate::core::tags::{normalize_svg_tag, TagNamespace};
use crate::error::{reserve_one, ConvertError, Result};
use crate::source::{AttrNamespace, SourceElement, SourceKind, SourceNode, SourceTree};

/// A host object model
pub trait NodeFactory {
    type Object;

    fn create_element(&mut self, name: &str, attributes: &[(String, String)]) -> Result<Self::Object>;
    fn create_comment(&mut self, text: &str) -> Result<Self::Object>;
    fn create_text(&mut self, text: &str) -> Result<Self::Object>;
    fn append(&mut self, parent: &Self::Object, child: &Self::Object) -> Result<()>;

    /// Give up the builder's reference to `object`
    fn release(&mut self, object: Self::Object);
}

/// Walk-side adapter over a [`NodeFactory`]
struct FactoryBuilder<'f, F: NodeFactory> {
    factory: &'f mut F,
    /// Every object created so far; handles index into it
    created: Vec<F::Object>,
    sanitize_names: bool,
    line_number_attr: Option<&'f str>,
    name_buf: Vec<u8>,
    attrs: Vec<(String, String)>,
}

impl<'f, F: NodeFactory> FactoryBuilder<'f, F> {
    fn record(&mut self, object: Result<F::Object>) -> Result<usize> {
        let object = object?;
        let id = self.created.len();
        self.created.push(object);
        Ok(id)
    }

    fn clean_name(&mut self, name: &str) -> Result<String> {
        if !self.sanitize_names {
            return Ok(name.to_string());
        }
        load_name(&mut self.name_buf, name.as_bytes())?;
        sanitize_name(&mut self.name_buf);
        Ok(name_str(&self.name_buf).into_owned())
    }

    fn element_name(&mut self, elem: &SourceElement) -> Result<String> {
        if elem.namespace == TagNamespace::Svg {
            if let Some(adjusted) = normalize_svg_tag(elem.original_tag.as_bytes()) {
                return Ok(adjusted.to_string());
            }
        }
        if let Some(standard) = elem.tag.name() {
            return Ok(standard.to_string());
        }
        self.clean_name(&elem.original_tag)
    }

    fn create_element(&mut self, elem: &SourceElement) -> Result<usize> {
        let name = self.element_name(elem)?;

        self.attrs.clear();
        self.attrs
            .try_reserve(elem.attributes.len() + 1)
            .map_err(|_| ConvertError::OutOfMemory(crate::site!("Out of memory allocating attributes")))?;
        if let Some(line_attr) = self.line_number_attr {
            self.attrs.push((line_attr.to_string(), elem.line.to_string()));
        }
        for attr in &elem.attributes {
            let local = self.clean_name(&attr.name)?;
            let qualified = match attr.namespace {
                AttrNamespace::None => local,
                AttrNamespace::Xlink => format!("xlink:{local}"),
                AttrNamespace::Xml => format!("xml:{local}"),
                AttrNamespace::Xmlns if attr.name == "xmlns" => local,
                AttrNamespace::Xmlns => format!("xmlns:{local}"),
            };
            self.attrs.push((qualified, attr.value.clone()));
        }

        reserve_one(&mut self.created, crate::site!("Out of memory recording object"))?;
        let object = self.factory.create_element(&name, &self.attrs);
        self.record(object)
    }

    /// Release every reference except `keep`, newest first
    fn release_all(&mut self, keep: Option<usize>) -> Option<F::Object> {
        let mut kept = None;
        while let Some(object) = self.created.pop() {
            if Some(self.created.len()) == keep {
                kept = Some(object);
            } else {
                self.factory.release(object);
            }
        }
        kept
    }
}

impl<'f, F: NodeFactory> TreeBuilder for FactoryBuilder<'f, F> {
    type Handle = usize;

    fn create(&mut self, _tree: &SourceTree, node: &SourceNode, _parent: Option<usize>) -> Result<usize> {
        let text = match &node.kind {
            SourceKind::Element(elem) | SourceKind::Template(elem) => return self.create_element(elem),
            SourceKind::Document { .. } => {
                return Err(ConvertError::UnknownNode(crate::site!("unknown source node type")));
            }
            SourceKind::Comment(text) => {
                reserve_one(&mut self.created, crate::site!("Out of memory recording object"))?;
                let object = self.factory.create_comment(text);
                return self.record(object);
            }
            SourceKind::Text(text) | SourceKind::Whitespace(text) | SourceKind::CData(text) => text,
        };
        reserve_one(&mut self.created, crate::site!("Out of memory recording object"))?;
        let object = self.factory.create_text(text);
        self.record(object)
    }

    fn append(&mut self, parent: usize, child: usize) -> Result<()> {
        let (Some(p), Some(c)) = (self.created.get(parent), self.created.get(child)) else {
            return Err(ConvertError::Structure(crate::site!("Failed to append: no such object")));
        };
        self.factory.append(p, c)
    }

    fn set_root(&mut self, _root: usize) {}
}

/// Build the host object tree for `tree` through `factory`, returning the root object.
pub fn convert_with_factory<F: NodeFactory>(tree: &SourceTree, opts: &ConvertOptions, factory: &mut F) -> Result<F::Object> {
    let root = tree
        .root()
        .ok_or(ConvertError::Structure(crate::site!("Source tree has no root element")))?;

    let mut builder = FactoryBuilder {
        factory,
        created: Vec::new(),
        sanitize_names: opts.sanitize_names,
        line_number_attr: opts.line_number_attr.as_deref(),
        name_buf: Vec::with_capacity(64),
        attrs: Vec::new(),
    };

    match walk(tree, root, opts.stack_size, &mut builder) {
        Ok(handle) => builder
            .release_all(Some(handle))
            .ok_or(ConvertError::Structure(crate::site!("Root object went missing"))),
        Err(err) => {
            log::debug!("factory conversion aborted: {err}");
            builder.release_all(None);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SOURCE_DOCUMENT;

    /// Reference-counted toy object model
    #[derive(Default)]
    struct Toy {
        names: Vec<String>,
        attrs: Vec<Vec<(String, String)>>,
        children: Vec<Vec<usize>>,
        refs: Vec<usize>,
        released: Vec<usize>,
        fail_on_create: Option<usize>,
    }

    impl Toy {
        fn make(&mut self, name: String, attrs: &[(String, String)]) -> Result<usize> {
            if self.fail_on_create == Some(self.names.len()) {
                return Err(ConvertError::OutOfMemory("toy exhausted"));
            }
            self.names.push(name);
            self.attrs.push(attrs.to_vec());
            self.children.push(Vec::new());
            self.refs.push(1);
            Ok(self.names.len() - 1)
        }
    }

    impl NodeFactory for Toy {
        type Object = usize;

        fn create_element(&mut self, name: &str, attributes: &[(String, String)]) -> Result<usize> {
            self.make(name.to_string(), attributes)
        }

        fn create_comment(&mut self, text: &str) -> Result<usize> {
            self.make(format!("!{text}"), &[])
        }

        fn create_text(&mut self, text: &str) -> Result<usize> {
            self.make(format!("#{text}"), &[])
        }

        fn append(&mut self, parent: &usize, child: &usize) -> Result<()> {
            self.children[*parent].push(*child);
            self.refs[*child] += 1;
            Ok(())
        }

        fn release(&mut self, object: usize) {
            self.refs[object] -= 1;
            self.released.push(object);
        }
    }

    fn sample() -> SourceTree {
        let mut tree = SourceTree::new();
        let html = tree.append_element(SOURCE_DOCUMENT, SourceElement::html("html")).unwrap();
        let body = tree.append_element(html, SourceElement::html("body").attr("class", "x")).unwrap();
        tree.append_text(body, "hi").unwrap();
        tree.append_comment(body, "note").unwrap();
        let svg = tree.append_element(body, SourceElement::new("svg", TagNamespace::Svg)).unwrap();
        tree.append_element(
            svg,
            SourceElement::new("clippath", TagNamespace::Svg).ns_attr(AttrNamespace::Xlink, "href", "#c"),
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_builds_tree_and_returns_root() {
        let tree = sample();
        let mut toy = Toy::default();
        let root = convert_with_factory(&tree, &ConvertOptions::default(), &mut toy).unwrap();
        assert_eq!(root, 0);
        assert_eq!(toy.names, vec!["html", "body", "#hi", "!note", "svg", "clipPath"]);
        assert_eq!(toy.children[1], vec![2, 3, 4]);
        assert_eq!(toy.attrs[1], vec![("class".to_string(), "x".to_string())]);
        assert_eq!(toy.attrs[5], vec![("xlink:href".to_string(), "#c".to_string())]);
        // Root keeps the builder's reference; everything else is held by its parent only
        assert!(toy.refs.iter().all(|&r| r == 1));
        assert!(!toy.released.contains(&0));
    }

    #[test]
    fn test_failure_releases_everything_in_reverse() {
        let tree = sample();
        let mut toy = Toy {
            fail_on_create: Some(3),
            ..Default::default()
        };
        let err = convert_with_factory(&tree, &ConvertOptions::default(), &mut toy).unwrap_err();
        assert_eq!(err, ConvertError::OutOfMemory("toy exhausted"));
        assert_eq!(toy.released, vec![2, 1, 0]);
    }

    #[test]
    fn test_line_number_attribute_first() {
        let mut tree = SourceTree::new();
        tree.append_element(SOURCE_DOCUMENT, SourceElement::html("p").attr("id", "a").line(3))
            .unwrap();
        let opts = ConvertOptions {
            line_number_attr: Some("data-line".into()),
            ..ConvertOptions::default()
        };
        let mut toy = Toy::default();
        convert_with_factory(&tree, &opts, &mut toy).unwrap();
        assert_eq!(
            toy.attrs[0],
            vec![
                ("data-line".to_string(), "3".to_string()),
                ("id".to_string(), "a".to_string())
            ]
        );
    }

    #[test]
    fn test_unknown_names_sanitized() {
        let mut tree = SourceTree::new();
        tree.append_element(SOURCE_DOCUMENT, SourceElement::html("my:el").attr("on click", "f()"))
            .unwrap();
        let mut toy = Toy::default();
        convert_with_factory(&tree, &ConvertOptions::default(), &mut toy).unwrap();
        assert_eq!(toy.names[0], "my_el");
        assert_eq!(toy.attrs[0][0].0, "on_click");
    }

    #[test]
    fn test_no_root() {
        let mut tree = SourceTree::new();
        tree.append_comment(SOURCE_DOCUMENT, "only").unwrap();
        let mut toy = Toy::default();
        assert!(matches!(
            convert_with_factory(&tree, &ConvertOptions::default(), &mut toy),
            Err(ConvertError::Structure(_))
        ));
        assert!(toy.names.is_empty());
    }
}
