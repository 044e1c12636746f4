//! Standard Tags and Namespaces
//!
//! The fixed tag enumeration an HTML5 tree builder reports for known elements,
//! the three element namespaces, and SVG tag-name case restoration.

use std::str::FromStr;
use strum_macros::{EnumCount, EnumString, IntoStaticStr};

/// Well-known element namespace URIs, indexed by [`TagNamespace`]
pub mod ns {
    pub const HTML: &[u8] = b"http://www.w3.org/1999/xhtml";
    pub const SVG: &[u8] = b"http://www.w3.org/2000/svg";
    pub const MATHML: &[u8] = b"http://www.w3.org/1998/Math/MathML";
}

/// Namespace an element was created in by the tree builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagNamespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

impl TagNamespace {
    /// The namespace URI bound for elements in this namespace
    pub fn uri(self) -> &'static [u8] {
        match self {
            TagNamespace::Html => ns::HTML,
            TagNamespace::Svg => ns::SVG,
            TagNamespace::MathMl => ns::MATHML,
        }
    }
}

/// A standard tag, or `Unknown` when the element name is not in the table.
///
/// The discriminant doubles as the index into the per-conversion name cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u16)]
pub enum Tag {
    Html,
    Head,
    Title,
    Base,
    Link,
    Meta,
    Style,
    Script,
    Noscript,
    Template,
    Body,
    Article,
    Section,
    Nav,
    Aside,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Hgroup,
    Header,
    Footer,
    Address,
    P,
    Hr,
    Pre,
    Blockquote,
    Ol,
    Ul,
    Li,
    Dl,
    Dt,
    Dd,
    Figure,
    Figcaption,
    Main,
    Div,
    A,
    Em,
    Strong,
    Small,
    S,
    Cite,
    Q,
    Dfn,
    Abbr,
    Data,
    Time,
    Code,
    Var,
    Samp,
    Kbd,
    Sub,
    Sup,
    I,
    B,
    U,
    Mark,
    Ruby,
    Rt,
    Rp,
    Bdi,
    Bdo,
    Span,
    Br,
    Wbr,
    Ins,
    Del,
    Image,
    Img,
    Iframe,
    Embed,
    Object,
    Param,
    Video,
    Audio,
    Source,
    Track,
    Canvas,
    Map,
    Area,
    Math,
    Mi,
    Mo,
    Mn,
    Ms,
    Mtext,
    Mglyph,
    Malignmark,
    #[strum(serialize = "annotation-xml")]
    AnnotationXml,
    Svg,
    ForeignObject,
    Desc,
    Table,
    Caption,
    Colgroup,
    Col,
    Tbody,
    Thead,
    Tfoot,
    Tr,
    Td,
    Th,
    Form,
    Fieldset,
    Legend,
    Label,
    Input,
    Button,
    Select,
    Datalist,
    Optgroup,
    Option,
    Textarea,
    Keygen,
    Output,
    Progress,
    Meter,
    Details,
    Summary,
    Menu,
    Menuitem,
    Applet,
    Acronym,
    Bgsound,
    Dir,
    Frame,
    Frameset,
    Noframes,
    Isindex,
    Listing,
    Xmp,
    Nextid,
    Noembed,
    Plaintext,
    Rb,
    Strike,
    Basefont,
    Big,
    Blink,
    Center,
    Font,
    Marquee,
    Multicol,
    Nobr,
    Spacer,
    Tt,
    Rtc,
    Dialog,
    Search,
    Slot,
    Picture,
    #[strum(disabled)]
    Unknown,
}

impl Tag {
    /// Look up a tag by element name, ASCII case-insensitively.
    pub fn from_name(name: &str) -> Tag {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            Tag::from_str(&name.to_ascii_lowercase()).unwrap_or(Tag::Unknown)
        } else {
            Tag::from_str(name).unwrap_or(Tag::Unknown)
        }
    }

    /// Normalized (lowercase) name of a standard tag; `None` for `Unknown`.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Tag::Unknown => None,
            known => Some(known.into()),
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_unknown(self) -> bool {
        self == Tag::Unknown
    }
}

/// SVG element names whose camel case the HTML tokenizer folds away
const SVG_TAG_ADJUSTMENTS: &[(&str, &str)] = &[
    ("altglyph", "altGlyph"),
    ("altglyphdef", "altGlyphDef"),
    ("altglyphitem", "altGlyphItem"),
    ("animatecolor", "animateColor"),
    ("animatemotion", "animateMotion"),
    ("animatetransform", "animateTransform"),
    ("clippath", "clipPath"),
    ("feblend", "feBlend"),
    ("fecolormatrix", "feColorMatrix"),
    ("fecomponenttransfer", "feComponentTransfer"),
    ("fecomposite", "feComposite"),
    ("feconvolvematrix", "feConvolveMatrix"),
    ("fediffuselighting", "feDiffuseLighting"),
    ("fedisplacementmap", "feDisplacementMap"),
    ("fedistantlight", "feDistantLight"),
    ("fedropshadow", "feDropShadow"),
    ("feflood", "feFlood"),
    ("fefunca", "feFuncA"),
    ("fefuncb", "feFuncB"),
    ("fefuncg", "feFuncG"),
    ("fefuncr", "feFuncR"),
    ("fegaussianblur", "feGaussianBlur"),
    ("feimage", "feImage"),
    ("femerge", "feMerge"),
    ("femergenode", "feMergeNode"),
    ("femorphology", "feMorphology"),
    ("feoffset", "feOffset"),
    ("fepointlight", "fePointLight"),
    ("fespecularlighting", "feSpecularLighting"),
    ("fespotlight", "feSpotLight"),
    ("fetile", "feTile"),
    ("feturbulence", "feTurbulence"),
    ("foreignobject", "foreignObject"),
    ("glyphref", "glyphRef"),
    ("lineargradient", "linearGradient"),
    ("radialgradient", "radialGradient"),
    ("textpath", "textPath"),
];

/// Restore the case of an SVG element name, matching ASCII case-insensitively.
///
/// Returns `None` when the name needs no adjustment.
pub fn normalize_svg_tag(original: &[u8]) -> Option<&'static str> {
    SVG_TAG_ADJUSTMENTS
        .iter()
        .find(|(from, _)| from.as_bytes().eq_ignore_ascii_case(original))
        .map(|&(_, to)| to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::EnumCount;

    #[test]
    fn test_lookup_known() {
        assert_eq!(Tag::from_name("div"), Tag::Div);
        assert_eq!(Tag::from_name("DIV"), Tag::Div);
        assert_eq!(Tag::from_name("h3"), Tag::H3);
        assert_eq!(Tag::from_name("annotation-xml"), Tag::AnnotationXml);
        assert_eq!(Tag::from_name("foreignObject"), Tag::ForeignObject);
    }

    #[test]
    fn test_lookup_unknown() {
        assert_eq!(Tag::from_name("my:custom"), Tag::Unknown);
        assert_eq!(Tag::from_name("unknown"), Tag::Unknown);
        assert_eq!(Tag::Unknown.name(), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Tag::Html.name(), Some("html"));
        assert_eq!(Tag::ForeignObject.name(), Some("foreignobject"));
        assert_eq!(Tag::AnnotationXml.name(), Some("annotation-xml"));
    }

    #[test]
    fn test_cache_index_in_range() {
        assert!(Tag::Unknown.index() < Tag::COUNT);
        assert_eq!(Tag::Html.index(), 0);
    }

    #[test]
    fn test_svg_normalization() {
        assert_eq!(normalize_svg_tag(b"foreignobject"), Some("foreignObject"));
        assert_eq!(normalize_svg_tag(b"CLIPPATH"), Some("clipPath"));
        assert_eq!(normalize_svg_tag(b"circle"), None);
    }

    #[test]
    fn test_namespace_uris() {
        assert_eq!(TagNamespace::Html.uri(), b"http://www.w3.org/1999/xhtml");
        assert_eq!(TagNamespace::Svg.uri(), b"http://www.w3.org/2000/svg");
        assert_eq!(TagNamespace::MathMl.uri(), b"http://www.w3.org/1998/Math/MathML");
    }
}
