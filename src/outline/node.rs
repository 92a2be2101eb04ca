//! Owned markup tree and the parser seam that builds it.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_fragment, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

/// Builds a [`MarkupNode`] tree from an HTML string.
///
/// Implementations must not fail: anything they cannot interpret becomes text.
pub trait MarkupParser {
    fn parse(&self, markup: &str) -> MarkupNode;
}

/// HTML5 parser backed by html5ever.
///
/// Markup is parsed as the contents of a `<div>`, so head-only elements such as
/// `<title>` or `<style>` stay where they appear. The returned root is a
/// `body` element holding the parsed fragment.
#[derive(Debug, Default, Clone, Copy)]
pub struct Html5everParser;

impl MarkupParser for Html5everParser {
    fn parse(&self, markup: &str) -> MarkupNode {
        let context = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("div"));
        let dom = parse_fragment(RcDom::default(), Default::default(), context, Vec::new()).one(markup);
        let children = find_element(&dom.document, "html")
            .map(|html| convert_children(&html))
            .unwrap_or_default();
        MarkupNode::Element(Element::new("body", Vec::new(), children))
    }
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { ref name, .. } = handle.data {
        if &*name.local == tag {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

fn convert_children(handle: &Handle) -> Vec<MarkupNode> {
    handle.children.borrow().iter().filter_map(convert).collect()
}

fn convert(handle: &Handle) -> Option<MarkupNode> {
    match handle.data {
        NodeData::Text { ref contents } => Some(MarkupNode::Text(contents.borrow().to_string())),
        NodeData::Element {
            ref name,
            ref attrs,
            ..
        } => {
            let attributes = attrs
                .borrow()
                .iter()
                .map(|a| (a.name.local.to_string(), a.value.to_string()))
                .collect();
            Some(MarkupNode::Element(Element::new(
                &name.local.to_ascii_lowercase(),
                attributes,
                convert_children(handle),
            )))
        }
        // comments, doctypes and processing instructions carry no content
        _ => None,
    }
}

impl MarkupNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            MarkupNode::Element(el) => Some(el),
            MarkupNode::Text(_) => None,
        }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            MarkupNode::Text(t) => out.push_str(t),
            MarkupNode::Element(el) => el.children.iter().for_each(|c| c.push_text(out)),
        }
    }

    fn serialize_into(&self, out: &mut String) {
        match self {
            MarkupNode::Text(t) => out.push_str(&html_escape::encode_text(t)),
            MarkupNode::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&el.tag.as_str()) {
                    return;
                }
                el.children.iter().for_each(|c| c.serialize_into(out));
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

impl Element {
    pub fn new(tag: &str, attributes: Vec<(String, String)>, children: Vec<MarkupNode>) -> Self {
        Self {
            tag: tag.to_string(),
            attributes,
            children,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendants, untrimmed.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.children.iter().for_each(|c| c.push_text(&mut out));
        out
    }

    /// Serialized child markup, as a browser's `innerHTML` would produce it.
    pub fn inner_markup(&self) -> String {
        let mut out = String::new();
        self.children.iter().for_each(|c| c.serialize_into(&mut out));
        out
    }

    /// Direct element children with one of the given tags.
    pub fn child_elements<'a>(
        &'a self,
        tags: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children
            .iter()
            .filter_map(MarkupNode::as_element)
            .filter(move |el| tags.contains(&el.tag.as_str()))
    }

    /// Descendant elements (not including `self`) with one of the given tags,
    /// in document order.
    pub fn descendants(&self, tags: &[&str]) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_descendants(tags, &mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, tags: &[&str], out: &mut Vec<&'a Element>) {
        for child in self.children.iter().filter_map(MarkupNode::as_element) {
            if tags.contains(&child.tag.as_str()) {
                out.push(child);
            }
            child.collect_descendants(tags, out);
        }
    }

    pub fn first_descendant(&self, tag: &str) -> Option<&Element> {
        self.children
            .iter()
            .filter_map(MarkupNode::as_element)
            .find_map(|child| {
                if child.tag == tag {
                    Some(child)
                } else {
                    child.first_descendant(tag)
                }
            })
    }
}
