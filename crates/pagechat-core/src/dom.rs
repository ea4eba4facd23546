//! Typed access to a parsed markup tree
//!
//! The extractor only needs a handful of capabilities from a parsed document:
//! the tag name, attributes, text and children of a node. [`MarkupNode`]
//! captures those, and is implemented for `scraper`'s [`ElementRef`].

use scraper::{ElementRef, Html, Node};

/// Elements whose subtrees never contribute content
pub const NON_CONTENT_TAGS: [&str; 5] = ["script", "style", "noscript", "iframe", "head"];

/// A child of an element: either another element or a text node
#[derive(Debug, Clone, Copy)]
pub enum Child<'a, N> {
    Element(N),
    Text(&'a str),
}

/// An element in a parsed document
pub trait MarkupNode<'a>: Copy {
    /// Lowercase tag name
    fn tag(&self) -> &'a str;

    /// Attribute value, if present
    fn attr(&self, name: &str) -> Option<&'a str>;

    /// Element and text children in document order
    fn children(&self) -> Vec<Child<'a, Self>>;
}

impl<'a> MarkupNode<'a> for ElementRef<'a> {
    fn tag(&self) -> &'a str {
        self.value().name()
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.value().attr(name)
    }

    fn children(&self) -> Vec<Child<'a, Self>> {
        let node = **self;
        let mut children = Vec::new();
        for child in node.children() {
            match child.value() {
                Node::Text(text) => children.push(Child::Text(text.text.as_ref())),
                Node::Element(_) => {
                    if let Some(elem) = ElementRef::wrap(child) {
                        children.push(Child::Element(elem));
                    }
                }
                _ => {}
            }
        }
        children
    }
}

/// Which parts of the tree a walk may enter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every element, including `<head>` and scripts
    Document,
    /// Skips the subtrees listed in [`NON_CONTENT_TAGS`]
    Content,
}

impl Scope {
    fn enters(self, tag: &str) -> bool {
        match self {
            Scope::Document => true,
            Scope::Content => !NON_CONTENT_TAGS.contains(&tag),
        }
    }
}

/// A parsed HTML document
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full HTML document. Malformed markup is repaired, never rejected.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// The `<html>` element
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}

/// All descendants of `node` (not `node` itself) with one of `tags`, in
/// document order
pub fn find_all<'a, N: MarkupNode<'a>>(node: N, tags: &[&str], scope: Scope) -> Vec<N> {
    let mut found = Vec::new();
    // Explicit stack so deeply nested pages cannot overflow the call stack
    let mut stack: Vec<N> = child_elements(node);
    stack.reverse();

    while let Some(elem) = stack.pop() {
        let tag = elem.tag();
        if !scope.enters(tag) {
            continue;
        }
        if tags.contains(&tag) {
            found.push(elem);
        }
        stack.extend(child_elements(elem).into_iter().rev());
    }
    found
}

fn child_elements<'a, N: MarkupNode<'a>>(node: N) -> Vec<N> {
    node.children()
        .into_iter()
        .filter_map(|child| match child {
            Child::Element(elem) => Some(elem),
            Child::Text(_) => None,
        })
        .collect()
}

/// Raw text nodes under `node`, depth first, skipping non-content subtrees
pub fn text_nodes<'a, N: MarkupNode<'a>>(node: N) -> Vec<&'a str> {
    let mut texts = Vec::new();
    let mut stack: Vec<Child<'a, N>> = node.children();
    stack.reverse();

    while let Some(child) = stack.pop() {
        match child {
            Child::Text(text) => texts.push(text),
            Child::Element(elem) => {
                if Scope::Content.enters(elem.tag()) {
                    stack.extend(elem.children().into_iter().rev());
                }
            }
        }
    }
    texts
}

/// Text nodes trimmed, empty ones dropped, joined by spaces, then collapsed
pub fn block_text<'a, N: MarkupNode<'a>>(node: N) -> String {
    let joined = text_nodes(node)
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}

/// Text nodes concatenated as they appear, then collapsed
pub fn inline_text<'a, N: MarkupNode<'a>>(node: N) -> String {
    collapse_whitespace(&text_nodes(node).concat())
}

/// Text nodes concatenated as they appear, only the ends trimmed
pub fn trimmed_text<'a, N: MarkupNode<'a>>(node: N) -> String {
    text_nodes(node).concat().trim().to_string()
}

/// Replace every whitespace run with one space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_all_document_order() {
        let doc = Document::parse("<div><h2>a</h2><section><h1>b</h1></section><h2>c</h2></div>");
        let found = find_all(doc.root(), &["h1", "h2"], Scope::Content);
        let texts: Vec<String> = found.into_iter().map(inline_text).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_content_scope_skips_scripts_and_head() {
        let html = "<html><head><title>T</title></head><body><p>x</p>\
                    <script>var p = 1;</script><noscript><p>y</p></noscript></body></html>";
        let doc = Document::parse(html);
        assert_eq!(find_all(doc.root(), &["p"], Scope::Content).len(), 1);
        assert_eq!(find_all(doc.root(), &["title"], Scope::Content).len(), 0);
        assert_eq!(find_all(doc.root(), &["title"], Scope::Document).len(), 1);
        assert_eq!(block_text(doc.root()), "x");
    }

    #[test]
    fn test_block_and_inline_text() {
        let doc = Document::parse("<body><p>  Hello\n\n <b>big</b>   world </p></body>");
        let p = find_all(doc.root(), &["p"], Scope::Content)[0];
        assert_eq!(block_text(p), "Hello big world");
        assert_eq!(inline_text(p), "Hello big world");
        assert_eq!(trimmed_text(p), "Hello\n\n big   world");
    }

    #[test]
    fn test_deeply_nested_document() {
        let depth = 20_000;
        let html = format!("{}<p>deep</p>{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let doc = Document::parse(&html);
        let divs = find_all(doc.root(), &["div"], Scope::Content);
        assert_eq!(divs.len(), depth);
        assert_eq!(find_all(doc.root(), &["p"], Scope::Content).len(), 1);
        assert_eq!(text_nodes(doc.root()), vec!["deep"]);
        assert_eq!(block_text(divs[0]), "deep");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
