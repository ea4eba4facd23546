//! Structured content extraction

use crate::dom::{self, Document, MarkupNode, Scope};
use crate::{
    condense, BlockKind, ContentBlock, Headings, Image, Link, ListBlock, PageRecord, Table,
    NO_DESCRIPTION, NO_TITLE,
};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// Class substrings that mark an element as a content block
const CONTENT_CLASS_KEYWORDS: [&str; 5] = ["content", "main", "article", "body", "text"];

/// Content blocks must be longer than this many characters
const MIN_BLOCK_CHARS: usize = 100;

/// Paragraphs must be longer than this many characters
const MIN_PARAGRAPH_CHARS: usize = 10;

pub const MAX_IMAGES: usize = 30;
pub const MAX_LINKS: usize = 50;

/// Alt text for images without an `alt` attribute
pub const DEFAULT_ALT: &str = "No description";

/// Parse `html` and extract a full record for it
pub fn extract_page(html: &str, page_url: &Url) -> PageRecord {
    let document = Document::parse(html);
    extract_record(document.root(), page_url)
}

/// Extract a record from an already parsed tree
pub fn extract_record<'a, N: MarkupNode<'a>>(root: N, page_url: &Url) -> PageRecord {
    let title = extract_title(root).unwrap_or_else(|| NO_TITLE.to_string());
    let meta = extract_meta(root);
    let description = meta
        .get("description")
        .cloned()
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    let mut record = PageRecord {
        url: page_url.clone(),
        title,
        description,
        meta,
        full_text: dom::block_text(root),
        headings: extract_headings(root),
        content_blocks: extract_content_blocks(root),
        paragraphs: extract_paragraphs(root),
        lists: extract_lists(root),
        tables: extract_tables(root),
        images: extract_images(root, page_url),
        links: extract_links(root, page_url),
        condensed: String::new(),
    };
    record.condensed = condense::condense(&record);

    debug!(
        "Extracted {}: {} headings, {} blocks, {} paragraphs, {} lists, {} tables, {} images, {} links",
        page_url,
        record.headings.len(),
        record.content_blocks.len(),
        record.paragraphs.len(),
        record.lists.len(),
        record.tables.len(),
        record.images.len(),
        record.links.len()
    );

    record
}

/// Text of the first `<title>`, if it has any
pub fn extract_title<'a, N: MarkupNode<'a>>(root: N) -> Option<String> {
    dom::find_all(root, &["title"], Scope::Document)
        .into_iter()
        .next()
        .map(dom::inline_text)
        .filter(|title| !title.is_empty())
}

/// `name` (or failing that `property`) to `content` for every `<meta>`
fn extract_meta<'a, N: MarkupNode<'a>>(root: N) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    for tag in dom::find_all(root, &["meta"], Scope::Document) {
        let key = tag
            .attr("name")
            .filter(|k| !k.is_empty())
            .or_else(|| tag.attr("property").filter(|k| !k.is_empty()));
        if let Some(key) = key {
            let content = tag.attr("content").unwrap_or_default();
            meta.insert(key.to_string(), content.to_string());
        }
    }
    meta
}

fn extract_headings<'a, N: MarkupNode<'a>>(root: N) -> Headings {
    let mut headings = Headings::default();
    for (level, tag) in (1u8..).zip(["h1", "h2", "h3", "h4", "h5", "h6"]) {
        for heading in dom::find_all(root, &[tag], Scope::Content) {
            headings.push(level, dom::trimmed_text(heading));
        }
    }
    headings
}

fn has_content_class(class: &str) -> bool {
    let class = class.to_lowercase();
    CONTENT_CLASS_KEYWORDS.iter().any(|kw| class.contains(kw))
}

/// Nested matches are each kept on their own
fn extract_content_blocks<'a, N: MarkupNode<'a>>(root: N) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    for kind in BlockKind::ALL {
        for element in dom::find_all(root, &[kind.tag()], Scope::Content) {
            if !element.attr("class").is_some_and(has_content_class) {
                continue;
            }
            let text = dom::block_text(element);
            if text.chars().count() > MIN_BLOCK_CHARS {
                blocks.push(ContentBlock { kind, text });
            }
        }
    }
    blocks
}

fn extract_paragraphs<'a, N: MarkupNode<'a>>(root: N) -> Vec<String> {
    dom::find_all(root, &["p"], Scope::Content)
        .into_iter()
        .map(dom::trimmed_text)
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect()
}

fn extract_lists<'a, N: MarkupNode<'a>>(root: N) -> Vec<ListBlock> {
    dom::find_all(root, &["ul", "ol"], Scope::Content)
        .into_iter()
        .filter_map(|list| {
            let items: Vec<String> = dom::find_all(list, &["li"], Scope::Content)
                .into_iter()
                .map(dom::trimmed_text)
                .filter(|item| !item.is_empty())
                .collect();
            (!items.is_empty()).then(|| ListBlock {
                ordered: list.tag() == "ol",
                items,
            })
        })
        .collect()
}

fn extract_tables<'a, N: MarkupNode<'a>>(root: N) -> Vec<Table> {
    let mut tables = Vec::new();
    for table in dom::find_all(root, &["table"], Scope::Content) {
        // Every <th> in the table, not just the first row
        let headers: Vec<String> = dom::find_all(table, &["th"], Scope::Content)
            .into_iter()
            .map(dom::trimmed_text)
            .collect();

        let rows: Vec<Vec<String>> = dom::find_all(table, &["tr"], Scope::Content)
            .into_iter()
            .map(|row| {
                dom::find_all(row, &["td", "th"], Scope::Content)
                    .into_iter()
                    .map(dom::trimmed_text)
                    .collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect();

        if !rows.is_empty() {
            tables.push(Table { headers, rows });
        }
    }
    tables
}

fn extract_images<'a, N: MarkupNode<'a>>(root: N, page_url: &Url) -> Vec<Image> {
    dom::find_all(root, &["img"], Scope::Content)
        .into_iter()
        .filter_map(|img| {
            let src = img.attr("src").filter(|src| !src.is_empty())?;
            Some(Image {
                src: resolve_url(src, page_url),
                alt: img.attr("alt").unwrap_or(DEFAULT_ALT).to_string(),
            })
        })
        .take(MAX_IMAGES)
        .collect()
}

fn extract_links<'a, N: MarkupNode<'a>>(root: N, page_url: &Url) -> Vec<Link> {
    dom::find_all(root, &["a"], Scope::Content)
        .into_iter()
        .filter_map(|anchor| {
            let href = anchor.attr("href")?;
            let url = if is_passthrough(href) {
                href.to_string()
            } else {
                resolve_url(href, page_url)
            };
            let text = dom::inline_text(anchor);
            let text = if text.is_empty() { url.clone() } else { text };
            Some(Link { url, text })
        })
        .take(MAX_LINKS)
        .collect()
}

fn is_passthrough(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("mailto:") || lower.starts_with("tel:")
}

/// Resolve `href` against the page URL by standard URL-join rules. Targets
/// that cannot be joined are kept verbatim.
pub fn resolve_url(href: &str, base_url: &Url) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        base_url
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://x.com/p").unwrap()
    }

    fn extract(html: &str) -> PageRecord {
        extract_page(html, &page_url())
    }

    #[test]
    fn test_title_and_fallback() {
        let html = "<html><head><title> Test Page </title></head><body></body></html>";
        assert_eq!(extract(html).title, "Test Page");

        let html = "<html><head></head><body></body></html>";
        assert_eq!(extract(html).title, NO_TITLE);
    }

    #[test]
    fn test_meta_entries() {
        let html = r#"<html><head>
            <meta name="description" content="A page">
            <meta property="og:title" content="OG">
            <meta name="author" property="og:author" content="Ann">
            <meta name="author" content="Bob">
            <meta charset="utf-8">
        </head><body></body></html>"#;
        let record = extract(html);
        assert_eq!(record.description, "A page");
        assert_eq!(record.meta.get("og:title").map(String::as_str), Some("OG"));
        assert_eq!(record.meta.get("author").map(String::as_str), Some("Bob"));
        assert!(!record.meta.contains_key("og:author"));
        assert_eq!(record.meta.len(), 3);
    }

    #[test]
    fn test_missing_description() {
        assert_eq!(extract("<p>hi</p>").description, NO_DESCRIPTION);
    }

    #[test]
    fn test_headings_partitioned_by_level() {
        let html = "<h3>c</h3><h1>a</h1><h2>b</h2><h6>f</h6><h1>a2</h1><h4>d</h4><h5>e</h5>";
        let record = extract(html);
        assert_eq!(record.headings.len(), 7);
        assert_eq!(record.headings.level(1), ["a".to_string(), "a2".to_string()]);
        assert_eq!(record.headings.level(2), ["b".to_string()]);
        assert_eq!(record.headings.level(3), ["c".to_string()]);
        assert_eq!(record.headings.level(6), ["f".to_string()]);
    }

    #[test]
    fn test_full_text_excludes_non_content() {
        let html = "<html><head><title>T</title><style>p { color: red }</style></head>\
                    <body><p>Hello   there</p><script>alert('x')</script>\
                    <iframe src=\"/f\"></iframe><div>world</div></body></html>";
        assert_eq!(extract(html).full_text, "Hello there world");
    }

    #[test]
    fn test_content_block_threshold() {
        let exactly = "a".repeat(100);
        let over = "b".repeat(101);
        let html = format!(
            r#"<div class="main-content">{exactly}</div><article class="Article-Body">{over}</article>"#
        );
        let record = extract(&html);
        assert_eq!(record.content_blocks.len(), 1);
        assert_eq!(record.content_blocks[0].kind, BlockKind::Article);
        assert_eq!(record.content_blocks[0].text, over);
    }

    #[test]
    fn test_content_block_requires_class_keyword() {
        let long = "word ".repeat(40);
        let html = format!(r#"<div class="sidebar">{long}</div><section id="content">{long}</section>"#);
        assert!(extract(&html).content_blocks.is_empty());
    }

    #[test]
    fn test_nested_content_blocks_are_both_kept() {
        let long = "text ".repeat(30);
        let html = format!(r#"<article class="post-content"><div class="entry-text">{long}</div></article>"#);
        let record = extract(&html);
        assert_eq!(record.content_blocks.len(), 2);
        assert_eq!(record.content_blocks[0].kind, BlockKind::Article);
        assert_eq!(record.content_blocks[1].kind, BlockKind::Div);
        assert_eq!(record.content_blocks[0].text, record.content_blocks[1].text);
    }

    #[test]
    fn test_paragraph_threshold() {
        let html = "<p>0123456789</p><p>0123456789a</p><p>  </p>";
        assert_eq!(extract(html).paragraphs, vec!["0123456789a".to_string()]);
    }

    #[test]
    fn test_paragraph_length_counts_inner_whitespace() {
        // Only the ends are trimmed before the length check
        let html = "<p>Hi\n\n\n\n\n\n\n\n\nyou</p><p>   short   </p><p>\n  tiny   one \n</p>";
        assert_eq!(
            extract(html).paragraphs,
            vec!["Hi\n\n\n\n\n\n\n\n\nyou".to_string()]
        );
    }

    #[test]
    fn test_deeply_nested_page() {
        let depth = 20_000;
        let html = format!(
            "<html><body>{}<p>deep paragraph</p>{}</body></html>",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let record = extract(&html);
        assert_eq!(record.full_text, "deep paragraph");
        assert_eq!(record.paragraphs, vec!["deep paragraph".to_string()]);
    }

    #[test]
    fn test_lists() {
        let html = "<ul><li>One</li><li> </li><li>Two</li></ul><ol><li>First</li></ol><ul></ul><ul><li></li></ul>";
        let record = extract(html);
        assert_eq!(record.lists.len(), 2);
        assert!(!record.lists[0].ordered);
        assert_eq!(record.lists[0].items, vec!["One", "Two"]);
        assert!(record.lists[1].ordered);
        assert_eq!(record.lists[1].items, vec!["First"]);
    }

    #[test]
    fn test_tables() {
        let html = "<table><tr><th>Name</th><th>Age</th></tr><tr><td>Ann</td><td>30</td></tr>\
                    <tr></tr><tr><th>Total</th><td>1</td></tr></table>\
                    <table><tr></tr></table>";
        let record = extract(html);
        assert_eq!(record.tables.len(), 1);
        let table = &record.tables[0];
        assert_eq!(table.headers, vec!["Name", "Age", "Total"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Ann".to_string(), "30".to_string()],
                vec!["Total".to_string(), "1".to_string()],
            ]
        );
    }

    #[test]
    fn test_table_without_headers() {
        let record = extract("<table><tr><td>a</td></tr></table>");
        assert!(record.tables[0].headers.is_empty());
        assert_eq!(record.tables[0].rows, vec![vec!["a".to_string()]]);
    }

    #[test]
    fn test_image_resolution() {
        let html = r#"<img src="/a.png"><img src=""><img alt="x"><img src="https://cdn.example/b.jpg" alt="B">"#;
        let record = extract(html);
        assert_eq!(record.images.len(), 2);
        assert_eq!(record.images[0].src, "https://x.com/a.png");
        assert_eq!(record.images[0].alt, DEFAULT_ALT);
        assert_eq!(record.images[1].src, "https://cdn.example/b.jpg");
        assert_eq!(record.images[1].alt, "B");
    }

    #[test]
    fn test_link_resolution() {
        let html = r#"<a href="docs/intro">Intro</a><a href="//cdn.x.com/f">CDN</a>
            <a href="mailto:me@x.com">Mail</a><a href="tel:+123"></a><a>no href</a>
            <a href="https://other.org/q?a=1"><img src="i.png"></a>"#;
        let record = extract(html);
        let urls: Vec<&str> = record.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://x.com/docs/intro",
                "https://cdn.x.com/f",
                "mailto:me@x.com",
                "tel:+123",
                "https://other.org/q?a=1",
            ]
        );
        assert_eq!(record.links[3].text, "tel:+123");
        assert_eq!(record.links[4].text, "https://other.org/q?a=1");
    }

    #[test]
    fn test_resolve_url_matches_join() {
        let base = Url::parse("https://x.com/blog/post/").unwrap();
        for href in ["../up", "./same", "?q=1", "#frag", "/root", "plain"] {
            assert_eq!(resolve_url(href, &base), base.join(href).unwrap().to_string());
        }
    }

    #[test]
    fn test_link_and_image_caps() {
        let mut html = String::new();
        for i in 0..60 {
            html.push_str(&format!(r#"<a href="/l{i}">L{i}</a><img src="/i{i}.png">"#));
        }
        let record = extract(&html);
        assert_eq!(record.links.len(), MAX_LINKS);
        assert_eq!(record.links[49].url, "https://x.com/l49");
        assert_eq!(record.images.len(), MAX_IMAGES);
        assert_eq!(record.images[29].src, "https://x.com/i29.png");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = r#"<html><head><title>T</title><meta name="a" content="b"></head>
            <body><h1>H</h1><div class="content">"#
            .to_string()
            + &"z ".repeat(80)
            + "</div><ul><li>i</li></ul><a href=\"/x\">x</a></body></html>";
        let document = Document::parse(&html);
        let first = extract_record(document.root(), &page_url());
        let second = extract_record(document.root(), &page_url());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_short_page_scenario() {
        let html = "<h1>Title</h1><p>Short.</p><p>A paragraph long enough to exceed ten characters easily.</p>";
        let record = extract(html);
        assert_eq!(record.headings.level(1), ["Title".to_string()]);
        assert_eq!(
            record.paragraphs,
            vec!["A paragraph long enough to exceed ten characters easily.".to_string()]
        );
        assert!(record.content_blocks.is_empty());
    }
}
