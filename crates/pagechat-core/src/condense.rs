//! Linearize a page record into condensed text
//!
//! Structure is preferred over raw text: headings, then content blocks, then
//! (only while the text is still short) paragraphs, then lists. Pages with
//! too little recognizable structure fall back to the full page text.

use crate::PageRecord;
use tracing::debug;

/// Paragraphs are appended only while the text is shorter than this
pub const PARAGRAPH_FALLBACK_CHARS: usize = 3000;

/// Trimmed condensed text shorter than this is replaced by the full text
pub const MIN_CONDENSED_CHARS: usize = 1000;

/// Build the condensed text for a record
pub fn condense(record: &PageRecord) -> String {
    let structured = structured_text(record);
    if structured.trim().chars().count() < MIN_CONDENSED_CHARS {
        debug!(
            "Condensed text too short ({} chars), using full page text",
            structured.trim().chars().count()
        );
        return record.full_text.clone();
    }
    structured
}

/// Headings, content blocks, paragraphs and lists, before the full-text fallback
fn structured_text(record: &PageRecord) -> String {
    let mut output = String::new();

    for heading in record.headings.iter() {
        output.push('\n');
        output.push_str(&"#".repeat(usize::from(heading.level)));
        output.push(' ');
        output.push_str(&heading.text);
        output.push('\n');
    }

    for block in &record.content_blocks {
        push_paragraph(&mut output, &block.text);
    }

    if output.chars().count() < PARAGRAPH_FALLBACK_CHARS {
        for paragraph in &record.paragraphs {
            push_paragraph(&mut output, paragraph);
        }
    }

    for list in &record.lists {
        output.push('\n');
        for (i, item) in list.items.iter().enumerate() {
            if list.ordered {
                output.push_str(&format!("{}. ", i + 1));
            } else {
                output.push_str("- ");
            }
            output.push_str(item);
            output.push('\n');
        }
    }

    output
}

fn push_paragraph(output: &mut String, text: &str) {
    output.push('\n');
    output.push_str(text);
    output.push('\n');
}

/// The first `limit` characters of `text`
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
