//! Markdown rendering of page records

use crate::{condense, PageRecord, Table};
use regex::Regex;
use std::sync::OnceLock;

/// Content blocks are previewed up to this many characters
pub const BLOCK_PREVIEW_CHARS: usize = 500;

/// Condensed text shown in a report is cut to this many characters
pub const RAW_CONTENT_CHARS: usize = 10_000;

/// Render every section of a record, one markdown section each
pub fn record_to_markdown(record: &PageRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", record.title));
    output.push_str(&format!("**URL:** {}\n\n", record.url));
    output.push_str(&format!("**Description:** {}", record.description));
    ensure_newlines(&mut output, 2);

    section(&mut output, "Headers");
    for level in 1..=6u8 {
        let headings = record.headings.level(level);
        if headings.is_empty() {
            continue;
        }
        output.push_str(&format!("**H{}:**\n", level));
        for heading in headings {
            output.push_str(&format!("- {}\n", heading));
        }
        ensure_newlines(&mut output, 2);
    }

    section(&mut output, "Main Content Blocks");
    for (i, block) in record.content_blocks.iter().enumerate() {
        output.push_str(&format!("**Block {} ({}):**\n\n", i + 1, block.kind));
        let preview = condense::truncate_chars(&block.text, BLOCK_PREVIEW_CHARS);
        output.push_str(preview);
        if preview.len() < block.text.len() {
            output.push_str("...");
        }
        output.push_str("\n\n---\n\n");
    }

    section(&mut output, "Lists");
    for (i, list) in record.lists.iter().enumerate() {
        let kind = if list.ordered { "ol" } else { "ul" };
        output.push_str(&format!("**List {} ({}):**\n", i + 1, kind));
        for item in &list.items {
            output.push_str(&format!("- {}\n", item));
        }
        output.push_str("\n---\n\n");
    }

    section(&mut output, "Tables");
    for (i, table) in record.tables.iter().enumerate() {
        output.push_str(&format!("**Table {}:**\n\n", i + 1));
        if !table.headers.is_empty() {
            output.push_str(&format!("Headers: {}\n\n", table.headers.join(", ")));
        }
        output.push_str(&table_to_markdown(table));
        output.push_str("\n---\n\n");
    }

    section(&mut output, "Images");
    for (i, image) in record.images.iter().enumerate() {
        output.push_str(&format!(
            "**Image {}:**\nAlt text: {}  \nSource: {}\n\n",
            i + 1,
            image.alt,
            image.src
        ));
    }

    section(&mut output, "Links");
    for link in &record.links {
        output.push_str(&format!("- [{}]({})\n", link.text, link.url));
    }
    ensure_newlines(&mut output, 2);

    section(&mut output, "Raw Combined Content");
    output.push_str("```\n");
    output.push_str(record.excerpt(RAW_CONTENT_CHARS).trim());
    output.push_str("\n```");
    ensure_newlines(&mut output, 2);

    section(&mut output, "Metadata");
    for (key, value) in &record.meta {
        output.push_str(&format!("**{}:** {}  \n", key, value));
    }

    clean_markdown(&output)
}

fn section(output: &mut String, name: &str) {
    ensure_newlines(output, 2);
    output.push_str("## ");
    output.push_str(name);
    output.push_str("\n\n");
}

/// Render a table with padded columns. The header row is used only when it
/// has one entry per column.
pub fn table_to_markdown(table: &Table) -> String {
    let mut output = String::new();
    let col_count = table.rows.iter().map(Vec::len).max().unwrap_or(0);
    if col_count == 0 {
        return output;
    }

    let has_header = table.headers.len() == col_count;
    let mut rows: Vec<&[String]> = Vec::with_capacity(table.rows.len() + 1);
    if has_header {
        rows.push(&table.headers);
    }
    rows.extend(table.rows.iter().map(Vec::as_slice));

    // Calculate column widths
    let mut col_widths: Vec<usize> = vec![3; col_count];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < col_widths.len() {
                col_widths[i] = col_widths[i].max(cell.chars().count());
            }
        }
    }

    for (row_idx, row) in rows.iter().enumerate() {
        output.push('|');
        for (i, width) in col_widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            output.push_str(&format!(" {:<width$} |", cell, width = width));
        }
        output.push('\n');

        if row_idx == 0 && has_header {
            output.push('|');
            for width in &col_widths {
                output.push_str(&format!(" {} |", "-".repeat(*width)));
            }
            output.push('\n');
        }
    }

    output
}

/// Convert Markdown to plain text
pub fn markdown_to_plain(markdown: &str) -> String {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    static LINK: OnceLock<Regex> = OnceLock::new();
    static BOLD: OnceLock<Regex> = OnceLock::new();
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

    let mut text = markdown.to_string();

    // Remove headers
    text = pattern(&HEADER, r"(?m)^#{1,6}\s+")
        .replace_all(&text, "")
        .to_string();

    // Remove links but keep text
    text = pattern(&LINK, r"\[([^\]]+)\]\([^)]+\)")
        .replace_all(&text, "$1")
        .to_string();

    // Remove bold
    text = pattern(&BOLD, r"\*\*([^*]+)\*\*")
        .replace_all(&text, "$1")
        .to_string();

    // Remove code fences
    text = text.replace("```\n", "").replace("```", "");

    // Clean up whitespace
    text = pattern(&BLANK_LINES, r"\n{3,}")
        .replace_all(&text, "\n\n")
        .to_string();

    text.trim().to_string()
}

fn pattern(cell: &'static OnceLock<Regex>, re: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(re).expect("static pattern is valid"))
}

fn ensure_newlines(output: &mut String, count: usize) {
    if output.is_empty() {
        return;
    }
    let trailing_newlines = output.chars().rev().take_while(|&c| c == '\n').count();
    for _ in trailing_newlines..count {
        output.push('\n');
    }
}

fn clean_markdown(md: &str) -> String {
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

    // Remove excessive newlines
    let cleaned = pattern(&BLANK_LINES, r"\n{3,}").replace_all(md, "\n\n");

    // Trim and ensure final newline
    let mut result = cleaned.trim().to_string();
    if !result.is_empty() && !result.ends_with('\n') {
        result.push('\n');
    }
    result
}
