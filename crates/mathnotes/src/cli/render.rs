//! # Rendering Module
//!
//! Plain-string renderers for the CLI. Handlers collect data from the coordinator and
//! hand it here; nothing in this module touches storage.
//!
//! ## Tree Layout
//!
//! ```text
//! Math
//!   Limits                                   3 pages    2 minutes ago
//!   Series                                   1 page     just now
//! Physics
//!   (empty)
//! ```
//!
//! The name column is truncated by display width (not bytes or chars) so wide glyphs in
//! file names keep the right-hand columns aligned. Styling goes through `console`, which
//! drops ANSI codes when stdout is not a terminal.

use chrono::{DateTime, Utc};
use console::Style;
use mathnotesapp::document::Document;
use mathnotesapp::drawing::InkDrawing;
use mathnotesapp::index::CollectionIndex;
use mathnotesapp::model::PagePayload;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const LINE_WIDTH: usize = 80;
pub const INDENT: &str = "  ";
pub const COL_PAGES: usize = 10;
pub const COL_TIME: usize = 16;
pub const ELLIPSIS: &str = "…";

struct Styles {
    folder: Style,
    file: Style,
    muted: Style,
    faint: Style,
    success: Style,
}

fn styles() -> Styles {
    Styles {
        folder: Style::new().color256(178).bold(),
        file: Style::new(),
        muted: Style::new().color256(244),
        faint: Style::new().color256(240),
        success: Style::new().green(),
    }
}

/// Truncate `text` to at most `width` display columns, marking the cut with an ellipsis.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(ELLIPSIS.width());
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(ELLIPSIS);
    out
}

/// Right-pad `text` to `width` display columns.
fn pad_to_width(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

pub fn format_time_ago(when: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - when).to_std().unwrap_or_default();
    if elapsed.as_secs() < 1 {
        return "just now".to_string();
    }
    timeago::Formatter::new().convert(elapsed)
}

fn page_word(count: usize) -> &'static str {
    if count == 1 {
        "page"
    } else {
        "pages"
    }
}

pub fn render_tree(index: &CollectionIndex<InkDrawing>, now: DateTime<Utc>) -> String {
    let styles = styles();
    let name_width = LINE_WIDTH.saturating_sub(INDENT.len() + COL_PAGES + COL_TIME);
    let mut out = String::new();

    for collection in index.collections() {
        out.push_str(&format!("{}\n", styles.folder.apply_to(&collection.name)));

        let documents = index.documents_in(collection.id).unwrap_or_default();
        if documents.is_empty() {
            out.push_str(&format!("{}{}\n", INDENT, styles.faint.apply_to("(empty)")));
            continue;
        }

        for document in documents {
            let name = pad_to_width(&truncate_to_width(document.name(), name_width), name_width);
            let count = document.page_count();
            let pages = format!("{} {}", count, page_word(count));
            let time = format_time_ago(document.meta().updated_at, now);
            out.push_str(&format!(
                "{}{}{}{}\n",
                INDENT,
                styles.file.apply_to(name),
                styles.muted.apply_to(pad_to_width(&pages, COL_PAGES)),
                styles.muted.apply_to(time),
            ));
        }
    }
    out
}

pub fn render_pages(document: &Document<InkDrawing>) -> String {
    let styles = styles();
    let recognition = document.recognition_index();
    let mut out = format!(
        "{} ({} {})\n",
        styles.folder.apply_to(document.name()),
        document.page_count(),
        page_word(document.page_count())
    );

    for (i, page) in document.pages().iter().enumerate() {
        let strokes = if page.is_blank() {
            "blank".to_string()
        } else {
            let n = page.stroke_count();
            format!("{} {}", n, if n == 1 { "stroke" } else { "strokes" })
        };
        let marker = if i == recognition {
            format!("  {}", styles.muted.apply_to("<- recognition"))
        } else {
            String::new()
        };
        out.push_str(&format!("{}{:>3}. {}{}\n", INDENT, i, strokes, marker));
    }
    out
}

pub fn render_success(message: &str) -> String {
    format!("{}\n", styles().success.apply_to(message))
}
