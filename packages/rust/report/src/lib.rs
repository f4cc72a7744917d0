//! Paginated plain-text report rendering for outline batches.
//!
//! Layout mirrors the legacy PDF report: a title page, then one block per
//! record (group, post idea, outline body), with a page break emitted when
//! the vertical space of a page is exhausted. Pages are separated by a form
//! feed so pagers and printers honor the breaks.
//!
//! Rendering is pure: identical records and settings produce an identical
//! document.

use chrono::{DateTime, Utc};

use keywordforge_shared::OutlineRecord;

/// Page separator (form feed on its own line).
pub const PAGE_BREAK: &str = "\u{c}\n";

/// Render `records` into a paginated report document.
///
/// `lines_per_page` bounds the content lines between breaks; a record block
/// always finishes its page before the break is emitted, matching the
/// legacy renderer's break-after-record behavior.
pub fn render_report(title: &str, records: &[OutlineRecord], lines_per_page: usize) -> String {
    let mut doc = String::new();

    // Title page
    doc.push_str(&"=".repeat(title.len().max(24)));
    doc.push('\n');
    doc.push_str(title);
    doc.push('\n');
    doc.push_str(&"=".repeat(title.len().max(24)));
    doc.push('\n');
    doc.push_str(PAGE_BREAK);

    let mut lines_used = 0usize;
    for (i, record) in records.iter().enumerate() {
        let mut block = String::new();
        block.push_str(&format!("Group: {}\n", record.group_summary));
        block.push_str(&format!("Post Idea: {}\n", record.idea));
        block.push_str("Outline:\n");
        for line in record.outline_body.lines() {
            block.push_str("  ");
            block.push_str(line);
            block.push('\n');
        }
        block.push('\n');

        doc.push_str(&block);
        lines_used += block.lines().count();

        if lines_used >= lines_per_page && i + 1 < records.len() {
            doc.push_str(PAGE_BREAK);
            lines_used = 0;
        }
    }

    doc
}

/// File name for a rendered report, derived from the batch timestamp.
pub fn report_file_name(prefix: &str, created_at: DateTime<Utc>) -> String {
    format!("{prefix}-{}.txt", created_at.format("%Y%m%d-%H%M%S"))
}
