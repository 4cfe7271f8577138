//! Line-oriented diffs for previews and changed-line counts.
//!
//! Built on `similar`; hunks use the familiar
//! `@@ -start,len +start,len @@` header with context lines.

use similar::{ChangeTag, DiffOp, TextDiff};

/// A single hunk in a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize, // 1-based line number in old text
    pub old_count: usize, // Number of lines in old version
    pub new_start: usize, // 1-based line number in new text
    pub new_count: usize, // Number of lines in new version
    pub lines: Vec<HunkLine>,
}

/// A line in a hunk with its change type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String), // Unchanged line (starts with ' ')
    Remove(String),  // Removed line (starts with '-')
    Add(String),     // Added line (starts with '+')
}

/// Unified-diff start: 1-based, or the preceding line for empty ranges.
fn header_start(start: usize, count: usize) -> usize {
    if count == 0 { start } else { start + 1 }
}

/// Hunks between `old` and `new` with `context` unchanged lines around
/// each change.
pub fn hunks(old: &str, new: &str, context: usize) -> Vec<Hunk> {
    let diff = TextDiff::from_lines(old, new);
    let mut out = Vec::new();

    for group in diff.grouped_ops(context) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;

        let mut lines = Vec::new();
        for op in &group {
            for change in diff.iter_changes(op) {
                let value = change.value();
                let text = value
                    .strip_suffix('\n')
                    .unwrap_or(value)
                    .to_string();
                lines.push(match change.tag() {
                    ChangeTag::Equal => HunkLine::Context(text),
                    ChangeTag::Delete => HunkLine::Remove(text),
                    ChangeTag::Insert => HunkLine::Add(text),
                });
            }
        }

        out.push(Hunk {
            old_start: header_start(old_range.start, old_range.len()),
            old_count: old_range.len(),
            new_start: header_start(new_range.start, new_range.len()),
            new_count: new_range.len(),
            lines,
        });
    }

    out
}

/// Render a full preview with `--- a/` and `+++ b/` headers.
pub fn render_unified(label: &str, old: &str, new: &str, context: usize) -> String {
    let mut output = format!("--- a/{label}\n+++ b/{label}\n");
    for hunk in hunks(old, new, context) {
        render_hunk(&mut output, &hunk);
    }
    output
}

fn render_hunk(output: &mut String, hunk: &Hunk) {
    // Hunk header
    output.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
    ));

    // Render lines
    for line in &hunk.lines {
        match line {
            HunkLine::Context(content) => output.push_str(&format!(" {}\n", content)),
            HunkLine::Remove(content) => output.push_str(&format!("-{}\n", content)),
            HunkLine::Add(content) => output.push_str(&format!("+{}\n", content)),
        }
    }
}

/// Changed lines between two texts: each run of adjacent changes counts
/// the larger of its removed and added line counts.
pub fn count_changed_lines(old: &str, new: &str) -> usize {
    let diff = TextDiff::from_lines(old, new);
    let mut total = 0;
    let (mut removed, mut added) = (0usize, 0usize);

    for op in diff.ops() {
        match op {
            DiffOp::Equal { .. } => {
                total += removed.max(added);
                removed = 0;
                added = 0;
            }
            _ => {
                removed += op.old_range().len();
                added += op.new_range().len();
            }
        }
    }

    total + removed.max(added)
}
