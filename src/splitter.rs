//! Cursor sampling and prefix/middle/suffix carving for fill-in-the-middle examples.

use rand::Rng;

use crate::config::SplitConfig;

/// The three contiguous sections carved out of a single source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitParts {
    /// Everything before the sampled cursor.
    pub prefix: String,
    /// The region the model is asked to fill in.
    pub middle: String,
    /// Everything after the consumed middle region.
    pub suffix: String,
}

/// Returns true when the trimmed line starts with a `#` or `//` comment marker.
#[must_use]
pub fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with("//")
}

/// A line qualifies as a cursor anchor when it is neither blank nor a comment.
fn qualifies_as_anchor(line: &str) -> bool {
    !line.trim().is_empty() && !is_comment_line(line)
}

/// Maps a character offset to the corresponding byte offset within `line`.
///
/// Cursor positions are sampled in characters; slicing must happen on byte
/// boundaries to stay safe for non-ASCII source text.
fn byte_offset_at_char(line: &str, char_pos: usize) -> usize {
    line.char_indices()
        .nth(char_pos)
        .map_or(line.len(), |(idx, _)| idx)
}

/// Samples a cursor line and a column within that line.
///
/// The column is drawn uniformly from the first half of the trimmed line and
/// then shifted right by the leading-whitespace width, so the cursor never
/// lands inside indentation.  Returns `None` when no line qualifies.
fn pick_cursor<R: Rng + ?Sized>(lines: &[&str], rng: &mut R) -> Option<(usize, usize)> {
    let anchors: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| qualifies_as_anchor(line))
        .map(|(idx, _)| idx)
        .collect();
    if anchors.is_empty() {
        return None;
    }
    let line_idx = anchors[rng.gen_range(0..anchors.len())];
    let line = lines[line_idx];
    let trimmed_len = line.trim().chars().count();
    let leading = line.chars().count() - line.trim_start().chars().count();
    let column = rng.gen_range(0..=trimmed_len / 2) + leading;
    Some((line_idx, column))
}

/// Carves a file into (prefix, middle, suffix) around a sampled cursor.
///
/// Returns `None` when the text is shorter than the configured minimum prefix
/// length, has no lines, has no qualifying cursor line, or when the carved
/// prefix/suffix fall below their configured minima.  Comment lines that fall
/// inside the middle region are dropped from the middle but still consume
/// their slot, so the region is skipped rather than re-sampled.
pub fn split_example<R: Rng + ?Sized>(
    text: &str,
    cfg: &SplitConfig,
    rng: &mut R,
) -> Option<SplitParts> {
    if text.chars().count() < cfg.min_prefix_length {
        return None;
    }
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return None;
    }

    let (line_idx, column) = pick_cursor(&lines, rng)?;
    let cursor_line = lines[line_idx];
    let cursor_byte = byte_offset_at_char(cursor_line, column);

    let prefix = format!(
        "{}\n{}",
        lines[..line_idx].join("\n"),
        &cursor_line[..cursor_byte]
    );

    let mut middle = format!("{}\n", &cursor_line[cursor_byte..]);
    let remaining = lines.len() - line_idx - 1;
    let additional = remaining.min(rng.gen_range(1..=cfg.max_middle_lines));
    for line in &lines[line_idx + 1..=line_idx + additional] {
        if !is_comment_line(line) {
            middle.push_str(line);
            middle.push('\n');
        }
    }

    let suffix_start = line_idx + additional + 1;
    let suffix = if suffix_start < lines.len() {
        lines[suffix_start..].join("\n")
    } else {
        String::new()
    };

    if prefix.chars().count() >= cfg.min_prefix_length
        && suffix.chars().count() >= cfg.min_suffix_length
    {
        Some(SplitParts {
            prefix,
            middle,
            suffix,
        })
    } else {
        None
    }
}
