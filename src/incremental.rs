//! Incremental reparsing.
//!
//! An edit between two versions of a file is described as a single replaced
//! span (common prefix / common suffix). Applying that span to the cached
//! tree lets tree-sitter reuse unchanged subtrees; output is always
//! equivalent to a full reparse of the new text, and any cache mismatch
//! silently falls back to a cold parse.

use tree_sitter::{InputEdit, Point};

use crate::cache::{content_hash, TreeCache};
use crate::lang::Adapter;
use crate::types::ParseResult;

/// A replaced byte span between two versions of a file, with the row/column
/// coordinates tree-sitter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_position: Point,
    pub old_end_position: Point,
    pub new_end_position: Point,
}

impl Edit {
    pub fn to_input_edit(&self) -> InputEdit {
        InputEdit {
            start_byte: self.start_byte,
            old_end_byte: self.old_end_byte,
            new_end_byte: self.new_end_byte,
            start_position: self.start_position,
            old_end_position: self.old_end_position,
            new_end_position: self.new_end_position,
        }
    }
}

/// Row/column of a byte offset. `offset` must lie on a char boundary.
fn position_at(text: &str, offset: usize) -> Point {
    let prefix = &text.as_bytes()[..offset];
    let row = prefix.iter().filter(|&&b| b == b'\n').count();
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    Point {
        row,
        column: offset - line_start,
    }
}

/// Compute the single replaced span between two texts, or `None` when they
/// are identical. The span is the smallest one outside the common prefix
/// and suffix, widened as needed to land on char boundaries.
pub fn calculate_edit(old: &str, new: &str) -> Option<Edit> {
    if old == new {
        return None;
    }
    let old_bytes = old.as_bytes();
    let new_bytes = new.as_bytes();

    let mut prefix = old_bytes
        .iter()
        .zip(new_bytes)
        .take_while(|(a, b)| a == b)
        .count();
    while prefix > 0 && !old.is_char_boundary(prefix) {
        prefix -= 1;
    }

    let max_suffix = old_bytes.len().min(new_bytes.len()) - prefix;
    let mut suffix = 0;
    while suffix < max_suffix
        && old_bytes[old_bytes.len() - 1 - suffix] == new_bytes[new_bytes.len() - 1 - suffix]
    {
        suffix += 1;
    }
    while suffix > 0
        && (!old.is_char_boundary(old.len() - suffix) || !new.is_char_boundary(new.len() - suffix))
    {
        suffix -= 1;
    }

    let old_end = old.len() - suffix;
    let new_end = new.len() - suffix;
    Some(Edit {
        start_byte: prefix,
        old_end_byte: old_end,
        new_end_byte: new_end,
        start_position: position_at(old, prefix),
        old_end_position: position_at(old, old_end),
        new_end_position: position_at(new, new_end),
    })
}

/// Collapse edits that all describe the same old-text -> new-text transition
/// into one covering span. Inputs must be baseline-relative (computed against
/// the same pair of texts), not sequential.
pub fn batch_edits(edits: &[Edit]) -> Option<Edit> {
    let mut iter = edits.iter();
    let first = iter.next()?;
    let mut merged = first.clone();
    for edit in iter {
        if edit.start_byte < merged.start_byte {
            merged.start_byte = edit.start_byte;
            merged.start_position = edit.start_position;
        }
        if edit.old_end_byte > merged.old_end_byte {
            merged.old_end_byte = edit.old_end_byte;
            merged.old_end_position = edit.old_end_position;
        }
        if edit.new_end_byte > merged.new_end_byte {
            merged.new_end_byte = edit.new_end_byte;
            merged.new_end_position = edit.new_end_position;
        }
    }
    Some(merged)
}

/// Reparse one file after an edit, reusing the cached tree when it matches
/// the old content. Always leaves the cache describing `new_text` (or empty
/// for the path when parsing failed outright).
pub fn reparse(
    adapter: &dyn Adapter,
    cache: &mut TreeCache,
    path: &str,
    old_text: &str,
    new_text: &str,
) -> ParseResult {
    let language = adapter.language();
    let new_hash = content_hash(new_text);

    let warm = {
        let old_hash = content_hash(old_text);
        cache.get(path, &old_hash, language).cloned()
    };

    let previous = match (warm, calculate_edit(old_text, new_text)) {
        (Some(mut tree), Some(edit)) => {
            tree.edit(&edit.to_input_edit());
            Some(tree)
        }
        // Identical content; the tree already describes it.
        (Some(tree), None) => Some(tree),
        (None, _) => {
            tracing::debug!(path, "no reusable tree, cold parse");
            None
        }
    };

    let (result, new_tree) = adapter.parse_incremental(new_text, path, previous.as_ref());
    match new_tree {
        Some(tree) => cache.set(path.to_string(), tree, new_hash, language),
        None => {
            cache.remove(path);
        }
    }
    result
}
