//! The module-wide position table (spec §3.1 Module: "file-position table
//! shared across all files in the module for stable absolute source
//! offsets").

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A half-open byte-offset range into a single file, plus the derived
/// line/column pair for each end (1-based lines, 0-based columns — the
/// source-language convention the teacher's own `SymbolInfo::line`/`col`
/// fields use).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceRange {
    /// Byte offset of the first character, inclusive.
    pub start_offset: usize,
    /// Byte offset one past the last character.
    pub end_offset: usize,
    /// 1-based start line.
    pub start_line: usize,
    /// 0-based start column.
    pub start_col: usize,
    /// 1-based end line.
    pub end_line: usize,
    /// 0-based end column.
    pub end_col: usize,
}

/// Per-file line-start offsets, used to turn a byte offset into line/column
/// without re-scanning the source on every query.
#[derive(Debug, Clone, Default)]
struct LineIndex {
    /// Byte offset where each line begins; `line_starts[0] == 0`.
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn build(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-based line, 0-based column for `offset`.
    fn line_col(&self, offset: usize) -> (usize, usize) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let col = offset - self.line_starts[line_idx];
        (line_idx + 1, col)
    }
}

/// Maps absolute byte offsets to (line, column) for every file in a Module.
#[derive(Debug, Clone, Default)]
pub struct PositionTable {
    files: HashMap<PathBuf, LineIndex>,
}

impl PositionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a file's source text for position lookups.
    pub fn register_file(&mut self, path: impl Into<PathBuf>, source: &str) {
        self.files.insert(path.into(), LineIndex::build(source));
    }

    /// Drop a file's entry (e.g. on incremental removal).
    pub fn remove_file(&mut self, path: &Path) {
        self.files.remove(path);
    }

    /// Build a [`SourceRange`] for `[start_offset, end_offset)` in `path`.
    /// Returns `None` if the file was never registered.
    pub fn range(&self, path: &Path, start_offset: usize, end_offset: usize) -> Option<SourceRange> {
        let idx = self.files.get(path)?;
        let (start_line, start_col) = idx.line_col(start_offset);
        let (end_line, end_col) = idx.line_col(end_offset);
        Some(SourceRange {
            start_offset,
            end_offset,
            start_line,
            start_col,
            end_line,
            end_col,
        })
    }

    /// 1-based line number for `offset` within `path`.
    pub fn line_start(&self, path: &Path, offset: usize) -> Option<usize> {
        self.files.get(path).map(|idx| idx.line_col(offset).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_tracks_newlines() {
        let mut table = PositionTable::new();
        let src = "line one\nline two\nline three";
        table.register_file("f.go", src);
        let range = table.range(Path::new("f.go"), 9, 17).unwrap();
        assert_eq!(range.start_line, 2);
        assert_eq!(range.start_col, 0);
        assert_eq!(range.end_line, 2);
        assert_eq!(range.end_col, 8);
    }

    #[test]
    fn unregistered_file_returns_none() {
        let table = PositionTable::new();
        assert!(table.range(Path::new("missing.go"), 0, 1).is_none());
    }
}
