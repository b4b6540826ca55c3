//! FileParser: tree-sitter + ropey::Rope for incremental PHP parsing.

use ropey::Rope;
use tree_sitter::{InputEdit, Parser, Point, Tree};

/// Parsing state for a single open PHP file.
pub struct FileParser {
    parser: Parser,
    tree: Option<Tree>,
    rope: Rope,
}

impl FileParser {
    /// Create a parser configured with the tree-sitter PHP grammar.
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .expect("Failed to set tree-sitter PHP language");

        FileParser {
            parser,
            tree: None,
            rope: Rope::new(),
        }
    }

    /// Parse the full document (didOpen, or full-content didChange).
    pub fn parse_full(&mut self, source: &str) {
        self.rope = Rope::from_str(source);
        self.tree = self.parser.parse(source.as_bytes(), None);
    }

    /// Apply one LSP didChange edit and reparse incrementally.
    ///
    /// The range is (start_line, start_char, end_line, end_char) in 0-based
    /// LSP coordinates; `new_text` replaces it.
    pub fn apply_edit(
        &mut self,
        start_line: u32,
        start_char: u32,
        end_line: u32,
        end_char: u32,
        new_text: &str,
    ) {
        let start = self.clamp_position(start_line as usize, start_char as usize);
        let old_end = self.clamp_position(end_line as usize, end_char as usize);

        let start_byte = self.point_to_byte(start);
        let old_end_byte = self.point_to_byte(old_end);

        let start_idx = self.rope.byte_to_char(start_byte);
        let old_end_idx = self.rope.byte_to_char(old_end_byte);
        self.rope.remove(start_idx..old_end_idx);
        self.rope.insert(start_idx, new_text);

        let new_end_byte = start_byte + new_text.len();
        let new_end = self.byte_to_point(new_end_byte);

        if let Some(tree) = &mut self.tree {
            tree.edit(&InputEdit {
                start_byte,
                old_end_byte,
                new_end_byte,
                start_position: start,
                old_end_position: old_end,
                new_end_position: new_end,
            });
        }

        let source = self.rope.to_string();
        self.tree = self.parser.parse(source.as_bytes(), self.tree.as_ref());
    }

    /// The current tree, if the last parse succeeded.
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// The current document text.
    pub fn source(&self) -> String {
        self.rope.to_string()
    }

    /// Clamp an LSP position to a valid point in the rope. The character
    /// offset counts UTF-16 code units and is converted to the byte column
    /// tree-sitter points use.
    fn clamp_position(&self, line: usize, character: usize) -> Point {
        if line >= self.rope.len_lines() {
            return self.byte_to_point(self.rope.len_bytes());
        }
        let mut units = 0usize;
        let mut byte_col = 0usize;
        for ch in self.rope.line(line).chars() {
            if units >= character || ch == '\n' || ch == '\r' {
                break;
            }
            units += ch.len_utf16();
            byte_col += ch.len_utf8();
        }
        Point::new(line, byte_col)
    }

    fn point_to_byte(&self, point: Point) -> usize {
        self.rope.line_to_byte(point.row) + point.column
    }

    fn byte_to_point(&self, byte: usize) -> Point {
        let byte = byte.min(self.rope.len_bytes());
        let row = self.rope.byte_to_line(byte);
        Point::new(row, byte - self.rope.line_to_byte(row))
    }
}

impl Default for FileParser {
    fn default() -> Self {
        Self::new()
    }
}
