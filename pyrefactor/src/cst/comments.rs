//! Comment extraction from Python source using CST.
//!
//! Tree-sitter captures comments as explicit nodes, making extraction reliable.

use super::parser::CstTree;

/// A comment extracted from source code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Start byte offset (the `#`)
    pub start_byte: usize,
    /// End byte offset, before the line terminator
    pub end_byte: usize,
    /// Line number (1-indexed for consistency with Ruff)
    pub line: usize,
    /// Byte column of the `#`
    pub column: usize,
    /// Whether this comment is inline (after code on same line)
    pub is_inline: bool,
}

impl Comment {
    /// Comment text including the `#` prefix.
    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start_byte..self.end_byte]
    }

    /// Check if this comment ends before `byte_pos` with only whitespace
    /// between them
    #[must_use]
    pub fn is_attached_before(&self, byte_pos: usize, source: &str) -> bool {
        if self.end_byte > byte_pos {
            return false;
        }
        source[self.end_byte..byte_pos]
            .chars()
            .all(char::is_whitespace)
    }
}

/// Extract all comments from a CST tree, in source order
#[must_use]
pub fn extract_comments(tree: &CstTree, source: &str) -> Vec<Comment> {
    let mut comments = Vec::new();
    tree.for_each_of_kind("comment", |node| {
        let start_byte = node.start_byte();
        let line_start = source[..start_byte].rfind('\n').map_or(0, |pos| pos + 1);
        let is_inline = source[line_start..start_byte]
            .chars()
            .any(|c| !c.is_whitespace());
        // Tree-sitter keeps the `\r` of a CRLF terminator inside the comment.
        let end_byte = node.end_byte() - usize::from(source[..node.end_byte()].ends_with('\r'));

        comments.push(Comment {
            start_byte,
            end_byte,
            line: node.start_position().row + 1,
            column: node.start_position().column,
            is_inline,
        });
    });
    comments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parser::CstParser;

    #[test]
    fn test_extract_comments() {
        let source = r"# Module comment
def foo():  # inline comment
    # body comment
    pass
# After function
";
        let mut parser = CstParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let comments = extract_comments(&tree, source);

        assert_eq!(comments.len(), 4);
        assert_eq!(comments[0].text(source), "# Module comment");
        assert!(!comments[0].is_inline);
        assert_eq!(comments[0].line, 1);

        assert_eq!(comments[1].text(source), "# inline comment");
        assert!(comments[1].is_inline);

        assert_eq!(comments[2].text(source), "# body comment");
        assert!(!comments[2].is_inline);
        assert_eq!(comments[2].column, 4);
    }

    #[test]
    fn test_attached_before() {
        let source = "# lead\n\nx = 1\ny = 2\n";
        let mut parser = CstParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let comments = extract_comments(&tree, source);

        let x = source.find('x').unwrap();
        let y = source.find('y').unwrap();
        assert!(comments[0].is_attached_before(x, source));
        assert!(!comments[0].is_attached_before(y, source));
    }

    #[test]
    fn test_crlf_comment_excludes_carriage_return() {
        let source = "x = 1  # note\r\ny = 2\r\n";
        let mut parser = CstParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let comments = extract_comments(&tree, source);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text(source), "# note");
    }
}
