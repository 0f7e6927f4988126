//! Span tracking: node ranges plus the comments attached to statements.
//!
//! The parser gives every node its exact byte range. Comments are not part of
//! the AST, so statements additionally pick up the block of standalone
//! comments directly above them and an inline comment on their last line.

use crate::cst::{extract_comments, Comment, CstParser};
use crate::syntax::{NodeRef, SyntaxTree};
use crate::utils::LineIndex;
use crate::walker::for_each_node;
use ruff_text_size::{Ranged, TextRange, TextSize};

/// Source ranges belonging to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Exact range of the node itself.
    pub node: TextRange,
    /// Standalone comment block attached above a statement, from the first
    /// `#` to the end of the last comment.
    pub leading: Option<TextRange>,
    /// Inline comment on the statement's last line.
    pub trailing: Option<TextRange>,
}

impl Span {
    /// Leading trivia through the end of the node.
    #[must_use]
    pub fn full(&self) -> TextRange {
        match self.leading {
            Some(leading) => TextRange::new(leading.start(), self.node.end()),
            None => self.node,
        }
    }
}

/// Maps nodes of one text version to their spans.
pub struct SpanTracker<'s> {
    source: &'s str,
    comments: Vec<Comment>,
    lines: LineIndex,
}

impl<'s> SpanTracker<'s> {
    /// Locates comments in `source`.
    ///
    /// If the CST parser is unavailable the tracker still works but reports
    /// bare node ranges.
    #[must_use]
    pub fn new(source: &'s str) -> Self {
        let comments = match CstParser::new().and_then(|mut parser| parser.parse(source)) {
            Ok(tree) => extract_comments(&tree, source),
            Err(err) => {
                tracing::warn!("comment tracking disabled: {err}");
                Vec::new()
            }
        };
        Self {
            source,
            comments,
            lines: LineIndex::new(source),
        }
    }

    /// Span of `node`.
    #[must_use]
    pub fn span(&self, node: NodeRef<'_>) -> Span {
        let range = node.range();
        if !node.is_stmt() {
            return Span {
                node: range,
                leading: None,
                trailing: None,
            };
        }
        Span {
            node: range,
            leading: self.leading_comments(range.start()),
            trailing: self.trailing_comment(range.end()),
        }
    }

    /// Spans for every node of `tree`, in pre-order.
    #[must_use]
    pub fn annotate<'a>(&self, tree: &'a SyntaxTree) -> Vec<(NodeRef<'a>, Span)> {
        let mut spans = Vec::new();
        for_each_node(tree.body(), |node, _| spans.push((node, self.span(node))));
        spans
    }

    fn leading_comments(&self, start: TextSize) -> Option<TextRange> {
        let offset = start.to_usize();
        let column = self.lines.column(start) - 1;
        let before = self.comments.partition_point(|c| c.start_byte < offset);

        let mut first: Option<&Comment> = None;
        let mut anchor = offset;
        for comment in self.comments[..before].iter().rev() {
            if comment.is_inline
                || comment.column != column
                || !comment.is_attached_before(anchor, self.source)
            {
                break;
            }
            anchor = comment.start_byte;
            first = Some(comment);
        }

        let first = first?;
        let last = &self.comments[before - 1];
        Some(TextRange::new(
            offset_to_size(first.start_byte),
            offset_to_size(last.end_byte),
        ))
    }

    fn trailing_comment(&self, end: TextSize) -> Option<TextRange> {
        let offset = end.to_usize();
        let line = self.lines.line_index(end);
        let after = self.comments.partition_point(|c| c.start_byte < offset);
        self.comments
            .get(after)
            .filter(|c| c.is_inline && c.line == line)
            .map(|c| TextRange::new(offset_to_size(c.start_byte), offset_to_size(c.end_byte)))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn offset_to_size(offset: usize) -> TextSize {
    TextSize::new(offset as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement_spans(source: &str) -> Vec<Span> {
        let tree = SyntaxTree::parse(source).unwrap();
        let tracker = SpanTracker::new(source);
        tracker
            .annotate(&tree)
            .into_iter()
            .filter(|(node, _)| node.is_stmt())
            .map(|(_, span)| span)
            .collect()
    }

    #[test]
    fn test_leading_block_is_attached() {
        let source = "x = 1\n# first\n# second\n\ny = 2  # why\n";
        let spans = statement_spans(source);
        assert_eq!(spans[0].leading, None);
        assert_eq!(
            &source[spans[1].full()],
            "# first\n# second\n\ny = 2"
        );
        assert_eq!(&source[spans[1].trailing.unwrap()], "# why");
    }

    #[test]
    fn test_comment_at_other_indentation_is_not_attached() {
        let source = "if a:\n    b = 1\n    # about b\nc = 2\n";
        let spans = statement_spans(source);
        // if, b, c
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2].leading, None);
    }

    #[test]
    fn test_code_between_breaks_attachment() {
        let source = "# header\nimport os\nx = 1\n";
        let spans = statement_spans(source);
        assert!(spans[0].leading.is_some());
        assert_eq!(spans[1].leading, None);
    }

    #[test]
    fn test_expression_spans_are_bare() {
        let source = "# c\nf(x)  # t\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let tracker = SpanTracker::new(source);
        let spans = tracker.annotate(&tree);
        let (node, span) = spans[1];
        assert!(!node.is_stmt());
        assert_eq!(span.full(), node.range());
        assert_eq!(span.trailing, None);
    }
}
