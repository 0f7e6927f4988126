//! Tree-sitter front end.
//!
//! Only the raw tree is kept. Callers pull the node kinds they care about
//! with [`CstTree::for_each_of_kind`] instead of copying the whole tree.

use tree_sitter::{Node, Parser, Tree};

/// Failure to produce a CST. The span tracker degrades instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum CstError {
    /// The Python grammar could not be loaded.
    #[error("failed to create CST parser: {0}")]
    ParserCreation(String),
    /// Tree-sitter returned no tree.
    #[error("failed to parse source as Python")]
    ParseFailed,
}

/// A Tree-sitter parse of one source text.
pub struct CstTree {
    tree: Tree,
}

impl CstTree {
    /// Kind of the root node, `module` for any Python input.
    #[must_use]
    pub fn root_kind(&self) -> &'static str {
        self.tree.root_node().kind()
    }

    /// Whether Tree-sitter had to recover from syntax errors.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Calls `visit` for every node of `kind`, in source order.
    pub fn for_each_of_kind<'t>(&'t self, kind: &str, mut visit: impl FnMut(Node<'t>)) {
        let mut cursor = self.tree.walk();
        loop {
            let node = cursor.node();
            if node.kind() == kind {
                visit(node);
            } else if cursor.goto_first_child() {
                continue;
            }
            // Climb until a sibling exists; the root has none.
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }
}

/// Reusable Python parser.
pub struct CstParser {
    parser: Parser,
}

impl CstParser {
    /// Loads the Python grammar.
    ///
    /// # Errors
    /// Returns error if the grammar cannot be loaded
    pub fn new() -> Result<Self, CstError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| CstError::ParserCreation(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Parses `source`. Invalid Python still yields a tree with error nodes.
    ///
    /// # Errors
    /// Returns error if Tree-sitter produces no tree
    pub fn parse(&mut self, source: &str) -> Result<CstTree, CstError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(CstError::ParseFailed)?;
        Ok(CstTree { tree })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tree: &CstTree, kind: &str) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        tree.for_each_of_kind(kind, |node| found.push((node.start_byte(), node.end_byte())));
        found
    }

    #[test]
    fn test_parse_module_root() {
        let mut parser = CstParser::new().unwrap();
        let tree = parser.parse("x = 1  # one\n").unwrap();

        assert_eq!(tree.root_kind(), "module");
        assert!(!tree.has_error());
        assert_eq!(kinds(&tree, "comment"), vec![(7, 12)]);
    }

    #[test]
    fn test_nested_nodes_in_source_order() {
        let source = "# a\ndef f():\n    # b\n    if x:  # c\n        pass\n# d\n";
        let mut parser = CstParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let texts: Vec<&str> = kinds(&tree, "comment")
            .into_iter()
            .map(|(start, end)| &source[start..end])
            .collect();
        assert_eq!(texts, vec!["# a", "# b", "# c", "# d"]);
    }

    #[test]
    fn test_parse_recovers_from_errors() {
        let mut parser = CstParser::new().unwrap();
        let tree = parser.parse("def (:\n").unwrap();
        assert!(tree.has_error());
    }
}
