//! Text and path helpers.

mod paths;

pub use paths::{collect_python_files, is_excluded, normalize_display_path};

use ruff_text_size::TextSize;

/// A utility struct to convert byte offsets to line numbers.
///
/// This is necessary because the AST parser works with byte offsets,
/// but splicing whole statements and reporting diagnostics both work in lines.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Stores the byte index of the start of each line.
    line_starts: Vec<usize>,
    /// Total length of the indexed text.
    len: usize,
}

impl LineIndex {
    /// Creates a new `LineIndex` by scanning the source code for newlines.
    /// `\n`, `\r\n` and a lone `\r` each end a line, as they do for the parser.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut line_starts = vec![0];
        for (i, byte) in bytes.iter().enumerate() {
            let ends_line = match byte {
                b'\n' => true,
                b'\r' => bytes.get(i + 1) != Some(&b'\n'),
                _ => false,
            };
            if ends_line {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Converts a `TextSize` (byte offset) to a 1-indexed line number.
    #[must_use]
    pub fn line_index(&self, offset: TextSize) -> usize {
        let offset = offset.to_usize();
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }

    /// 1-indexed byte column of `offset` within its line.
    #[must_use]
    pub fn column(&self, offset: TextSize) -> usize {
        offset.to_usize() - self.line_start(offset) + 1
    }

    /// Byte offset of the first character on the line containing `offset`.
    #[must_use]
    pub fn line_start(&self, offset: TextSize) -> usize {
        self.line_starts[self.line_index(offset) - 1]
    }

    /// Byte offset just past the line containing `offset`, including its
    /// newline. Equals the text length on the last line.
    #[must_use]
    pub fn next_line_start(&self, offset: TextSize) -> usize {
        self.line_starts
            .get(self.line_index(offset))
            .copied()
            .unwrap_or(self.len)
    }

    /// Number of lines in the text.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Offset of the end of the physical line containing `offset`, excluding the
/// line terminator.
#[must_use]
pub fn line_end(source: &str, offset: usize) -> usize {
    source[offset..]
        .find(['\n', '\r'])
        .map_or(source.len(), |pos| offset + pos)
}

/// Leading whitespace of the line that contains `offset`.
#[must_use]
pub fn indentation_at(source: &str, offset: usize) -> &str {
    let line_start = source[..offset].rfind(['\n', '\r']).map_or(0, |pos| pos + 1);
    let line = &source[line_start..];
    let width = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..width]
}

/// Whether everything between the start of the line and `offset` is
/// whitespace.
#[must_use]
pub fn starts_line(source: &str, offset: usize) -> bool {
    let line_start = source[..offset].rfind(['\n', '\r']).map_or(0, |pos| pos + 1);
    source[line_start..offset]
        .chars()
        .all(|c| c == ' ' || c == '\t')
}
