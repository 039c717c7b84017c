use super::span::Span;

/// A reference to a single line of the raw text with its byte span.
#[derive(Debug, Clone, Copy)]
pub struct LineRef<'a> {
    /// Byte span of this line (includes the line break if present).
    pub span: Span,
    /// The line text including its line break.
    pub text: &'a str,
}

impl<'a> LineRef<'a> {
    /// Whether the line break for this line has arrived yet.
    ///
    /// The last line of a partially streamed text is usually unterminated
    /// and may still grow on the next chunk.
    pub fn is_terminated(&self) -> bool {
        self.text.ends_with('\n')
    }

    /// The line content with surrounding whitespace (and the line break) removed.
    pub fn trimmed(&self) -> &'a str {
        self.text.trim()
    }
}

/// Returns an iterator over lines with their byte spans.
///
/// Line breaks are kept on each line, which is important for accurate span
/// tracking and for telling a finished line from one still streaming in.
pub fn lines_with_spans(text: &str) -> impl Iterator<Item = LineRef<'_>> {
    let mut offset = 0usize;
    text.split_inclusive('\n').map(move |line| {
        let start = offset;
        offset += line.len();
        LineRef {
            span: Span { start, end: offset },
            text: line,
        }
    })
}

/// Strip the single line break (`\n` or `\r\n`) that ends `span`, if any.
///
/// The line break in front of a token line belongs to the token, so content
/// spans are shortened by it before slicing.
pub fn without_trailing_line_break(text: &str, span: Span) -> Span {
    let slice = &text[span.start..span.end];
    let trimmed = slice
        .strip_suffix("\r\n")
        .or_else(|| slice.strip_suffix('\n'))
        .unwrap_or(slice);
    Span {
        start: span.start,
        end: span.start + trimmed.len(),
    }
}
