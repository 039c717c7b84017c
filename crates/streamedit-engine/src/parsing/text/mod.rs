pub mod lines;
pub mod span;

pub use lines::{LineRef, lines_with_spans, without_trailing_line_break};
pub use span::Span;
