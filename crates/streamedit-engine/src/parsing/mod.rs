//! Tolerant parser for streamed SEARCH/REPLACE edit instructions.
//!
//! The wire format is a sequence of blocks:
//!
//! ```text
//! SEARCH
//! <text expected verbatim in the document>
//! =======
//! REPLACE
//! <replacement text, up to the next SEARCH line or end of input>
//! ```
//!
//! The parser is stateless: callers hand it the whole text accumulated so far
//! on every chunk and get back every block that can already be recognized.
//! The last block may still be growing, in which case `complete` is false.

pub mod builder;
pub mod classify;
pub mod text;

#[cfg(test)]
mod tests;

use relative_path::RelativePath;

use builder::BlockBuilder;
use classify::classify;
use text::lines_with_spans;

/// One search/replace instruction extracted from the raw stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffBlock {
    /// Verbatim text expected once in the target document. Only reported
    /// once the separator has arrived, so it never changes afterwards.
    pub search_text: String,
    /// Replacement text received so far.
    pub replace_text: String,
    /// Whether the REPLACE line has arrived. A finished stream with a block
    /// still lacking it was cut short.
    pub replace_open: bool,
    /// True once the next block's SEARCH line has been seen.
    pub complete: bool,
}

/// Parse every block currently recognizable in `raw`.
///
/// Malformed or not-yet-recognizable input yields an empty result rather than
/// an error; the next chunk is expected to make progress. `path` only feeds
/// diagnostics.
pub fn parse_diff_blocks(raw: &str, path: &RelativePath) -> Vec<DiffBlock> {
    parse_with(BlockBuilder::new(raw), raw, path)
}

/// Parse `raw` as the whole stream, once no more text will arrive.
///
/// The last line counts as complete even without a line break, so a trailing
/// `SEARCH` closes the block before it instead of landing in its replacement.
pub fn parse_final_diff_blocks(raw: &str, path: &RelativePath) -> Vec<DiffBlock> {
    parse_with(BlockBuilder::at_end(raw), raw, path)
}

fn parse_with(mut builder: BlockBuilder<'_>, raw: &str, path: &RelativePath) -> Vec<DiffBlock> {
    for line in lines_with_spans(raw) {
        let class = classify(line);
        if let Err(reason) = builder.push(&class) {
            log::debug!(
                "diff for {path} not parsable yet ({reason:?} at byte {})",
                line.span.start
            );
            return vec![];
        }
    }

    builder.finish()
}
