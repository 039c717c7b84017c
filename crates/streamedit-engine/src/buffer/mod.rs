//! The Document Buffer seam.
//!
//! Edit sessions never own document text. They hold a path and an anchor and
//! perform every read and write through a [`DocumentBuffer`], which keeps
//! anchors valid across all edits applied to a document.

pub mod workspace;

use std::ops::Range;

use relative_path::{RelativePath, RelativePathBuf};

use crate::editing::{AnchorId, EditError};
use crate::io::IoError;

pub use workspace::Workspace;

#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: RelativePathBuf,
        #[source]
        source: IoError,
    },
    #[error("document {0} is not open")]
    NotOpen(RelativePathBuf),
    #[error("edit rejected for {path}: {source}")]
    Edit {
        path: RelativePathBuf,
        #[source]
        source: EditError,
    },
}

/// Text storage for the documents an edit task touches
pub trait DocumentBuffer {
    /// Current text of the document, loading it on first access
    fn read(&mut self, path: &RelativePath) -> Result<String, BufferError>;

    /// Replace a byte range and return where the new text now lives
    fn replace_range(
        &mut self,
        path: &RelativePath,
        range: Range<usize>,
        text: &str,
    ) -> Result<Range<usize>, BufferError>;

    /// Persist the document
    fn save(&mut self, path: &RelativePath) -> Result<(), BufferError>;

    /// Start tracking a range that follows subsequent edits
    fn create_anchor(
        &mut self,
        path: &RelativePath,
        range: Range<usize>,
    ) -> Result<AnchorId, BufferError>;

    fn anchor_range(&self, path: &RelativePath, anchor: AnchorId) -> Option<Range<usize>>;

    /// Replace exactly what `anchor` covers and rebind it to the new text
    fn replace_anchored(
        &mut self,
        path: &RelativePath,
        anchor: AnchorId,
        text: &str,
    ) -> Result<Range<usize>, BufferError>;

    fn remove_anchor(&mut self, path: &RelativePath, anchor: AnchorId) -> bool;
}
