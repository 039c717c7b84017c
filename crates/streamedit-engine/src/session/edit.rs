use std::ops::Range;

use relative_path::{RelativePath, RelativePathBuf};

use crate::buffer::{BufferError, DocumentBuffer};
use crate::editing::{AnchorId, EditError};
use crate::session::{SessionId, SessionState};

/// One search/replace instruction bound to a live document region
///
/// The session never caches offsets. Its region is an anchor held by the
/// document, which always bounds exactly the text the session wrote last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    id: SessionId,
    path: RelativePathBuf,
    anchor: AnchorId,
    /// Region text before the session touched it, restored on discard
    search_text: String,
    streamed_text: String,
    state: SessionState,
}

impl EditSession {
    pub(crate) fn new(path: &RelativePath, anchor: AnchorId, search_text: &str) -> Self {
        Self {
            id: SessionId::generate(),
            path: path.to_owned(),
            anchor,
            search_text: search_text.to_string(),
            streamed_text: search_text.to_string(),
            state: SessionState::Matched,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn path(&self) -> &RelativePath {
        &self.path
    }

    pub fn anchor(&self) -> AnchorId {
        self.anchor
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Text currently written into the owned region
    pub fn streamed_text(&self) -> &str {
        &self.streamed_text
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Live range of the owned region
    pub fn range<B: DocumentBuffer + ?Sized>(&self, buffer: &B) -> Option<Range<usize>> {
        buffer.anchor_range(&self.path, self.anchor)
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    /// Rewrite the owned region with `text`
    ///
    /// Writing the text already in place leaves the document untouched.
    pub(crate) fn write<B: DocumentBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        text: &str,
    ) -> Result<Range<usize>, BufferError> {
        if text == self.streamed_text {
            return self.range(buffer).ok_or_else(|| BufferError::Edit {
                path: self.path.clone(),
                source: EditError::UnknownAnchor(self.anchor),
            });
        }

        let inserted = buffer.replace_anchored(&self.path, self.anchor, text)?;
        self.streamed_text = text.to_string();
        Ok(inserted)
    }

    /// Put the pre-open text back and release the anchor
    pub(crate) fn rollback<B: DocumentBuffer + ?Sized>(&mut self, buffer: &mut B) {
        if self.streamed_text != self.search_text {
            match buffer.replace_anchored(&self.path, self.anchor, &self.search_text) {
                Ok(_) => self.streamed_text = self.search_text.clone(),
                Err(e) => log::warn!("rollback of session {} in {} failed: {e}", self.id, self.path),
            }
        }
        buffer.remove_anchor(&self.path, self.anchor);
        self.state = SessionState::Discarded;
    }

    /// Release the anchor after the document was persisted
    pub(crate) fn release<B: DocumentBuffer + ?Sized>(&mut self, buffer: &mut B) {
        buffer.remove_anchor(&self.path, self.anchor);
        self.state = SessionState::Saved;
    }
}
