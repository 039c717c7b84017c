use std::collections::HashMap;
use std::ops::Range;

use relative_path::{RelativePath, RelativePathBuf};

use crate::buffer::DocumentBuffer;
use crate::editing::ranges_overlap;
use crate::session::{EditSession, OpenError, SessionError, SessionId, SessionState};

/// Owner of every open edit session
///
/// Every mutation takes `&mut self`, so writes against a document are
/// serialized here no matter how many sessions target it.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, EditSession>,
    /// Open sessions per document, in document order
    by_path: HashMap<RelativePathBuf, Vec<SessionId>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session(&self, id: SessionId) -> Option<&EditSession> {
        self.sessions.get(&id)
    }

    /// Track a session, keeping its document's sessions in document order
    ///
    /// Open sessions never overlap and anchors keep their relative order
    /// through edits, so the position chosen here stays correct.
    pub fn register<B: DocumentBuffer + ?Sized>(&mut self, buffer: &B, session: EditSession) {
        let id = session.id();
        let key = session.range(buffer).map(|r| (r.start, r.end));
        let ids = self.by_path.entry(session.path().to_owned()).or_default();
        let position = ids
            .iter()
            .position(|other| {
                let other_key = self
                    .sessions
                    .get(other)
                    .and_then(|s| s.range(buffer))
                    .map(|r| (r.start, r.end));
                other_key > key
            })
            .unwrap_or(ids.len());
        ids.insert(position, id);
        self.sessions.insert(id, session);
    }

    pub fn unregister(&mut self, id: SessionId) -> Option<EditSession> {
        let session = self.sessions.remove(&id)?;
        if let Some(ids) = self.by_path.get_mut(session.path()) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_path.remove(session.path());
            }
        }
        Some(session)
    }

    /// Open sessions of a document, in document order
    pub fn sessions_for(&self, path: &RelativePath) -> Vec<&EditSession> {
        self.by_path
            .get(path)
            .into_iter()
            .flatten()
            .filter_map(|id| self.sessions.get(id))
            .collect()
    }

    /// Whether `range` intersects the live range of any open session
    pub fn find_overlapping<B: DocumentBuffer + ?Sized>(
        &self,
        buffer: &B,
        path: &RelativePath,
        range: &Range<usize>,
    ) -> bool {
        self.sessions_for(path)
            .into_iter()
            .filter_map(|s| s.range(buffer))
            .any(|live| ranges_overlap(&live, range))
    }

    /// Anchor a new session on the first free occurrence of `search_text`
    ///
    /// Occurrences inside another session's region are skipped. When every
    /// occurrence is taken the first one is reported as a conflict.
    pub fn open<B: DocumentBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        path: &RelativePath,
        search_text: &str,
    ) -> Result<SessionId, OpenError> {
        if search_text.is_empty() {
            return Err(OpenError::EmptySearch);
        }

        let content = buffer.read(path)?;
        let candidates = occurrences(&content, search_text);

        let Some(first) = candidates.first() else {
            return Err(OpenError::NotFound {
                path: path.to_owned(),
            });
        };
        if candidates.len() > 1 {
            log::warn!(
                "search text occurs {} times in {path}, using the first free match",
                candidates.len()
            );
        }

        let Some(range) = candidates
            .iter()
            .find(|r| !self.find_overlapping(&*buffer, path, r))
        else {
            log::warn!(
                "match {}..{} in {path} overlaps an open session",
                first.start,
                first.end
            );
            return Err(OpenError::Overlap {
                path: path.to_owned(),
                range: first.clone(),
            });
        };

        let anchor = buffer.create_anchor(path, range.clone())?;
        let session = EditSession::new(path, anchor, search_text);
        let id = session.id();
        log::info!("opened session {id} on {path} at {}..{}", range.start, range.end);
        self.register(buffer, session);
        Ok(id)
    }

    /// Replace the session's region with the text streamed so far
    pub fn apply_stream_content<B: DocumentBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        id: SessionId,
        text: &str,
    ) -> Result<Range<usize>, SessionError> {
        let session = self.session_mut(id)?;
        if !session.state().is_in_progress() {
            return Err(invalid_state(session, "stream"));
        }

        let range = session.write(buffer, text)?;
        session.set_state(SessionState::Streaming);
        log::debug!("session {id} streamed {} bytes", text.len());
        Ok(range)
    }

    /// Write the authoritative replacement and stop streaming
    pub fn apply_final_content<B: DocumentBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        id: SessionId,
        text: &str,
    ) -> Result<Range<usize>, SessionError> {
        let session = self.session_mut(id)?;
        if session.state().is_terminal() {
            return Err(invalid_state(session, "finalize"));
        }

        let range = session.write(buffer, text)?;
        session.set_state(SessionState::Finalized);
        log::info!("finalized session {id} on {}", session.path());
        Ok(range)
    }

    /// Persist the document a finalized session belongs to
    ///
    /// Every finalized session of that document is saved along with it and
    /// returned. On failure nothing changes state and the save can be retried.
    pub fn save_changes<B: DocumentBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        id: SessionId,
        text: &str,
    ) -> Result<Vec<EditSession>, SessionError> {
        let session = self.session_mut(id)?;
        if session.state() != SessionState::Finalized {
            return Err(invalid_state(session, "save"));
        }
        let path = session.path().to_owned();

        let pending = self
            .sessions_for(&path)
            .iter()
            .filter(|s| s.state().is_in_progress())
            .count();
        if pending > 0 {
            return Err(SessionError::PendingSessions { path, pending });
        }

        self.session_mut(id)?.write(buffer, text)?;
        buffer.save(&path)?;

        let finalized: Vec<SessionId> = self
            .sessions_for(&path)
            .iter()
            .filter(|s| s.state() == SessionState::Finalized)
            .map(|s| s.id())
            .collect();
        let mut saved = Vec::with_capacity(finalized.len());
        for id in finalized {
            if let Some(mut session) = self.unregister(id) {
                session.release(buffer);
                saved.push(session);
            }
        }
        log::info!("saved {path} with {} session(s)", saved.len());
        Ok(saved)
    }

    /// Restore a session's region to its pre-open text and forget it
    ///
    /// Returns false if the session is not open.
    pub fn discard<B: DocumentBuffer + ?Sized>(&mut self, buffer: &mut B, id: SessionId) -> bool {
        match self.unregister(id) {
            Some(mut session) => {
                session.rollback(buffer);
                log::warn!("discarded session {id} on {}", session.path());
                true
            }
            None => false,
        }
    }

    /// Discard every open session of a document
    pub fn discard_all<B: DocumentBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        path: &RelativePath,
    ) -> usize {
        let ids = self.by_path.get(path).cloned().unwrap_or_default();
        ids.into_iter().filter(|id| self.discard(buffer, *id)).count()
    }

    /// Live ranges of sessions that are still receiving text
    pub fn streaming_ranges<B: DocumentBuffer + ?Sized>(
        &self,
        buffer: &B,
        path: &RelativePath,
    ) -> Vec<Range<usize>> {
        self.sessions_for(path)
            .into_iter()
            .filter(|s| s.state().is_in_progress())
            .filter_map(|s| s.range(buffer))
            .collect()
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut EditSession, SessionError> {
        self.sessions
            .get_mut(&id)
            .ok_or(SessionError::UnknownSession(id))
    }
}

/// Every occurrence of `needle`, including ones that overlap each other
fn occurrences(haystack: &str, needle: &str) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(offset) = haystack.get(from..).and_then(|rest| rest.find(needle)) {
        let start = from + offset;
        found.push(start..start + needle.len());
        // Resume one character in, so overlapping matches are seen too
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    found
}

fn invalid_state(session: &EditSession, operation: &'static str) -> SessionError {
    SessionError::InvalidState {
        id: session.id(),
        state: session.state(),
        operation,
    }
}
