//! Edit sessions bind a parsed block to a live region of a document.
//!
//! A session is opened once its search text is found, rewrites its region on
//! every streamed update, is finalized with the authoritative replacement and
//! is then either saved or discarded. The [`SessionRegistry`] owns every
//! session and is the single place where writes to a document are
//! serialized.

pub mod edit;
pub mod registry;

use std::fmt;
use std::ops::Range;

use relative_path::RelativePathBuf;
use uuid::Uuid;

use crate::buffer::BufferError;

pub use edit::EditSession;
pub use registry::SessionRegistry;

/// Unique identifier for an edit session, fresh for every `open`
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SessionId(Uuid);

impl SessionId {
    pub(crate) fn generate() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Matched,
    Streaming,
    Finalized,
    Saved,
    Discarded,
}

impl SessionState {
    /// Still receiving text; saving now would persist a partial edit
    pub fn is_in_progress(self) -> bool {
        matches!(self, SessionState::Matched | SessionState::Streaming)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Saved | SessionState::Discarded)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("search text not found in {path}")]
    NotFound { path: RelativePathBuf },
    #[error("match {}..{} in {path} overlaps an open session", .range.start, .range.end)]
    Overlap {
        path: RelativePathBuf,
        range: Range<usize>,
    },
    #[error("empty search text cannot anchor an edit")]
    EmptySearch,
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
    #[error("session {id} cannot {operation} while {state:?}")]
    InvalidState {
        id: SessionId,
        state: SessionState,
        operation: &'static str,
    },
    #[error("{path} still has {pending} session(s) streaming")]
    PendingSessions { path: RelativePathBuf, pending: usize },
    #[error(transparent)]
    Buffer(#[from] BufferError),
}
