//! Drives edit sessions from a stream of raw diff text.
//!
//! Every chunk is appended to the text received so far, the whole text is
//! re-parsed and each recognized block is opened, streamed into the document
//! and finalized through the [`SessionRegistry`]. An edit task either saves
//! every block or leaves the document exactly as it found it.

use std::future::Future;

use futures::{FutureExt, Stream, StreamExt};
use relative_path::{RelativePath, RelativePathBuf};

use crate::buffer::{BufferError, DocumentBuffer};
use crate::parsing::{DiffBlock, parse_diff_blocks, parse_final_diff_blocks};
use crate::session::{OpenError, SessionError, SessionId, SessionRegistry, SessionState};

/// How blocks of one stream are advanced relative to each other
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BlockPolicy {
    /// Only the first unfinished block receives text; later blocks wait
    #[default]
    Sequential,
    /// Every block is opened and streamed as soon as it matches
    Concurrent,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("search text of block {index} not found in {path}")]
    SearchNotFound { path: RelativePathBuf, index: usize },
    #[error("block {index} overlaps another edit in {path}")]
    Conflict { path: RelativePathBuf, index: usize },
    #[error("stream for {path} ended inside block {index} before its REPLACE line")]
    Truncated { path: RelativePathBuf, index: usize },
    #[error("no edit blocks found for {path}")]
    NoBlocks { path: RelativePathBuf },
    #[error("edit of {path} was cancelled")]
    Cancelled { path: RelativePathBuf },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Summary of a saved edit task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub path: RelativePathBuf,
    pub blocks: usize,
    pub saved: Vec<SessionId>,
    pub chunks: usize,
}

/// One edit task against one document
///
/// Dropping a driver that was neither finished nor aborted discards every
/// session it opened, so cancelling the task that owns it restores the
/// document.
pub struct StreamDriver<'a, B: DocumentBuffer + ?Sized> {
    registry: &'a mut SessionRegistry,
    buffer: &'a mut B,
    path: RelativePathBuf,
    policy: BlockPolicy,
    raw: String,
    /// Session opened for each block, by block index
    sessions: Vec<Option<SessionId>>,
    chunks: usize,
    settled: bool,
}

impl<'a, B: DocumentBuffer + ?Sized> StreamDriver<'a, B> {
    pub fn new(
        registry: &'a mut SessionRegistry,
        buffer: &'a mut B,
        path: impl Into<RelativePathBuf>,
        policy: BlockPolicy,
    ) -> Self {
        Self {
            registry,
            buffer,
            path: path.into(),
            policy,
            raw: String::new(),
            sessions: Vec::new(),
            chunks: 0,
            settled: false,
        }
    }

    pub fn path(&self) -> &RelativePath {
        &self.path
    }

    pub fn buffer(&self) -> &B {
        &*self.buffer
    }

    pub fn registry(&self) -> &SessionRegistry {
        &*self.registry
    }

    /// Raw diff text received so far
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn chunks_received(&self) -> usize {
        self.chunks
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions.iter().flatten().count()
    }

    /// Live ranges of blocks still being written
    pub fn streaming_ranges(&self) -> Vec<std::ops::Range<usize>> {
        self.registry.streaming_ranges(&*self.buffer, &self.path)
    }

    /// Feed the next piece of raw diff text
    ///
    /// Blocks that cannot be matched yet stay pending and are retried on the
    /// next chunk.
    pub fn push_chunk(&mut self, chunk: &str) -> Result<(), DriverError> {
        self.raw.push_str(chunk);
        self.chunks += 1;

        let blocks = parse_diff_blocks(&self.raw, &self.path);
        log::debug!(
            "chunk {} for {} ({} bytes total): {} block(s)",
            self.chunks,
            self.path,
            self.raw.len(),
            blocks.len()
        );
        self.advance(&blocks, false)
    }

    /// Finalize every block and save the document
    ///
    /// A block that never matched, or whose REPLACE line never arrived, fails
    /// the whole task and restores the document. If only the save fails, the
    /// sessions stay finalized in the registry so the caller can retry or
    /// discard them.
    pub fn finish(mut self) -> Result<EditOutcome, DriverError> {
        let blocks = parse_final_diff_blocks(&self.raw, &self.path);
        let Some(last) = blocks.last() else {
            self.discard_open();
            return Err(DriverError::NoBlocks {
                path: self.path.clone(),
            });
        };
        if let Some(index) = blocks.iter().position(|b| !b.replace_open) {
            self.discard_open();
            return Err(DriverError::Truncated {
                path: self.path.clone(),
                index,
            });
        }

        if let Err(e) = self.advance(&blocks, true) {
            self.discard_open();
            return Err(e);
        }

        let Some(id) = self.sessions.get(blocks.len() - 1).copied().flatten() else {
            self.discard_open();
            return Err(DriverError::SearchNotFound {
                path: self.path.clone(),
                index: blocks.len() - 1,
            });
        };

        self.settled = true;
        let saved = self.registry.save_changes(self.buffer, id, &last.replace_text)?;
        log::info!(
            "applied {} block(s) to {} from {} chunk(s)",
            blocks.len(),
            self.path,
            self.chunks
        );
        Ok(EditOutcome {
            path: self.path.clone(),
            blocks: blocks.len(),
            saved: saved.iter().map(|s| s.id()).collect(),
            chunks: self.chunks,
        })
    }

    /// Discard every session of the task. Returns how many were open.
    ///
    /// Sessions on the same document that this driver did not open are left
    /// alone.
    pub fn abort(mut self) -> usize {
        self.discard_open()
    }

    fn discard_open(&mut self) -> usize {
        self.settled = true;
        let mut discarded = 0;
        for id in self.sessions.iter().flatten() {
            if self.registry.discard(self.buffer, *id) {
                discarded += 1;
            }
        }
        if discarded > 0 {
            log::warn!("rolled back {discarded} session(s) on {}", self.path);
        }
        discarded
    }

    fn advance(&mut self, blocks: &[DiffBlock], at_end: bool) -> Result<(), DriverError> {
        if self.sessions.len() < blocks.len() {
            self.sessions.resize(blocks.len(), None);
        }

        for (index, block) in blocks.iter().enumerate() {
            let finished = at_end || block.complete;

            let id = match self.sessions[index] {
                Some(id) => id,
                None if !finished && block.replace_text.is_empty() => break,
                None => match self.open(index, block, at_end)? {
                    Some(id) => id,
                    None if self.policy == BlockPolicy::Sequential => break,
                    None => continue,
                },
            };

            if finished {
                let state = self.registry.session(id).map(|s| s.state());
                if state != Some(SessionState::Finalized) {
                    self.registry
                        .apply_final_content(self.buffer, id, &block.replace_text)?;
                }
            } else {
                self.registry
                    .apply_stream_content(self.buffer, id, &block.replace_text)?;
                if self.policy == BlockPolicy::Sequential {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Try to open a session for a block. `None` means retry later.
    fn open(
        &mut self,
        index: usize,
        block: &DiffBlock,
        at_end: bool,
    ) -> Result<Option<SessionId>, DriverError> {
        match self
            .registry
            .open(self.buffer, &self.path, &block.search_text)
        {
            Ok(id) => {
                self.sessions[index] = Some(id);
                Ok(Some(id))
            }
            Err(OpenError::Buffer(e)) => Err(e.into()),
            Err(OpenError::Overlap { .. }) if at_end => Err(DriverError::Conflict {
                path: self.path.clone(),
                index,
            }),
            Err(OpenError::NotFound { .. } | OpenError::EmptySearch) if at_end => {
                Err(DriverError::SearchNotFound {
                    path: self.path.clone(),
                    index,
                })
            }
            Err(e) => {
                log::debug!("block {index} for {} pending: {e}", self.path);
                Ok(None)
            }
        }
    }
}

impl<B: DocumentBuffer + ?Sized> Drop for StreamDriver<'_, B> {
    fn drop(&mut self) {
        if !self.settled {
            self.discard_open();
        }
    }
}

/// Drive `driver` with `chunks` until the stream ends or `cancel` resolves
///
/// `on_progress` runs after every chunk. Errors while streaming abort the
/// task, as does cancellation, leaving the document as it was.
pub async fn run_stream<B, S, C, F>(
    mut driver: StreamDriver<'_, B>,
    chunks: S,
    cancel: C,
    mut on_progress: F,
) -> Result<EditOutcome, DriverError>
where
    B: DocumentBuffer + ?Sized,
    S: Stream<Item = String>,
    C: Future<Output = ()>,
    F: FnMut(&StreamDriver<'_, B>),
{
    let mut chunks = Box::pin(chunks.fuse());
    let mut cancel = Box::pin(cancel.fuse());

    loop {
        futures::select! {
            chunk = chunks.next() => match chunk {
                Some(chunk) => {
                    driver.push_chunk(&chunk)?;
                    on_progress(&driver);
                }
                None => return driver.finish(),
            },
            () = cancel => {
                let path = driver.path().to_owned();
                driver.abort();
                log::warn!("edit of {path} cancelled");
                return Err(DriverError::Cancelled { path });
            }
        }
    }
}
