use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use relative_path::{RelativePath, RelativePathBuf};

use crate::buffer::{BufferError, DocumentBuffer};
use crate::editing::{AnchorId, Document};
use crate::io;

/// File-backed documents under one root directory
///
/// Documents are loaded on first access and stay in memory until closed, so
/// every edit session on the same path shares one buffer and one set of
/// anchors.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    documents: HashMap<RelativePathBuf, Document>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            documents: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A loaded document, if any
    pub fn document(&self, path: &RelativePath) -> Option<&Document> {
        self.documents.get(path)
    }

    /// Open a document from memory instead of disk
    ///
    /// Saving still writes it under the workspace root.
    pub fn insert(&mut self, path: impl Into<RelativePathBuf>, document: Document) {
        self.documents.insert(path.into(), document);
    }

    /// Drop a document from memory, discarding unsaved edits
    pub fn close(&mut self, path: &RelativePath) -> Option<Document> {
        self.documents.remove(path)
    }

    fn load(&mut self, path: &RelativePath) -> Result<&mut Document, BufferError> {
        if !self.documents.contains_key(path) {
            let content = io::read_file(path, &self.root).map_err(|source| BufferError::Io {
                path: path.to_owned(),
                source,
            })?;
            log::debug!("loaded {path} ({} bytes)", content.len());
            self.documents
                .insert(path.to_owned(), Document::from(content.as_str()));
        }
        self.loaded_mut(path)
    }

    fn loaded_mut(&mut self, path: &RelativePath) -> Result<&mut Document, BufferError> {
        self.documents
            .get_mut(path)
            .ok_or_else(|| BufferError::NotOpen(path.to_owned()))
    }
}

impl DocumentBuffer for Workspace {
    fn read(&mut self, path: &RelativePath) -> Result<String, BufferError> {
        Ok(self.load(path)?.text())
    }

    fn replace_range(
        &mut self,
        path: &RelativePath,
        range: Range<usize>,
        text: &str,
    ) -> Result<Range<usize>, BufferError> {
        let patch = self
            .load(path)?
            .replace_range(range, text)
            .map_err(|source| BufferError::Edit {
                path: path.to_owned(),
                source,
            })?;
        Ok(patch.inserted)
    }

    fn save(&mut self, path: &RelativePath) -> Result<(), BufferError> {
        let root = self.root.clone();
        let document = self.loaded_mut(path)?;
        io::write_file(path, &root, &document.text()).map_err(|source| BufferError::Io {
            path: path.to_owned(),
            source,
        })?;
        document.mark_saved();
        log::info!("saved {path} (version {})", document.version());
        Ok(())
    }

    fn create_anchor(
        &mut self,
        path: &RelativePath,
        range: Range<usize>,
    ) -> Result<AnchorId, BufferError> {
        self.load(path)?
            .create_anchor(range)
            .map_err(|source| BufferError::Edit {
                path: path.to_owned(),
                source,
            })
    }

    fn anchor_range(&self, path: &RelativePath, anchor: AnchorId) -> Option<Range<usize>> {
        self.documents.get(path)?.anchor_range(anchor)
    }

    fn replace_anchored(
        &mut self,
        path: &RelativePath,
        anchor: AnchorId,
        text: &str,
    ) -> Result<Range<usize>, BufferError> {
        let patch = self
            .loaded_mut(path)?
            .replace_anchored(anchor, text)
            .map_err(|source| BufferError::Edit {
                path: path.to_owned(),
                source,
            })?;
        Ok(patch.inserted)
    }

    fn remove_anchor(&mut self, path: &RelativePath, anchor: AnchorId) -> bool {
        self.documents
            .get_mut(path)
            .is_some_and(|document| document.remove_anchor(anchor))
    }
}
