use std::ops::Range;

use xi_rope::{Delta, Rope};

use crate::editing::anchors::{
    Anchor, AnchorId, anchor_index, insert_anchor, transform_anchors, transform_anchors_for_owner,
};
use crate::editing::Patch;

/// Why an edit against a [`Document`] was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("range {}..{} is outside the document (length {len})", .range.start, .range.end)]
    OutOfBounds { range: Range<usize>, len: usize },
    #[error("offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
    #[error("unknown anchor {0:?}")]
    UnknownAnchor(AnchorId),
}

/// In-memory text of one target resource
///
/// Document is the buffer every edit session writes through. It maintains:
///
/// ## 1. Single Source of Truth (xi-rope buffer)
/// - **Lossless storage**: Entire document in one `xi_rope::Rope` buffer
/// - **Exact round-trip**: `to_bytes()` returns identical content to original
/// - **Efficient edits**: every replace is an xi-rope `Delta`, O(log n) to apply
///
/// ## 2. Edit-aware Anchors
/// - **Persistent IDs**: an [`AnchorId`] keeps naming the same logical region
///   across any number of edits
/// - **Range transformation**: anchor byte ranges are re-derived after every
///   edit instead of being cached as raw offsets
/// - **Document order**: anchors are kept sorted, which resolves ties between
///   neighbours that touch or have become empty
///
/// ## 3. Save Boundary
/// - **Version counter**: bumped on every applied edit
/// - **Dirty tracking**: `is_dirty()` compares against the last saved version
///
/// ## Usage Pattern
///
/// ```rust
/// # use streamedit_engine::editing::Document;
/// let mut doc = Document::from("fn main() {}\n");
///
/// // Anchor the region an edit will own
/// let anchor = doc.create_anchor(10..12).unwrap();
///
/// // Rewrite it as often as needed; the anchor follows the new text
/// doc.replace_anchored(anchor, "{ todo!() }").unwrap();
/// doc.replace_anchored(anchor, "{ run() }").unwrap();
///
/// assert_eq!(doc.text(), "fn main() { run() }\n");
/// assert_eq!(doc.anchor_range(anchor), Some(10..19));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// xi-rope buffer containing entire document as UTF-8 bytes
    pub(crate) buffer: Rope,
    /// Version counter incremented on each edit (enables change detection)
    pub(crate) version: u64,
    /// Version at the last successful save
    pub(crate) saved_version: u64,
    /// Edit-aware ranges, sorted in document order
    pub(crate) anchors: Vec<Anchor>,
}

impl Document {
    /// Create a new document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, std::str::Utf8Error> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from(text))
    }

    /// Get the document's content as raw bytes (exact round-trip)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.text().into_bytes()
    }

    /// Get the current text content
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Get the buffer length in bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the current version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether edits were applied since the last save
    pub fn is_dirty(&self) -> bool {
        self.version != self.saved_version
    }

    pub fn mark_saved(&mut self) {
        self.saved_version = self.version;
    }

    /// Get reference to anchors for testing
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Slice the buffer to a cow string
    pub fn slice_to_cow(&self, range: Range<usize>) -> std::borrow::Cow<'_, str> {
        let doc_len = self.buffer.len();

        // Clamp range to document bounds to prevent xi-rope panic
        let start = range.start.min(doc_len);
        let end = range.end.min(doc_len).max(start);

        self.buffer.slice_to_cow(start..end)
    }

    /// Replace `range` with `text`, transforming every anchor through the edit
    pub fn replace_range(&mut self, range: Range<usize>, text: &str) -> Result<Patch, EditError> {
        self.check_range(&range)?;
        let patch = self.apply_edit(range.clone(), text);
        transform_anchors(self, &range, text.len());
        Ok(patch)
    }

    /// Track `range` with a new anchor
    pub fn create_anchor(&mut self, range: Range<usize>) -> Result<AnchorId, EditError> {
        self.check_range(&range)?;
        Ok(insert_anchor(self, range))
    }

    /// Current range of an anchor, if it is still tracked
    pub fn anchor_range(&self, id: AnchorId) -> Option<Range<usize>> {
        self.anchors
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.range.clone())
    }

    /// Stop tracking an anchor. Returns false if it was unknown.
    pub fn remove_anchor(&mut self, id: AnchorId) -> bool {
        match anchor_index(self, id) {
            Some(index) => {
                self.anchors.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace exactly the text an anchor covers and rebind the anchor to the
    /// inserted text
    pub fn replace_anchored(&mut self, id: AnchorId, text: &str) -> Result<Patch, EditError> {
        let owner = anchor_index(self, id).ok_or(EditError::UnknownAnchor(id))?;
        let range = self.anchors[owner].range.clone();
        self.check_range(&range)?;

        let patch = self.apply_edit(range.clone(), text);
        transform_anchors_for_owner(self, owner, &range, text.len());
        Ok(patch)
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), EditError> {
        let len = self.len();
        if range.start > range.end || range.end > len {
            return Err(EditError::OutOfBounds {
                range: range.clone(),
                len,
            });
        }

        for offset in [range.start, range.end] {
            if offset < len && !self.buffer.is_codepoint_boundary(offset) {
                return Err(EditError::NotCharBoundary(offset));
            }
        }
        Ok(())
    }

    /// Apply a validated single-range edit to the buffer
    ///
    /// Anchors are left untouched; callers transform them afterwards.
    fn apply_edit(&mut self, range: Range<usize>, text: &str) -> Patch {
        let delta = Delta::simple_edit(range.clone(), Rope::from(text), self.buffer.len());

        // Track changed ranges for the patch
        let mut changed = Vec::new();
        let mut cursor = 0;
        for op in delta.els.iter() {
            match op {
                xi_rope::delta::DeltaElement::Copy(from, to) => {
                    cursor += to - from;
                }
                xi_rope::delta::DeltaElement::Insert(inserted) => {
                    let start = cursor;
                    let end = cursor + inserted.len();
                    changed.push(start..end);
                    cursor = end;
                }
            }
        }
        if changed.is_empty() && !range.is_empty() {
            // Pure deletion: report the collapsed position
            changed.push(range.start..range.start);
        }

        self.buffer = delta.apply(&self.buffer);
        self.version += 1;

        Patch {
            changed,
            inserted: range.start..range.start + text.len(),
            version: self.version,
        }
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self {
            buffer: Rope::from(text),
            version: 0,
            saved_version: 0,
            anchors: Vec::new(),
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.buffer.to_string() == other.buffer.to_string()
    }
}
