use std::ops::Range;

use uuid::Uuid;

use crate::editing::Document;

/// Stable identifier for a text range that survives edits
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub id: AnchorId,
    pub range: Range<usize>, // byte range in the rope
}

/// Unique identifier for an anchor
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AnchorId(pub u128);

impl AnchorId {
    pub(crate) fn generate() -> Self {
        AnchorId(Uuid::new_v4().as_u128())
    }
}

/// Whether two byte ranges share any position.
///
/// Empty ranges only overlap when they sit strictly inside the other range,
/// so ranges that merely touch at a boundary never conflict.
pub fn ranges_overlap(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Map an offset in the pre-edit document to the post-edit document.
///
/// `edited` is the replaced range in the old document and `inserted_len` the
/// length of the text that replaced it. `after` only matters where the
/// mapping is ambiguous: at a pure insertion point, and strictly inside the
/// replaced range, where the offset lands after the new text if set and
/// before it otherwise.
pub(crate) fn transform_offset(
    offset: usize,
    edited: &Range<usize>,
    inserted_len: usize,
    after: bool,
) -> usize {
    if offset < edited.start {
        offset
    } else if offset > edited.end {
        offset - edited.len() + inserted_len
    } else if edited.is_empty() {
        if after { offset + inserted_len } else { offset }
    } else if offset == edited.start {
        offset
    } else if offset == edited.end || after {
        edited.start + inserted_len
    } else {
        edited.start
    }
}

/// Register a new anchor, keeping anchors sorted in document order
pub(crate) fn insert_anchor(doc: &mut Document, range: Range<usize>) -> AnchorId {
    let id = AnchorId::generate();
    let index = doc
        .anchors
        .partition_point(|a| (a.range.start, a.range.end) <= (range.start, range.end));
    doc.anchors.insert(index, Anchor { id, range });
    id
}

/// Transform anchors through an edit that is not owned by any anchor
///
/// Insertions at an anchor's exact start push it forward and insertions at
/// its exact end do not grow it. Anchors swallowed by the edit collapse to an
/// empty range at the edit position.
pub(crate) fn transform_anchors(doc: &mut Document, edited: &Range<usize>, inserted_len: usize) {
    for anchor in &mut doc.anchors {
        let start = transform_offset(anchor.range.start, edited, inserted_len, true);
        let end = transform_offset(anchor.range.end, edited, inserted_len, false);
        anchor.range = start..end.max(start);
    }

    // Stable sort so anchors that tie keep their previous relative order
    doc.anchors.sort_by_key(|a| (a.range.start, a.range.end));
}

/// Transform anchors through an edit of the anchor at `owner`
///
/// The owner is rebound to exactly cover the inserted text. The remaining
/// anchors are resolved by document order rather than by position alone, so
/// a neighbour that touches the owner (or shares its position while empty)
/// ends up on the correct side of the new text.
pub(crate) fn transform_anchors_for_owner(
    doc: &mut Document,
    owner: usize,
    edited: &Range<usize>,
    inserted_len: usize,
) {
    for (index, anchor) in doc.anchors.iter_mut().enumerate() {
        if index == owner {
            anchor.range = edited.start..edited.start + inserted_len;
            continue;
        }

        let after = index > owner;
        let start = transform_offset(anchor.range.start, edited, inserted_len, after);
        let end = transform_offset(anchor.range.end, edited, inserted_len, after);
        anchor.range = start..end.max(start);
    }
}

pub(crate) fn anchor_index(doc: &Document, id: AnchorId) -> Option<usize> {
    doc.anchors.iter().position(|a| a.id == id)
}
