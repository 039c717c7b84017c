/// Result of applying an edit to a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub changed: Vec<std::ops::Range<usize>>,
    /// Where the inserted text now lives in the document
    pub inserted: std::ops::Range<usize>,
    pub version: u64,
}
