pub mod buffer;
pub mod driver;
pub mod editing;
pub mod io;
pub mod parsing;
pub mod session;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use buffer::{BufferError, DocumentBuffer, Workspace};
pub use driver::{BlockPolicy, DriverError, EditOutcome, StreamDriver, run_stream};
pub use editing::{AnchorId, Document, EditError, Patch};
pub use io::*;
pub use parsing::{DiffBlock, parse_diff_blocks, parse_final_diff_blocks};
pub use session::{
    EditSession, OpenError, SessionError, SessionId, SessionRegistry, SessionState,
};
