/*!
 * # Document Buffer
 *
 * Text storage that edit sessions write through.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: xi-rope Buffer
 * - Each document is stored in a single **`xi_rope::Rope`** buffer
 * - Every replace compiles to an xi-rope **Delta** and yields a **Patch**
 * - **Lossless round-trip**: saving writes rope bytes verbatim
 *
 * ### 2. Anchors Instead of Offsets
 * - An **Anchor** names a byte range that survives edits anywhere else in the
 *   document
 * - Ranges are re-derived after every edit; nothing outside this module holds
 *   raw offsets across edits
 * - `replace_anchored` rewrites exactly what an anchor covers and rebinds the
 *   anchor to the new text, so a streaming edit only ever touches the text it
 *   wrote last
 *
 * ## Module Structure
 *
 * - **`document`**: Core `Document` type with the rope buffer and save boundary
 * - **`anchors`**: Anchor ids and range transformation through edits
 * - **`patch`**: Edit result metadata including changed ranges and version
 */

pub mod anchors;
pub mod document;
pub mod patch;

pub use anchors::{Anchor, AnchorId, ranges_overlap};
pub use document::{Document, EditError};
pub use patch::Patch;
