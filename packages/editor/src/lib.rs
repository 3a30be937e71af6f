//! # Weft Editor
//!
//! Keeps a block editor's tree and a tagged-prose source file in step.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: source → tree with spans and ids    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor:                                     │
//! │  - translate / tree_ops: editor → mutations │
//! │  - apply: mutations → minimal text patches  │
//! │  - sync: both directions, one state machine │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Source is the truth**: the tree is always a parse of it
//! 2. **Surgical edits**: untouched bytes are never rewritten
//! 3. **Atomic batches**: a batch applies in full or not at all
//! 4. **Stable identity**: reparses carry node ids over
//!
//! ## Usage
//!
//! ```rust,ignore
//! use weft_editor::{EditorOp, EngineConfig, SyncController};
//!
//! let config = EngineConfig::load(".")?;
//! let mut sync = SyncController::from_config(&config, |source: &str| {
//!     std::fs::write("page.mdx", source).ok();
//! }, &std::fs::read_to_string("page.mdx")?);
//!
//! let id = sync.snapshot().root().unwrap().id.clone();
//! sync.structural_operation(&EditorOp::Select { ids: vec![id] });
//! ```

mod apply;
mod config;
mod errors;
mod mutations;
mod sync;
mod text_edit;
mod translate;
mod tree_ops;
mod whitespace;

pub use apply::{apply_mutations, Applicator, ApplyOptions};
pub use config::{ConfigError, EngineConfig, DEFAULT_CONFIG_NAME};
pub use errors::{AdaptError, ApplyError};
pub use mutations::{AttrValue, Mutation};
pub use sync::{SourceSink, SyncController, SyncOutcome, SyncState};
pub use text_edit::{apply_edits, TextEdit};
pub use translate::{translate_operation, DropPosition, EditorOp};
pub use tree_ops::{adapt_operation, TreeOperation};
pub use whitespace::{deletion_range, separator};

// Re-export parser types hosts need alongside the editor
pub use weft_parser::{parse, NodeKind, ParseOptions, ParseResult, Parser, Path};
