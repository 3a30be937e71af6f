pub mod apply;
pub mod parse;
pub mod watch;

pub use apply::{apply, ApplyArgs};
pub use parse::{parse, ParseArgs};
pub use watch::{watch, WatchArgs};

use anyhow::{Context, Result};
use std::path::Path;
use weft_editor::EngineConfig;

/// Config from `cwd`, with ids seeded from the document's path
pub(crate) fn load_config(cwd: &Path, document: &Path) -> Result<EngineConfig> {
    let config = EngineConfig::load(cwd)?;
    Ok(config.with_document_path(document.to_string_lossy()))
}

pub(crate) fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
