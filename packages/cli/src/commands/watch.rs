use super::{load_config, read_document};
use crate::watcher::DocumentWatcher;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use weft_editor::{EditorOp, SourceSink, SyncController, SyncOutcome};

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Document to watch
    pub input: PathBuf,

    /// JSON array of editor operations to run before watching
    #[arg(long)]
    pub ops: Option<PathBuf>,

    /// Milliseconds to wait for a burst of file events to settle
    #[arg(long, default_value = "50")]
    pub debounce: u64,
}

pub fn watch(args: WatchArgs, cwd: &Path) -> Result<()> {
    let mut session = WatchSession::open(&args.input, cwd)?;

    println!("👀 {} {}", "Watching".green().bold(), args.input.display());

    if let Some(ops_path) = &args.ops {
        let ops: Vec<EditorOp> = serde_json::from_str(&read_document(ops_path)?)
            .with_context(|| format!("Invalid editor operations in {}", ops_path.display()))?;
        for op in &ops {
            report(op.kind(), &session.operation(op));
        }
    }

    let watcher = DocumentWatcher::new(&args.input)?;
    while watcher.next_change().is_some() {
        watcher.settle(Duration::from_millis(args.debounce));
        match session.disk_changed() {
            Ok(outcome) => report("external", &outcome),
            Err(err) => eprintln!("  {} {:#}", "✗".red(), err),
        }
    }
    Ok(())
}

/// Persists committed sources back to the watched file
pub(crate) struct FileSink {
    path: PathBuf,
}

impl SourceSink for FileSink {
    fn source_changed(&mut self, source: &str) {
        if let Err(err) = std::fs::write(&self.path, source) {
            tracing::error!("[Watch] Failed to write {}: {}", self.path.display(), err);
        }
    }
}

pub(crate) struct WatchSession {
    path: PathBuf,
    sync: SyncController<FileSink>,
}

impl WatchSession {
    pub(crate) fn open(path: &Path, cwd: &Path) -> Result<Self> {
        let source = read_document(path)?;
        let config = load_config(cwd, path)?;
        let sink = FileSink {
            path: path.to_path_buf(),
        };

        Ok(Self {
            path: path.to_path_buf(),
            sync: SyncController::from_config(&config, sink, &source),
        })
    }

    pub(crate) fn operation(&mut self, op: &EditorOp) -> SyncOutcome {
        self.sync.structural_operation(op)
    }

    pub(crate) fn disk_changed(&mut self) -> Result<SyncOutcome> {
        let text = read_document(&self.path)?;
        Ok(self.sync.external_source_changed(&text))
    }

    #[cfg(test)]
    pub(crate) fn sync(&self) -> &SyncController<FileSink> {
        &self.sync
    }
}

fn report(what: &str, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Committed { revision } => {
            println!("  {} {} committed (revision {})", "✓".green(), what, revision)
        }
        SyncOutcome::Reparsed { revision } => {
            println!("  {} {} reparsed (revision {})", "↻".blue(), what, revision)
        }
        SyncOutcome::Unchanged => println!("  {} {} unchanged", "·".dimmed(), what),
        SyncOutcome::KeptPrevious { diagnostics } => println!(
            "  {} {} does not parse ({} diagnostics), keeping previous tree",
            "⚠".yellow(),
            what,
            diagnostics
        ),
        SyncOutcome::Rejected(err) => println!("  {} {} rejected: {}", "✗".red(), what, err),
        SyncOutcome::Untranslatable => {
            println!("  {} {} does not match the document", "✗".red(), what)
        }
        SyncOutcome::Diverged(err) => println!("  {} {} diverged: {}", "⚠".yellow(), what, err),
        SyncOutcome::Busy => println!("  {} {} skipped, busy", "·".dimmed(), what),
    }
}
