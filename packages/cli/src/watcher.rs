use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

/// Watches one document by watching its directory and filtering events
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    document: PathBuf,
}

impl DocumentWatcher {
    pub fn new(document: &Path) -> notify::Result<Self> {
        let (tx, rx) = channel();
        let document = document
            .canonicalize()
            .map_err(notify::Error::io)?;
        let dir = document.parent().unwrap_or(Path::new(".")).to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            document,
        })
    }

    /// Block until the document is created or modified; `None` once the
    /// watcher has shut down
    pub fn next_change(&self) -> Option<()> {
        loop {
            match self.receiver.recv() {
                Ok(Ok(event)) if self.touches_document(&event) => return Some(()),
                Ok(Ok(_)) => continue,
                Ok(Err(err)) => tracing::warn!("[Watch] {}", err),
                Err(_) => return None,
            }
        }
    }

    /// Drain events that arrive within `quiet` of each other, so one save
    /// is handled once
    pub fn settle(&self, quiet: Duration) {
        while self.receiver.recv_timeout(quiet).is_ok() {}
    }

    fn touches_document(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
            && event.paths.iter().any(|path| {
                path == &self.document
                    || path.canonicalize().map(|p| p == self.document).unwrap_or(false)
            })
    }
}
