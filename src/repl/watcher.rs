use crossbeam_channel::Sender;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Watches script files for the REPL's `watch` command.
///
/// notify delivers events from its own background thread; they are forwarded
/// into the REPL's select loop through `tx`.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    watched: BTreeSet<PathBuf>,
}

impl FileWatcher {
    pub fn new(tx: Sender<notify::Result<Event>>) -> notify::Result<Self> {
        let watcher = notify::recommended_watcher(move |res| {
            // The REPL has exited if the receiver is gone
            let _ = tx.send(res);
        })?;

        Ok(Self {
            watcher,
            watched: BTreeSet::new(),
        })
    }

    /// Start watching a script; watching the same file twice is a no-op
    pub fn watch<P: AsRef<Path>>(&mut self, path: P) -> notify::Result<()> {
        let path = path.as_ref().to_path_buf();
        if self.watched.contains(&path) {
            return Ok(());
        }

        self.watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %path.display(), "watching script");
        self.watched.insert(path);
        Ok(())
    }

    pub fn unwatch<P: AsRef<Path>>(&mut self, path: P) -> notify::Result<()> {
        let path = path.as_ref();
        self.watcher.unwatch(path)?;
        self.watched.remove(path);
        Ok(())
    }

    /// Scripts currently watched, in path order
    pub fn watched(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_watch_missing_file_fails() {
        let (tx, _rx) = unbounded();
        let mut watcher = FileWatcher::new(tx).unwrap();
        assert!(watcher.watch("no/such/script.lox").is_err());
        assert_eq!(watcher.watched().count(), 0);
    }

    #[test]
    fn test_watch_is_idempotent() {
        let (tx, _rx) = unbounded();
        let mut watcher = FileWatcher::new(tx).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();

        watcher.watch(file.path()).unwrap();
        watcher.watch(file.path()).unwrap();
        assert_eq!(watcher.watched().collect::<Vec<_>>(), vec![file.path()]);

        watcher.unwatch(file.path()).unwrap();
        assert_eq!(watcher.watched().count(), 0);
    }
}
