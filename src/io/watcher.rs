use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the file watcher to its owner.
#[derive(Debug, PartialEq, Eq)]
pub enum DatasetEvent {
    /// The dataset file was written, replaced or removed.
    Changed(PathBuf),
}

/// Watches a single dataset file.
///
/// The parent directory is watched rather than the file itself, because
/// atomic saves replace the file and a watch on the old inode would go quiet.
pub struct DatasetWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<DatasetEvent>,
}

impl DatasetWatcher {
    pub fn start(path: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let file_name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }
                if let Some(changed) = event
                    .paths
                    .into_iter()
                    .find(|p| p.file_name() == Some(file_name.as_os_str()))
                {
                    let _ = tx.send(DatasetEvent::Changed(changed));
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(DatasetWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll. Returns every queued event (may be empty).
    pub fn poll(&self) -> Vec<DatasetEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}
