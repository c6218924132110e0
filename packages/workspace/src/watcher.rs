//! Filesystem watcher.
//!
//! Wraps `notify` behind a channel so events can be drained synchronously
//! behind the project's own mutation point; the project never observes a
//! half-updated document because watcher revalidation runs through the same
//! serialized entry points as explicit edits.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
}

impl FileWatcher {
    pub fn new(root: &Path) -> notify::Result<Self> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Drain every pending event without blocking, returning the distinct
    /// scene file paths that changed on disk.
    pub fn drain_changed(&self) -> Vec<PathBuf> {
        let mut changed: Vec<PathBuf> = Vec::new();
        while let Ok(result) = self.receiver.try_recv() {
            let Ok(event) = result else { continue };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                continue;
            }
            for path in event.paths {
                if path.extension().and_then(|e| e.to_str()) != Some("tsx") {
                    continue;
                }
                if !changed.contains(&path) {
                    changed.push(path);
                }
            }
        }
        changed
    }

    /// Block until one event arrives. Test helper more than anything else;
    /// the project polls with [`FileWatcher::drain_changed`].
    pub fn next_event(&self) -> Option<Event> {
        match self.receiver.recv() {
            Ok(Ok(event)) => Some(event),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_watcher_reports_scene_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = FileWatcher::new(dir.path()).unwrap();

        let file = dir.path().join("scene.tsx");
        thread::spawn({
            let file = file.clone();
            move || {
                thread::sleep(Duration::from_millis(100));
                fs::write(&file, "export default function Scene() { return <></>; }").unwrap();
            }
        });

        assert!(watcher.next_event().is_some());
        thread::sleep(Duration::from_millis(100));
        let changed = watcher.drain_changed();
        assert!(changed.iter().all(|p| p.extension().is_some()));
    }
}
