//! Stylesheet watcher.
//!
//! Watches the built stylesheet on disk and feeds changes into the
//! [`StyleBroadcaster`] once the build tool has finished writing.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::debouncer::EventDebouncer;
use super::styles::StyleBroadcaster;

/// How often debounced events are checked.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Watches the stylesheet file and pushes new versions to clients.
///
/// Dropping the watcher stops it.
pub struct StyleWatcher {
    styles_path: PathBuf,
    broadcaster: Arc<StyleBroadcaster>,
    debounce: Duration,
    watcher: Option<RecommendedWatcher>,
    shutdown: CancellationToken,
}

impl StyleWatcher {
    /// Create a watcher for `styles_path`.
    ///
    /// # Arguments
    ///
    /// * `styles_path` - Stylesheet produced by the asset build
    /// * `broadcaster` - Receives the new stylesheet after each change
    /// * `debounce` - Quiet period before a change is applied
    #[must_use]
    pub fn new(styles_path: PathBuf, broadcaster: Arc<StyleBroadcaster>, debounce: Duration) -> Self {
        Self {
            styles_path,
            broadcaster,
            debounce,
            watcher: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Start watching.
    ///
    /// The parent directory is watched rather than the file itself, since
    /// build tools commonly replace the file by renaming a temporary one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file watcher cannot be created.
    pub fn start(&mut self) -> Result<(), notify::Error> {
        let (tx, mut rx) = mpsc::channel::<Event>(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // Use blocking_send since callback is sync
                let _ = tx.blocking_send(event);
            }
        })?;

        let watch_dir = self
            .styles_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;
        self.watcher = Some(watcher);

        let debouncer = Arc::new(EventDebouncer::new(self.debounce));
        let debouncer_for_record = Arc::clone(&debouncer);
        let file_name = self.styles_path.file_name().map(ToOwned::to_owned);
        let styles_path = self.styles_path.clone();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if Self::is_styles_event(&event, file_name.as_ref()) {
                    tracing::debug!(kind = ?event.kind, "Stylesheet change recorded");
                    debouncer_for_record.record(styles_path.clone());
                }
            }
        });

        let broadcaster = Arc::clone(&self.broadcaster);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = interval.tick() => {}
                }

                for path in debouncer.drain_ready() {
                    Self::reload(&path, &broadcaster).await;
                }
            }
        });

        tracing::info!(path = %self.styles_path.display(), "Watching stylesheet");
        Ok(())
    }

    /// Whether `event` is a content change to the watched file.
    fn is_styles_event(event: &Event, file_name: Option<&OsString>) -> bool {
        let Some(file_name) = file_name else {
            return false;
        };
        matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name.as_os_str()))
    }

    /// Read the stylesheet and hand it to the broadcaster.
    ///
    /// A failed read keeps the previous snapshot.
    async fn reload(path: &Path, broadcaster: &StyleBroadcaster) {
        match tokio::fs::read_to_string(path).await {
            Ok(styles) => broadcaster.update_styles(styles),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to read stylesheet, keeping previous version"
                );
            }
        }
    }
}

impl Drop for StyleWatcher {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_reload::ConnectionRegistry;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_is_styles_event_matches_file_name() {
        let name = Some(OsString::from("styles.css"));

        assert!(StyleWatcher::is_styles_event(
            &event(EventKind::Modify(ModifyKind::Any), "/dist/styles.css"),
            name.as_ref()
        ));
        assert!(StyleWatcher::is_styles_event(
            &event(EventKind::Create(CreateKind::File), "/dist/styles.css"),
            name.as_ref()
        ));
    }

    #[test]
    fn test_is_styles_event_ignores_other_files_and_access() {
        let name = Some(OsString::from("styles.css"));

        assert!(!StyleWatcher::is_styles_event(
            &event(EventKind::Modify(ModifyKind::Any), "/dist/client.js"),
            name.as_ref()
        ));
        assert!(!StyleWatcher::is_styles_event(
            &event(EventKind::Access(AccessKind::Any), "/dist/styles.css"),
            name.as_ref()
        ));
    }

    #[tokio::test]
    async fn test_reload_missing_file_keeps_snapshot() {
        let broadcaster = StyleBroadcaster::new("old {}", ConnectionRegistry::new());

        StyleWatcher::reload(Path::new("/nonexistent/styles.css"), &broadcaster).await;

        assert_eq!(&*broadcaster.current(), "old {}");
    }

    #[tokio::test]
    async fn test_file_change_updates_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.css");
        std::fs::write(&path, "body {}").unwrap();

        let broadcaster = Arc::new(StyleBroadcaster::new("body {}", ConnectionRegistry::new()));
        let mut watcher = StyleWatcher::new(
            path.clone(),
            Arc::clone(&broadcaster),
            Duration::from_millis(20),
        );
        watcher.start().unwrap();

        std::fs::write(&path, "body { color: red }").unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while &*broadcaster.current() != "body { color: red }" {
            assert!(
                tokio::time::Instant::now() < deadline,
                "stylesheet was not reloaded"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
