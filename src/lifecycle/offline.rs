//! Deployment hook: drop `app_offline.htm` into the watched directory and
//! the service shuts down so the host can replace the binary.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lifecycle::shutdown::Shutdown;

pub const OFFLINE_MARKER: &str = "app_offline.htm";

/// Watches a directory for the offline marker.
pub struct OfflineWatcher {
    dir: PathBuf,
    shutdown: Shutdown,
}

impl OfflineWatcher {
    pub fn new(dir: &Path, shutdown: Shutdown) -> Self {
        Self {
            dir: dir.to_path_buf(),
            shutdown,
        }
    }

    /// Start watching. Keep the returned watcher alive for as long as the
    /// hook should stay armed.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let shutdown = self.shutdown.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.paths.iter().any(|p| is_offline_marker(p)) {
                        tracing::warn!("Exiting due to {} being present", OFFLINE_MARKER);
                        shutdown.trigger();
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;

        tracing::info!(dir = ?self.dir, "Offline marker watcher started");
        Ok(watcher)
    }
}

/// Whether `path` names the offline marker (case-insensitive).
pub fn is_offline_marker(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(OFFLINE_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_offline_marker() {
        assert!(is_offline_marker(Path::new("/srv/faucet/app_offline.htm")));
        assert!(is_offline_marker(Path::new("App_Offline.htm")));
        assert!(!is_offline_marker(Path::new("/srv/faucet/app_offline.html")));
        assert!(!is_offline_marker(Path::new("/srv/faucet/")));
    }

    #[tokio::test]
    async fn test_marker_triggers_shutdown() {
        let dir = std::env::temp_dir().join(format!("faucet-offline-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        let _watcher = OfflineWatcher::new(&dir, shutdown.clone()).run().unwrap();

        std::fs::write(dir.join(OFFLINE_MARKER), "down for deploy").unwrap();

        let fired = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        std::fs::remove_dir_all(&dir).unwrap_or_default();
        assert!(matches!(fired, Ok(Ok(()))));
    }
}
