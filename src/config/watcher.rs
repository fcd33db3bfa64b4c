//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself so that
//! editors and deploy tools which replace the file by rename keep triggering
//! reloads. Plain modify events are ignored: a truncating write emits one
//! while the file is still empty, and every section has defaults, so that
//! intermediate state would parse as a valid all-defaults config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ServiceConfig;

/// Watches the configuration file and publishes every valid revision.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ServiceConfig>,
}

impl ConfigWatcher {
    /// Create a new watcher for `path`.
    ///
    /// Returns the watcher and the receiving end of the update channel, which is
    /// what [`HttpServer::run`](crate::http::HttpServer::run) consumes.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ServiceConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. The returned handle must be kept alive for as long as
    /// reloads should happen.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let reload_path = path.clone();
        let mut last_sent: Option<ServiceConfig> = None;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_complete_write(&event.kind) && touches(&event, &reload_path) => {
                    reload(&reload_path, &update_tx, &mut last_sent);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Events after which the file holds its final content.
fn is_complete_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(_))
    )
}

fn touches(event: &Event, path: &Path) -> bool {
    event
        .paths
        .iter()
        .any(|p| p.file_name().is_some() && p.file_name() == path.file_name())
}

fn reload(
    path: &Path,
    update_tx: &mpsc::UnboundedSender<ServiceConfig>,
    last_sent: &mut Option<ServiceConfig>,
) {
    match load_config(path) {
        Ok(config) if last_sent.as_ref() == Some(&config) => {
            tracing::debug!(path = %path.display(), "Config unchanged, skipping reload");
        }
        Ok(config) => {
            tracing::info!(
                path = %path.display(),
                version = %config.greeting.version,
                "Config file changed, publishing new revision"
            );
            if update_tx.send(config.clone()).is_err() {
                tracing::debug!("Config update receiver dropped");
            }
            *last_sent = Some(config);
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to reload config, keeping current configuration"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RenameMode};
    use std::fs;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hello-gitops-watch-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    async fn next_version(rx: &mut mpsc::UnboundedReceiver<ServiceConfig>) -> String {
        let config = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no config revision published")
            .expect("update channel closed");
        config.greeting.version
    }

    #[test]
    fn only_complete_writes_trigger_reload() {
        assert!(is_complete_write(&EventKind::Access(AccessKind::Close(AccessMode::Write))));
        assert!(is_complete_write(&EventKind::Create(CreateKind::File)));
        assert!(is_complete_write(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));

        assert!(!is_complete_write(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
        assert!(!is_complete_write(&EventKind::Access(AccessKind::Close(AccessMode::Read))));
    }

    #[test]
    fn events_for_sibling_files_are_ignored() {
        let target = Path::new("/etc/hello/config.toml");
        let sibling = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/hello/config.toml.swp"));
        let own = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/hello/config.toml"));

        assert!(!touches(&sibling, target));
        assert!(touches(&own, target));
    }

    #[test]
    fn reload_publishes_valid_config_once() {
        let dir = temp_dir();
        let path = dir.join("config.toml");
        fs::write(&path, "[greeting]\nversion = \"v3\"\n").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let mut last_sent = None;
        reload(&path, &watcher.update_tx, &mut last_sent);
        reload(&path, &watcher.update_tx, &mut last_sent);
        fs::remove_dir_all(&dir).ok();

        assert_eq!(rx.try_recv().unwrap().greeting.version, "v3");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn reload_skips_invalid_config() {
        let dir = temp_dir();
        let path = dir.join("config.toml");
        fs::write(&path, "[greeting]\nversion = \"\"\n").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let mut last_sent = None;
        reload(&path, &watcher.update_tx, &mut last_sent);
        fs::remove_dir_all(&dir).ok();

        assert!(rx.try_recv().is_err());
        assert!(last_sent.is_none());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn in_place_rewrite_publishes_final_content() {
        let dir = temp_dir();
        let path = dir.join("config.toml");
        fs::write(&path, "[greeting]\nversion = \"v1\"\n").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        fs::write(&path, "[greeting]\nversion = \"v2\"\n").unwrap();
        assert_eq!(next_version(&mut rx).await, "v2");

        let staged = dir.join("config.toml.tmp");
        fs::write(&staged, "[greeting]\nversion = \"v3\"\n").unwrap();
        fs::rename(&staged, &path).unwrap();
        assert_eq!(next_version(&mut rx).await, "v3");

        fs::remove_dir_all(&dir).ok();
    }
}
