//! Watches the well-known skip file and forces the current track to end
//! early: a control file whose mere existence means "end the current track
//! now", removed once acted on. This is a lightweight file-based trigger,
//! separate from the `"procman"` IMC endpoint's `{op:2}` stop_all, which a
//! caller on the IMC bus can invoke directly without touching the
//! filesystem.

use crate::extension::{Observer, ProcessManager};
use async_trait::async_trait;
use radio_common::Track;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct SkipWatcher {
    skip_file: PathBuf,
    procman: Arc<dyn ProcessManager>,
}

impl SkipWatcher {
    pub fn new(skip_file: PathBuf, procman: Arc<dyn ProcessManager>) -> Self {
        Self { skip_file, procman }
    }
}

#[async_trait]
impl Observer for SkipWatcher {
    async fn progress(&self, _index: u64, current: &Track, _elapsed: f64, _total: f64, _real_total: f64) {
        if self.skip_file.exists() {
            info!(path = %current.path().display(), "skip requested, stopping current track");
            let _ = tokio::fs::remove_file(&self.skip_file).await;
            self.procman.stop_all(Some(Duration::from_secs(2))).await;
        }
    }

    fn imc_name(&self) -> Option<&str> {
        Some("skipper")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ProcessHandle;
    use crate::error::Result;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProcman(Arc<AtomicUsize>);

    #[async_trait]
    impl ProcessManager for CountingProcman {
        async fn duration(&self, _path: &std::path::Path) -> Option<f64> {
            None
        }
        async fn play(&self, _track: &Track, _fade_time: f64) -> Result<Arc<dyn ProcessHandle>> {
            unimplemented!()
        }
        async fn anything_playing(&self) -> bool {
            false
        }
        async fn stop_all(&self, _timeout: Option<Duration>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        async fn wait_all(&self, _timeout: Option<Duration>) {}
    }

    #[tokio::test]
    async fn skip_file_presence_triggers_stop_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let skip_file = dir.path().join("skip");
        std::fs::write(&skip_file, "").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let watcher = SkipWatcher::new(skip_file.clone(), Arc::new(CountingProcman(calls.clone())));
        let track = Track::new("a.mp3", 0.0, 0.0, true, HashMap::new(), 0.0);
        watcher.progress(0, &track, 1.0, 10.0, 10.0).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!skip_file.exists());
    }

    #[tokio::test]
    async fn no_skip_file_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let skip_file = dir.path().join("skip");
        let calls = Arc::new(AtomicUsize::new(0));
        let watcher = SkipWatcher::new(skip_file, Arc::new(CountingProcman(calls.clone())));
        let track = Track::new("a.mp3", 0.0, 0.0, true, HashMap::new(), 0.0);
        watcher.progress(0, &track, 1.0, 10.0, 10.0).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
