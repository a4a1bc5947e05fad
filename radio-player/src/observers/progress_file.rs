//! Writes a single human-readable progress line:
//! `"HH:MM:SS / HH:MM:SS  <path>"`, rewritten on every tick.

use crate::extension::Observer;
use async_trait::async_trait;
use radio_common::{human_time::format_hms, Track};
use std::path::PathBuf;
use tracing::warn;

pub struct ProgressFileWriter {
    path: PathBuf,
}

impl ProgressFileWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Observer for ProgressFileWriter {
    async fn progress(&self, _index: u64, current: &Track, elapsed: f64, total: f64, _real_total: f64) {
        let line = format!(
            "{} / {}  {}\n",
            format_hms(elapsed),
            format_hms(total),
            current.path().display()
        );
        if let Err(e) = tokio::fs::write(&self.path, line).await {
            warn!(error = %e, path = %self.path.display(), "failed to write progress file");
        }
    }

    async fn shutdown(&self) {
        let _ = tokio::fs::remove_file(&self.path).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn writes_formatted_progress_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress");
        let writer = ProgressFileWriter::new(path.clone());
        let track = Track::new("song.mp3", 0.0, 0.0, true, HashMap::new(), 0.0);
        writer.progress(0, &track, 65.0, 130.0, 130.0).await;
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "00:01:05 / 00:02:10  song.mp3\n");
    }
}
