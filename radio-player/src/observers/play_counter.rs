//! Tallies official-track plays per path: an in-memory `path -> count`
//! table, flushed to a small TSV file once on shutdown rather than on
//! every play.

use crate::extension::Observer;
use async_trait::async_trait;
use radio_common::Track;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

pub struct PlayCounter {
    output_file: PathBuf,
    counts: Mutex<HashMap<PathBuf, u64>>,
}

impl PlayCounter {
    pub fn new(output_file: PathBuf) -> Self {
        Self {
            output_file,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn count_for(&self, path: &std::path::Path) -> u64 {
        self.counts.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Observer for PlayCounter {
    async fn on_new_track(&self, _index: u64, current: &Track, _next: Option<&Track>) {
        if !current.official() {
            return;
        }
        let mut counts = self.counts.lock().unwrap();
        *counts.entry(current.path().to_path_buf()).or_insert(0) += 1;
    }

    async fn shutdown(&self) {
        let counts = self.counts.lock().unwrap().clone();
        let mut out = String::new();
        let mut entries: Vec<_> = counts.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (path, count) in entries {
            out.push_str(&format!("{}\t{}\n", path.display(), count));
        }
        if let Err(e) = tokio::fs::write(&self.output_file, out).await {
            warn!(error = %e, "failed to flush play counter");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    #[tokio::test]
    async fn only_official_tracks_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let counter = PlayCounter::new(dir.path().join("counts"));
        let official = Track::new("a.mp3", 0.0, 0.0, true, Map::new(), 0.0);
        let jingle = Track::new("j.mp3", 0.0, 0.0, false, Map::new(), 0.0);
        counter.on_new_track(0, &official, None).await;
        counter.on_new_track(1, &jingle, None).await;
        counter.on_new_track(2, &official, None).await;
        assert_eq!(counter.count_for(std::path::Path::new("a.mp3")), 2);
        assert_eq!(counter.count_for(std::path::Path::new("j.mp3")), 0);
    }

    #[tokio::test]
    async fn shutdown_flushes_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("counts");
        let counter = PlayCounter::new(output.clone());
        let official = Track::new("a.mp3", 0.0, 0.0, true, Map::new(), 0.0);
        counter.on_new_track(0, &official, None).await;
        counter.shutdown().await;
        let contents = tokio::fs::read_to_string(&output).await.unwrap();
        assert_eq!(contents, "a.mp3\t1\n");
    }
}
