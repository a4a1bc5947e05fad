//! Writes the full current playlist to disk with a `>` marker on the
//! currently-playing row.

use crate::extension::Observer;
use async_trait::async_trait;
use radio_common::Track;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

pub struct PlaylistFileWriter {
    path: PathBuf,
    playlist: Mutex<Vec<Track>>,
}

impl PlaylistFileWriter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            playlist: Mutex::new(Vec::new()),
        }
    }

    async fn rewrite(&self, current_index: Option<u64>) {
        let playlist = self.playlist.lock().unwrap().clone();
        let mut out = String::new();
        for (i, track) in playlist.iter().enumerate() {
            let marker = if Some(i as u64) == current_index { ">" } else { " " };
            out.push_str(&format!("{marker} {}\n", track.path().display()));
        }
        if let Err(e) = tokio::fs::write(&self.path, out).await {
            warn!(error = %e, path = %self.path.display(), "failed to write playlist file");
        }
    }
}

#[async_trait]
impl Observer for PlaylistFileWriter {
    async fn on_new_playlist(&self, playlist: &[Track], _global_args: &HashMap<String, String>) {
        *self.playlist.lock().unwrap() = playlist.to_vec();
        self.rewrite(None).await;
    }

    async fn on_new_track(&self, index: u64, _current: &Track, _next: Option<&Track>) {
        self.rewrite(Some(index)).await;
    }

    async fn shutdown(&self) {
        let _ = tokio::fs::remove_file(&self.path).await;
    }
}
