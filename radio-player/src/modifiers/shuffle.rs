//! Shuffle modifier: a Fisher-Yates shuffle of the whole playlist, skipped
//! entirely when the global `no_shuffle` flag is set.

use crate::extension::PlaylistModifier;
use async_trait::async_trait;
use radio_common::Track;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct Shuffle {
    rng: Mutex<rand::rngs::StdRng>,
}

impl Shuffle {
    pub fn new() -> Self {
        use rand::SeedableRng;
        Self {
            rng: Mutex::new(rand::rngs::StdRng::from_entropy()),
        }
    }
}

impl Default for Shuffle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaylistModifier for Shuffle {
    async fn modify(
        &self,
        global_args: &HashMap<String, String>,
        playlist: Vec<Track>,
    ) -> Option<Vec<Track>> {
        let disabled = global_args
            .get("no_shuffle")
            .map_or(false, |v| v != "" && v != "0" && v != "false");
        if disabled {
            return None;
        }
        let mut shuffled = playlist;
        shuffled.shuffle(&mut *self.rng.lock().unwrap());
        Some(shuffled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn track(n: usize) -> Track {
        Track::new(PathBuf::from(format!("{n}.mp3")), 0.0, 0.0, true, HashMap::new(), 0.0)
    }

    #[tokio::test]
    async fn no_shuffle_flag_is_respected() {
        let shuffle = Shuffle::new();
        let mut args = HashMap::new();
        args.insert("no_shuffle".to_string(), "1".to_string());
        let playlist = vec![track(1), track(2), track(3)];
        let result = shuffle.modify(&args, playlist).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn shuffle_preserves_set_of_tracks() {
        let shuffle = Shuffle::new();
        let playlist = vec![track(1), track(2), track(3), track(4)];
        let result = shuffle.modify(&HashMap::new(), playlist.clone()).await.unwrap();
        assert_eq!(result.len(), playlist.len());
        for t in &playlist {
            assert!(result.contains(t));
        }
    }
}
