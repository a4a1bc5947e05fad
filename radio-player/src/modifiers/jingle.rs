//! Jingle modifier: inserts a non-official jingle track between official
//! tracks with roughly 1/3 probability, drawing first from a primary pool and
//! falling back to a secondary pool, never as the very first track, skipped
//! when `no_jingle` is set globally or on the individual track that would
//! receive the insertion.

use crate::extension::PlaylistModifier;
use async_trait::async_trait;
use radio_common::Track;
use rand::Rng;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct Jingle {
    primary: Vec<PathBuf>,
    secondary: Vec<PathBuf>,
    rng: Mutex<rand::rngs::StdRng>,
}

impl Jingle {
    pub fn new(primary: Vec<PathBuf>, secondary: Vec<PathBuf>) -> Self {
        use rand::SeedableRng;
        Self {
            primary,
            secondary,
            rng: Mutex::new(rand::rngs::StdRng::from_entropy()),
        }
    }

    fn pick_jingle(&self) -> Option<PathBuf> {
        let mut rng = self.rng.lock().unwrap();
        let pool = if !self.primary.is_empty() {
            &self.primary
        } else {
            &self.secondary
        };
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.gen_range(0..pool.len())].clone())
    }
}

#[async_trait]
impl PlaylistModifier for Jingle {
    async fn modify(
        &self,
        global_args: &HashMap<String, String>,
        playlist: Vec<Track>,
    ) -> Option<Vec<Track>> {
        let disabled = global_args
            .get("no_jingle")
            .map_or(false, |v| v != "" && v != "0" && v != "false");
        if disabled || (self.primary.is_empty() && self.secondary.is_empty()) {
            return None;
        }

        let mut result = Vec::with_capacity(playlist.len());
        // "never begins with jingle": the sweep state carries across the
        // whole playlist, so the first slot is always excluded.
        let mut first = true;
        for track in playlist {
            if !first && track.official() && !track.flag("no_jingle") {
                let roll = self.rng.lock().unwrap().gen_range(0..3);
                if roll == 0 {
                    if let Some(path) = self.pick_jingle() {
                        result.push(Track::new(path, 0.0, 0.0, false, HashMap::new(), 0.0));
                    }
                }
            }
            first = false;
            result.push(track);
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(n: usize, official: bool) -> Track {
        Track::new(
            PathBuf::from(format!("{n}.mp3")),
            0.0,
            0.0,
            official,
            HashMap::new(),
            0.0,
        )
    }

    #[tokio::test]
    async fn no_jingle_flag_is_respected() {
        let jingle = Jingle::new(vec![PathBuf::from("j1.mp3")], vec![]);
        let mut args = HashMap::new();
        args.insert("no_jingle".to_string(), "1".to_string());
        let playlist = vec![track(1, true), track(2, true)];
        assert!(jingle.modify(&args, playlist).await.is_none());
    }

    #[tokio::test]
    async fn empty_pools_mean_no_change() {
        let jingle = Jingle::new(vec![], vec![]);
        let playlist = vec![track(1, true), track(2, true)];
        assert!(jingle.modify(&HashMap::new(), playlist).await.is_none());
    }

    #[tokio::test]
    async fn never_inserts_before_first_track() {
        let jingle = Jingle::new(vec![PathBuf::from("j1.mp3")], vec![]);
        let playlist = vec![track(1, true)];
        let result = jingle.modify(&HashMap::new(), playlist).await.unwrap();
        assert_eq!(result[0].path(), std::path::Path::new("1.mp3"));
    }

    #[tokio::test]
    async fn per_track_no_jingle_flag_suppresses_that_slot() {
        let jingle = Jingle::new(vec![PathBuf::from("j1.mp3")], vec![]);
        let mut args = HashMap::new();
        args.insert("no_jingle".to_string(), "1".to_string());
        let marked = Track::new(PathBuf::from("2.mp3"), 0.0, 0.0, true, args, 0.0);
        let playlist = vec![track(1, true), marked];
        for _ in 0..20 {
            let result = jingle.modify(&HashMap::new(), playlist.clone()).await.unwrap();
            assert_eq!(result.len(), 2, "marked slot must never receive a jingle insertion");
        }
    }
}
