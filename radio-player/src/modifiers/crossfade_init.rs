//! Crossfade-init modifier: sets `fade_in`/`fade_out` from a per-track
//! `crossfade=` argument or the global default, and derives
//! `focus_time_offset` so consecutive official tracks overlap by the
//! crossfade duration. Non-official tracks (jingles, inserted filler) are
//! left untouched; only official tracks carry the crossfade handoff.

use crate::extension::PlaylistModifier;
use async_trait::async_trait;
use radio_common::Track;
use std::collections::HashMap;

pub struct CrossfadeInit {
    default_crossfade: f64,
}

impl CrossfadeInit {
    pub fn new(default_crossfade: f64) -> Self {
        Self { default_crossfade }
    }
}

#[async_trait]
impl PlaylistModifier for CrossfadeInit {
    async fn modify(
        &self,
        global_args: &HashMap<String, String>,
        playlist: Vec<Track>,
    ) -> Option<Vec<Track>> {
        let global_crossfade: f64 = global_args
            .get("crossfade")
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.default_crossfade);

        let result = playlist
            .into_iter()
            .map(|track| {
                if !track.official() {
                    return track;
                }
                let crossfade: f64 = track
                    .arg("crossfade")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(global_crossfade);
                if crossfade <= 0.0 {
                    return track;
                }
                track
                    .with_fades(crossfade, crossfade)
                    .with_focus_time_offset(-crossfade)
            })
            .collect();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn applies_global_default_crossfade() {
        let modifier = CrossfadeInit::new(3.0);
        let track = Track::new(PathBuf::from("a.mp3"), 0.0, 0.0, true, HashMap::new(), 0.0);
        let result = modifier.modify(&HashMap::new(), vec![track]).await.unwrap();
        assert_eq!(result[0].fade_in(), 3.0);
        assert_eq!(result[0].fade_out(), 3.0);
        assert_eq!(result[0].focus_time_offset(), -3.0);
    }

    #[tokio::test]
    async fn per_track_crossfade_overrides_global() {
        let modifier = CrossfadeInit::new(3.0);
        let mut args = HashMap::new();
        args.insert("crossfade".to_string(), "1.5".to_string());
        let track = Track::new(PathBuf::from("a.mp3"), 0.0, 0.0, true, args, 0.0);
        let result = modifier.modify(&HashMap::new(), vec![track]).await.unwrap();
        assert_eq!(result[0].fade_in(), 1.5);
    }

    #[tokio::test]
    async fn zero_crossfade_leaves_track_unchanged() {
        let modifier = CrossfadeInit::new(0.0);
        let track = Track::new(PathBuf::from("a.mp3"), 0.0, 0.0, true, HashMap::new(), 0.0);
        let result = modifier.modify(&HashMap::new(), vec![track]).await.unwrap();
        assert_eq!(result[0].fade_in(), 0.0);
    }

    #[tokio::test]
    async fn non_official_tracks_are_never_faded() {
        let modifier = CrossfadeInit::new(3.0);
        let jingle = Track::new(PathBuf::from("j.mp3"), 0.0, 0.0, false, HashMap::new(), 0.0);
        let result = modifier.modify(&HashMap::new(), vec![jingle]).await.unwrap();
        assert_eq!(result[0].fade_in(), 0.0);
        assert_eq!(result[0].fade_out(), 0.0);
        assert_eq!(result[0].focus_time_offset(), 0.0);
    }
}
