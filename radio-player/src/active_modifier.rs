//! Default ActiveModifier — the "toplay queue" substitution: requests
//! queued to a well-known file get played next, displacing (not discarding)
//! the track the scheduler would otherwise have played, which is pushed
//! onto an "originals" stack and resumed once the queue drains.
//!
//! A queued path may carry a leading `!` to mark it non-official (an
//! unprefixed path is official, matching the playlist grammar's default).
//! The substituted track's fades are synthesized from the track it
//! displaces rather than copied outright: it fades in to match whatever the
//! outgoing track was fading out of, and fades out only if an official
//! track is still queued to follow it.

use crate::extension::{ActiveModifier, ActiveStep};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use radio_common::Track;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

struct State {
    originals: Vec<Track>,
    /// Timestamp of the last substitution, used to guard against "time
    /// bleed": a queued request that has been sitting for a long time
    /// should not suddenly fire well after it was relevant. Compared as a
    /// full timestamp rather than truncated to the hour.
    last_substitution_at: Option<DateTime<Local>>,
}

/// Default active modifier backed by `toplay_file`.
pub struct ToplayQueue {
    toplay_file: PathBuf,
    max_bleed: chrono::Duration,
    state: Mutex<State>,
}

impl ToplayQueue {
    pub fn new(toplay_file: PathBuf, max_bleed_secs: i64) -> Self {
        Self {
            toplay_file,
            max_bleed: chrono::Duration::seconds(max_bleed_secs),
            state: Mutex::new(State {
                originals: Vec::new(),
                last_substitution_at: None,
            }),
        }
    }

    fn read_queue(&self) -> Vec<String> {
        std::fs::read_to_string(&self.toplay_file)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .filter(|l| !l.trim().is_empty())
            .collect()
    }

    fn write_queue(&self, remaining: &[String]) {
        let contents = remaining.join("\n");
        if let Err(e) = std::fs::write(&self.toplay_file, contents) {
            warn!(error = %e, "failed to rewrite toplay file");
        }
    }

    fn push_request(&self, path: &str) {
        let mut lines = self.read_queue();
        lines.push(path.to_string());
        self.write_queue(&lines);
    }
}

#[async_trait]
impl ActiveModifier for ToplayQueue {
    async fn arguments(&self, _arguments: Option<&str>) {}

    async fn on_new_playlist(&self, _playlist: &[Track]) {
        self.state.lock().unwrap().originals.clear();
    }

    async fn play(&self, _index: u64, current: Option<&Track>, next: Option<&Track>) -> ActiveStep {
        let mut queue = self.read_queue();

        if !queue.is_empty() {
            let now = Local::now();
            let mut state = self.state.lock().unwrap();
            if let Some(last) = state.last_substitution_at {
                if now - last > self.max_bleed {
                    // The queue has been stale for too long; drop it rather
                    // than play something long out of context.
                    warn!("toplay request exceeded max bleed window, discarding");
                    self.write_queue(&[]);
                    queue.clear();
                }
            }
            if !queue.is_empty() {
                let requested_path = queue.remove(0);
                self.write_queue(&queue);
                if let Some(current) = current {
                    state.originals.push(current.clone());
                }
                state.last_substitution_at = Some(now);
                drop(state);

                let (official, path) = match requested_path.strip_prefix('!') {
                    Some(rest) => (false, rest.to_string()),
                    None => (true, requested_path),
                };

                let outgoing_fade_out = current.map(|t| t.fade_out()).unwrap_or(0.0);
                let fade_in = if outgoing_fade_out > 0.0 { outgoing_fade_out } else { 0.0 };
                let fade_out = if next.map_or(false, |t| t.official()) {
                    current.map(|t| t.fade_in()).unwrap_or(0.0)
                } else {
                    0.0
                };
                let substituted = Track::new(path, fade_in, fade_out, official, HashMap::new(), 0.0)
                    .with_focus_time_offset(-fade_in);
                info!(path = %substituted.path().display(), "playing toplay request");
                return ActiveStep::Play {
                    current: substituted,
                    next: next.cloned(),
                    extend: true,
                };
            }
        }

        let mut state = self.state.lock().unwrap();
        if let Some(original) = state.originals.pop() {
            info!(path = %original.path().display(), "resuming original track after toplay queue drained");
            return ActiveStep::Play {
                current: original,
                next: next.cloned(),
                extend: false,
            };
        }
        drop(state);

        match current {
            Some(track) => ActiveStep::Play {
                current: track.clone(),
                next: next.cloned(),
                extend: false,
            },
            None => ActiveStep::Skip,
        }
    }

    fn imc_name(&self) -> Option<&str> {
        Some("activemod")
    }

    async fn imc_data(&self, _source: &str, data: Value, _broadcast: bool) -> Option<Value> {
        let op = data.get("op")?.as_str()?;
        match op {
            "add" => {
                let path = data.get("path")?.as_str()?;
                self.push_request(path);
                Some(serde_json::json!({"ok": true}))
            }
            "list" => Some(serde_json::json!({"queue": self.read_queue()})),
            "clear" => {
                self.write_queue(&[]);
                Some(serde_json::json!({"ok": true}))
            }
            _ => None,
        }
    }
}
