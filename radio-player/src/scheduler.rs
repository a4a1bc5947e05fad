//! Playout Scheduler — the central loop: Advisor → Parser → Modifier chain
//! → per-track (ActiveModifier → ProcessManager → Observers) →
//! reload/exit, run as an explicit state machine.
//!
//! `i` (the raw step counter) and `song_i` (the cursor into the current
//! playlist) are kept distinct: the effective program of plays is
//! `song_i`-indexed into the playlist, and substitutions do not advance it.
//! `song_i` is what is handed to the active modifier and to observers; it
//! only advances when a step neither extends nor is skipped.

use crate::config::Config;
use crate::error::Result;
use crate::extension::{ActiveModifier, ActiveStep, Advisor, Observer, PlaylistModifier, ProcessHandle, ProcessManager};
use crate::parser;
use crate::procman::prefetch_hint;
use crate::signal::ShutdownController;
use radio_common::Track;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

const PARSE_RETRY_DELAY: Duration = Duration::from_secs(15);
const PROGRESS_TICK: Duration = Duration::from_secs(1);

/// Everything the loop needs, gathered once at startup as fields on a
/// single aggregate rather than free-standing globals.
pub struct Scheduler {
    config: Config,
    advisor: Arc<dyn Advisor>,
    active_modifier: Arc<dyn ActiveModifier>,
    procman: Arc<dyn ProcessManager>,
    modifiers: Vec<Arc<dyn PlaylistModifier>>,
    observers: Vec<Arc<dyn Observer>>,
    shutdown: Arc<ShutdownController>,
}

impl Scheduler {
    pub fn new(
        config: Config,
        advisor: Arc<dyn Advisor>,
        active_modifier: Arc<dyn ActiveModifier>,
        procman: Arc<dyn ProcessManager>,
        modifiers: Vec<Arc<dyn PlaylistModifier>>,
        observers: Vec<Arc<dyn Observer>>,
        shutdown: Arc<ShutdownController>,
    ) -> Self {
        Self {
            config,
            advisor,
            active_modifier,
            procman,
            modifiers,
            observers,
            shutdown,
        }
    }

    /// Runs until a graceful or forced exit is requested. Returns once the
    /// Stopping state's shutdown sequence has completed.
    pub async fn run(&self) -> Result<()> {
        self.active_modifier.arguments(self.config.startup_arg.as_deref()).await;

        loop {
            if self.shutdown.is_exit_pending() {
                break;
            }

            let (playlist, global_args) = match self.load_playlist().await {
                Some(loaded) => loaded,
                None => continue,
            };

            if playlist.is_empty() {
                warn!("playlist is empty, retrying");
                tokio::time::sleep(PARSE_RETRY_DELAY).await;
                continue;
            }

            self.notify_new_playlist(&playlist, &global_args).await;

            let return_pending = self.play_until_reload_or_exit(&playlist).await;
            if self.shutdown.is_exit_pending() {
                break;
            }
            if !return_pending {
                // Parser/advisor gave us nothing playable; back off before
                // trying again rather than spinning.
                tokio::time::sleep(PARSE_RETRY_DELAY).await;
            }
        }

        self.shut_down().await;
        Ok(())
    }

    /// Loads and folds one playlist through the modifier chain. Returns
    /// `None` if the caller should retry (advisor has nothing yet, or parse
    /// failed) after a back-off.
    async fn load_playlist(&self) -> Option<(Vec<Track>, HashMap<String, String>)> {
        let path = match self.advisor.advise(self.config.startup_arg.as_deref()).await {
            Some(p) => p,
            None => {
                tokio::time::sleep(PARSE_RETRY_DELAY).await;
                return None;
            }
        };

        let parsed = match parser::parse_playlist(&path) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to parse playlist, retrying");
                tokio::time::sleep(PARSE_RETRY_DELAY).await;
                return None;
            }
        };

        let mut tracks = parsed.tracks;
        for modifier in &self.modifiers {
            if let Some(rewritten) = modifier.modify(&parsed.global_args, tracks.clone()).await {
                tracks = rewritten;
            }
        }

        // `advise()` just committed this selection, which always flags a
        // pending reload on the first commit of a run. Drain that here so
        // the playlist we're about to play doesn't immediately look stale
        // to the first `new_playlist()` poll in the per-track loop.
        self.advisor.new_playlist();

        Some((tracks, parsed.global_args))
    }

    async fn notify_new_playlist(&self, playlist: &[Track], global_args: &HashMap<String, String>) {
        for observer in &self.observers {
            observer.on_new_playlist(playlist, global_args).await;
        }
        self.active_modifier.on_new_playlist(playlist).await;
    }

    /// Runs the per-track loop until the advisor asks for a reload or a
    /// shutdown signal arrives. Returns whether a reload was requested (as
    /// opposed to simply running out of playlist). Exposed (not just used
    /// internally by `run`) so integration tests can exercise exactly one
    /// pass without relying on `run`'s indefinite retry loop.
    pub async fn play_until_reload_or_exit(&self, playlist: &[Track]) -> bool {
        let n = playlist.len() as u64;
        let mut song_i: u64 = 0;

        loop {
            if self.shutdown.is_exit_pending() {
                return false;
            }

            let current_idx = (song_i % n) as usize;
            let next_idx = ((song_i + 1) % n) as usize;
            let current = &playlist[current_idx];
            let next = &playlist[next_idx];

            match self.active_modifier.play(song_i, Some(current), Some(next)).await {
                ActiveStep::Skip => {
                    song_i += 1;
                }
                ActiveStep::Play { current, next, extend } => {
                    for observer in &self.observers {
                        observer.on_new_track(song_i, &current, next.as_ref()).await;
                    }

                    match self.procman.play(&current, self.config.default_crossfade).await {
                        Err(e) => {
                            error!(error = %e, "failed to launch decoder, skipping track");
                            if !extend {
                                song_i += 1;
                            }
                        }
                        Ok(handle) => {
                            self.run_focus_window(song_i, &current, handle.as_ref()).await;
                            prefetch_hint(next.as_ref().map(Track::path).unwrap_or_else(|| current.path()));
                            if !extend {
                                song_i += 1;
                            }
                        }
                    }
                }
            }

            // Re-probe the advisor every step, not just at load time, so a
            // band boundary crossed mid-playback or an edited playlist file
            // is caught before the next track starts rather than only on
            // the next full reload.
            self.advisor.advise(self.config.startup_arg.as_deref()).await;
            if self.advisor.new_playlist() {
                return true;
            }
            if self.shutdown.is_exit_pending() {
                return false;
            }
        }
    }

    async fn run_focus_window(&self, song_i: u64, current: &Track, handle: &dyn ProcessHandle) {
        let duration = handle.duration();
        let focus_window = current.focus_window(duration);
        let started_at = Instant::from_std(handle.started_at());
        let end = started_at + Duration::from_secs_f64(focus_window);

        loop {
            let now = Instant::now();
            if now >= end || !handle.is_alive() {
                break;
            }
            let elapsed = now.duration_since(started_at).as_secs_f64();
            for observer in &self.observers {
                observer.progress(song_i, current, elapsed, duration, focus_window).await;
            }
            let remaining = end.saturating_duration_since(now);
            tokio::time::sleep(remaining.min(PROGRESS_TICK)).await;
        }
    }

    async fn shut_down(&self) {
        info!("stopping all decoder processes");
        self.procman.stop_all(Some(Duration::from_secs(5))).await;
        for observer in &self.observers {
            observer.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct FixedAdvisor {
        path: PathBuf,
        reload_after: AtomicU64,
    }

    #[async_trait]
    impl Advisor for FixedAdvisor {
        async fn advise(&self, _arguments: Option<&str>) -> Option<PathBuf> {
            Some(self.path.clone())
        }
        fn new_playlist(&self) -> bool {
            self.reload_after.fetch_sub(1, Ordering::SeqCst);
            self.reload_after.load(Ordering::SeqCst) == 0
        }
    }

    struct PassthroughActiveModifier;

    #[async_trait]
    impl ActiveModifier for PassthroughActiveModifier {
        async fn play(&self, _index: u64, current: Option<&Track>, next: Option<&Track>) -> ActiveStep {
            match current {
                Some(c) => ActiveStep::Play {
                    current: c.clone(),
                    next: next.cloned(),
                    extend: false,
                },
                None => ActiveStep::Skip,
            }
        }
    }

    struct InstantHandle {
        started_at: std::time::Instant,
    }

    impl ProcessHandle for InstantHandle {
        fn started_at(&self) -> std::time::Instant {
            self.started_at
        }
        fn duration(&self) -> f64 {
            0.0
        }
        fn is_alive(&self) -> bool {
            false
        }
        fn path(&self) -> &Path {
            Path::new("x.mp3")
        }
    }

    struct CountingProcman(Mutex<Vec<PathBuf>>);

    #[async_trait]
    impl ProcessManager for CountingProcman {
        async fn duration(&self, _path: &Path) -> Option<f64> {
            Some(0.0)
        }
        async fn play(&self, track: &Track, _fade_time: f64) -> Result<Arc<dyn ProcessHandle>> {
            self.0.lock().unwrap().push(track.path().to_path_buf());
            Ok(Arc::new(InstantHandle {
                started_at: std::time::Instant::now(),
            }))
        }
        async fn anything_playing(&self) -> bool {
            false
        }
        async fn stop_all(&self, _timeout: Option<Duration>) {}
        async fn wait_all(&self, _timeout: Option<Duration>) {}
    }

    fn track(path: &str) -> Track {
        Track::new(path, 0.0, 0.0, true, HashMap::new(), 0.0)
    }

    #[tokio::test]
    async fn plays_every_track_once_per_pass_before_reload() {
        let playlist = vec![track("a.mp3"), track("b.mp3")];
        let procman = Arc::new(CountingProcman(Mutex::new(Vec::new())));
        let advisor = Arc::new(FixedAdvisor {
            path: PathBuf::from("unused.playlist"),
            // load_playlist() drains one pending-reload signal up front, so
            // this needs one more decrement than the three per-step polls
            // it takes to land on "a, b, a" before reload fires.
            reload_after: AtomicU64::new(4),
        });
        let scheduler = Scheduler::new(
            Config {
                playlist_root: PathBuf::new(),
                control_dir: PathBuf::new(),
                extensions_file: PathBuf::new(),
                decoder_program: "ffplay".to_string(),
                log_file: PathBuf::new(),
                log_max_bytes: 1000,
                default_crossfade: 0.0,
                duration_cache_ttl_secs: 3600,
                bands: Default::default(),
                startup_arg: None,
            },
            advisor,
            Arc::new(PassthroughActiveModifier),
            procman.clone(),
            Vec::new(),
            Vec::new(),
            ShutdownController::new(),
        );

        scheduler.play_until_reload_or_exit(&playlist).await;
        let played = procman.0.lock().unwrap().clone();
        assert_eq!(played, vec![PathBuf::from("a.mp3"), PathBuf::from("b.mp3"), PathBuf::from("a.mp3")]);
    }
}
