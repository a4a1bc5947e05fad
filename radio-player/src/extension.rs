//! Extension contracts — the traits a pluggable component implements,
//! reshaped as Rust trait objects so the scheduler can hold an open-ended
//! set of them behind a static registration table built at startup.
//! `async fn` in a dyn trait needs the `async-trait` crate.

use async_trait::async_trait;
use radio_common::Track;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Passive sink notified of playlist/track/progress/shutdown events.
/// Exceptions (here, `Err`/panics) are caught by the scheduler and logged;
/// they must never abort the loop.
#[async_trait]
pub trait Observer: Send + Sync {
    /// Stable name used for IMC registration; `None` if this observer never
    /// needs to be addressed directly.
    fn imc_name(&self) -> Option<&str> {
        None
    }

    async fn on_new_playlist(&self, _playlist: &[Track], _global_args: &HashMap<String, String>) {}

    async fn on_new_track(&self, _index: u64, _current: &Track, _next: Option<&Track>) {}

    /// Called at ~1 Hz during playback. Must not block for more than a
    /// fraction of a second.
    async fn progress(&self, _index: u64, _current: &Track, _elapsed: f64, _total: f64, _real_total: f64) {
    }

    async fn shutdown(&self) {}

    /// Handle a point-to-point `imc.send` or `imc.broadcast` addressed to
    /// this observer's `imc_name()`.
    async fn imc_data(&self, _source: &str, _data: Value, _broadcast: bool) -> Option<Value> {
        None
    }
}

/// Ordered chain step that rewrites a parsed playlist. Returning `None`
/// means "no change" — the scheduler keeps the previous value.
#[async_trait]
pub trait PlaylistModifier: Send + Sync {
    async fn modify(
        &self,
        global_args: &HashMap<String, String>,
        playlist: Vec<Track>,
    ) -> Option<Vec<Track>>;
}

/// Decides which playlist plays and when to reload. At most one may be
/// registered.
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Choose a playlist path, or `None` if nothing is playable yet.
    async fn advise(&self, arguments: Option<&str>) -> Option<PathBuf>;

    /// Whether the scheduler should reload (new band, or the current file's
    /// mtime advanced).
    fn new_playlist(&self) -> bool;

    fn imc_name(&self) -> Option<&str> {
        Some("advisor")
    }

    async fn imc_data(&self, _source: &str, _data: Value, _broadcast: bool) -> Option<Value> {
        None
    }
}

/// What the active modifier decided for this step.
pub enum ActiveStep {
    /// Play `current`, with `next` as advisory-only metadata for observers.
    /// `extend = true` means "don't advance the underlying cursor this
    /// step".
    Play {
        current: Track,
        next: Option<Track>,
        extend: bool,
    },
    /// Skip this step entirely: advance the cursor without calling the
    /// process manager.
    Skip,
}

/// The one extension allowed to rewrite `(current, next)` at each track
/// boundary. At most one may be registered.
#[async_trait]
pub trait ActiveModifier: Send + Sync {
    /// Called once at startup with the raw startup argument string.
    async fn arguments(&self, _arguments: Option<&str>) {}

    async fn on_new_playlist(&self, _playlist: &[Track]) {}

    async fn play(&self, index: u64, current: Option<&Track>, next: Option<&Track>) -> ActiveStep;

    fn imc_name(&self) -> Option<&str> {
        Some("activemod")
    }

    async fn imc_data(&self, _source: &str, _data: Value, _broadcast: bool) -> Option<Value> {
        None
    }
}

/// A running (or finished) supervised decoder process.
pub trait ProcessHandle: Send + Sync {
    fn started_at(&self) -> std::time::Instant;
    fn duration(&self) -> f64;
    /// Non-blocking liveness check; reaps the child if it has exited.
    fn is_alive(&self) -> bool;
    fn path(&self) -> &std::path::Path;
}

/// Starts/stops/awaits external decoder processes for a [`Track`]; probes
/// duration; tracks the live set. Exactly one must be registered.
#[async_trait]
pub trait ProcessManager: Send + Sync {
    /// Best-effort duration probe, cached with a TTL.
    async fn duration(&self, path: &std::path::Path) -> Option<f64>;

    /// Start a supervised decoder rendering `track.path()`, with the given
    /// fade time applied to `track.fade_in()`/`track.fade_out()`.
    async fn play(
        &self,
        track: &Track,
        fade_time: f64,
    ) -> crate::error::Result<std::sync::Arc<dyn ProcessHandle>>;

    /// Reaps finished processes; returns whether any remain.
    async fn anything_playing(&self) -> bool;

    async fn stop_all(&self, timeout: Option<Duration>);

    async fn wait_all(&self, timeout: Option<Duration>);

    /// Paths of the currently live decoder processes. Default empty;
    /// implementations backed by real processes override it.
    async fn live_paths(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}
