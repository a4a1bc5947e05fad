//! Default Advisor (C4) — time-band playlist selection: a
//! `<root>/<weekday>/<band>.playlist` layout, auto-created with placeholder
//! files, reloaded on band change or when the chosen file's mtime advances,
//! with an `override_list_file` / `"list:"` startup-arg escape hatch.
//!
//! `new_playlist()` re-probes the same selection logic `advise()` uses (band,
//! override file, mtime) rather than just reading a flag set once at load
//! time, so a band boundary crossed mid-playback or an edited playlist file
//! is detected on the next track step, not only the next full reload.

use crate::extension::Advisor;
use async_trait::async_trait;
use chrono::Local;
use radio_common::time_band::{weekday_dir_name, Band, BandSchedule};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;
use tracing::{info, warn};

struct Selection {
    path: PathBuf,
    mtime: Option<SystemTime>,
    band: Band,
}

/// Picks `<root>/<weekday>/<band>.playlist`, falling back to an override
/// file (`"list:"` startup arg / `override_list_file`) when present.
pub struct TimeBandAdvisor {
    root: PathBuf,
    bands: BandSchedule,
    override_list_file: PathBuf,
    state: Mutex<Option<Selection>>,
    reload_pending: Mutex<bool>,
}

impl TimeBandAdvisor {
    pub fn new(root: PathBuf, bands: BandSchedule, override_list_file: PathBuf) -> Self {
        Self {
            root,
            bands,
            override_list_file,
            state: Mutex::new(None),
            reload_pending: Mutex::new(false),
        }
    }

    /// Pre-creates `<root>/<weekday>/<band>.playlist` placeholders for every
    /// band, matching the original's startup directory scaffolding.
    pub fn ensure_directory_layout(&self) -> std::io::Result<()> {
        for weekday in [
            "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
        ] {
            let dir = self.root.join(weekday);
            std::fs::create_dir_all(&dir)?;
            for band in Band::all() {
                let path = dir.join(format!("{}.playlist", band.dir_name()));
                if !path.exists() {
                    std::fs::write(&path, "")?;
                }
            }
        }
        Ok(())
    }

    fn current_band_path(&self) -> PathBuf {
        let now = Local::now();
        let weekday = weekday_dir_name(now);
        let band = self.bands.band_for(now);
        self.root
            .join(weekday)
            .join(format!("{}.playlist", band.dir_name()))
    }

    /// Resolves the same path/band that `advise()` would pick right now,
    /// without touching the startup-argument escape hatch (that one only
    /// ever applies at the very first selection).
    fn probe_current_selection(&self) -> (PathBuf, Band) {
        if self.override_list_file.exists() {
            return (self.override_list_file.clone(), Band::Day);
        }
        (self.current_band_path(), self.bands.band_for(Local::now()))
    }
}

#[async_trait]
impl Advisor for TimeBandAdvisor {
    async fn advise(&self, arguments: Option<&str>) -> Option<PathBuf> {
        if let Some(list_path) = arguments.and_then(|a| a.strip_prefix("list:")) {
            let path = PathBuf::from(list_path);
            if path.exists() {
                self.commit(path.clone(), Band::Day);
                return Some(path);
            }
            warn!(path = %path.display(), "startup list: override not found");
        }

        if self.override_list_file.exists() {
            self.commit(self.override_list_file.clone(), Band::Day);
            return Some(self.override_list_file.clone());
        }

        let path = self.current_band_path();
        if !path.exists() {
            warn!(path = %path.display(), "no playlist for current band");
            return None;
        }
        let band = self.bands.band_for(Local::now());
        self.commit(path.clone(), band);
        Some(path)
    }

    /// Re-probes the current band/override selection on every call (cheap:
    /// a directory check plus at most one `stat`), so a band boundary or an
    /// edited playlist file is picked up the next time this is polled rather
    /// than only the next time `advise()` happens to be re-run from a full
    /// reload.
    fn new_playlist(&self) -> bool {
        let (path, band) = self.probe_current_selection();
        self.commit(path, band);
        let mut pending = self.reload_pending.lock().unwrap();
        let was_pending = *pending;
        *pending = false;
        was_pending
    }

    fn imc_name(&self) -> Option<&str> {
        Some("advisor")
    }
}

impl TimeBandAdvisor {
    /// Records `path`/`band` as the current selection, setting
    /// `reload_pending` when it differs from what was previously recorded
    /// (including the very first call, which always counts as a change).
    /// Callers that only want to observe a change that happened since their
    /// own last selection, not re-flag their own initial one, must drain the
    /// pending flag immediately after the first `commit` of a fresh load.
    fn commit(&self, path: PathBuf, band: Band) {
        let mtime = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        let mut state = self.state.lock().unwrap();
        let reload = match state.as_ref() {
            None => true,
            Some(prev) => prev.path != path || prev.band != band || prev.mtime != mtime,
        };
        if reload {
            info!(path = %path.display(), "advisor selected playlist");
            *self.reload_pending.lock().unwrap() = true;
        }
        *state = Some(Selection { path, mtime, band });
    }
}
