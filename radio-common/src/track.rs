//! The [`Track`] model — an immutable description of one playable item.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One playable item plus its fade/offset timing.
///
/// Construction takes all six fields; there is no mutation after
/// construction — modifiers produce replacement `Track`s rather than editing
/// one in place. Equality is structural on
/// `(path, fade_in, fade_out, official, args, offset)`; `focus_time_offset`
/// is deliberately excluded so modifiers can recompute it without breaking
/// substitution detection.
#[derive(Debug, Clone)]
pub struct Track {
    path: PathBuf,
    fade_in: f64,
    fade_out: f64,
    official: bool,
    args: HashMap<String, String>,
    offset: f64,
    focus_time_offset: f64,
}

impl Track {
    /// Construct a new track. `fade_in`/`fade_out`/`offset` are clamped to
    /// be non-negative; `focus_time_offset` is clamped to be non-positive.
    pub fn new(
        path: impl Into<PathBuf>,
        fade_in: f64,
        fade_out: f64,
        official: bool,
        args: HashMap<String, String>,
        offset: f64,
    ) -> Self {
        Self {
            path: path.into(),
            fade_in: fade_in.max(0.0),
            fade_out: fade_out.max(0.0),
            official,
            args,
            offset: offset.max(0.0),
            focus_time_offset: 0.0,
        }
    }

    /// Return a copy with `focus_time_offset` set. Clamped to `<= 0`.
    pub fn with_focus_time_offset(mut self, offset: f64) -> Self {
        self.focus_time_offset = offset.min(0.0);
        self
    }

    /// Return a copy with `fade_in`/`fade_out` replaced (both clamped `>= 0`).
    pub fn with_fades(mut self, fade_in: f64, fade_out: f64) -> Self {
        self.fade_in = fade_in.max(0.0);
        self.fade_out = fade_out.max(0.0);
        self
    }

    /// Return a copy with `official` replaced.
    pub fn with_official(mut self, official: bool) -> Self {
        self.official = official;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fade_in(&self) -> f64 {
        self.fade_in
    }

    pub fn fade_out(&self) -> f64 {
        self.fade_out
    }

    pub fn official(&self) -> bool {
        self.official
    }

    pub fn args(&self) -> &HashMap<String, String> {
        &self.args
    }

    /// Look up a per-track hint; absence means "default".
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }

    /// Truthy per-track flag: present and not `"0"`/`"false"`/empty.
    pub fn flag(&self, key: &str) -> bool {
        match self.arg(key) {
            None => false,
            Some(v) => !matches!(v, "" | "0" | "false"),
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn focus_time_offset(&self) -> f64 {
        self.focus_time_offset
    }

    /// Length of the scheduler's focus window, given the media `duration`:
    /// `duration + focus_time_offset` (the latter is `<= 0`).
    pub fn focus_window(&self, duration: f64) -> f64 {
        (duration + self.focus_time_offset).max(0.0)
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.fade_in == other.fade_in
            && self.fade_out == other.fade_out
            && self.official == other.official
            && self.args == other.args
            && self.offset == other.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(path: &str) -> Track {
        Track::new(path, 0.0, 0.0, true, HashMap::new(), 0.0)
    }

    #[test]
    fn equality_ignores_focus_time_offset() {
        let a = track("/music/a.mp3").with_focus_time_offset(-5.0);
        let b = track("/music/a.mp3").with_focus_time_offset(-2.0);
        assert_eq!(a, b);
    }

    #[test]
    fn equality_considers_args() {
        let mut args = HashMap::new();
        args.insert("crossfade".to_string(), "3".to_string());
        let a = Track::new("/music/a.mp3", 0.0, 0.0, true, args, 0.0);
        let b = track("/music/a.mp3");
        assert_ne!(a, b);
    }

    #[test]
    fn focus_window_never_negative() {
        let t = track("/x.mp3").with_focus_time_offset(-1000.0);
        assert_eq!(t.focus_window(5.0), 0.0);
    }

    #[test]
    fn flag_is_truthy_semantics() {
        let mut args = HashMap::new();
        args.insert("no_jingle".to_string(), "0".to_string());
        let t = Track::new("/x.mp3", 0.0, 0.0, true, args, 0.0);
        assert!(!t.flag("no_jingle"));

        let mut args = HashMap::new();
        args.insert("no_jingle".to_string(), "1".to_string());
        let t = Track::new("/x.mp3", 0.0, 0.0, true, args, 0.0);
        assert!(t.flag("no_jingle"));
    }

    #[test]
    fn offset_and_fades_are_clamped_nonnegative() {
        let t = Track::new("/x.mp3", -1.0, -2.0, true, HashMap::new(), -3.0);
        assert_eq!(t.fade_in(), 0.0);
        assert_eq!(t.fade_out(), 0.0);
        assert_eq!(t.offset(), 0.0);
    }
}
