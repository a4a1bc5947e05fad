//! Bootstrap configuration: a TOML file plus command-line overrides. No
//! database layer — this system has no persistent store, only playlist
//! files and well-known control files on disk.

use crate::error::{PlayerError, Result};
use radio_common::time_band::BandSchedule;
use serde::Deserialize;
use std::path::PathBuf;

/// Bootstrap configuration loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root of the `<root>/<day-of-week>/{late_night,morning,day,night}`
    /// playlist directory layout.
    pub playlist_root: PathBuf,

    /// Directory holding the well-known control files (`toplay`, `progress`,
    /// `playlist`, `skip`, `list`). Defaults to the OS temp directory.
    pub control_dir: PathBuf,

    /// Path to the extension registration table.
    pub extensions_file: PathBuf,

    /// External decoder program invoked per track.
    pub decoder_program: String,

    /// Rotating log file path.
    pub log_file: PathBuf,

    /// Log file truncate-and-rewind threshold in bytes.
    pub log_max_bytes: u64,

    /// Default crossfade in seconds, used when a playlist's `|crossfade=`
    /// global argument is absent.
    pub default_crossfade: f64,

    /// Duration-probe cache TTL in seconds.
    pub duration_cache_ttl_secs: u64,

    /// Time-of-day band boundaries.
    #[serde(default)]
    pub bands: BandSchedule,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            playlist_root: default_playlist_root(),
            control_dir: std::env::temp_dir(),
            extensions_file: PathBuf::from("extensions.toml"),
            decoder_program: "ffplay".to_string(),
            log_file: std::env::temp_dir().join("radio_player_log"),
            log_max_bytes: 2_621_440,
            default_crossfade: 5.0,
            duration_cache_ttl_secs: 2 * 60 * 60,
            bands: BandSchedule::default(),
        }
    }
}

fn default_playlist_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playlists")
}

/// Runtime configuration: the parsed TOML plus command-line overrides and
/// the startup argument string (equivalent to the original's
/// `sys.argv[1:]` passed through to the advisor/active modifier).
#[derive(Debug, Clone)]
pub struct Config {
    pub playlist_root: PathBuf,
    pub control_dir: PathBuf,
    pub extensions_file: PathBuf,
    pub decoder_program: String,
    pub log_file: PathBuf,
    pub log_max_bytes: u64,
    pub default_crossfade: f64,
    pub duration_cache_ttl_secs: u64,
    pub bands: BandSchedule,
    /// Free-form startup argument (e.g. `list:/path/to/fixed.playlist`),
    /// forwarded to the advisor and active modifier at startup.
    pub startup_arg: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file, applying command-line overrides.
    ///
    /// Missing config files are not an error: defaults apply, and only
    /// explicit CLI overrides take priority over them.
    pub async fn load(
        config_path: &std::path::Path,
        playlist_root_override: Option<PathBuf>,
        control_dir_override: Option<PathBuf>,
        startup_arg: Option<String>,
    ) -> Result<Self> {
        let toml_config = match tokio::fs::read_to_string(config_path).await {
            Ok(contents) => toml::from_str::<TomlConfig>(&contents)
                .map_err(|e| PlayerError::Config(format!("failed to parse TOML: {e}")))?,
            Err(_) => TomlConfig::default(),
        };

        Ok(Config {
            playlist_root: playlist_root_override.unwrap_or(toml_config.playlist_root),
            control_dir: control_dir_override.unwrap_or(toml_config.control_dir),
            extensions_file: toml_config.extensions_file,
            decoder_program: toml_config.decoder_program,
            log_file: toml_config.log_file,
            log_max_bytes: toml_config.log_max_bytes,
            default_crossfade: toml_config.default_crossfade,
            duration_cache_ttl_secs: toml_config.duration_cache_ttl_secs,
            bands: toml_config.bands,
            startup_arg,
        })
    }

    /// `…/toplay` — the active modifier's substitution queue.
    pub fn toplay_file(&self) -> PathBuf {
        self.control_dir.join("radio_player_toplay")
    }

    /// `…/progress` — human-readable current-position line.
    pub fn progress_file(&self) -> PathBuf {
        self.control_dir.join("radio_player_progress")
    }

    /// `…/playlist` — current playlist with `>` prefix on the playing row.
    pub fn playlist_file(&self) -> PathBuf {
        self.control_dir.join("radio_player_playlist")
    }

    /// `…/skip` — presence triggers an immediate skip of the current track.
    pub fn skip_file(&self) -> PathBuf {
        self.control_dir.join("radio_player_skip")
    }

    /// `…/list` — if present, forces the advisor to use it.
    pub fn override_list_file(&self) -> PathBuf {
        self.control_dir.join("radio_player_list")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_config_file_uses_defaults() {
        let cfg = Config::load(
            std::path::Path::new("/nonexistent/radio-player.toml"),
            None,
            None,
            None,
        )
        .await
        .unwrap();
        assert_eq!(cfg.default_crossfade, 5.0);
        assert_eq!(cfg.decoder_program, "ffplay");
    }

    #[tokio::test]
    async fn overrides_win_over_toml_defaults() {
        let root = PathBuf::from("/custom/playlists");
        let cfg = Config::load(
            std::path::Path::new("/nonexistent/radio-player.toml"),
            Some(root.clone()),
            None,
            Some("list:/tmp/x".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(cfg.playlist_root, root);
        assert_eq!(cfg.startup_arg.as_deref(), Some("list:/tmp/x"));
    }
}
