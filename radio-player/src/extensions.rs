//! Extension registration — reads `extensions.toml` to decide which
//! built-ins to wire in, then registers each one with the [`Imc`] bus.
//! What would be dynamic module discovery elsewhere is collapsed here into
//! a static table assembled once at startup.

use crate::active_modifier::ToplayQueue;
use crate::advisor::TimeBandAdvisor;
use crate::config::Config;
use crate::error::{PlayerError, Result};
use crate::extension::{ActiveModifier, Advisor, Observer, PlaylistModifier, ProcessManager};
use crate::imc::{Imc, ImcEndpoint};
use crate::modifiers::{CrossfadeInit, Jingle, Shuffle};
use crate::observers::{PlayCounter, PlaylistFileWriter, ProgressFileWriter, SkipWatcher};
use async_trait::async_trait;
use radio_common::Track;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    pub shuffle: bool,
    pub jingle: bool,
    pub jingle_primary: Vec<PathBuf>,
    pub jingle_secondary: Vec<PathBuf>,
    pub progress_file_observer: bool,
    pub playlist_file_observer: bool,
    pub skip_watcher: bool,
    pub play_counter: bool,
    pub play_counter_file: PathBuf,
    pub toplay_bleed_secs: i64,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            shuffle: true,
            jingle: false,
            jingle_primary: Vec::new(),
            jingle_secondary: Vec::new(),
            progress_file_observer: true,
            playlist_file_observer: true,
            skip_watcher: true,
            play_counter: true,
            play_counter_file: PathBuf::from("radio_player_play_counts"),
            toplay_bleed_secs: 3600,
        }
    }
}

impl ExtensionsConfig {
    pub async fn load(path: &std::path::Path) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }
}

/// Every component assembled for one run. The scheduler consumes this
/// directly; singleton traits (Advisor/ActiveModifier/ProcessManager) are
/// `Arc`s rather than `Vec`s, enforcing the spec's "at most one" invariant
/// at the type level.
pub struct Extensions {
    pub playlist_modifiers: Vec<Arc<dyn PlaylistModifier>>,
    pub observers: Vec<Arc<dyn Observer>>,
    pub advisor: Arc<dyn Advisor>,
    pub active_modifier: Arc<dyn ActiveModifier>,
}

struct ObserverImcEndpoint(Arc<dyn Observer>);

#[async_trait]
impl ImcEndpoint for ObserverImcEndpoint {
    async fn handle(&self, source: &str, payload: Value, broadcast: bool) -> Option<Value> {
        self.0.imc_data(source, payload, broadcast).await
    }
}

struct AdvisorImcEndpoint(Arc<dyn Advisor>);

#[async_trait]
impl ImcEndpoint for AdvisorImcEndpoint {
    async fn handle(&self, source: &str, payload: Value, broadcast: bool) -> Option<Value> {
        self.0.imc_data(source, payload, broadcast).await
    }
}

struct ActiveModifierImcEndpoint(Arc<dyn ActiveModifier>);

#[async_trait]
impl ImcEndpoint for ActiveModifierImcEndpoint {
    async fn handle(&self, source: &str, payload: Value, broadcast: bool) -> Option<Value> {
        self.0.imc_data(source, payload, broadcast).await
    }
}

/// The mandatory `"procman"` endpoint: a numbered operation protocol over
/// the process manager. `{op:0}` pings, `{op:1, arg:path}` probes duration,
/// `{op:2, timeout?}` stops everything, `{op:3}` lists live paths,
/// `{op:4}` reports whether anything is playing, and
/// `{op:5, arg:{path,...}, fade_in_time?, fade_out_time?}` starts playback.
/// `Track` has no `Deserialize` impl, so `op:5`'s track fields are read off
/// the raw JSON object rather than deserialized wholesale.
struct ProcessManagerImcEndpoint(Arc<dyn ProcessManager>);

#[async_trait]
impl ImcEndpoint for ProcessManagerImcEndpoint {
    async fn handle(&self, _source: &str, payload: Value, _broadcast: bool) -> Option<Value> {
        let op = payload.get("op")?.as_u64()?;
        match op {
            0 => Some(serde_json::json!({"op": 0, "arg": "pong"})),
            1 => {
                let path = payload.get("arg")?.as_str()?;
                let duration = self.0.duration(Path::new(path)).await;
                Some(serde_json::json!({"op": 1, "arg": duration}))
            }
            2 => {
                let timeout = payload
                    .get("timeout")
                    .and_then(|v| v.as_f64())
                    .map(Duration::from_secs_f64);
                self.0.stop_all(timeout).await;
                Some(serde_json::json!({"op": 2, "arg": "ok"}))
            }
            3 => {
                let paths: Vec<String> = self
                    .0
                    .live_paths()
                    .await
                    .into_iter()
                    .map(|p| p.display().to_string())
                    .collect();
                Some(serde_json::json!({"op": 3, "arg": paths}))
            }
            4 => {
                let playing = self.0.anything_playing().await;
                Some(serde_json::json!({"op": 4, "arg": playing}))
            }
            5 => {
                let arg = payload.get("arg")?;
                let path = arg.get("path").and_then(|v| v.as_str())?;
                let fade_in = arg.get("fade_in").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let fade_out = arg.get("fade_out").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let official = arg.get("official").and_then(|v| v.as_bool()).unwrap_or(true);
                let offset = arg.get("offset").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let track = Track::new(PathBuf::from(path), fade_in, fade_out, official, HashMap::new(), offset);
                let fade_time = payload
                    .get("fade_in_time")
                    .and_then(|v| v.as_f64())
                    .or_else(|| payload.get("fade_out_time").and_then(|v| v.as_f64()))
                    .unwrap_or(0.0);
                match self.0.play(&track, fade_time).await {
                    Ok(_) => Some(serde_json::json!({"op": 5, "arg": "ok"})),
                    Err(e) => Some(serde_json::json!({"op": 5, "error": e.to_string()})),
                }
            }
            _ => None,
        }
    }
}

/// Builds the static extension set and registers every addressable one on
/// `imc`. `procman` is needed up front because [`SkipWatcher`] must hold a
/// handle to stop the current process, and because it is itself registered
/// as the mandatory `"procman"` endpoint.
pub async fn build(
    ext_config: &ExtensionsConfig,
    runtime_config: &Config,
    procman: Arc<dyn ProcessManager>,
    imc: &Imc,
) -> Result<Extensions> {
    let mut playlist_modifiers: Vec<Arc<dyn PlaylistModifier>> = Vec::new();
    if ext_config.shuffle {
        playlist_modifiers.push(Arc::new(Shuffle::new()));
    }
    if ext_config.jingle {
        playlist_modifiers.push(Arc::new(Jingle::new(
            ext_config.jingle_primary.clone(),
            ext_config.jingle_secondary.clone(),
        )));
    }
    playlist_modifiers.push(Arc::new(CrossfadeInit::new(runtime_config.default_crossfade)));

    let mut observers: Vec<Arc<dyn Observer>> = Vec::new();
    if ext_config.progress_file_observer {
        observers.push(Arc::new(ProgressFileWriter::new(runtime_config.progress_file())));
    }
    if ext_config.playlist_file_observer {
        observers.push(Arc::new(PlaylistFileWriter::new(runtime_config.playlist_file())));
    }
    if ext_config.skip_watcher {
        observers.push(Arc::new(SkipWatcher::new(
            runtime_config.skip_file(),
            Arc::clone(&procman),
        )));
    }
    if ext_config.play_counter {
        let path = runtime_config.control_dir.join(&ext_config.play_counter_file);
        observers.push(Arc::new(PlayCounter::new(path)));
    }

    let advisor: Arc<dyn Advisor> = Arc::new(TimeBandAdvisor::new(
        runtime_config.playlist_root.clone(),
        runtime_config.bands,
        runtime_config.override_list_file(),
    ));

    let active_modifier: Arc<dyn ActiveModifier> = Arc::new(ToplayQueue::new(
        runtime_config.toplay_file(),
        ext_config.toplay_bleed_secs,
    ));

    for observer in &observers {
        if let Some(name) = observer.imc_name() {
            if !imc.register(name, Arc::new(ObserverImcEndpoint(Arc::clone(observer)))).await {
                return Err(PlayerError::Config(format!("duplicate IMC name: {name}")));
            }
        }
    }
    if let Some(name) = advisor.imc_name() {
        imc.register(name, Arc::new(AdvisorImcEndpoint(Arc::clone(&advisor)))).await;
    }
    if let Some(name) = active_modifier.imc_name() {
        imc.register(
            name,
            Arc::new(ActiveModifierImcEndpoint(Arc::clone(&active_modifier))),
        )
        .await;
    }
    if !imc
        .register("procman", Arc::new(ProcessManagerImcEndpoint(Arc::clone(&procman))))
        .await
    {
        return Err(PlayerError::Config("duplicate IMC name: procman".to_string()));
    }

    info!(
        modifiers = playlist_modifiers.len(),
        observers = observers.len(),
        "extensions registered"
    );

    Ok(Extensions {
        playlist_modifiers,
        observers,
        advisor,
        active_modifier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procman::ExternalProcessManager;

    #[tokio::test]
    async fn default_config_registers_expected_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            playlist_root: dir.path().join("playlists"),
            control_dir: dir.path().to_path_buf(),
            extensions_file: dir.path().join("extensions.toml"),
            decoder_program: "ffplay".to_string(),
            log_file: dir.path().join("log"),
            log_max_bytes: 1000,
            default_crossfade: 3.0,
            duration_cache_ttl_secs: 3600,
            bands: Default::default(),
            startup_arg: None,
        };
        let ext_config = ExtensionsConfig::default();
        let procman = Arc::new(ExternalProcessManager::new("ffplay", std::time::Duration::from_secs(3600)));
        let imc = Imc::new();
        let extensions = build(&ext_config, &config, procman, &imc).await.unwrap();
        assert!(!extensions.playlist_modifiers.is_empty());
        assert!(!extensions.observers.is_empty());

        let pong = imc
            .send("test", "procman", serde_json::json!({"op": 0}))
            .await
            .unwrap();
        assert_eq!(pong, Some(serde_json::json!({"op": 0, "arg": "pong"})));
    }
}
