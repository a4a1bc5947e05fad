//! Process Manager — supervises external decoder processes: an
//! `ffprobe`/`ffplay` pair that probes duration, spawns with `-ss`/
//! `-af afade=...`, and tracks the live set under a lock.

use crate::error::{PlayerError, ProcmanError, Result};
use crate::extension::{ProcessHandle, ProcessManager};
use async_trait::async_trait;
use radio_common::Track;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

struct CacheEntry {
    duration: f64,
    inserted_at: Instant,
}

/// `ffprobe`-style duration cache, keyed by absolute path, TTL-expired on
/// read.
#[derive(Default)]
struct DurationCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl DurationCache {
    fn get(&self, path: &Path, ttl: Duration) -> Option<f64> {
        let entries = self.entries.lock().unwrap();
        entries.get(path).and_then(|entry| {
            if entry.inserted_at.elapsed() < ttl {
                Some(entry.duration)
            } else {
                None
            }
        })
    }

    fn insert(&self, path: PathBuf, duration: f64) {
        self.entries.lock().unwrap().insert(
            path,
            CacheEntry {
                duration,
                inserted_at: Instant::now(),
            },
        );
    }
}

/// A live supervised decoder process.
pub struct DecoderProcess {
    child: Mutex<Child>,
    path: PathBuf,
    started_at: Instant,
    duration: f64,
}

impl ProcessHandle for DecoderProcess {
    fn started_at(&self) -> Instant {
        self.started_at
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_alive(&self) -> bool {
        let mut child = self.child.lock().unwrap();
        matches!(child.try_wait(), Ok(None))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Supervises external decoder processes launched via `decoder_program`
/// (default `ffplay`) with a fixed CLI envelope: no video, auto-exit, quiet
/// logging, optional seek, optional afade filter chain.
pub struct ExternalProcessManager {
    decoder_program: String,
    probe_program: String,
    duration_cache: DurationCache,
    duration_ttl: Duration,
    processes: Mutex<Vec<Arc<DecoderProcess>>>,
}

impl ExternalProcessManager {
    pub fn new(decoder_program: impl Into<String>, duration_ttl: Duration) -> Self {
        Self {
            decoder_program: decoder_program.into(),
            probe_program: "ffprobe".to_string(),
            duration_cache: DurationCache::default(),
            duration_ttl,
            processes: Mutex::new(Vec::new()),
        }
    }

    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        if let Some(cached) = self.duration_cache.get(path, self.duration_ttl) {
            return Some(cached);
        }
        let output = Command::new(&self.probe_program)
            .args([
                "-v",
                "quiet",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let duration: f64 = text.trim().parse().ok()?;
        self.duration_cache.insert(path.to_path_buf(), duration);
        Some(duration)
    }
}

#[async_trait]
impl ProcessManager for ExternalProcessManager {
    async fn duration(&self, path: &Path) -> Option<f64> {
        self.probe_duration(path).await
    }

    async fn play(
        &self,
        track: &Track,
        fade_time: f64,
    ) -> Result<Arc<dyn ProcessHandle>> {
        let path = track.path().to_path_buf();
        let duration = self.probe_duration(&path).await.ok_or_else(|| {
            PlayerError::Procman(ProcmanError::DurationProbe(path.clone()))
        })?;

        let mut offset = track.offset();
        if offset >= duration {
            offset = (duration - 0.1).max(0.0);
        }

        let mut cmd = Command::new(&self.decoder_program);
        cmd.args(["-nodisp", "-hide_banner", "-autoexit", "-loglevel", "quiet"]);
        if offset > 0.0 {
            cmd.args(["-ss", &offset.to_string()]);
        }

        let mut filters = Vec::new();
        if track.fade_in() != 0.0 && fade_time != 0.0 {
            filters.push(format!("afade=t=in:st=0:d={fade_time}"));
        }
        if track.fade_out() != 0.0 && fade_time != 0.0 {
            let start = (duration - fade_time - offset).max(0.0);
            filters.push(format!("afade=t=out:st={start}:d={fade_time}"));
        }
        if !filters.is_empty() {
            cmd.args(["-af", &filters.join(",")]);
        }
        cmd.arg(&path);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            PlayerError::Procman(ProcmanError::DecoderLaunch {
                path: path.clone(),
                reason: e.to_string(),
            })
        })?;

        info!(path = %path.display(), "started decoder process");

        let process = Arc::new(DecoderProcess {
            child: Mutex::new(child),
            path,
            started_at: Instant::now(),
            duration: duration - offset,
        });
        self.processes.lock().unwrap().push(Arc::clone(&process));
        Ok(process)
    }

    async fn anything_playing(&self) -> bool {
        let mut processes = self.processes.lock().unwrap();
        processes.retain(|p| p.is_alive());
        !processes.is_empty()
    }

    async fn stop_all(&self, timeout: Option<Duration>) {
        let processes: Vec<Arc<DecoderProcess>> = {
            let mut guard = self.processes.lock().unwrap();
            std::mem::take(&mut *guard)
        };
        let timeout = timeout.unwrap_or(Duration::from_secs(5));
        for process in processes {
            let mut child = process.child.lock().unwrap();
            let _ = child.start_kill();
            drop(child);
            let wait = process.child.lock().unwrap().try_wait();
            if matches!(wait, Ok(None)) {
                // Escalate to forced kill after the timeout if it is still
                // alive; `start_kill` above already sends SIGKILL on most
                // platforms via tokio, so this is a last-resort sleep/poll.
                tokio::time::sleep(timeout).await;
                let _ = process.child.lock().unwrap().start_kill();
            }
        }
    }

    async fn wait_all(&self, timeout: Option<Duration>) {
        let processes: Vec<Arc<DecoderProcess>> = {
            let mut guard = self.processes.lock().unwrap();
            std::mem::take(&mut *guard)
        };
        for process in processes {
            let deadline = timeout.map(|t| Instant::now() + t);
            loop {
                if !process.is_alive() {
                    break;
                }
                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        warn!(path = %process.path().display(), "wait_all timeout, terminating");
                        let _ = process.child.lock().unwrap().start_kill();
                        break;
                    }
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }

    async fn live_paths(&self) -> Vec<PathBuf> {
        let mut processes = self.processes.lock().unwrap();
        processes.retain(|p| p.is_alive());
        processes.iter().map(|p| p.path().to_path_buf()).collect()
    }
}

/// Read-ahead hint on the upcoming track's file. No-op on non-unix
/// platforms.
#[cfg(unix)]
pub fn prefetch_hint(path: &Path) {
    use std::os::unix::io::AsRawFd;
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return,
    };
    let fd = file.as_raw_fd();
    unsafe {
        libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_SEQUENTIAL);
        libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_NOREUSE);
        libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_WILLNEED);
    }
    debug!(path = %path.display(), "prefetch hint issued");
}

#[cfg(not(unix))]
pub fn prefetch_hint(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_cache_round_trips_within_ttl() {
        let cache = DurationCache::default();
        let path = PathBuf::from("/music/a.mp3");
        cache.insert(path.clone(), 123.0);
        assert_eq!(cache.get(&path, Duration::from_secs(3600)), Some(123.0));
    }

    #[test]
    fn duration_cache_expires() {
        let cache = DurationCache::default();
        let path = PathBuf::from("/music/a.mp3");
        cache.insert(path.clone(), 123.0);
        assert_eq!(cache.get(&path, Duration::from_secs(0)), None);
    }

    #[tokio::test]
    async fn anything_playing_false_with_no_processes() {
        let pm = ExternalProcessManager::new("ffplay", Duration::from_secs(3600));
        assert!(!pm.anything_playing().await);
    }
}
