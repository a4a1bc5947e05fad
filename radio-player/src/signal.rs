//! Signal/shutdown controller: the first `Ctrl-C` requests a graceful stop,
//! a second one within a short debounce window forces an immediate exit
//! with code 130.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

const DEBOUNCE_WINDOW: Duration = Duration::from_secs(5);

/// Tracks whether a graceful shutdown has been requested, and escalates to
/// a forced exit if asked twice within [`DEBOUNCE_WINDOW`].
pub struct ShutdownController {
    exit_pending: AtomicBool,
    last_signal_at: Mutex<Option<Instant>>,
}

impl ShutdownController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            exit_pending: AtomicBool::new(false),
            last_signal_at: Mutex::new(None),
        })
    }

    pub fn is_exit_pending(&self) -> bool {
        self.exit_pending.load(Ordering::SeqCst)
    }

    pub fn request_exit(&self) {
        self.exit_pending.store(true, Ordering::SeqCst);
    }

    /// Spawns a task that waits on `ctrl_c()` in a loop. The first signal
    /// sets `exit_pending`; a second signal inside the debounce window
    /// terminates the process immediately with exit code 130.
    pub fn spawn_listener(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                let now = Instant::now();
                let mut last = this.last_signal_at.lock().await;
                let forced = match *last {
                    Some(prev) => now.duration_since(prev) <= DEBOUNCE_WINDOW,
                    None => false,
                };
                *last = Some(now);
                drop(last);

                if forced {
                    warn!("second interrupt within debounce window, forcing exit");
                    std::process::exit(130);
                }
                info!("interrupt received, requesting graceful shutdown");
                this.request_exit();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_pending_starts_false() {
        let controller = ShutdownController::new();
        assert!(!controller.is_exit_pending());
    }

    #[test]
    fn request_exit_sets_flag() {
        let controller = ShutdownController::new();
        controller.request_exit();
        assert!(controller.is_exit_pending());
    }
}
