//! Error types for the playout engine, one enum per component plus a
//! crate-wide `Result` alias.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayerError>;

/// Top-level error for the playout engine.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("playlist error: {0}")]
    Playlist(#[from] PlaylistError),

    #[error("process manager error: {0}")]
    Procman(#[from] ProcmanError),

    #[error("IMC error: {0}")]
    Imc(#[from] ImcError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("two singleton extensions registered for the same role: {0}")]
    MultipleSingletons(&'static str),

    #[error("no playlist advisor registered")]
    NoAdvisor,

    #[error("no process manager registered")]
    NoProcessManager,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Playlist parsing / resolution failures.
#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("playlist not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse playlist {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Process-manager failures.
#[derive(Debug, Error)]
pub enum ProcmanError {
    #[error("failed to launch decoder for {path}: {reason}")]
    DecoderLaunch { path: PathBuf, reason: String },

    #[error("failed to probe duration for {0}")]
    DurationProbe(PathBuf),
}

/// IMC bus failures.
#[derive(Debug, Error)]
pub enum ImcError {
    #[error("unknown IMC endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("endpoint {0} already registered")]
    DuplicateName(String),

    #[error("handler error: {0}")]
    Handler(String),
}
