//! # radio-common
//!
//! Shared types for the playout engine and its extensions:
//! - The [`Track`] model and focus-window timing
//! - Error leaves reused across the process manager, parser, advisor and
//!   active modifier
//! - Time-of-day bands used by the advisor
//! - Human-readable time formatting for progress observers

pub mod error;
pub mod human_time;
pub mod time_band;
pub mod track;

pub use error::{CoreError, Result};
pub use time_band::{Band, BandSchedule};
pub use track::Track;
