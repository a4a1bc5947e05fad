//! Built-in Observers: progress reporting, playlist/skip-file writers, and
//! play counting.

pub mod play_counter;
pub mod playlist_file;
pub mod progress_file;
pub mod skip_watcher;

pub use play_counter::PlayCounter;
pub use playlist_file::PlaylistFileWriter;
pub use progress_file::ProgressFileWriter;
pub use skip_watcher::SkipWatcher;
