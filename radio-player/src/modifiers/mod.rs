//! Built-in PlaylistModifier chain: shuffle, jingle insertion, and
//! crossfade initialization.

pub mod crossfade_init;
pub mod jingle;
pub mod shuffle;

pub use crossfade_init::CrossfadeInit;
pub use jingle::Jingle;
pub use shuffle::Shuffle;
