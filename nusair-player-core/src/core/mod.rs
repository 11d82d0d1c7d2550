pub mod media;
pub mod playback;
pub mod players;
pub mod storage;
pub mod store;
