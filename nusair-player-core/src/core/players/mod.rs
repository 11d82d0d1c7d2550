pub use player::*;

mod player;
