pub use events::*;
pub use state::*;

mod events;
mod state;
