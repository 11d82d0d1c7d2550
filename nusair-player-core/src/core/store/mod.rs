pub use state::*;
pub use store::*;

mod state;
mod store;
