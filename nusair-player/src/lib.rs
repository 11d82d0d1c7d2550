pub use controls::*;
pub use keyboard::*;
pub use platform::*;
pub use session::*;

mod controls;
mod keyboard;
mod platform;
mod session;
