pub use errors::*;
pub use history::*;
pub use resume::*;
pub use video::*;

mod errors;
mod history;
mod resume;
mod video;
