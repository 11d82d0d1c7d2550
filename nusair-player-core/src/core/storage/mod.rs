pub use error::*;
pub use storage::*;

mod error;
mod storage;
