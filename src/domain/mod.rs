mod index;
mod types;

pub use index::*;
pub use types::*;
