mod control;
mod scan;
mod spawn;

pub use control::*;
pub use scan::*;
pub use spawn::*;
