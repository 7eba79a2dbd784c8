//! Store implementations: the in-memory token registry, the directory-backed
//! upload store and a composite joining the two.

mod composite;
mod dir;
mod memory;

pub use composite::*;
pub use dir::*;
pub use memory::*;
