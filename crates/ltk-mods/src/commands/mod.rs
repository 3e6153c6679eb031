mod config;
mod inspect;
mod organize;
mod resolve;
mod tree;

pub use config::*;
pub use inspect::*;
pub use organize::*;
pub use resolve::*;
pub use tree::*;
