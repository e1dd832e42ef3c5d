pub mod config;
pub mod index;
pub mod path;
pub mod session;
pub mod task;

pub use config::*;
pub use index::*;
pub use path::*;
pub use session::*;
pub use task::*;
