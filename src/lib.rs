pub mod cli;
pub mod export;
pub mod io;
pub mod message;
pub mod model;
pub mod ops;
pub mod util;
