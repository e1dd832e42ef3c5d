pub mod config_io;
pub mod hooks;
pub mod lock;
pub mod prompt;
pub mod state;
pub mod store;

pub use config_io::load_config;
pub use hooks::{HookPhase, HookSettings, fetch_data, run_hook};
pub use lock::BaseLock;
pub use prompt::{prompt, system_editor};
pub use state::{load_session, save_session};
pub use store::Store;
