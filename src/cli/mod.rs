pub mod app;
pub mod commands;
pub mod session;

pub use app::{Config, Overrides};
pub use commands::{Cli, Commands, ConfigCommand};
pub use session::{replies_for, run, session_handler};
