mod cli;
pub mod command;
pub mod config;
pub mod device;
pub mod entries;
pub mod error;
pub mod partitions;
pub mod probe;
pub mod rename;
pub mod types;
mod utils;

pub use cli::RenameCli;
pub use error::{RenameError, RenameResult};
pub use rename::{execute_plan, plan_rename, run};
