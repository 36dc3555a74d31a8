//! CLI command implementations

mod config;
mod history;
mod read;

pub use config::config;
pub use history::history;
pub use read::read;
