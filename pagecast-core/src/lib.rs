//! Pagecast Core Library
//!
//! This crate reads chapters: it fetches a chapter's pages from a source,
//! optionally upscales them with an external tool, packages them into the
//! configured format and opens the result in an external reader.

pub mod config;
pub mod convert;
pub mod enhance;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod process;
pub mod reader;
pub mod source;
pub mod stage;
pub mod types;

pub use config::{Format, ReadConfig, SharedConfig};
pub use error::{ReadError, Result};
pub use pipeline::Pipeline;
pub use source::{DirectorySource, Source};
pub use types::{Chapter, Page, Progress};
