//! Core types for chapters and their pages

mod chapter;
mod page;

pub use chapter::{human_size, Chapter, Progress};
pub use page::Page;
