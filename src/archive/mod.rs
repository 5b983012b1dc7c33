//! File selection, ZIP archive construction, and archive inspection.

pub mod builder;
pub mod reader;
pub mod selector;
