//! Core data model types for file selection, archives, messages, and dispatches.

pub mod archive;
pub mod dispatch;
pub mod message;
pub mod selection;
