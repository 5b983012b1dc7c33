//! `filemailer` — bundle a directory of files into a ZIP archive and mail it.
//!
//! This crate provides the pipeline behind the CLI: file selection, archive
//! construction, body rendering, and delivery through a mail transport.

pub mod archive;
pub mod codec;
pub mod config;
pub mod error;
pub mod i18n;
pub mod mail;
pub mod model;
pub mod render;
