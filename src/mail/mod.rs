//! Outbound mail: MIME composition, transports, and the dispatch pipeline.

pub mod compose;
pub mod dispatch;
pub mod transport;
