//! Storage boundary for trucks, users and refresh tokens.
//!
//! Every query function takes a plain `&mut AsyncPgConnection`, so callers can
//! pass a pooled connection or run inside their own transaction.

pub mod refresh_tokens;
pub mod sweeper;
pub mod trucks;
pub mod users;

pub use sweeper::run as run_sweeper;
