//! SQLite persistence for the residence rules engine.
//!
//! [`SqliteGateway`] implements the rules crate's `PersistenceGateway` and
//! also carries the writes the API layer owns (check-ins, staff decisions,
//! complaint replies) so the whole lifecycle can run against one database.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod sqlite;

pub use sqlite::SqliteGateway;
