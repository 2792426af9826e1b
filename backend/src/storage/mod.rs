//! Storage layer: connection management and per-table repositories.

pub mod connection;
pub mod repositories;

pub use connection::DbConnection;
