//! roomsched-store: the embedded relational event store (C9).
//!
//! Catalogs calendar sources and manually-entered events in a
//! write-ahead-logged SQLite database. Migrations are idempotent and
//! additive, run once at startup from [`pool::connect`].

pub mod csv_import;
pub mod error;
pub mod manual_events;
pub mod models;
pub mod pool;
pub mod sources;

pub use error::{StoreError, StoreResult};
pub use pool::connect;
