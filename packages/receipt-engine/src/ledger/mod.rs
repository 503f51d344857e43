//! Ledger backends.
//!
//! [`MemoryLedger`] backs tests and credential-free deployments;
//! [`PostgresLedger`] (feature `postgres`) is the production store.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemoryLedger;
#[cfg(feature = "postgres")]
pub use postgres::PostgresLedger;
