//! Storage implementations for job postings.
//!
//! Available backends:
//! - `MemoryStore` - In-memory storage for tests and local runs
//! - `PostgresStore` - PostgreSQL storage

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
