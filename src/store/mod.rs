//! Trade store implementations

pub mod memory;
pub mod postgres;

pub use memory::InMemoryTradeStore;
pub use postgres::PgTradeStore;
