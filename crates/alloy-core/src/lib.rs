//! AlloyPro core crate - shared error type, configuration, domain types, and
//! the in-memory service order book.

pub mod config;
pub mod error;
pub mod orders;
pub mod types;

pub use config::AlloyConfig;
pub use error::{AlloyError, Result};
pub use orders::{OrderBook, OrderProvider};
pub use types::*;
