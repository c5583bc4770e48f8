//! Storage for car deals, makes, models and users.
//!
//! The [`DealStore`] trait is implemented by [`PostgresDealStore`] for
//! production and [`MemoryDealStore`] for tests and database-less local runs.
//! Listing criteria are expressed once as [`Predicate`]s so both stores apply
//! exactly the same filters.

mod error;
mod filter;
mod memory;
mod postgres;
mod rows;
mod schema;
pub mod seed;
mod traits;

pub use error::*;
pub use filter::*;
pub use memory::MemoryDealStore;
pub use postgres::PostgresDealStore;
pub use traits::DealStore;
