//! Core entity definitions for the car deal exchange.
//!
//! This crate defines the data types shared by the store and the HTTP layer:
//! users, the make/model vocabulary, deals with their embedded relations,
//! money helpers, price statistics and the administrative export snapshot.

mod deal;
mod export;
mod money;
mod stats;
mod user;
mod vehicle;

pub use deal::*;
pub use export::*;
pub use money::*;
pub use stats::*;
pub use user::*;
pub use vehicle::*;

/// Generates a new opaque record identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
