//! Session and guest identity for the car deal exchange.
//!
//! This crate provides:
//! - HS256 session token generation and validation
//! - The authenticated user type and admin allow-list
//! - Guest device tokens and salted source-address hashing

mod error;
mod guest;
mod identity;
mod jwt;
mod user;

pub use error::*;
pub use guest::*;
pub use identity::*;
pub use jwt::*;
pub use user::*;

/// Default session lifetime in hours (30 days).
pub const DEFAULT_JWT_EXPIRATION_HOURS: u64 = 720;

/// Default session token issuer.
pub const DEFAULT_JWT_ISSUER: &str = "cardeals";
