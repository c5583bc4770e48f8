//! Request middleware.

pub mod auth;

pub use self::auth::{SESSION_COOKIE_NAME, optional_auth_middleware};
