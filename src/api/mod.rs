//! Framework adapters for reading the session cookie.
//!
//! Each adapter provides a `CurrentSession<S>` extractor and a rejection type
//! answering 401 for a missing, unknown or expired session and 500 otherwise.

mod types;

pub use types::*;

#[cfg(feature = "actix")]
pub mod actix;

#[cfg(feature = "axum")]
pub mod axum;
