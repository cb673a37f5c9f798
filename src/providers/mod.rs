//! External service implementations.
//!
//! - [`email`] - Message stores (Gmail API)

pub mod email;
