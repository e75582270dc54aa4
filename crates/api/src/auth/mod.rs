//! Authentication primitives.
//!
//! Identity is owned by an external provider; this service only validates
//! the HS256 access tokens it issues. See [`jwt`].

pub mod jwt;
