//! API middleware.
//!
//! One layer: bearer-token auth. Protected routes run
//! Extension → Auth → Handler.

pub mod auth;
