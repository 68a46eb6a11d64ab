//! Domain model definitions.

pub mod principal;
pub mod session;
pub mod tenant;
pub mod user;
