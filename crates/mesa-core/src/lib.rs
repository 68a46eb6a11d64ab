//! Mesa Core — domain models, shared error type, and repository trait
//! definitions for the Mesa session authority.

pub mod error;
pub mod models;
pub mod repository;
