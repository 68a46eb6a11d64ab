//! Mesa Auth — the session authority: credential issuance/validation,
//! refresh rotation, revocation, and access-guard helpers.

pub mod config;
pub mod error;
pub mod guard;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, TokenPair};
pub use token::AccessClaims;
