//! SurrealDB repository implementations.

mod session;
mod tenant;
mod user;

pub use session::SurrealSessionRepository;
pub use tenant::SurrealTenantRepository;
pub use user::SurrealUserRepository;
