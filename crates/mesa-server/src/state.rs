//! Shared application state.

use std::sync::Arc;

use mesa_auth::AuthService;
use mesa_db::repository::{
    SurrealSessionRepository, SurrealTenantRepository, SurrealUserRepository,
};
use surrealdb::engine::remote::ws::Client;

/// The authority wired to the production store.
pub type Authority = AuthService<
    SurrealUserRepository<Client>,
    SurrealTenantRepository<Client>,
    SurrealSessionRepository<Client>,
>;

#[derive(Clone)]
pub struct AppState {
    pub authority: Arc<Authority>,
}
