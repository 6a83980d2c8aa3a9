use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Config;
use crate::contract::Logo;
use crate::dao::{JobDao, UserDao};
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserDao>,
    pub jobs: Arc<dyn JobDao>,
    pub storage: Arc<dyn ObjectStore>,
    pub tokens: TokenService,
    pub config: Config,
    /// Printed on page one of every contract when configured.
    pub contract_logo: Option<Arc<Logo>>,
}
