use std::sync::Arc;

use crate::auth::{AuthGate, PasswordHasher, RevocationPolicy, RevocationStore, TokenService};
use crate::store::{TaskStore, UserStore};

/// Everything a handler needs, built once at startup and shared through
/// `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub revocations: Arc<dyn RevocationStore>,
    pub hasher: PasswordHasher,
    pub tokens: Arc<TokenService>,
    pub revocation_policy: RevocationPolicy,
    pub gate: AuthGate,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        revocations: Arc<dyn RevocationStore>,
        hasher: PasswordHasher,
        tokens: TokenService,
        revocation_policy: RevocationPolicy,
    ) -> Self {
        let tokens = Arc::new(tokens);
        let gate = AuthGate::new(tokens.clone(), revocations.clone(), users.clone());
        Self {
            users,
            tasks,
            revocations,
            hasher,
            tokens,
            revocation_policy,
            gate,
        }
    }
}
