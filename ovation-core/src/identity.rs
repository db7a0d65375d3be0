use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::EngineResult;

/// Identity collaborator. The engine only asks whether a user exists;
/// authentication and account management live outside this system.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> EngineResult<bool>;
}

/// Fixed-roster identity service. `allow_all` accepts every user id, for
/// deployments where the API layer has already authenticated the caller.
pub struct StaticIdentity {
    known: HashSet<Uuid>,
    allow_all: bool,
}

impl StaticIdentity {
    pub fn new(users: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            known: users.into_iter().collect(),
            allow_all: false,
        }
    }

    pub fn allow_all() -> Self {
        Self {
            known: HashSet::new(),
            allow_all: true,
        }
    }
}

#[async_trait]
impl IdentityService for StaticIdentity {
    async fn user_exists(&self, user_id: Uuid) -> EngineResult<bool> {
        let known = self.allow_all || self.known.contains(&user_id);
        tracing::debug!("identity check for {}: {}", user_id, known);
        Ok(known)
    }
}
