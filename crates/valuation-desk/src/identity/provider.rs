use std::collections::HashMap;
use std::sync::Arc;

use super::domain::UserId;
use super::permissions::Caller;
use super::repository::IdentityRepository;
use super::service::IdentityService;
use crate::api::IdentityProvider;
use crate::store::RepositoryError;

/// Maps externally issued bearer tokens onto staff members held in the identity store.
pub struct TokenTable<R> {
    tokens: HashMap<String, UserId>,
    identities: Arc<IdentityService<R>>,
}

impl<R> TokenTable<R>
where
    R: IdentityRepository + 'static,
{
    pub fn new(
        tokens: impl IntoIterator<Item = (String, UserId)>,
        identities: Arc<IdentityService<R>>,
    ) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
            identities,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<R> IdentityProvider for TokenTable<R>
where
    R: IdentityRepository + 'static,
{
    fn resolve(&self, token: &str) -> Result<Option<Caller>, RepositoryError> {
        match self.tokens.get(token) {
            Some(user_id) => self.identities.resolve_caller(*user_id),
            None => Ok(None),
        }
    }
}
