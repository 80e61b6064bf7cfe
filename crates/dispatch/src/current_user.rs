use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use domain::User;
use tokio::sync::RwLock;

use crate::{DispatchError, Result};

/// Resolves the user on whose behalf the current mutation runs.
///
/// Recorders use this to attribute audit records; the surrounding
/// application decides what "current" means (session, token, job owner).
#[async_trait]
pub trait CurrentUser: Send + Sync {
    async fn current_user(&self) -> Result<User>;
}

/// A fixed acting user, for workers and tests.
#[derive(Clone)]
pub struct StaticCurrentUser {
    user: User,
}

impl StaticCurrentUser {
    /// Creates a resolver that always answers with the given user.
    pub fn new(user: User) -> Self {
        Self { user }
    }
}

#[async_trait]
impl CurrentUser for StaticCurrentUser {
    async fn current_user(&self) -> Result<User> {
        Ok(self.user.clone())
    }
}

/// In-memory user directory with a switchable current user.
///
/// Resolution fails with [`DispatchError::UserNotFound`] when the current
/// id points at no known user, which in turn fails the mutation that
/// needed attribution.
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    inner: Arc<RwLock<DirectoryState>>,
}

#[derive(Default)]
struct DirectoryState {
    users: HashMap<UserId, User>,
    current: Option<UserId>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory with no current user.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user to the directory.
    pub async fn add_user(&self, user: User) {
        self.inner.write().await.users.insert(user.id, user);
    }

    /// Sets the current acting user id.
    pub async fn set_current(&self, id: UserId) {
        self.inner.write().await.current = Some(id);
    }
}

#[async_trait]
impl CurrentUser for InMemoryUserDirectory {
    async fn current_user(&self) -> Result<User> {
        let state = self.inner.read().await;
        let id = state
            .current
            .ok_or(DispatchError::UserNotFound(UserId::from_uuid(uuid::Uuid::nil())))?;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or(DispatchError::UserNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_resolver_answers_with_its_user() {
        let user = User::new("ana");
        let resolver = StaticCurrentUser::new(user.clone());
        assert_eq!(resolver.current_user().await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn directory_resolves_the_current_user() {
        let directory = InMemoryUserDirectory::new();
        let user = User::new("ana");
        directory.add_user(user.clone()).await;
        directory.set_current(user.id).await;

        assert_eq!(directory.current_user().await.unwrap().username, "ana");
    }

    #[tokio::test]
    async fn unknown_current_user_fails() {
        let directory = InMemoryUserDirectory::new();
        directory.set_current(UserId::new()).await;

        let result = directory.current_user().await;
        assert!(matches!(result, Err(DispatchError::UserNotFound(_))));
    }
}
