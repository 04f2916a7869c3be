//! Account management on top of the user repository.

use std::collections::BTreeMap;

use greetnet_core::error::{GreetnetError, GreetnetResult, ValidationErrors};
use greetnet_core::models::email::codes;
use greetnet_core::models::user::{CreateUser, UpdateUser, User};
use greetnet_core::repository::{PaginatedResult, Pagination, UserRepository};
use uuid::Uuid;

use crate::effects::{Effect, EffectQueue};

/// Result of a successful account save.
#[derive(Debug)]
pub struct UserSaveOutcome {
    pub user: User,
    pub effects: Vec<Effect>,
}

/// Account orchestration.
pub struct UserService<U> {
    users: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// Create an account and queue its set-password mail.
    pub async fn create(&self, input: CreateUser) -> GreetnetResult<UserSaveOutcome> {
        let user = match self.users.create(input).await {
            Ok(u) => u,
            Err(GreetnetError::AlreadyExists { .. }) => {
                let mut errors = ValidationErrors::new();
                errors.push("email", "an account with this email already exists");
                return Err(GreetnetError::Invalid(errors));
            }
            Err(e) => return Err(e),
        };

        let mut effects = EffectQueue::new();
        effects.push(Effect::SendTemplateEmail {
            code: codes::SET_PASSWORD.to_string(),
            user_id: user.id,
            variables: BTreeMap::new(),
        });

        Ok(UserSaveOutcome {
            user,
            effects: effects.drain(),
        })
    }

    pub async fn update(&self, id: Uuid, input: UpdateUser) -> GreetnetResult<User> {
        self.users.update(id, input).await
    }

    /// Queue the reset-password mail for an existing account.
    pub async fn reset_password(&self, email: &str) -> GreetnetResult<Vec<Effect>> {
        let user = self.users.get_by_email(email).await?;

        let mut effects = EffectQueue::new();
        effects.push(Effect::SendTemplateEmail {
            code: codes::RESET_PASSWORD.to_string(),
            user_id: user.id,
            variables: BTreeMap::new(),
        });
        Ok(effects.drain())
    }

    pub async fn get(&self, id: Uuid) -> GreetnetResult<User> {
        self.users.get_by_id(id).await
    }

    pub async fn list(&self, pagination: Pagination) -> GreetnetResult<PaginatedResult<User>> {
        self.users.list(pagination).await
    }

    /// Accounts attached to a cluster, by short code.
    pub async fn list_by_cluster_code(&self, code: &str) -> GreetnetResult<Vec<User>> {
        self.users.list_by_cluster_code(code).await
    }

    /// Accounts attached to a destination, by short code.
    pub async fn list_by_dest_code(&self, code: &str) -> GreetnetResult<Vec<User>> {
        self.users.list_by_dest_code(code).await
    }
}
