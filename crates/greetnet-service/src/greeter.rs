//! Greeter account and profile orchestration.

use std::collections::BTreeMap;

use greetnet_core::error::{GreetnetError, GreetnetResult, ValidationErrors};
use greetnet_core::models::email::codes;
use greetnet_core::models::greeter::{CreateGreeter, Greeter, UpdateGreeter};
use greetnet_core::models::role::Role;
use greetnet_core::models::user::{CreateUser, User};
use greetnet_core::repository::{GreeterRepository, RoleMembershipRepository, UserRepository};
use serde_json::json;
use uuid::Uuid;

use crate::effects::{Effect, EffectQueue};
use crate::validation;

/// A signup form: the account half and the profile half together.
#[derive(Debug, Clone)]
pub struct GreeterSignup {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub comm_lang: String,
    pub dest_code: Option<String>,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub landline: Option<String>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub job: Option<String>,
    pub photo_path: Option<String>,
    pub away_from: Option<chrono::NaiveDate>,
    pub away_until: Option<chrono::NaiveDate>,
    pub interests: Vec<String>,
    pub experiences: Vec<String>,
    pub places: Vec<String>,
}

/// Result of a successful greeter save.
#[derive(Debug)]
pub struct GreeterSaveOutcome {
    pub user: User,
    pub greeter: Greeter,
    pub effects: Vec<Effect>,
}

/// Greeter orchestration.
pub struct GreeterService<U, G, M> {
    users: U,
    greeters: G,
    memberships: M,
}

impl<U, G, M> GreeterService<U, G, M>
where
    U: UserRepository,
    G: GreeterRepository,
    M: RoleMembershipRepository,
{
    pub fn new(users: U, greeters: G, memberships: M) -> Self {
        Self {
            users,
            greeters,
            memberships,
        }
    }

    /// Register a new greeter: the account, the profile, the role.
    ///
    /// The account starts inactive; the set-password mail carries the
    /// activation link.
    pub async fn create(&self, signup: GreeterSignup) -> GreetnetResult<GreeterSaveOutcome> {
        // 1. Validate.
        let mut errors = ValidationErrors::new();
        validation::validate_greeter_dates(&mut errors, signup.away_from, signup.away_until);
        errors.into_result()?;

        // 2. Create the account. A duplicate email is a field error.
        let user = match self
            .users
            .create(CreateUser {
                email: signup.email,
                first_name: signup.first_name,
                last_name: signup.last_name,
                phone: signup.phone,
                comm_lang: signup.comm_lang,
                cluster_code: None,
                dest_code: signup.dest_code,
                is_active: false,
            })
            .await
        {
            Ok(u) => u,
            Err(GreetnetError::AlreadyExists { .. }) => {
                let mut errors = ValidationErrors::new();
                errors.push("email", "an account with this email already exists");
                return Err(GreetnetError::Invalid(errors));
            }
            Err(e) => return Err(e),
        };

        let photo_path = signup.photo_path.clone();

        // 3. Create the profile keyed by the account.
        let greeter = self
            .greeters
            .create(CreateGreeter {
                user_id: user.id,
                address_line_1: signup.address_line_1,
                address_line_2: signup.address_line_2,
                postal_code: signup.postal_code,
                city: signup.city,
                landline: signup.landline,
                birth_date: signup.birth_date,
                job: signup.job,
                photo_path: signup.photo_path,
                away_from: signup.away_from,
                away_until: signup.away_until,
                interests: signup.interests,
                experiences: signup.experiences,
                places: signup.places,
            })
            .await?;

        // 4. Role membership.
        self.memberships.add(user.id, Role::Greeter).await?;

        // 5. Post-commit effects.
        let mut effects = EffectQueue::new();
        if let Some(path) = photo_path {
            effects.push(Effect::ResizeImage { path });
        }
        effects.push(Effect::SendTemplateEmail {
            code: codes::SET_PASSWORD.to_string(),
            user_id: user.id,
            variables: BTreeMap::new(),
        });

        Ok(GreeterSaveOutcome {
            user,
            greeter,
            effects: effects.drain(),
        })
    }

    /// Update a profile and notify the greeter of what changed.
    pub async fn update(
        &self,
        user_id: Uuid,
        input: UpdateGreeter,
    ) -> GreetnetResult<GreeterSaveOutcome> {
        let user = self.users.get_by_id(user_id).await?;
        let old = self.greeters.get_by_user(user_id).await?;

        // 1. Validate the availability window after the update.
        let away_from_after = match input.away_from {
            Some(value) => value,
            None => old.away_from,
        };
        let away_until_after = match input.away_until {
            Some(value) => value,
            None => old.away_until,
        };
        let mut errors = ValidationErrors::new();
        validation::validate_greeter_dates(&mut errors, away_from_after, away_until_after);
        errors.into_result()?;

        // 2. Persist.
        let greeter = self.greeters.update(user_id, input).await?;

        // 3. Diff the snapshots and queue the notification mail.
        let mut effects = EffectQueue::new();
        let changes = Greeter::diff(&old, &greeter);
        if !changes.is_empty() {
            let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
            let mut variables = BTreeMap::new();
            variables.insert("fields".to_string(), json!(fields.join(", ")));
            variables.insert("user_first_name".to_string(), json!(user.first_name));
            effects.push(Effect::SendTemplateEmail {
                code: codes::PROFILE_MODIFIED.to_string(),
                user_id,
                variables,
            });
        }
        if old.photo_path != greeter.photo_path
            && let Some(path) = greeter.photo_path.clone()
        {
            effects.push(Effect::ResizeImage { path });
        }

        Ok(GreeterSaveOutcome {
            user,
            greeter,
            effects: effects.drain(),
        })
    }

    /// Remove the profile. The account survives; only the volunteer
    /// data goes.
    pub async fn delete(&self, user_id: Uuid) -> GreetnetResult<()> {
        self.greeters.delete(user_id).await?;
        self.memberships.remove(user_id, Role::Greeter).await
    }

    pub async fn get(&self, user_id: Uuid) -> GreetnetResult<Greeter> {
        self.greeters.get_by_user(user_id).await
    }
}
