//! SurrealDB implementation of [`GreeterRepository`].
//!
//! Profiles are keyed by the owning user's UUID, so the one-to-one
//! constraint is the record id itself. List fields travel as
//! `Vec<String>` in the API and are stored comma-joined.

use chrono::{DateTime, NaiveDate, Utc};
use greetnet_core::error::GreetnetResult;
use greetnet_core::models::greeter::{CreateGreeter, Greeter, UpdateGreeter};
use greetnet_core::models::tag::{join_tag_list, parse_tag_list};
use greetnet_core::repository::GreeterRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

fn parse_opt_date(value: Option<String>, field: &str) -> Result<Option<NaiveDate>, DbError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|e| DbError::Migration(format!("invalid {field} date: {e}")))
        })
        .transpose()
}

fn date_to_string(value: Option<NaiveDate>) -> Option<String> {
    value.map(|d| d.format("%Y-%m-%d").to_string())
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct GreeterRow {
    user_id: String,
    address_line_1: String,
    address_line_2: Option<String>,
    postal_code: String,
    city: String,
    landline: Option<String>,
    birth_date: Option<String>,
    job: Option<String>,
    photo_path: Option<String>,
    away_from: Option<String>,
    away_until: Option<String>,
    interests: String,
    experiences: String,
    places: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GreeterRow {
    fn try_into_greeter(self, id: Uuid) -> Result<Greeter, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user_id UUID: {e}")))?;
        Ok(Greeter {
            id,
            user_id,
            address_line_1: self.address_line_1,
            address_line_2: self.address_line_2,
            postal_code: self.postal_code,
            city: self.city,
            landline: self.landline,
            birth_date: parse_opt_date(self.birth_date, "birth_date")?,
            job: self.job,
            photo_path: self.photo_path,
            away_from: parse_opt_date(self.away_from, "away_from")?,
            away_until: parse_opt_date(self.away_until, "away_until")?,
            interests: parse_tag_list(&self.interests),
            experiences: parse_tag_list(&self.experiences),
            places: parse_tag_list(&self.places),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Greeter repository.
#[derive(Clone)]
pub struct SurrealGreeterRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGreeterRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GreeterRepository for SurrealGreeterRepository<C> {
    async fn create(&self, input: CreateGreeter) -> GreetnetResult<Greeter> {
        let id_str = input.user_id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('greeter', $id) SET \
                 user_id = $id, \
                 address_line_1 = $address_line_1, \
                 address_line_2 = $address_line_2, \
                 postal_code = $postal_code, city = $city, \
                 landline = $landline, birth_date = $birth_date, \
                 job = $job, photo_path = $photo_path, \
                 away_from = $away_from, away_until = $away_until, \
                 interests = $interests, experiences = $experiences, \
                 places = $places",
            )
            .bind(("id", id_str.clone()))
            .bind(("address_line_1", input.address_line_1))
            .bind(("address_line_2", input.address_line_2))
            .bind(("postal_code", input.postal_code))
            .bind(("city", input.city))
            .bind(("landline", input.landline))
            .bind(("birth_date", date_to_string(input.birth_date)))
            .bind(("job", input.job))
            .bind(("photo_path", input.photo_path))
            .bind(("away_from", date_to_string(input.away_from)))
            .bind(("away_until", date_to_string(input.away_until)))
            .bind(("interests", join_tag_list(&input.interests)))
            .bind(("experiences", join_tag_list(&input.experiences)))
            .bind(("places", join_tag_list(&input.places)))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("greeter", e))?;

        self.get_by_user(input.user_id).await
    }

    async fn get_by_user(&self, user_id: Uuid) -> GreetnetResult<Greeter> {
        let id_str = user_id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('greeter', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GreeterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "greeter".into(),
            id: id_str,
        })?;

        Ok(row.try_into_greeter(user_id)?)
    }

    async fn update(&self, user_id: Uuid, input: UpdateGreeter) -> GreetnetResult<Greeter> {
        let id_str = user_id.to_string();

        let mut sets = Vec::new();
        if input.address_line_1.is_some() {
            sets.push("address_line_1 = $address_line_1");
        }
        if input.address_line_2.is_some() {
            sets.push("address_line_2 = $address_line_2");
        }
        if input.postal_code.is_some() {
            sets.push("postal_code = $postal_code");
        }
        if input.city.is_some() {
            sets.push("city = $city");
        }
        if input.landline.is_some() {
            sets.push("landline = $landline");
        }
        if input.birth_date.is_some() {
            sets.push("birth_date = $birth_date");
        }
        if input.job.is_some() {
            sets.push("job = $job");
        }
        if input.photo_path.is_some() {
            sets.push("photo_path = $photo_path");
        }
        if input.away_from.is_some() {
            sets.push("away_from = $away_from");
        }
        if input.away_until.is_some() {
            sets.push("away_until = $away_until");
        }
        if input.interests.is_some() {
            sets.push("interests = $interests");
        }
        if input.experiences.is_some() {
            sets.push("experiences = $experiences");
        }
        if input.places.is_some() {
            sets.push("places = $places");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('greeter', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(address_line_1) = input.address_line_1 {
            builder = builder.bind(("address_line_1", address_line_1));
        }
        if let Some(address_line_2) = input.address_line_2 {
            builder = builder.bind(("address_line_2", address_line_2));
        }
        if let Some(postal_code) = input.postal_code {
            builder = builder.bind(("postal_code", postal_code));
        }
        if let Some(city) = input.city {
            builder = builder.bind(("city", city));
        }
        if let Some(landline) = input.landline {
            builder = builder.bind(("landline", landline));
        }
        if let Some(birth_date) = input.birth_date {
            builder = builder.bind(("birth_date", date_to_string(birth_date)));
        }
        if let Some(job) = input.job {
            builder = builder.bind(("job", job));
        }
        if let Some(photo_path) = input.photo_path {
            builder = builder.bind(("photo_path", photo_path));
        }
        if let Some(away_from) = input.away_from {
            builder = builder.bind(("away_from", date_to_string(away_from)));
        }
        if let Some(away_until) = input.away_until {
            builder = builder.bind(("away_until", date_to_string(away_until)));
        }
        if let Some(interests) = input.interests {
            builder = builder.bind(("interests", join_tag_list(&interests)));
        }
        if let Some(experiences) = input.experiences {
            builder = builder.bind(("experiences", join_tag_list(&experiences)));
        }
        if let Some(places) = input.places {
            builder = builder.bind(("places", join_tag_list(&places)));
        }

        let result = builder.await.map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::from_write("greeter", e))?;

        self.get_by_user(user_id).await
    }

    async fn delete(&self, user_id: Uuid) -> GreetnetResult<()> {
        self.db
            .query("DELETE type::record('greeter', $id)")
            .bind(("id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
