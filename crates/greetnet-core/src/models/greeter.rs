//! Greeter profile model and the old/new snapshot diff used for
//! change-notification mail.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Volunteer profile, one-to-one with a [`User`](super::user::User).
///
/// The three list fields are plain `Vec<String>` in the API; the
/// comma-joined encoding only exists at the storage boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Greeter {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub landline: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub job: Option<String>,
    pub photo_path: Option<String>,
    pub away_from: Option<NaiveDate>,
    pub away_until: Option<NaiveDate>,
    pub interests: Vec<String>,
    pub experiences: Vec<String>,
    pub places: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGreeter {
    pub user_id: Uuid,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub landline: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub job: Option<String>,
    pub photo_path: Option<String>,
    pub away_from: Option<NaiveDate>,
    pub away_until: Option<NaiveDate>,
    pub interests: Vec<String>,
    pub experiences: Vec<String>,
    pub places: Vec<String>,
}

/// Partial update. `None` leaves a field unchanged; for optional
/// fields, `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGreeter {
    pub address_line_1: Option<String>,
    pub address_line_2: Option<Option<String>>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub landline: Option<Option<String>>,
    pub birth_date: Option<Option<NaiveDate>>,
    pub job: Option<Option<String>>,
    pub photo_path: Option<Option<String>>,
    pub away_from: Option<Option<NaiveDate>>,
    pub away_until: Option<Option<NaiveDate>>,
    pub interests: Option<Vec<String>>,
    pub experiences: Option<Vec<String>>,
    pub places: Option<Vec<String>>,
}

/// One changed field between two profile snapshots, stringified for
/// the notification template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

fn display_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

impl Greeter {
    /// Compare two snapshots field by field.
    ///
    /// The update path fetches the profile before writing and passes
    /// both versions here; an empty result means no notification.
    pub fn diff(old: &Greeter, new: &Greeter) -> Vec<FieldChange> {
        let mut changes = Vec::new();
        let mut push = |field: &str, old_value: String, new_value: String| {
            if old_value != new_value {
                changes.push(FieldChange {
                    field: field.to_string(),
                    old_value,
                    new_value,
                });
            }
        };

        push(
            "address_line_1",
            old.address_line_1.clone(),
            new.address_line_1.clone(),
        );
        push(
            "address_line_2",
            display_opt(&old.address_line_2),
            display_opt(&new.address_line_2),
        );
        push("postal_code", old.postal_code.clone(), new.postal_code.clone());
        push("city", old.city.clone(), new.city.clone());
        push(
            "landline",
            display_opt(&old.landline),
            display_opt(&new.landline),
        );
        push(
            "birth_date",
            display_opt(&old.birth_date),
            display_opt(&new.birth_date),
        );
        push("job", display_opt(&old.job), display_opt(&new.job));
        push(
            "photo_path",
            display_opt(&old.photo_path),
            display_opt(&new.photo_path),
        );
        push(
            "away_from",
            display_opt(&old.away_from),
            display_opt(&new.away_from),
        );
        push(
            "away_until",
            display_opt(&old.away_until),
            display_opt(&new.away_until),
        );
        push("interests", old.interests.join(", "), new.interests.join(", "));
        push(
            "experiences",
            old.experiences.join(", "),
            new.experiences.join(", "),
        );
        push("places", old.places.join(", "), new.places.join(", "));

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Greeter {
        Greeter {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            address_line_1: "12 rue des Lilas".into(),
            address_line_2: None,
            postal_code: "44000".into(),
            city: "Nantes".into(),
            landline: None,
            birth_date: None,
            job: Some("librarian".into()),
            photo_path: None,
            away_from: None,
            away_until: None,
            interests: vec!["history".into(), "food".into()],
            experiences: vec![],
            places: vec!["old town".into()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn identical_snapshots_produce_no_changes() {
        let g = sample();
        assert!(Greeter::diff(&g, &g.clone()).is_empty());
    }

    #[test]
    fn changed_fields_are_reported_with_both_values() {
        let old = sample();
        let mut new = old.clone();
        new.city = "Rennes".into();
        new.interests = vec!["history".into()];

        let changes = Greeter::diff(&old, &new);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, "city");
        assert_eq!(changes[0].old_value, "Nantes");
        assert_eq!(changes[0].new_value, "Rennes");
        assert_eq!(changes[1].field, "interests");
        assert_eq!(changes[1].old_value, "history, food");
        assert_eq!(changes[1].new_value, "history");
    }
}
