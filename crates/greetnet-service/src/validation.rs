//! Form validation.
//!
//! All checks accumulate field-level errors; a save only proceeds when
//! the collected set is empty, so nothing is ever partially persisted.

use chrono::NaiveDate;
use greetnet_core::error::ValidationErrors;
use greetnet_core::models::cluster::MAX_VISITORS;
use greetnet_core::models::destination::DestinationData;
use uuid::Uuid;

/// Item bounds for the cluster tag lists.
pub const CLUSTER_LIST_MIN: usize = 2;
pub const CLUSTER_LIST_MAX: usize = 10;
/// No-reply reason lists only need one entry.
pub const NO_REPLY_LIST_MIN: usize = 1;
/// Item bounds for the destination places list.
pub const PLACES_MIN: usize = 2;
pub const PLACES_MAX: usize = 10;

/// Short network codes are at most five characters.
pub const CODE_MAX_LEN: usize = 5;

/// Check a short code before creation. Codes are immutable afterwards.
pub fn validate_short_code(errors: &mut ValidationErrors, field: &str, code: &str) {
    let code = code.trim();
    if code.is_empty() {
        errors.push(field, "required");
    } else if code.chars().count() > CODE_MAX_LEN {
        errors.push(field, format!("at most {CODE_MAX_LEN} characters"));
    }
}

/// Check a tag list's item count.
pub fn validate_tag_list(
    errors: &mut ValidationErrors,
    field: &str,
    items: &[String],
    min: usize,
    max: usize,
) {
    let count = items.iter().filter(|s| !s.trim().is_empty()).count();
    if count < min {
        errors.push(field, format!("at least {min} items required"));
    } else if count > max {
        errors.push(field, format!("at most {max} items allowed"));
    }
}

/// Paired bounds: the maximum may not undercut the minimum. The error
/// lands on the max field.
pub fn validate_bounds_pair(
    errors: &mut ValidationErrors,
    max_field: &str,
    min: u32,
    max: u32,
) {
    if max < min {
        errors.push(max_field, "must be greater than or equal to the minimum");
    }
}

/// Participant caps may never exceed the network-wide limit.
pub fn validate_max_participants(errors: &mut ValidationErrors, field: &str, value: u32) {
    if value > MAX_VISITORS {
        errors.push(field, format!("must not exceed {MAX_VISITORS}"));
    }
}

/// Destination-specific caps against their backing lists.
pub fn validate_destination_caps(
    errors: &mut ValidationErrors,
    max_interests: u32,
    cluster_interest_count: usize,
    max_places: u32,
    submitted_places_count: usize,
) {
    if max_interests as usize > cluster_interest_count {
        errors.push(
            "max_interests",
            format!("must not exceed the cluster's {cluster_interest_count} interest tags"),
        );
    }
    if max_places as usize > submitted_places_count {
        errors.push(
            "max_places",
            format!("must not exceed the {submitted_places_count} submitted places"),
        );
    }
}

fn validate_date_range(
    errors: &mut ValidationErrors,
    end_field: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        errors.push(end_field, "must not be before the start date");
    }
}

/// Checks on the functional configuration block.
pub fn validate_destination_data(errors: &mut ValidationErrors, data: &DestinationData) {
    if data.ask_visitor_comment
        && data
            .visitor_comment_prompt
            .as_deref()
            .is_none_or(|p| p.trim().is_empty())
    {
        errors.push(
            "visitor_comment_prompt",
            "required when visitor comments are enabled",
        );
    }

    validate_date_range(errors, "closure_end", data.closure_start, data.closure_end);
    validate_date_range(errors, "footer_end", data.footer_start, data.footer_end);
    validate_max_participants(
        errors,
        "closure_max_participants",
        data.closure_max_participants,
    );
}

/// Greeter availability window must be ordered.
pub fn validate_greeter_dates(
    errors: &mut ValidationErrors,
    away_from: Option<NaiveDate>,
    away_until: Option<NaiveDate>,
) {
    validate_date_range(errors, "away_until", away_from, away_until);
}

/// A cluster must keep a primary admin through any update.
pub fn validate_cluster_retains_admin(errors: &mut ValidationErrors, admin_after: Option<Uuid>) {
    if admin_after.is_none() {
        errors.push("admin", "a cluster must have a primary admin");
    }
}
