//! Input validation for item and recovery payloads
//!
//! Every write is checked here before any remote call is issued. Category
//! and post type are parsed into their closed enumerations; anything
//! outside those sets is rejected.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Category, ItemChanges, ItemDraft, ItemPatch, NewItem, NewRecoveredItem, PostType,
    RecoveryDraft,
};

/// Date format accepted for `date_lost_found` and `recovery_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Rejections raised before a write reaches the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Unknown post type: {0} (expected Lost or Found)")]
    UnknownPostType(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid date for {0}: expected YYYY-MM-DD")]
    InvalidDate(&'static str),

    #[error("{0} cannot be in the future")]
    DateInFuture(&'static str),

    #[error("Update contains no changes")]
    EmptyUpdate,

    #[error("Unsupported upload: {0}")]
    UnsupportedUpload(String),
}

/// Require a non-blank value and return it trimmed
fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

fn optional_url(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

fn parse_email(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let email = required(field, value)?;
    validate_email(&email)?;
    Ok(email)
}

/// Parse a calendar date that must not lie after `today`
pub fn parse_past_date(
    field: &'static str,
    value: &str,
    today: NaiveDate,
) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }

    let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(field))?;

    if date > today {
        return Err(ValidationError::DateInFuture(field));
    }

    Ok(date)
}

pub fn parse_post_type(value: &str) -> Result<PostType, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField("post_type"));
    }
    value.parse().map_err(ValidationError::UnknownPostType)
}

pub fn parse_category(value: &str) -> Result<Category, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField("category"));
    }
    value.parse().map_err(ValidationError::UnknownCategory)
}

/// Validate an add-item draft into an insert payload owned by `owner`
///
/// `is_recovered` on the draft is ignored: new items are always active.
pub fn validate_item_draft(
    draft: &ItemDraft,
    owner: Uuid,
    today: NaiveDate,
) -> Result<NewItem, ValidationError> {
    Ok(NewItem {
        title: required("title", &draft.title)?,
        description: required("description", &draft.description)?,
        post_type: parse_post_type(&draft.post_type)?,
        category: parse_category(&draft.category)?,
        location: required("location", &draft.location)?,
        date_lost_found: parse_past_date("date_lost_found", &draft.date_lost_found, today)?,
        thumbnail_url: optional_url(draft.thumbnail_url.as_deref()),
        contact_name: required("contact_name", &draft.contact_name)?,
        contact_email: parse_email("contact_email", &draft.contact_email)?,
        user_id: owner,
    })
}

/// Validate an update patch; present fields obey the same rules as a draft
pub fn validate_item_patch(
    patch: &ItemPatch,
    today: NaiveDate,
) -> Result<ItemChanges, ValidationError> {
    let changes = ItemChanges {
        title: patch
            .title
            .as_deref()
            .map(|v| required("title", v))
            .transpose()?,
        description: patch
            .description
            .as_deref()
            .map(|v| required("description", v))
            .transpose()?,
        post_type: patch.post_type.as_deref().map(parse_post_type).transpose()?,
        category: patch.category.as_deref().map(parse_category).transpose()?,
        location: patch
            .location
            .as_deref()
            .map(|v| required("location", v))
            .transpose()?,
        date_lost_found: patch
            .date_lost_found
            .as_deref()
            .map(|v| parse_past_date("date_lost_found", v, today))
            .transpose()?,
        thumbnail_url: optional_url(patch.thumbnail_url.as_deref()),
        contact_name: patch
            .contact_name
            .as_deref()
            .map(|v| required("contact_name", v))
            .transpose()?,
        contact_email: patch
            .contact_email
            .as_deref()
            .map(|v| parse_email("contact_email", v))
            .transpose()?,
        ..ItemChanges::default()
    };

    if changes.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }

    Ok(changes)
}

/// Validate a recovery form for `item_id`, logged by `recovered_by`
pub fn validate_recovery_draft(
    draft: &RecoveryDraft,
    item_id: Uuid,
    recovered_by: Uuid,
    today: NaiveDate,
) -> Result<NewRecoveredItem, ValidationError> {
    Ok(NewRecoveredItem {
        item_id,
        recovered_by_user_id: recovered_by,
        recovered_person_name: required("recovered_person_name", &draft.recovered_person_name)?,
        recovered_person_email: parse_email(
            "recovered_person_email",
            &draft.recovered_person_email,
        )?,
        recovered_person_image: optional_url(draft.recovered_person_image.as_deref()),
        recovery_date: parse_past_date("recovery_date", &draft.recovery_date, today)?,
        recovered_location: required("recovered_location", &draft.recovered_location)?,
    })
}
