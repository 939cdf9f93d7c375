//! Input records accepted by workflow operations.
//!
//! Boundary handlers deserialize requests into these records. Each record's
//! `validate` collects every field failure into one
//! [`LearningError::Validation`] instead of stopping at the first.

use learning::{
    CategoryId, Date, LearningError, QuestionType, Role, Timestamp, UserId, ValidationErrors,
};
use serde::{Deserialize, Serialize};

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Minimal structural email check: one `@`, a non-empty local part, and a
/// dotted domain without whitespace.
pub(crate) fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), LearningError> {
        let mut errors = ValidationErrors::new();
        errors.check(blank(&self.name), "name", "must not be blank");
        errors.check(
            self.name.len() > 100,
            "name",
            "must be at most 100 characters",
        );
        errors.check(
            !is_plausible_email(&self.email),
            "email",
            "must be a valid email address",
        );
        errors.into_result()
    }
}

/// Replacement values for a user's profile. Absent fields are cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFields {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
}

impl ProfileFields {
    pub fn validate(&self) -> Result<(), LearningError> {
        let mut errors = ValidationErrors::new();
        errors.check(
            self.bio.as_deref().is_some_and(|b| b.len() > 2000),
            "bio",
            "must be at most 2000 characters",
        );
        for (field, value) in [
            ("avatar_url", &self.avatar_url),
            ("website", &self.website),
            ("linkedin", &self.linkedin),
        ] {
            errors.check(
                value.as_deref().is_some_and(|v| !is_http_url(v)),
                field,
                "must be an http(s) URL",
            );
        }
        errors.check(
            self.phone
                .as_deref()
                .is_some_and(|p| !p.chars().all(|c| c.is_ascii_digit() || "+-() ".contains(c))),
            "phone",
            "may only contain digits, spaces, and + - ( )",
        );
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCourse {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_hours: Option<u32>,
    #[serde(default)]
    pub start_date: Option<Date>,
    #[serde(default)]
    pub category: Option<CategoryId>,
    pub teacher: UserId,
}

impl NewCourse {
    pub fn validate(&self) -> Result<(), LearningError> {
        let mut errors = ValidationErrors::new();
        errors.check(blank(&self.title), "title", "must not be blank");
        errors.check(
            self.duration_hours == Some(0),
            "duration_hours",
            "must be positive when set",
        );
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewModule {
    pub title: String,
}

impl NewModule {
    pub fn validate(&self) -> Result<(), LearningError> {
        let mut errors = ValidationErrors::new();
        errors.check(blank(&self.title), "title", "must not be blank");
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLesson {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl NewLesson {
    pub fn validate(&self) -> Result<(), LearningError> {
        let mut errors = ValidationErrors::new();
        errors.check(blank(&self.title), "title", "must not be blank");
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssignment {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<Timestamp>,
    pub max_score: u32,
}

impl NewAssignment {
    pub fn validate(&self) -> Result<(), LearningError> {
        let mut errors = ValidationErrors::new();
        errors.check(blank(&self.title), "title", "must not be blank");
        errors.check(
            self.max_score == 0,
            "max_score",
            "must be greater than zero",
        );
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    pub kind: QuestionType,
}

impl NewQuestion {
    pub fn validate(&self) -> Result<(), LearningError> {
        let mut errors = ValidationErrors::new();
        errors.check(blank(&self.text), "text", "must not be blank");
        errors.into_result()
    }
}

/// Validates a single required name field (categories, tags, quiz titles).
pub(crate) fn validate_name(field: &str, value: &str) -> Result<(), LearningError> {
    let mut errors = ValidationErrors::new();
    errors.check(blank(value), field, "must not be blank");
    errors.check(value.len() > 200, field, "must be at most 200 characters");
    errors.into_result()
}
