//! `post` table: job and service listings stored as one flat row.
//!
//! The enums and field validators here are shared by the service layer,
//! which owns the job/service variant rules.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::ModelError, user};

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 5000;
pub const RATING_MAX: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub post_type: String,
    pub category: String,
    pub location: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub display_contact: String,
    pub company: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub requirements: Option<String>,
    pub provider: Option<String>,
    #[sea_orm(column_type = "Double")]
    pub rating: f64,
    pub rating_count: i32,
    pub user_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Job,
    Service,
}

impl PostType {
    pub const ALL: [PostType; 2] = [PostType::Job, PostType::Service];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Job => "job",
            PostType::Service => "service",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::invalid("type", "type must be either job or service"))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
    Temporary,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Contract,
        JobType::Internship,
        JobType::Temporary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
            JobType::Temporary => "Temporary",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or_else(|| {
            ModelError::invalid(
                "jobType",
                "jobType must be one of Full-time, Part-time, Contract, Internship, Temporary",
            )
        })
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayContact {
    #[default]
    Email,
    Phone,
    Both,
}

impl DisplayContact {
    pub const ALL: [DisplayContact; 3] = [DisplayContact::Email, DisplayContact::Phone, DisplayContact::Both];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayContact::Email => "email",
            DisplayContact::Phone => "phone",
            DisplayContact::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ModelError::invalid("displayContact", "displayContact must be email, phone or both"))
    }

    pub fn needs_phone(&self) -> bool {
        matches!(self, DisplayContact::Phone | DisplayContact::Both)
    }
}

/// Trimmed, non-empty, at most `max` characters.
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<String, ModelError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelError::invalid(field, format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(ModelError::invalid(field, format!("{field} cannot be more than {max} characters")));
    }
    Ok(trimmed.to_string())
}

pub fn validate_title(title: &str) -> Result<String, ModelError> {
    validate_text("title", title, TITLE_MAX)
}

pub fn validate_description(description: &str) -> Result<String, ModelError> {
    validate_text("description", description, DESCRIPTION_MAX)
}

pub fn validate_contact_email(email: &str) -> Result<String, ModelError> {
    let trimmed = validate_text("contactEmail", email, 255)?;
    if !trimmed.contains('@') {
        return Err(ModelError::invalid("contactEmail", "please add a valid contact email"));
    }
    Ok(trimmed)
}

pub fn validate_rating(rating: f64) -> Result<f64, ModelError> {
    if !rating.is_finite() || rating < 0.0 {
        return Err(ModelError::invalid("rating", "rating must be at least 0"));
    }
    if rating > RATING_MAX {
        return Err(ModelError::invalid("rating", "rating cannot be more than 5"));
    }
    Ok(rating)
}

pub fn validate_rating_count(count: i32) -> Result<i32, ModelError> {
    if count < 0 {
        return Err(ModelError::invalid("ratingCount", "ratingCount cannot be negative"));
    }
    Ok(count)
}
