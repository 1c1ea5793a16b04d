use chrono::{DateTime, FixedOffset};
use models::comment;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    #[serde(rename = "post")]
    pub post_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    /// Author display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl Comment {
    pub fn from_row(row: comment::Model, user_name: Option<String>) -> Self {
        Self {
            id: row.id,
            text: row.text,
            post_id: row.post_id,
            user_id: row.user_id,
            user_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Body of add and edit requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentInput {
    pub text: Option<String>,
}

impl CommentInput {
    pub fn validated_text(&self) -> Result<String, models::errors::ModelError> {
        comment::validate_text(self.text.as_deref().unwrap_or_default())
    }
}
