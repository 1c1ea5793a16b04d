use chrono::{DateTime, FixedOffset};
use models::user::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authz::Actor;

/// Registration input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
}

/// Login input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Profile changes; absent fields are kept, a blank phone clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDetailsInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UpdateDetailsInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordInput {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// A validated registration whose password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Domain user (business view)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_phone_verified: bool,
    pub created_at: DateTime<FixedOffset>,
}

impl From<models::user::Model> for AuthUser {
    fn from(u: models::user::Model) -> Self {
        Self {
            role: u.role(),
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            is_phone_verified: u.is_phone_verified,
            created_at: u.created_at,
        }
    }
}

impl From<&AuthUser> for Actor {
    fn from(u: &AuthUser) -> Self {
        Actor { id: u.id, role: u.role, name: u.name.clone() }
    }
}

/// Domain credentials (hashed)
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Signed token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Email at issue time.
    pub sub: String,
    pub uid: String,
    pub role: Role,
    pub exp: usize,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
}
