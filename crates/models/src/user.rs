use sea_orm::{entity::prelude::*, ConnectionTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldError};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: Option<String>,
    pub is_phone_verified: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Account role; admins may edit or remove anybody's posts and comments.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Result<Self, errors::ModelError> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(errors::ModelError::invalid("role", format!("unknown role '{other}'"))),
        }
    }
}

impl Model {
    /// Stored role; unknown values degrade to the least privileged role.
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::User)
    }
}

pub const NAME_MAX: usize = 128;
pub const PHONE_MAX: usize = 32;

pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(errors::ModelError::invalid("email", "please include a valid email"));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::invalid("name", "name is required"));
    }
    if name.trim().chars().count() > NAME_MAX {
        return Err(errors::ModelError::invalid("name", format!("name cannot be more than {NAME_MAX} characters")));
    }
    Ok(())
}

/// Optional phone number: blank means none.
pub fn validate_phone(field: &str, phone: &str) -> Result<Option<String>, errors::ModelError> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > PHONE_MAX {
        return Err(errors::ModelError::invalid(field, format!("{field} cannot be more than {PHONE_MAX} characters")));
    }
    Ok(Some(trimmed.to_string()))
}

/// Record validation failures in `problems`; other errors pass through.
fn gather<T>(problems: &mut Vec<FieldError>, result: Result<T, errors::ModelError>) -> Result<Option<T>, errors::ModelError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(errors::ModelError::Validation(mut v)) => {
            problems.append(&mut v);
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

fn finish(problems: Vec<FieldError>) -> Result<(), errors::ModelError> {
    if problems.is_empty() { Ok(()) } else { Err(errors::ModelError::Validation(problems)) }
}

/// Insert a user. A taken email surfaces as `ModelError::Conflict`.
pub async fn create<C: ConnectionTrait>(db: &C, name: &str, email: &str, phone: Option<&str>) -> Result<Model, errors::ModelError> {
    let mut problems = Vec::new();
    gather(&mut problems, validate_name(name))?;
    gather(&mut problems, validate_email(email))?;
    let phone = match phone {
        Some(p) => gather(&mut problems, validate_phone("phone", p))?.flatten(),
        None => None,
    };
    finish(problems)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        email: Set(email.trim().to_lowercase()),
        role: Set(Role::User.as_str().to_string()),
        phone: Set(phone),
        is_phone_verified: Set(false),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

/// Profile changes; `None` leaves a field as is, a blank phone clears it.
/// A changed phone number is no longer verified.
pub async fn update_details<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<Model, errors::ModelError> {
    let mut problems = Vec::new();
    if let Some(n) = name {
        gather(&mut problems, validate_name(n))?;
    }
    if let Some(e) = email {
        gather(&mut problems, validate_email(e))?;
    }
    let phone = match phone {
        Some(p) => gather(&mut problems, validate_phone("phone", p))?,
        None => None,
    };
    finish(problems)?;

    let current = find_by_id(db, id)
        .await?
        .ok_or_else(|| errors::ModelError::invalid("id", "user not found"))?;
    let phone_changed = phone.as_ref().is_some_and(|p| *p != current.phone);
    let mut am: ActiveModel = current.into();
    if let Some(n) = name {
        am.name = Set(n.trim().to_string());
    }
    if let Some(e) = email {
        am.email = Set(e.trim().to_lowercase());
    }
    if let Some(p) = phone {
        am.phone = Set(p);
    }
    if phone_changed {
        am.is_phone_verified = Set(false);
    }
    Ok(am.update(db).await?)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn set_role(db: &DatabaseConnection, id: Uuid, role: Role) -> Result<Model, errors::ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?
        .ok_or_else(|| errors::ModelError::invalid("id", "user not found"))?
        .into();
    found.role = Set(role.as_str().to_string());
    found.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
