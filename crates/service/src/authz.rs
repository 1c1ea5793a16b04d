//! Owner-or-admin rule shared by posts and comments.

use models::user::Role;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::ServiceError;

/// The authenticated user performing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
}

pub fn can_mutate(actor: &Actor, owner_id: Uuid) -> bool {
    actor.id == owner_id || actor.role == Role::Admin
}

/// `action` completes "Not authorized to ...", e.g. "update this post".
pub fn ensure_can_mutate(actor: &Actor, owner_id: Uuid, action: &str) -> Result<(), ServiceError> {
    if can_mutate(actor, owner_id) {
        Ok(())
    } else {
        tracing::warn!(actor = %actor.id, owner = %owner_id, action, "mutation denied");
        Err(ServiceError::Unauthorized(format!("Not authorized to {action}")))
    }
}
