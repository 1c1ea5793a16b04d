#![cfg(test)]
use migration::MigratorTrait;
use models::user::Role;
use sea_orm::DatabaseConnection;

use crate::authz::Actor;

/// Fresh in-memory database with the schema applied. Each call is isolated.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let db = models::db::connect_in_memory().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn seed_user(db: &DatabaseConnection, name: &str, email: &str, role: Role) -> Actor {
    let user = models::user::create(db, name, email, None).await.expect("seed user");
    if role != Role::User {
        models::user::set_role(db, user.id, role).await.expect("set role");
    }
    Actor { id: user.id, role, name: user.name }
}
