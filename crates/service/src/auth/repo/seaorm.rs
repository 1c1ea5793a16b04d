use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials, NewAccount, UpdateDetailsInput};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn credentials(c: models::user_credentials::Model) -> Credentials {
    Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::find_by_email(&self.db, email).await?;
        Ok(res.map(AuthUser::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::find_by_id(&self.db, id).await?;
        Ok(res.map(AuthUser::from))
    }

    async fn create_account(&self, account: NewAccount) -> Result<AuthUser, AuthError> {
        // Dropping the transaction on an early return rolls the user row back.
        let txn = self.db.begin().await?;
        let user = models::user::create(&txn, &account.name, &account.email, account.phone.as_deref()).await?;
        models::user_credentials::upsert_password(&txn, user.id, account.password_hash, &account.password_algorithm).await?;
        txn.commit().await?;
        Ok(AuthUser::from(user))
    }

    async fn update_details(&self, id: Uuid, changes: &UpdateDetailsInput) -> Result<AuthUser, AuthError> {
        let updated = models::user::update_details(
            &self.db,
            id,
            changes.name.as_deref(),
            changes.email.as_deref(),
            changes.phone.as_deref(),
        )
        .await?;
        Ok(AuthUser::from(updated))
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(credentials))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(credentials(c))
    }
}
