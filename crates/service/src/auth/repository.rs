use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, NewAccount, UpdateDetailsInput};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    /// Store the user and their credentials together. A taken email is `AuthError::Conflict`.
    async fn create_account(&self, account: NewAccount) -> Result<AuthUser, AuthError>;
    async fn update_details(&self, id: Uuid, changes: &UpdateDetailsInput) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;
}

/// Simple in-memory mock repository for tests
pub mod mock {
    use super::*;
    use models::user::Role;
    use std::collections::HashMap;
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: lowercased email
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
    }

    fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, AuthError> {
        m.lock().map_err(|_| AuthError::Repository("mock store poisoned".into()))
    }

    impl MockAuthRepository {
        /// Change a stored user's role, as an operator would.
        pub fn set_role(&self, id: Uuid, role: Role) -> Result<(), AuthError> {
            let mut users = lock(&self.users)?;
            let user = users.values_mut().find(|u| u.id == id).ok_or(AuthError::NotFound)?;
            user.role = role;
            Ok(())
        }

        pub fn remove_user(&self, id: Uuid) -> Result<(), AuthError> {
            lock(&self.users)?.retain(|_, u| u.id != id);
            Ok(())
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            Ok(lock(&self.users)?.get(&email.trim().to_lowercase()).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            Ok(lock(&self.users)?.values().find(|u| u.id == id).cloned())
        }

        async fn create_account(&self, account: NewAccount) -> Result<AuthUser, AuthError> {
            let key = account.email.trim().to_lowercase();
            let mut users = lock(&self.users)?;
            if users.contains_key(&key) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                name: account.name.trim().to_string(),
                email: key.clone(),
                role: Role::User,
                phone: account.phone,
                is_phone_verified: false,
                created_at: chrono::Utc::now().into(),
            };
            let creds = Credentials {
                user_id: user.id,
                password_hash: account.password_hash,
                password_algorithm: account.password_algorithm,
            };
            lock(&self.creds)?.insert(user.id, creds);
            users.insert(key, user.clone());
            Ok(user)
        }

        async fn update_details(&self, id: Uuid, changes: &UpdateDetailsInput) -> Result<AuthUser, AuthError> {
            let mut users = lock(&self.users)?;
            let old_key = users.iter().find(|(_, u)| u.id == id).map(|(k, _)| k.clone()).ok_or(AuthError::NotFound)?;
            let new_key = changes.email.as_deref().map(|e| e.trim().to_lowercase()).unwrap_or_else(|| old_key.clone());
            if new_key != old_key && users.contains_key(&new_key) {
                return Err(AuthError::Conflict);
            }
            let mut user = users.remove(&old_key).ok_or(AuthError::NotFound)?;
            if let Some(name) = changes.name.as_deref() {
                user.name = name.trim().to_string();
            }
            user.email = new_key.clone();
            if let Some(phone) = changes.phone.as_deref() {
                let phone = Some(phone.trim().to_string()).filter(|p| !p.is_empty());
                if phone != user.phone {
                    user.is_phone_verified = false;
                }
                user.phone = phone;
            }
            users.insert(new_key, user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            Ok(lock(&self.creds)?.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let c = Credentials { user_id, password_hash, password_algorithm };
            lock(&self.creds)?.insert(user_id, c.clone());
            Ok(c)
        }
    }
}
