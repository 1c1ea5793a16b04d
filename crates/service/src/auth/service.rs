use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{
    AuthSession, AuthUser, Claims, LoginInput, NewAccount, RegisterInput, UpdateDetailsInput, UpdatePasswordInput,
};
use super::errors::AuthError;
use super::repository::AuthRepository;
use models::errors::{FieldError, ModelError};

pub const PASSWORD_MIN: usize = 6;

fn check_password(field: &str, password: &str, problems: &mut Vec<FieldError>) {
    if password.chars().count() < PASSWORD_MIN {
        problems.push(FieldError::new(field, format!("please enter a password with {PASSWORD_MIN} or more characters")));
    }
}

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub password_algorithm: String,
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(c: &configs::AuthConfig) -> Self {
        Self { jwt_secret: c.jwt_secret.clone(), token_ttl_hours: c.token_ttl_hours, password_algorithm: "argon2".into() }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string())
    }

    async fn verify_password(&self, user_id: Uuid, password: &str) -> Result<(), AuthError> {
        let cred = self.repo.get_credentials(user_id).await?.ok_or(AuthError::Unauthorized)?;
        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::Unauthorized)
    }

    /// Register a new user with a hashed password.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        let mut problems: Vec<FieldError> = Vec::new();
        for check in [models::user::validate_name(&input.name), models::user::validate_email(&input.email)] {
            if let Err(ModelError::Validation(mut v)) = check {
                problems.append(&mut v);
            }
        }
        let phone = match input.phone.as_deref().map(|p| models::user::validate_phone("phone", p)).transpose() {
            Ok(phone) => phone.flatten(),
            Err(ModelError::Validation(mut v)) => {
                problems.append(&mut v);
                None
            }
            Err(other) => return Err(other.into()),
        };
        check_password("password", &input.password, &mut problems);
        if !problems.is_empty() {
            return Err(AuthError::Validation(problems));
        }
        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let password_hash = self.hash_password(&input.password)?;
        let account = NewAccount {
            name: input.name,
            email: input.email,
            phone,
            password_hash,
            password_algorithm: self.cfg.password_algorithm.clone(),
        };
        let user = self.repo.create_account(account).await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a signed token.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        self.verify_password(user.id, &input.password).await?;

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    /// Change name, email or phone of the signed-in user.
    #[instrument(skip(self, user, input), fields(user_id = %user.id))]
    pub async fn update_details(&self, user: &AuthUser, input: UpdateDetailsInput) -> Result<AuthUser, AuthError> {
        if input.is_empty() {
            return Err(AuthError::Validation(vec![FieldError::new("name", "provide a name, email or phone to update")]));
        }
        if let Some(email) = input.email.as_deref() {
            if let Some(other) = self.repo.find_user_by_email(email).await? {
                if other.id != user.id {
                    return Err(AuthError::Conflict);
                }
            }
        }
        let updated = self.repo.update_details(user.id, &input).await?;
        info!(user_id = %updated.id, "user_details_updated");
        Ok(updated)
    }

    /// Replace the password after checking the current one; returns a fresh session.
    #[instrument(skip(self, user, input), fields(user_id = %user.id))]
    pub async fn update_password(&self, user: &AuthUser, input: UpdatePasswordInput) -> Result<AuthSession, AuthError> {
        let mut problems: Vec<FieldError> = Vec::new();
        if input.current_password.is_empty() {
            problems.push(FieldError::new("currentPassword", "current password is required"));
        }
        check_password("newPassword", &input.new_password, &mut problems);
        if !problems.is_empty() {
            return Err(AuthError::Validation(problems));
        }
        self.verify_password(user.id, &input.current_password).await?;

        let hash = self.hash_password(&input.new_password)?;
        self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        let token = self.issue_token(user)?;
        info!(user_id = %user.id, "user_password_updated");
        Ok(AuthSession { user: user.clone(), token })
    }

    pub fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp().max(0) as usize;
        let claims = Claims { sub: user.email.clone(), uid: user.id.to_string(), role: user.role, exp };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Verify a token and reload its user, so role changes and deletions
    /// take effect on the next request.
    pub async fn resolve(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthError::Unauthorized
        })?;
        let uid = Uuid::parse_str(&data.claims.uid).map_err(|_| AuthError::Unauthorized)?;
        match self.repo.find_user_by_id(uid).await? {
            Some(user) => Ok(user),
            None => {
                warn!(user_id = %uid, "token for unknown user");
                Err(AuthError::Unauthorized)
            }
        }
    }
}
