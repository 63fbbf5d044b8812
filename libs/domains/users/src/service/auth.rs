use chrono::{Duration, Utc};
use core_config::JwtConfig;
use domain_kernel::Email;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{LoginRequest, LoginResponse, UserInfo};
use crate::password::PasswordHasher;
use crate::repository::{RoleRepository, UserRepository, UsersUnitOfWork};
use crate::token::TokenIssuer;

const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Password login issuing a bearer token.
///
/// Every credential failure surfaces as [`UserError::InvalidCredentials`];
/// the specific reason is only logged.
#[derive(Clone)]
pub struct AuthService<U: UsersUnitOfWork, H: PasswordHasher, T: TokenIssuer> {
    uow: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    token_lifetime: Duration,
}

impl<U, H, T> AuthService<U, H, T>
where
    U: UsersUnitOfWork,
    H: PasswordHasher,
    T: TokenIssuer,
{
    pub fn new(uow: U, hasher: H, tokens: T) -> Self {
        Self {
            uow: Arc::new(uow),
            hasher: Arc::new(hasher),
            tokens: Arc::new(tokens),
            token_lifetime: Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
        }
    }

    /// Use the token lifetime from `config` instead of the 24h default.
    pub fn with_config(mut self, config: &JwtConfig) -> Self {
        self.token_lifetime = Duration::hours(config.expiration_hours);
        self
    }

    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> UserResult<LoginResponse> {
        let Ok(email) = Email::parse(&request.email) else {
            tracing::warn!("Login rejected: malformed email");
            return Err(UserError::InvalidCredentials);
        };

        let Some(user) = self.uow.users().find_by_email(&email).await? else {
            tracing::warn!(email = %email, "Login rejected: unknown email");
            return Err(UserError::InvalidCredentials);
        };

        if !self.hasher.verify(&request.password, user.password_hash())? {
            tracing::warn!(user_id = ?user.id(), "Login rejected: wrong password");
            return Err(UserError::InvalidCredentials);
        }

        let user_id = user
            .id()
            .ok_or_else(|| UserError::Internal("Stored user has no id".to_string()))?;

        let Some(role) = self.uow.roles().get_by_id(user.role_id()).await? else {
            tracing::error!(user_id, role_id = user.role_id(), "User role is missing");
            return Err(UserError::RoleNotConfigured);
        };

        let expires_at = Utc::now() + self.token_lifetime;
        let role_name = role.description().as_str();
        let token = self
            .tokens
            .generate_token(user_id, email.as_str(), role_name, expires_at)?;

        tracing::info!(user_id, "User logged in");
        Ok(LoginResponse {
            token,
            expires_at,
            user: UserInfo {
                id: user_id,
                email: email.into_inner(),
                role_name: role_name.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use crate::password::MockPasswordHasher;
    use crate::repository::InMemoryUsersUnitOfWork;
    use crate::token::MockTokenIssuer;
    use domain_kernel::{Description, ErrorKind};

    async fn seeded() -> InMemoryUsersUnitOfWork {
        let uow = InMemoryUsersUnitOfWork::new();
        let role = uow
            .roles()
            .add(Role::new(Description::parse("Admin").unwrap()))
            .await
            .unwrap();
        uow.users()
            .add(User::new(
                Email::parse("admin@shop.com").unwrap(),
                "stored-hash".into(),
                role.id().unwrap(),
            ))
            .await
            .unwrap();
        uow
    }

    fn hasher() -> MockPasswordHasher {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_verify()
            .returning(|password, hash| Ok(password == "right" && hash == "stored-hash"));
        hasher
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_login_issues_token_for_user_role() {
        let mut tokens = MockTokenIssuer::new();
        tokens
            .expect_generate_token()
            .withf(|id, email, role, _| *id == 1 && email == "admin@shop.com" && role == "Admin")
            .times(1)
            .returning(|_, _, _, _| Ok("signed".to_string()));

        let service = AuthService::new(seeded().await, hasher(), tokens);
        let before = Utc::now();
        let response = service.login(login("Admin@Shop.com", "right")).await.unwrap();

        assert_eq!(response.token, "signed");
        assert_eq!(response.user.role_name, "Admin");
        assert_eq!(response.user.email, "admin@shop.com");
        let lifetime = response.expires_at - before;
        assert!(lifetime >= Duration::hours(24) && lifetime < Duration::hours(24) + Duration::minutes(1));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let mut tokens = MockTokenIssuer::new();
        tokens.expect_generate_token().never();
        let service = AuthService::new(seeded().await, hasher(), tokens);

        for request in [
            login("not-an-email", "right"),
            login("ghost@shop.com", "right"),
            login("admin@shop.com", "wrong"),
        ] {
            let err = service.login(request).await.unwrap_err();
            assert!(matches!(err, UserError::InvalidCredentials));
            assert_eq!(err.kind(), ErrorKind::Unauthorized);
            assert_eq!(err.to_string(), "Invalid credentials");
        }
    }

    #[tokio::test]
    async fn test_login_uses_configured_lifetime() {
        let mut tokens = MockTokenIssuer::new();
        tokens
            .expect_generate_token()
            .returning(|_, _, _, _| Ok("signed".to_string()));
        let config = JwtConfig::new("0123456789abcdef0123456789abcdef")
            .unwrap()
            .with_expiration_hours(2);

        let service = AuthService::new(seeded().await, hasher(), tokens).with_config(&config);
        let response = service.login(login("admin@shop.com", "right")).await.unwrap();

        assert!(response.expires_at - Utc::now() <= Duration::hours(2));
    }
}
