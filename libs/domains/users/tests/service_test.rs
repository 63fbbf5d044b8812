//! Service-level tests for the Users domain
//!
//! Run against the in-memory unit of work with the real Argon2 hasher and
//! JWT issuer, so the whole register/login flow is exercised.

use chrono::Utc;
use core_config::JwtConfig;
use domain_kernel::ErrorKind;
use domain_users::*;
use test_utils::{assertions::*, TestDataBuilder};

const SECRET: &str = "an-integration-test-secret-of-32+chars";

struct Fixture {
    roles: RoleService<InMemoryUsersUnitOfWork>,
    users: UserService<InMemoryUsersUnitOfWork, Argon2PasswordHasher>,
    auth: AuthService<InMemoryUsersUnitOfWork, Argon2PasswordHasher, JwtTokenIssuer>,
    issuer: JwtTokenIssuer,
}

fn fixture() -> Fixture {
    test_utils::init_test_tracing();
    let uow = InMemoryUsersUnitOfWork::new();
    let config = JwtConfig::new(SECRET).unwrap();
    let issuer = JwtTokenIssuer::new(&config);

    Fixture {
        roles: RoleService::new(uow.clone()),
        users: UserService::new(uow.clone(), Argon2PasswordHasher::new()),
        auth: AuthService::new(uow, Argon2PasswordHasher::new(), issuer.clone())
            .with_config(&config),
        issuer,
    }
}

#[tokio::test]
async fn test_register_then_login() {
    let f = fixture();
    let builder = TestDataBuilder::from_test_name("register_then_login");
    let email = builder.email("buyer");

    let role = f
        .roles
        .create_role(CreateRole {
            description: "Customer".into(),
        })
        .await
        .unwrap();
    let user = f
        .users
        .create_user(CreateUser {
            email: email.to_uppercase(),
            password: "correct horse".into(),
            role_id: role.id,
        })
        .await
        .unwrap();
    assert_eq!(user.email, email);

    let response = f
        .auth
        .login(LoginRequest {
            email: email.clone(),
            password: "correct horse".into(),
        })
        .await
        .unwrap();

    let claims = f.issuer.verify(&response.token).unwrap();
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.email, email);
    assert_eq!(claims.role, "Customer");

    let hours_left = (response.expires_at - Utc::now()).num_minutes() as f64 / 60.0;
    assert!((23.9..=24.0).contains(&hours_left));
    assert_eq!(claims.exp, response.expires_at.timestamp());
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_look_the_same() {
    let f = fixture();
    let role = f
        .roles
        .create_role(CreateRole {
            description: "Customer".into(),
        })
        .await
        .unwrap();
    f.users
        .create_user(CreateUser {
            email: "known@shop.com".into(),
            password: "right".into(),
            role_id: role.id,
        })
        .await
        .unwrap();

    let unknown = assert_err(
        f.auth
            .login(LoginRequest {
                email: "unknown@shop.com".into(),
                password: "right".into(),
            })
            .await,
        "unknown email",
    );
    let wrong = assert_err(
        f.auth
            .login(LoginRequest {
                email: "known@shop.com".into(),
                password: "wrong".into(),
            })
            .await,
        "wrong password",
    );

    assert_eq!(unknown.kind(), ErrorKind::Unauthorized);
    assert_eq!(unknown.to_string(), wrong.to_string());
    assert_eq!(unknown.kind(), wrong.kind());
}

#[tokio::test]
async fn test_role_with_users_cannot_be_deleted() {
    let f = fixture();
    let role = f
        .roles
        .create_role(CreateRole {
            description: "Staff".into(),
        })
        .await
        .unwrap();
    f.users
        .create_user(CreateUser {
            email: "staff@shop.com".into(),
            password: "pw".into(),
            role_id: role.id,
        })
        .await
        .unwrap();

    let err = assert_err(f.roles.delete_role(role.id).await, "delete role in use");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let still_there = f.roles.get_role(role.id).await.unwrap();
    assert_eq!(still_there.user_count, 1);
}

#[tokio::test]
async fn test_password_change_takes_effect_on_login() {
    let f = fixture();
    let role = f
        .roles
        .create_role(CreateRole {
            description: "Customer".into(),
        })
        .await
        .unwrap();
    let user = f
        .users
        .create_user(CreateUser {
            email: "mover@shop.com".into(),
            password: "old-password".into(),
            role_id: role.id,
        })
        .await
        .unwrap();

    f.users
        .change_password(
            user.id,
            ChangePassword {
                current_password: "old-password".into(),
                new_password: "new-password".into(),
            },
        )
        .await
        .unwrap();

    let old = f
        .auth
        .login(LoginRequest {
            email: "mover@shop.com".into(),
            password: "old-password".into(),
        })
        .await;
    assert!(matches!(old, Err(UserError::InvalidCredentials)));

    f.auth
        .login(LoginRequest {
            email: "mover@shop.com".into(),
            password: "new-password".into(),
        })
        .await
        .unwrap();
}
