use crate::{env_or_default, env_parse_or, env_required, ConfigError, FromEnv};

pub const MIN_SECRET_LEN: usize = 32;
pub const DEFAULT_ISSUER: &str = "catalog";
pub const DEFAULT_AUDIENCE: &str = "catalog";
pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Token signing configuration.
///
/// Loaded from environment variables:
/// - `JWT_SECRET` (required) - at least 32 characters
/// - `JWT_ISSUER` (default: "catalog")
/// - `JWT_AUDIENCE` (default: "catalog")
/// - `JWT_EXPIRATION_HOURS` (default: 24)
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_hours: i64,
}

impl JwtConfig {
    /// Build a config with default issuer, audience and lifetime.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        check_secret(&secret)?;
        Ok(Self {
            secret,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            expiration_hours: DEFAULT_EXPIRATION_HOURS,
        })
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_expiration_hours(mut self, hours: i64) -> Self {
        self.expiration_hours = hours;
        self
    }
}

fn check_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::ParseError {
            key: "JWT_SECRET".to_string(),
            details: format!(
                "must be at least {} characters (got {}). Generate one with: openssl rand -base64 32",
                MIN_SECRET_LEN,
                secret.len()
            ),
        });
    }
    Ok(())
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;
        check_secret(&secret)?;

        let expiration_hours = env_parse_or("JWT_EXPIRATION_HOURS", DEFAULT_EXPIRATION_HOURS)?;
        if expiration_hours <= 0 {
            return Err(ConfigError::ParseError {
                key: "JWT_EXPIRATION_HOURS".to_string(),
                details: "must be a positive number of hours".to_string(),
            });
        }

        Ok(Self {
            secret,
            issuer: env_or_default("JWT_ISSUER", DEFAULT_ISSUER),
            audience: env_or_default("JWT_AUDIENCE", DEFAULT_AUDIENCE),
            expiration_hours,
        })
    }
}
