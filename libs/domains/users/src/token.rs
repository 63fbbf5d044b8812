use chrono::{DateTime, Utc};
use core_config::JwtConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{UserError, UserResult};

/// Issues bearer tokens after a successful login
#[cfg_attr(test, mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn generate_token(
        &self,
        user_id: i32,
        email: &str,
        role: &str,
        expires_at: DateTime<Utc>,
    ) -> UserResult<String>;
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// HS256 issuer configured from [`JwtConfig`]
#[derive(Clone)]
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl JwtTokenIssuer {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    /// Check signature, expiry, issuer and audience, then return the claims.
    pub fn verify(&self, token: &str) -> UserResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| UserError::Token(e.to_string()))
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn generate_token(
        &self,
        user_id: i32,
        email: &str,
        role: &str,
        expires_at: DateTime<Utc>,
    ) -> UserResult<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header {
            alg: Algorithm::HS256,
            ..Default::default()
        };

        encode(&header, &claims, &self.encoding_key).map_err(|e| UserError::Token(e.to_string()))
    }
}
