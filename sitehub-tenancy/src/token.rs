//! HS256 bearer tokens carrying the tenant id

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sitehub_config::AuthConfig;
use tracing::debug;

use crate::error::ResolveError;

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Tenant id
    pub tid: i32,
    /// Login email of the authenticated user
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Signs and verifies tenant tokens with a shared secret
pub struct JwtManager {
    issuer: String,
    token_expiry: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            token_expiry: config.token_expiry,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    pub fn token_expiry(&self) -> Duration {
        self.token_expiry
    }

    /// Issue a token for `subject` in tenant `tenant_id`
    pub fn issue(&self, tenant_id: i32, subject: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            tid: tenant_id,
            sub: subject.to_string(),
            iat: now,
            exp: now + self.token_expiry.as_secs() as i64,
            iss: self.issuer.clone(),
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
    }

    /// Verify signature, issuer and expiry. Expiry is reported separately.
    pub fn verify(&self, token: &str) -> Result<Claims, ResolveError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    debug!("Rejected expired token");
                    ResolveError::ExpiredToken
                }
                other => {
                    debug!("Rejected token: {:?}", other);
                    ResolveError::InvalidToken
                }
            })
    }
}
