//! Signed session tokens.
//!
//! The claims are the only source of role and company for authorization;
//! nothing is re-read from the store while a token is valid, so a role change
//! takes effect when the holder next logs in.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::access::Caller;
use crate::models::user::{Role, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub company_id: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn into_caller(self) -> Caller {
        Caller::from_claims(self.id, self.name, self.email, self.role, self.company_id)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign session token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("session token rejected: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// HS256 signing material plus the session lifetime.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            company_id: user.company_id,
            iat: now,
            exp: now + self.ttl_secs,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Encode)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}
