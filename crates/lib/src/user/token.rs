//! Signed session tokens.
//!
//! Tokens are HS256 JWTs. The signing secret is fixed for the lifetime of the
//! issuer; a process started without one gets a random secret, which means
//! its tokens stop verifying after a restart.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::errors::UserError;
use super::types::{Role, User};
use crate::constants::{DEFAULT_TOKEN_TTL, GENERATED_SECRET_LENGTH};
use crate::{Clock, Result, SystemClock};

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Issued at, Unix seconds
    pub iat: i64,
    /// Expiry, Unix seconds
    pub exp: i64,
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Signs and verifies session tokens with one process-wide secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    generated: bool,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .field("generated", &self.generated)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer with an explicit signing secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: DEFAULT_TOKEN_TTL,
            clock: Arc::new(SystemClock),
            generated: false,
        }
    }

    /// Create an issuer with a random secret that lives only in this process.
    pub fn generate() -> Self {
        let mut secret = Zeroizing::new([0u8; GENERATED_SECRET_LENGTH]);
        rand::thread_rng().fill_bytes(&mut secret[..]);
        tracing::warn!(
            "No token secret configured; generated a random one. Tokens will not survive a restart"
        );
        let mut issuer = Self::new(&secret[..]);
        issuer.generated = true;
        issuer
    }

    /// Use `secret` when given, otherwise generate one.
    pub fn from_optional_secret(secret: Option<&str>) -> Self {
        match secret {
            Some(secret) if !secret.is_empty() => Self::new(secret.as_bytes()),
            _ => Self::generate(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True when the secret was generated rather than configured.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Sign a token for `user`.
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        let iat = self.clock.now_secs();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let exp = iat.saturating_add(ttl);
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| UserError::TokenIssueFailed {
                reason: e.to_string(),
            })?;

        Ok(IssuedToken {
            token,
            expires_at: exp,
        })
    }

    /// Check the signature and expiry of `token` and return its claims.
    ///
    /// Expiry is judged against the issuer's clock.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map_err(
            |e| UserError::InvalidToken {
                reason: e.to_string(),
            },
        )?;

        if data.claims.exp <= self.clock.now_secs() {
            return Err(UserError::InvalidToken {
                reason: "token expired".to_string(),
            }
            .into());
        }

        Ok(data.claims)
    }
}
