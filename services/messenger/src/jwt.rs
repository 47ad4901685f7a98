//! JWT service for session token issuance and validation
//!
//! Tokens are HS256-signed with a single process-wide secret and carry the
//! username they were issued for. The server keeps no session state: a
//! token is valid for as long as its signature verifies (and, when a
//! lifetime is configured, until it expires).

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret used to sign and verify tokens
    pub secret: String,
    /// Token lifetime in seconds, `None` for tokens without expiry
    pub token_expiry: Option<u64>,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Signing secret (required)
    /// - `JWT_TOKEN_EXPIRY`: Token lifetime in seconds (default: no expiry)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let token_expiry = match std::env::var("JWT_TOKEN_EXPIRY") {
            Ok(value) => Some(
                value
                    .parse()
                    .map_err(|e| anyhow::anyhow!("Invalid JWT_TOKEN_EXPIRY: {}", e))?,
            ),
            Err(_) => None,
        };

        Ok(JwtConfig {
            secret,
            token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identity the token was issued for
    pub username: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Issues and validates session tokens
pub trait TokenCodec: Send + Sync {
    /// Produce a signed token bound to `username`
    fn issue(&self, username: &str) -> Result<String>;

    /// Check a token and return the username it was issued for
    ///
    /// Every failure is reported as [`ApiError::Unauthorized`], whatever
    /// the underlying cause.
    fn verify(&self, token: &str) -> ApiResult<String>;
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        if config.token_expiry.is_some() {
            validation.set_required_spec_claims(&["exp"]);
        } else {
            validation.required_spec_claims.clear();
        }

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Get the token expiry time
    pub fn token_expiry(&self) -> Option<u64> {
        self.config.token_expiry
    }
}

impl TokenCodec for JwtService {
    fn issue(&self, username: &str) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            username: username.to_string(),
            iat: now,
            exp: self.config.token_expiry.map(|expiry| now + expiry),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    fn verify(&self, token: &str) -> ApiResult<String> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Rejected session token: {}", e);
                ApiError::Unauthorized
            })?;

        Ok(token_data.claims.username)
    }
}
