//! Defines the token claims and how tokens are verified.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The claims read from a verified token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The identity provider's ID for the user.
    pub sub: String,
    /// When the token expires, in seconds since the Unix epoch.
    pub exp: u64,
    /// The user's email address, if the provider shares it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The user's display name, if the provider shares it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The key and rules for verifying bearer tokens.
#[derive(Clone)]
pub struct AuthConfig {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthConfig {
    /// Verify HS256 tokens signed with a shared `secret`.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::new(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    /// Verify RS256 tokens with the provider's public key.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidVerificationKey] if `pem` is not an RSA public key in PEM format.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, Error> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|error| Error::InvalidVerificationKey(error.to_string()))?;

        Ok(Self::new(key, Algorithm::RS256))
    }

    fn new(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Only accept tokens issued for `audience`.
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    /// Only accept tokens from `issuer`.
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    /// Check the signature and expiry of `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidToken] if the token cannot be verified.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|error| Error::InvalidToken(error.to_string()))
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("algorithms", &self.validation.algorithms)
            .field("audience", &self.validation.aud)
            .field("issuer", &self.validation.iss)
            .finish_non_exhaustive()
    }
}
