//! JWT access token utilities.
//!
//! Tokens are issued by the external identity service and validated here.
//! Production deployments verify RS256 signatures with the identity service's
//! public key; development and test setups may use an HS256 shared secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Token signing is not configured")]
    SigningUnavailable,
}

/// JWT token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (numeric user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID (unique token identifier)
    pub jti: String,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Type of JWT token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Keys and settings for validating (and optionally issuing) access tokens.
#[derive(Clone)]
pub struct JwtConfig {
    algorithm: Algorithm,
    /// Present only when this process is allowed to sign tokens.
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    /// Access token expiration in seconds
    pub access_token_expiry_secs: i64,
    /// Leeway in seconds for clock skew tolerance
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("can_sign", &self.encoding_key.is_some())
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

impl JwtConfig {
    /// Creates an RS256 config from PEM keys.
    ///
    /// The private key is optional: a pure API node only needs the public key
    /// to verify tokens minted by the identity service.
    pub fn from_rsa_pem(
        private_key_pem: Option<&str>,
        public_key_pem: &str,
        access_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        let encoding_key = private_key_pem
            .filter(|pem| !pem.trim().is_empty())
            .map(|pem| {
                EncodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| JwtError::InvalidKey(format!("Invalid private key: {}", e)))
            })
            .transpose()?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            algorithm: Algorithm::RS256,
            encoding_key,
            decoding_key,
            access_token_expiry_secs,
            leeway_secs,
        })
    }

    /// Creates an HS256 config from a shared secret.
    pub fn from_secret(secret: &str, access_token_expiry_secs: i64, leeway_secs: u64) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: Some(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry_secs,
            leeway_secs,
        }
    }

    /// Returns the signing algorithm in use.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Generates an access token for the given user ID.
    ///
    /// Returns the encoded token and its jti.
    pub fn generate_access_token(&self, user_id: i64) -> Result<(String, String), JwtError> {
        let encoding_key = self
            .encoding_key
            .as_ref()
            .ok_or(JwtError::SigningUnavailable)?;

        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::seconds(self.access_token_expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
            token_type: TokenType::Access,
        };

        let token = encode(&Header::new(self.algorithm), &claims, encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, jti))
    }

    /// Validates a token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validates an access token specifically.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Access {
            return Err(JwtError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Extracts the numeric user ID from validated claims.
pub fn extract_user_id(claims: &Claims) -> Result<i64, JwtError> {
    claims
        .sub
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(JwtError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn create_test_config() -> JwtConfig {
        JwtConfig::from_secret("test_secret_key_for_jwt_testing_12345", 900, 0)
    }

    #[test]
    fn test_generate_access_token() {
        let config = create_test_config();

        let (token, jti) = config.generate_access_token(42).unwrap();

        assert!(!token.is_empty());
        assert!(!jti.is_empty());
        assert_eq!(token.matches('.').count(), 2);
    }

    #[test]
    fn test_validate_access_token() {
        let config = create_test_config();

        let (token, jti) = config.generate_access_token(7).unwrap();
        let claims = config.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.jti, jti);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let config = create_test_config();
        let now = Utc::now();
        let claims = Claims {
            sub: "7".to_string(),
            exp: (now + Duration::seconds(60)).timestamp(),
            iat: now.timestamp(),
            jti: "refresh-jti".to_string(),
            token_type: TokenType::Refresh,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test_secret_key_for_jwt_testing_12345"),
        )
        .unwrap();

        let result = config.validate_access_token(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let issuer = JwtConfig::from_secret("another-secret", 900, 0);
        let (token, _) = issuer.generate_access_token(1).unwrap();

        let result = create_test_config().validate_access_token(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let mut config = create_test_config();
        config.access_token_expiry_secs = 1;

        let (token, _) = config.generate_access_token(3).unwrap();
        sleep(StdDuration::from_secs(2));

        let result = config.validate_access_token(&token);
        assert!(
            matches!(result, Err(JwtError::TokenExpired)),
            "Expected TokenExpired, got: {:?}",
            result
        );
    }

    #[test]
    fn test_malformed_token() {
        let config = create_test_config();
        assert!(config.validate_token("not_a_jwt").is_err());
    }

    #[test]
    fn test_extract_user_id() {
        let config = create_test_config();

        let (token, _) = config.generate_access_token(1234).unwrap();
        let claims = config.validate_access_token(&token).unwrap();

        assert_eq!(extract_user_id(&claims).unwrap(), 1234);
    }

    #[test]
    fn test_extract_user_id_rejects_non_numeric_subject() {
        let claims = Claims {
            sub: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            exp: 0,
            iat: 0,
            jti: String::new(),
            token_type: TokenType::Access,
        };
        assert!(matches!(
            extract_user_id(&claims),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_unique_jti_per_token() {
        let config = create_test_config();

        let (_, jti1) = config.generate_access_token(1).unwrap();
        let (_, jti2) = config.generate_access_token(1).unwrap();

        assert_ne!(jti1, jti2);
    }

    #[test]
    fn test_verify_only_config_cannot_sign() {
        let config = JwtConfig {
            algorithm: Algorithm::HS256,
            encoding_key: None,
            decoding_key: DecodingKey::from_secret(b"x"),
            access_token_expiry_secs: 60,
            leeway_secs: 0,
        };
        assert!(matches!(
            config.generate_access_token(1),
            Err(JwtError::SigningUnavailable)
        ));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", create_test_config());
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("test_secret_key"));
    }
}
