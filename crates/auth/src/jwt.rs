//! Session token generation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuthError, AuthResult, AuthenticatedUser, DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_JWT_ISSUER};

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sign-in provider account ID).
    pub sub: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// JWT ID.
    pub jti: String,
}

impl Claims {
    /// Creates new claims for a user.
    pub fn new(user: &AuthenticatedUser, issuer: &str, expiration_hours: u64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours as i64);

        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Returns true if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// The session user described by these claims.
    pub fn user(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            id: self.sub.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Token expiration in hours.
    pub expiration_hours: u64,
    /// Token issuer.
    pub issuer: String,
}

impl JwtConfig {
    /// Creates a new JWT configuration.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            issuer: DEFAULT_JWT_ISSUER.to_string(),
        }
    }

    /// Sets the expiration time in hours.
    pub fn with_expiration_hours(mut self, hours: u64) -> Self {
        self.expiration_hours = hours;
        self
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// Session token manager.
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("expiration_hours", &self.config.expiration_hours)
            .field("issuer", &self.config.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Creates a new JWT manager. An empty secret is rejected.
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        if config.secret.trim().is_empty() {
            return Err(AuthError::Configuration(
                "session secret must not be empty".to_string(),
            ));
        }
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Generates a session token for a user.
    pub fn generate_token(&self, user: &AuthenticatedUser) -> AuthResult<String> {
        let claims = Claims::new(user, &self.config.issuer, self.config.expiration_hours);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::JwtEncoding(e.to_string()))
    }

    /// Validates and decodes a token.
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    /// Returns the expiration time in seconds.
    pub fn expiration_seconds(&self) -> u64 {
        self.config.expiration_hours * 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(secret: &str) -> JwtManager {
        JwtManager::new(JwtConfig::new(secret)).unwrap()
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let manager = manager("test-secret-key-must-be-long-enough-for-security");
        let user = AuthenticatedUser::new("google-1234")
            .with_email("test@example.com")
            .with_name("Test User")
            .with_image("https://example.com/a.png");

        let token = manager.generate_token(&user).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.user(), user);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_invalid_token() {
        let manager = manager("test-secret-key-must-be-long-enough-for-security");
        assert!(manager.validate_token("invalid-token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let manager1 = manager("secret-one-must-be-long-enough");
        let manager2 = manager("secret-two-must-be-long-enough");

        let token = manager1
            .generate_token(&AuthenticatedUser::new("user-1"))
            .unwrap();

        assert!(manager2.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let manager1 = manager("shared-secret-must-be-long-enough");
        let manager2 = JwtManager::new(
            JwtConfig::new("shared-secret-must-be-long-enough").with_issuer("someone-else"),
        )
        .unwrap();

        let token = manager2
            .generate_token(&AuthenticatedUser::new("user-1"))
            .unwrap();
        assert!(manager1.validate_token(&token).is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = JwtManager::new(JwtConfig::new("  "));
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn test_optional_claims_omitted() {
        let claims = Claims::new(&AuthenticatedUser::new("user-1"), DEFAULT_JWT_ISSUER, 1);
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["sub"], "user-1");
    }
}
