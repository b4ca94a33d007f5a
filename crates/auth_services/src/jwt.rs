use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::types::{AuthError, Claims, Identity, Role};

const DEFAULT_SECRET: &str = "your-secret-key-change-this-in-production";
const DEFAULT_EXPIRE_DAYS: i64 = 30;

/// Signing configuration for access tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret used to sign and verify tokens
    pub secret: String,
    /// Token lifetime in days
    pub expire_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expire_days: DEFAULT_EXPIRE_DAYS,
        }
    }
}

impl JwtConfig {
    /// Reads `JWT_SECRET` and `JWT_EXPIRE_DAYS`, falling back to the defaults.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET is not set, using the development secret");
            DEFAULT_SECRET.to_string()
        });
        let expire_days = std::env::var("JWT_EXPIRE_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|days: &i64| *days > 0)
            .unwrap_or(DEFAULT_EXPIRE_DAYS);

        Self {
            secret,
            expire_days,
        }
    }
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expire_days: i64,
}

impl JwtService {
    /// Creates a token service from the given configuration.
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_ref()),
            decoding_key: DecodingKey::from_secret(config.secret.as_ref()),
            expire_days: config.expire_days,
        }
    }

    /// Token lifetime in days
    pub fn expire_days(&self) -> i64 {
        self.expire_days
    }

    /// Signs an access token for the given user.
    pub fn generate_token(&self, user_id: &Uuid, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: (now + Duration::days(self.expire_days)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Decodes and validates a token, including its expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }

    /// Verifies a token and returns the identity it carries.
    pub fn identity_from_token(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.verify_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            AuthError::Jwt(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidSubject,
            ))
        })?;

        Ok(Identity {
            user_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(&JwtConfig::default())
    }

    #[test]
    fn test_generate_and_verify_token() {
        let service = service();
        let user_id = Uuid::new_v4();

        let token = service.generate_token(&user_id, Role::Admin).unwrap();
        let identity = service.identity_from_token(&token).unwrap();

        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn test_token_expiry_follows_config() {
        let service = JwtService::new(&JwtConfig {
            secret: "test-secret".to_string(),
            expire_days: 2,
        });
        let token = service.generate_token(&Uuid::new_v4(), Role::User).unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 2 * 24 * 60 * 60);
    }

    #[test]
    fn test_invalid_token() {
        assert!(service().verify_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let other = JwtService::new(&JwtConfig {
            secret: "another-secret".to_string(),
            expire_days: 1,
        });
        let token = other.generate_token(&Uuid::new_v4(), Role::User).unwrap();

        assert!(service().verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = service();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: Role::User,
            exp: (Utc::now() - Duration::days(1)).timestamp() as usize,
            iat: (Utc::now() - Duration::days(2)).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        assert!(service.verify_token(&token).is_err());
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let service = service();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            role: Role::User,
            exp: (Utc::now() + Duration::days(1)).timestamp() as usize,
            iat: Utc::now().timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        assert!(service.identity_from_token(&token).is_err());
    }
}
