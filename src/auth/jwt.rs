use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};

use crate::config::JwtConfig;
use crate::error::AppError;

use super::Claims;

pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(config: &JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::default();

        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(ref audience) = config.audience {
            validation.set_audience(&[audience]);
        }

        Self {
            decoding_key,
            validation,
        }
    }

    /// Decode and verify a bearer token.
    ///
    /// The decoder's error stays in the server log. Clients only learn
    /// whether the token expired or was rejected outright.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                let message = match e.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    _ => "Invalid token",
                };
                AppError::Auth(message.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn create_test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            issuer: None,
            audience: None,
        }
    }

    fn create_test_token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn test_claims(exp_offset: i64) -> Claims {
        Claims {
            sub: "42".to_string(),
            username: Some("alice".to_string()),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            iat: chrono::Utc::now().timestamp(),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_valid_token() {
        let config = create_test_config();
        let validator = JwtValidator::new(&config);

        let token = create_test_token(&test_claims(3600), &config.secret);
        let validated = validator.validate(&token).unwrap();

        assert_eq!(validated.sub, "42");
        assert_eq!(validated.identity(), Some("alice"));
    }

    #[test]
    fn test_invalid_token() {
        let validator = JwtValidator::new(&create_test_config());
        assert!(matches!(
            validator.validate("invalid-token"),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let validator = JwtValidator::new(&create_test_config());
        let token = create_test_token(&test_claims(3600), "another-secret");
        assert!(validator.validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = create_test_config();
        let validator = JwtValidator::new(&config);
        // Beyond the default 60s leeway
        let token = create_test_token(&test_claims(-600), &config.secret);
        assert!(matches!(
            validator.validate(&token),
            Err(AppError::Auth(msg)) if msg == "Token expired"
        ));
    }

    #[test]
    fn test_decode_detail_not_in_message() {
        let validator = JwtValidator::new(&create_test_config());
        let token = create_test_token(&test_claims(3600), "another-secret");

        let Err(AppError::Auth(msg)) = validator.validate(&token) else {
            panic!("expected auth error");
        };
        assert_eq!(msg, "Invalid token");
        assert!(!msg.to_lowercase().contains("signature"));
    }

    #[test]
    fn test_issuer_enforced() {
        let config = JwtConfig {
            issuer: Some("rooms-api".to_string()),
            ..create_test_config()
        };
        let validator = JwtValidator::new(&config);

        let mut foreign = test_claims(3600);
        foreign
            .extra
            .insert("iss".to_string(), serde_json::json!("someone-else"));
        let token = create_test_token(&foreign, &config.secret);
        assert!(validator.validate(&token).is_err());

        let mut trusted = test_claims(3600);
        trusted
            .extra
            .insert("iss".to_string(), serde_json::json!("rooms-api"));
        let token = create_test_token(&trusted, &config.secret);
        assert!(validator.validate(&token).is_ok());
    }
}
