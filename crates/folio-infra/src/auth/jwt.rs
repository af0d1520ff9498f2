//! HS256 JWT verification for tokens minted by the external auth provider.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
use uuid::Uuid;

use folio_core::ports::{AuthError, IdentityVerifier, VerifiedIdentity};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Required `iss` claim. `None` accepts any issuer.
    pub issuer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    name: Option<String>,
}

/// Verifies the signature, expiry and (optionally) issuer of a bearer token.
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::default();
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(format!("sub: {e}")))?;

        Ok(VerifiedIdentity {
            user_id,
            name: data.claims.name.filter(|n| !n.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        name: Option<&'a str>,
        exp: i64,
        iss: &'a str,
    }

    fn token(secret: &str, sub: &str, iss: &str, expires_in: TimeDelta) -> String {
        let claims = TestClaims {
            sub,
            name: Some("Ada"),
            exp: (Utc::now() + expires_in).timestamp(),
            iss,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier(issuer: Option<&str>) -> JwtIdentityVerifier {
        JwtIdentityVerifier::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            issuer: issuer.map(str::to_string),
        })
    }

    #[test]
    fn test_verify_valid_token() {
        let user_id = Uuid::new_v4();
        let token = token("test-secret-key", &user_id.to_string(), "auth", TimeDelta::hours(1));

        let identity = verifier(Some("auth")).verify(&token).unwrap();

        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_verify_garbage_token() {
        let result = verifier(None).verify("invalid-token");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let token = token("other-secret", &Uuid::new_v4().to_string(), "auth", TimeDelta::hours(1));
        assert!(verifier(None).verify(&token).is_err());
    }

    #[test]
    fn test_verify_wrong_issuer() {
        let token = token("test-secret-key", &Uuid::new_v4().to_string(), "someone-else", TimeDelta::hours(1));
        assert!(verifier(Some("auth")).verify(&token).is_err());
        assert!(verifier(None).verify(&token).is_ok());
    }

    #[test]
    fn test_verify_expired_token() {
        // Beyond the default 60s leeway.
        let token = token("test-secret-key", &Uuid::new_v4().to_string(), "auth", TimeDelta::hours(-1));
        assert!(matches!(verifier(None).verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_verify_non_uuid_subject() {
        let token = token("test-secret-key", "user-42", "auth", TimeDelta::hours(1));
        assert!(matches!(verifier(None).verify(&token), Err(AuthError::InvalidToken(_))));
    }
}
