use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT payload. `sub` carries the user id; times are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Issues and validates HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|_| TokenError::Invalid)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_returns_subject() {
        let svc = TokenService::new("test-secret", 24);
        let user_id = Uuid::new_v4();
        let token = svc.issue(user_id).unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = TokenService::new("secret-a", 24);
        let verifier = TokenService::new("secret-b", 24);
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert_eq!(verifier.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        // Issue with a negative expiry so the token is already stale.
        let svc = TokenService::new("test-secret", -2);
        let token = svc.issue(Uuid::new_v4()).unwrap();
        assert_eq!(svc.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let svc = TokenService::new("test-secret", 24);
        let mut token = svc.issue(Uuid::new_v4()).unwrap();
        token.push('x');
        assert_eq!(svc.verify(&token), Err(TokenError::Invalid));
    }
}
