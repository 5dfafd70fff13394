use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::error::{AppError, AppResult};
use crate::models::auth::Claims;
use crate::models::user::User;

/// Signs and verifies bearer tokens carrying `{id, role}`.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id,
            role: user.role,
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))
    }

    /// Bad signature, malformed input and expiry all fail the same way.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("token rejected: {}", e);
                AppError::unauthorized("Invalid or expired token")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{NewUser, Role};

    fn user(role: Role) -> User {
        User::from_new(
            42,
            NewUser::basic("ada".into(), "ada@example.com".into(), "hash".into(), role),
            Utc::now(),
        )
    }

    #[test]
    fn issued_token_verifies_with_role() {
        let issuer = TokenIssuer::new("test-secret", Duration::hours(24));
        let token = issuer.issue(&user(Role::Admin)).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn other_secret_is_rejected() {
        let a = TokenIssuer::new("secret-a", Duration::hours(1));
        let b = TokenIssuer::new("secret-b", Duration::hours(1));
        let token = a.issue(&user(Role::User)).unwrap();
        assert!(matches!(b.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", Duration::hours(1));
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            id: 1,
            role: Role::User,
            iat: past.timestamp() as usize,
            exp: (past + Duration::minutes(30)).timestamp() as usize,
        };
        let token = issuer.sign(&claims).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", Duration::hours(1));
        assert!(issuer.verify("invalid.token.here").is_err());
        assert!(issuer.verify("").is_err());
    }
}
