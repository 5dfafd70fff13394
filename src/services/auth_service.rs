use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};
use crate::models::auth::{AuthResponse, LoginRequest, ResetPasswordRequest, SignUpRequest};
use crate::models::user::{normalize_email, NewUser, Role};
use crate::repositories::UserRepository;
use crate::services::mail_service::{Mailer, OutgoingMail};
use crate::services::password::{hash_password, verify_password};
use crate::services::token_service::TokenIssuer;

const RESET_TOKEN_BYTES: usize = 32;

pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

/// Returns `(raw, sha256_hex(raw))`. Only the hash is ever stored.
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);
    let hashed = hash_reset_token(&raw);
    (raw, hashed)
}

pub fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub fn reset_link(frontend_url: &str, raw_token: &str) -> String {
    format!("{}/reset-password?token={}", frontend_url, raw_token)
}

fn reset_mail_body(link: &str) -> String {
    format!(
        "<p>You are receiving this email because you (or someone else) have requested the reset of a password.</p>\
         <p>Please click the link below to reset your password:</p>\
         <a href=\"{link}\">Reset Password</a>\
         <p>If you did not request this, please ignore this email and your password will remain unchanged.</p>\
         <p>This link will expire in 1 hour.</p>"
    )
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenIssuer>,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenIssuer>,
        mailer: Arc<dyn Mailer>,
        frontend_url: String,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            frontend_url,
        }
    }

    pub async fn sign_up(&self, req: SignUpRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&req.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("User already exists"));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .users
            .create(NewUser::basic(req.name, email, password_hash, Role::User))
            .await?;
        tracing::info!("user registered: id={}", user.id);

        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse::new(&user, token))
    }

    pub async fn log_in(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&req.email);
        let user = match self.users.find_by_email(&email).await? {
            Some(user) if user.active && verify_password(&req.password, &user.password) => user,
            _ => {
                tracing::warn!("failed login attempt for {}", email);
                return Err(AppError::unauthorized("Invalid credentials"));
            }
        };

        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse::new(&user, token))
    }

    /// Stores a fresh reset token hash on the account and mails the raw token.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        self.forgot_password_at(email, Utc::now()).await
    }

    pub async fn forgot_password_at(&self, email: &str, now: DateTime<Utc>) -> AppResult<()> {
        let email = normalize_email(email);
        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let (raw, hashed) = generate_reset_token();
        user.set_reset_token(hashed, now + reset_token_ttl());
        let user = self.users.update(&user).await?;

        let link = reset_link(&self.frontend_url, &raw);
        self.mailer
            .send(OutgoingMail {
                to: user.email.clone(),
                subject: "Reset Password".to_string(),
                html: reset_mail_body(&link),
            })
            .await?;
        tracing::info!("password reset requested: id={}", user.id);
        Ok(())
    }

    pub async fn reset_password(&self, req: ResetPasswordRequest) -> AppResult<()> {
        self.reset_password_at(req, Utc::now()).await
    }

    pub async fn reset_password_at(
        &self,
        req: ResetPasswordRequest,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let hashed = hash_reset_token(&req.token);
        let mut user = self
            .users
            .find_by_reset_token(&hashed, now)
            .await?
            .ok_or_else(|| AppError::bad_request("Token is invalid or has expired"))?;

        user.password = hash_password(&req.password)?;
        user.clear_reset_token();
        self.users.update(&user).await?;
        tracing::info!("password reset completed: id={}", user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryUserRepository;
    use crate::services::mail_service::{redact_tokens, RecordingMailer};

    #[test]
    fn reset_mail_body_is_safe_to_log_once_redacted() {
        let (raw, _) = generate_reset_token();
        let html = reset_mail_body(&reset_link("https://shop.test", &raw));
        assert!(html.contains(&raw));
        assert!(!redact_tokens(&html).contains(&raw));
    }

    struct Harness {
        service: AuthService,
        users: Arc<InMemoryUserRepository>,
        mailer: Arc<RecordingMailer>,
        tokens: Arc<TokenIssuer>,
    }

    fn harness() -> Harness {
        let users = Arc::new(InMemoryUserRepository::new());
        let mailer = Arc::new(RecordingMailer::new());
        let tokens = Arc::new(TokenIssuer::new("test-secret", Duration::hours(24)));
        let service = AuthService::new(
            users.clone(),
            tokens.clone(),
            mailer.clone(),
            "http://frontend.test".to_string(),
        );
        Harness {
            service,
            users,
            mailer,
            tokens,
        }
    }

    fn signup(email: &str) -> SignUpRequest {
        SignUpRequest {
            name: "Ada".into(),
            email: email.into(),
            password: "password123".into(),
        }
    }

    fn token_from_mail(h: &Harness) -> String {
        let mail = h.mailer.last().expect("a reset mail");
        let start = mail.html.find("token=").expect("token in link") + "token=".len();
        mail.html[start..start + RESET_TOKEN_BYTES * 2].to_string()
    }

    #[test]
    fn reset_token_is_random_hex_and_hash_is_sha256() {
        let (raw, hashed) = generate_reset_token();
        assert_eq!(raw.len(), 64);
        assert!(raw.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hashed, hash_reset_token(&raw));
        assert_ne!(raw, hashed);
        assert_ne!(generate_reset_token().0, raw);
    }

    #[test]
    fn sha256_of_known_input() {
        assert_eq!(
            hash_reset_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn signup_twice_conflicts() {
        let h = harness();
        h.service.sign_up(signup("ada@example.com")).await.unwrap();
        let err = h.service.sign_up(signup("ADA@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_issues_token_with_stored_role() {
        let h = harness();
        h.service.sign_up(signup("ada@example.com")).await.unwrap();

        let res = h
            .service
            .log_in(LoginRequest {
                email: "ada@example.com".into(),
                password: "password123".into(),
            })
            .await
            .unwrap();
        let claims = h.tokens.verify(&res.token).unwrap();
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.id.to_string(), res.user.id);
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_email_is_unauthorized() {
        let h = harness();
        h.service.sign_up(signup("ada@example.com")).await.unwrap();

        for (email, password) in [("ada@example.com", "not-the-password"), ("nobody@example.com", "password123")] {
            let err = h
                .service
                .log_in(LoginRequest {
                    email: email.into(),
                    password: password.into(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Unauthorized(_)));
        }
    }

    #[tokio::test]
    async fn deactivated_account_cannot_log_in() {
        let h = harness();
        h.service.sign_up(signup("ada@example.com")).await.unwrap();
        let mut user = h.users.find_by_email("ada@example.com").await.unwrap().unwrap();
        user.active = false;
        h.users.update(&user).await.unwrap();

        let err = h
            .service
            .log_in(LoginRequest {
                email: "ada@example.com".into(),
                password: "password123".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_email_is_not_found() {
        let h = harness();
        let err = h.service.forgot_password("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn forgot_password_stores_only_the_hash() {
        let h = harness();
        h.service.sign_up(signup("ada@example.com")).await.unwrap();
        let now = Utc::now();
        h.service.forgot_password_at("ada@example.com", now).await.unwrap();

        let raw = token_from_mail(&h);
        let mail = h.mailer.last().unwrap();
        assert_eq!(mail.to, "ada@example.com");
        assert!(mail
            .html
            .contains(&format!("http://frontend.test/reset-password?token={}", raw)));

        let user = h.users.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(user.reset_password_token(), Some(hash_reset_token(&raw).as_str()));
        assert_eq!(user.reset_password_expires(), Some(now + reset_token_ttl()));
    }

    #[tokio::test]
    async fn reset_changes_password_and_token_is_single_use() {
        let h = harness();
        h.service.sign_up(signup("ada@example.com")).await.unwrap();
        h.service.forgot_password("ada@example.com").await.unwrap();
        let raw = token_from_mail(&h);

        h.service
            .reset_password(ResetPasswordRequest {
                token: raw.clone(),
                password: "brand-new-pass".into(),
            })
            .await
            .unwrap();

        let user = h.users.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert!(user.reset_password_token().is_none());
        assert!(user.reset_password_expires().is_none());
        assert!(verify_password("brand-new-pass", &user.password));

        let err = h
            .service
            .reset_password(ResetPasswordRequest {
                token: raw,
                password: "another-pass".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let h = harness();
        h.service.sign_up(signup("ada@example.com")).await.unwrap();
        let issued_at = Utc::now() - Duration::hours(2);
        h.service
            .forgot_password_at("ada@example.com", issued_at)
            .await
            .unwrap();
        let raw = token_from_mail(&h);

        let err = h
            .service
            .reset_password(ResetPasswordRequest {
                token: raw,
                password: "brand-new-pass".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let user = h.users.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert!(verify_password("password123", &user.password));
    }

    #[tokio::test]
    async fn newer_request_invalidates_older_token() {
        let h = harness();
        h.service.sign_up(signup("ada@example.com")).await.unwrap();
        h.service.forgot_password("ada@example.com").await.unwrap();
        let first = token_from_mail(&h);
        h.service.forgot_password("ada@example.com").await.unwrap();

        let err = h
            .service
            .reset_password(ResetPasswordRequest {
                token: first,
                password: "brand-new-pass".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
