use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Emails are stored and looked up trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A stored account. `password` is the argon2 PHC string.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub age: Option<i32>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub gender: Option<Gender>,
    reset_password_token: Option<String>,
    reset_password_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn reset_password_token(&self) -> Option<&str> {
        self.reset_password_token.as_deref()
    }

    pub fn reset_password_expires(&self) -> Option<DateTime<Utc>> {
        self.reset_password_expires
    }

    /// Token hash and expiry are only ever written together.
    pub fn set_reset_token(&mut self, token_hash: String, expires: DateTime<Utc>) {
        self.reset_password_token = Some(token_hash);
        self.reset_password_expires = Some(expires);
    }

    pub fn clear_reset_token(&mut self) {
        self.reset_password_token = None;
        self.reset_password_expires = None;
    }

    pub fn reset_token_matches(&self, token_hash: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_password_token, self.reset_password_expires) {
            (Some(stored), Some(expires)) => stored == token_hash && expires > now,
            _ => false,
        }
    }

    /// Builds an in-memory record; used by the in-memory store and tests.
    pub fn from_new(id: i32, new: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            password: new.password_hash,
            role: new.role,
            avatar: new.avatar,
            age: new.age,
            phone_number: new.phone_number,
            address: new.address,
            active: new.active,
            gender: new.gender,
            reset_password_token: None,
            reset_password_expires: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Insert payload handed to the repository; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub age: Option<i32>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub gender: Option<Gender>,
}

impl NewUser {
    pub fn basic(name: String, email: String, password_hash: String, role: Role) -> Self {
        Self {
            name,
            email,
            password_hash,
            role,
            avatar: None,
            age: None,
            phone_number: None,
            address: None,
            active: true,
            gender: None,
        }
    }
}

/// Identity block returned by auth and user listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Full public view of an account; never includes the password or reset fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub age: Option<i32>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub gender: Option<Gender>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            avatar: user.avatar.clone(),
            age: user.age,
            phone_number: user.phone_number.clone(),
            address: user.address.clone(),
            active: user.active,
            gender: user.gender,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 20, message = "name must be between 3 and 20 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[validate(length(min = 8, max = 30, message = "password must be between 8 and 30 characters"))]
    pub password: String,
    pub role: Option<Role>,
    pub avatar: Option<String>,
    #[validate(range(min = 0, max = 150, message = "age must be a valid number"))]
    pub age: Option<i32>,
    #[validate(length(min = 6, max = 20, message = "phoneNumber must be valid"))]
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub active: Option<bool>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 20, message = "name must be between 3 and 20 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be valid"))]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 30, message = "password must be between 8 and 30 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
    pub avatar: Option<String>,
    #[validate(range(min = 0, max = 150, message = "age must be a valid number"))]
    pub age: Option<i32>,
    #[validate(length(min = 6, max = 20, message = "phoneNumber must be valid"))]
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub active: Option<bool>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 20, message = "name must be between 3 and 20 characters"))]
    pub name: Option<String>,
    pub avatar: Option<String>,
    #[validate(range(min = 0, max = 150, message = "age must be a valid number"))]
    pub age: Option<i32>,
    #[validate(length(min = 6, max = 20, message = "phoneNumber must be valid"))]
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub gender: Option<Gender>,
}

/// Query string of `GET /users`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
    pub sort: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

fn default_limit() -> i64 {
    10
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            skip: 0,
            sort: None,
            name: None,
            email: None,
            role: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Email,
    Role,
    CreatedAt,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Email => "email",
            SortField::Role => "role",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated listing criteria handed to the repository.
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub sort: Vec<(SortField, SortOrder)>,
    pub limit: i64,
    pub skip: i64,
}
