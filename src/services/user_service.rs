use std::sync::Arc;

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::user::{
    normalize_email, CreateUserRequest, NewUser, SortField, SortOrder, UpdateUserRequest,
    UserFilter, UserProfile, UserQuery, UserSummary,
};
use crate::repositories::UserRepository;
use crate::services::password::hash_password;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub limit: i64,
    pub skip: i64,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub status: u16,
    pub message: String,
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: u16,
    pub message: String,
}

/// Parses `{"name":"ASC","createdAt":"DESC"}`, keeping key order.
pub fn parse_sort(raw: Option<&str>) -> AppResult<Vec<(SortField, SortOrder)>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(vec![(SortField::CreatedAt, SortOrder::Desc)]),
        Some(raw) => raw,
    };

    let parsed: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(raw).map_err(|_| AppError::bad_request("Invalid sort format"))?;

    parsed
        .iter()
        .map(|(key, value)| {
            let field = match key.as_str() {
                "name" => SortField::Name,
                "email" => SortField::Email,
                "role" => SortField::Role,
                "createdAt" => SortField::CreatedAt,
                other => return Err(AppError::bad_request(format!("Cannot sort by {}", other))),
            };
            let order = match value.as_str().map(str::to_ascii_uppercase).as_deref() {
                Some("ASC") => SortOrder::Asc,
                Some("DESC") => SortOrder::Desc,
                _ => {
                    return Err(AppError::bad_request(format!(
                        "Sort direction for {} must be ASC or DESC",
                        key
                    )))
                }
            };
            Ok((field, order))
        })
        .collect()
}

pub fn build_filter(query: UserQuery) -> AppResult<UserFilter> {
    if query.limit < 0 || query.skip < 0 {
        return Err(AppError::bad_request("limit and skip must not be negative"));
    }
    let sort = parse_sort(query.sort.as_deref())?;
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    Ok(UserFilter {
        name: non_blank(query.name),
        email: non_blank(query.email),
        role: query.role,
        sort,
        limit: query.limit,
        skip: query.skip,
    })
}

/// Administrative user management.
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn create(&self, req: CreateUserRequest) -> AppResult<Envelope<UserSummary>> {
        let email = normalize_email(&req.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already exists"));
        }

        let user = self
            .users
            .create(NewUser {
                name: req.name,
                email,
                password_hash: hash_password(&req.password)?,
                role: req.role.unwrap_or_default(),
                avatar: req.avatar,
                age: req.age,
                phone_number: req.phone_number,
                address: req.address,
                active: req.active.unwrap_or(true),
                gender: req.gender,
            })
            .await?;
        tracing::info!("user created by admin: id={} role={}", user.id, user.role);

        Ok(Envelope {
            status: 201,
            message: "User created successfully".to_string(),
            data: UserSummary::from(&user),
        })
    }

    pub async fn find_all(&self, query: UserQuery) -> AppResult<Page<UserSummary>> {
        let filter = build_filter(query)?;
        let (users, total) = self.users.list(&filter).await?;
        Ok(Page {
            status: 200,
            message: "Users fetched successfully".to_string(),
            data: users.iter().map(UserSummary::from).collect(),
            meta: PageMeta {
                total,
                limit: filter.limit,
                skip: filter.skip,
            },
        })
    }

    pub async fn find_one(&self, id: i32) -> AppResult<Envelope<UserProfile>> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(Envelope {
            status: 200,
            message: "User fetched successfully".to_string(),
            data: UserProfile::from(&user),
        })
    }

    pub async fn update(&self, id: i32, req: UpdateUserRequest) -> AppResult<Envelope<UserProfile>> {
        let mut user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if let Some(email) = req.email {
            let email = normalize_email(&email);
            if email != user.email {
                if self.users.find_by_email(&email).await?.is_some() {
                    return Err(AppError::conflict("Email already exists"));
                }
                user.email = email;
            }
        }
        if let Some(password) = req.password {
            user.password = hash_password(&password)?;
        }
        if let Some(name) = req.name {
            user.name = name;
        }
        if let Some(role) = req.role {
            user.role = role;
        }
        if let Some(active) = req.active {
            user.active = active;
        }
        user.avatar = req.avatar.or(user.avatar);
        user.age = req.age.or(user.age);
        user.phone_number = req.phone_number.or(user.phone_number);
        user.address = req.address.or(user.address);
        user.gender = req.gender.or(user.gender);

        let user = self.users.update(&user).await?;
        Ok(Envelope {
            status: 200,
            message: "User updated successfully".to_string(),
            data: UserProfile::from(&user),
        })
    }

    pub async fn remove(&self, id: i32) -> AppResult<StatusMessage> {
        if !self.users.delete(id).await? {
            return Err(AppError::not_found("User not found"));
        }
        tracing::info!("user deleted: id={}", id);
        Ok(StatusMessage {
            status: 200,
            message: "User deleted successfully".to_string(),
        })
    }
}
