use std::sync::Arc;

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::auth::{Claims, MessageResponse};
use crate::models::user::{UpdateProfileRequest, User, UserProfile};
use crate::repositories::UserRepository;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

/// Self-service operations for the caller identified by the token claims.
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    async fn current(&self, claims: &Claims) -> AppResult<User> {
        self.users
            .find_by_id(claims.id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn get(&self, claims: &Claims) -> AppResult<ProfileResponse> {
        let user = self.current(claims).await?;
        Ok(ProfileResponse {
            user: UserProfile::from(&user),
        })
    }

    pub async fn update(
        &self,
        claims: &Claims,
        req: UpdateProfileRequest,
    ) -> AppResult<ProfileResponse> {
        let mut user = self.current(claims).await?;
        if let Some(name) = req.name {
            user.name = name;
        }
        user.avatar = req.avatar.or(user.avatar);
        user.age = req.age.or(user.age);
        user.phone_number = req.phone_number.or(user.phone_number);
        user.address = req.address.or(user.address);
        user.gender = req.gender.or(user.gender);

        let user = self.users.update(&user).await?;
        Ok(ProfileResponse {
            user: UserProfile::from(&user),
        })
    }

    pub async fn deactivate(&self, claims: &Claims) -> AppResult<MessageResponse> {
        let mut user = self.current(claims).await?;
        user.active = false;
        self.users.update(&user).await?;
        tracing::info!("account deactivated: id={}", user.id);
        Ok(MessageResponse::new("Account deactivated successfully"))
    }
}
