//! In-process stores backing tests and database-less local runs.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::category_repository::{CategoryRepository, NewCategory};
use super::user_repository::UserRepository;
use crate::error::{AppError, AppResult};
use crate::models::category::Category;
use crate::models::user::{NewUser, SortField, SortOrder, User, UserFilter};

struct Table<T> {
    next_id: i32,
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    table: Mutex<Table<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_users(a: &User, b: &User, sort: &[(SortField, SortOrder)]) -> Ordering {
    for (field, order) in sort {
        let ord = match field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Email => a.email.cmp(&b.email),
            SortField::Role => a.role.as_str().cmp(b.role.as_str()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let ord = match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.id.cmp(&b.id)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let table = self.table.lock();
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let table = self.table.lock();
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        let table = self.table.lock();
        Ok(table
            .rows
            .iter()
            .find(|u| u.reset_token_matches(token_hash, now))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut table = self.table.lock();
        if table.rows.iter().any(|u| u.email == user.email) {
            return Err(AppError::conflict("User already exists"));
        }
        let id = table.allocate_id();
        let user = User::from_new(id, user, Utc::now());
        table.rows.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let mut table = self.table.lock();
        if table
            .rows
            .iter()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(AppError::conflict("User already exists"));
        }
        let stored = table
            .rows
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        let created_at = stored.created_at;
        *stored = user.clone();
        stored.created_at = created_at;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut table = self.table.lock();
        let before = table.rows.len();
        table.rows.retain(|u| u.id != id);
        Ok(table.rows.len() != before)
    }

    async fn list(&self, filter: &UserFilter) -> AppResult<(Vec<User>, i64)> {
        let table = self.table.lock();
        let mut matches: Vec<User> = table
            .rows
            .iter()
            .filter(|u| filter.name.as_deref().map_or(true, |n| contains_ignore_case(&u.name, n)))
            .filter(|u| filter.email.as_deref().map_or(true, |e| contains_ignore_case(&u.email, e)))
            .filter(|u| filter.role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        let total = matches.len() as i64;

        matches.sort_by(|a, b| compare_users(a, b, &filter.sort));
        let page = matches
            .into_iter()
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }
}

#[derive(Default)]
pub struct InMemoryCategoryRepository {
    table: Mutex<Table<Category>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_all(&self) -> AppResult<Vec<Category>> {
        Ok(self.table.lock().rows.clone())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>> {
        let table = self.table.lock();
        Ok(table.rows.iter().find(|c| c.id == id).cloned())
    }

    async fn find_roots(&self) -> AppResult<Vec<Category>> {
        let table = self.table.lock();
        Ok(table
            .rows
            .iter()
            .filter(|c| c.parent_id.is_none())
            .cloned()
            .collect())
    }

    async fn find_children(&self, parent_id: i32) -> AppResult<Vec<Category>> {
        let table = self.table.lock();
        Ok(table
            .rows
            .iter()
            .filter(|c| c.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn create(&self, category: NewCategory) -> AppResult<Category> {
        let mut table = self.table.lock();
        let now = Utc::now();
        let category = Category {
            id: table.allocate_id(),
            name: category.name,
            image: category.image,
            parent_id: category.parent_id,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(category.clone());
        Ok(category)
    }

    async fn update(&self, category: &Category) -> AppResult<Category> {
        let mut table = self.table.lock();
        let stored = table
            .rows
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or_else(|| {
                AppError::not_found(format!("Category with ID {} not found", category.id))
            })?;
        stored.name = category.name.clone();
        stored.image = category.image.clone();
        stored.parent_id = category.parent_id;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut table = self.table.lock();
        let before = table.rows.len();
        table.rows.retain(|c| c.id != id);
        let removed = table.rows.len() != before;
        if removed {
            for child in table.rows.iter_mut().filter(|c| c.parent_id == Some(id)) {
                child.parent_id = None;
            }
        }
        Ok(removed)
    }
}
