//! Credential store: persistence of user accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::{AppError, AppResult};
use crate::models::user::{NewUser, SortField, SortOrder, User, UserFilter};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Cheap connectivity probe used by the health endpoint.
    async fn ping(&self) -> AppResult<()>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;

    /// `email` is expected in its normalized (lowercase) form.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Finds the user holding `token_hash` whose reset window is still open at `now`.
    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>>;

    /// Fails with `AppError::Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Persists every mutable column of `user` and returns the stored row.
    async fn update(&self, user: &User) -> AppResult<User>;

    /// Returns `false` when no row had that id.
    async fn delete(&self, id: i32) -> AppResult<bool>;

    /// One page of users plus the total number of matches.
    async fn list(&self, filter: &UserFilter) -> AppResult<(Vec<User>, i64)>;
}

const USER_COLUMNS: &str = "id, name, email, password, role, avatar, age, phone_number, address, \
     active, gender, reset_password_token, reset_password_expires, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::conflict("User already exists")
        }
        _ => AppError::Database(err),
    }
}

/// Escapes LIKE metacharacters so filters match literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE TRUE");
    if let Some(name) = &filter.name {
        qb.push(" AND name ILIKE ").push_bind(like_pattern(name));
    }
    if let Some(email) = &filter.email {
        qb.push(" AND email ILIKE ").push_bind(like_pattern(email));
    }
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role);
    }
}

fn order_by_clause(sort: &[(SortField, SortOrder)]) -> String {
    let mut parts: Vec<String> = sort
        .iter()
        .map(|(field, order)| format!("{} {}", field.column(), order.keyword()))
        .collect();
    parts.push("id ASC".to_string());
    format!(" ORDER BY {}", parts.join(", "))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE reset_password_token = $1 AND reset_password_expires > $2",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (name, email, password, role, avatar, age, phone_number, address, active, gender)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(&user.avatar)
            .bind(user.age)
            .bind(&user.phone_number)
            .bind(&user.address)
            .bind(user.active)
            .bind(user.gender)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let sql = format!(
            r#"
            UPDATE users SET
                name = $2, email = $3, password = $4, role = $5, avatar = $6, age = $7,
                phone_number = $8, address = $9, active = $10, gender = $11,
                reset_password_token = $12, reset_password_expires = $13, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .bind(user.role)
            .bind(&user.avatar)
            .bind(user.age)
            .bind(&user.phone_number)
            .bind(&user.address)
            .bind(user.active)
            .bind(user.gender)
            .bind(user.reset_password_token())
            .bind(user.reset_password_expires())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &UserFilter) -> AppResult<(Vec<User>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", USER_COLUMNS));
        push_filters(&mut qb, filter);
        qb.push(order_by_clause(&filter.sort));
        qb.push(" LIMIT ").push_bind(filter.limit);
        qb.push(" OFFSET ").push_bind(filter.skip);

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok((users, total))
    }
}
