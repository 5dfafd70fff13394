use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::category::Category;

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub image: String,
    pub parent_id: Option<i32>,
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Category>>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>>;

    /// Categories without a parent.
    async fn find_roots(&self) -> AppResult<Vec<Category>>;

    /// Direct children of `parent_id`.
    async fn find_children(&self, parent_id: i32) -> AppResult<Vec<Category>>;

    async fn create(&self, category: NewCategory) -> AppResult<Category>;

    async fn update(&self, category: &Category) -> AppResult<Category>;

    /// Children of a deleted category become roots.
    async fn delete(&self, id: i32) -> AppResult<bool>;
}

const CATEGORY_COLUMNS: &str = "id, name, image, parent_id, created_at, updated_at";

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_all(&self) -> AppResult<Vec<Category>> {
        let sql = format!("SELECT {} FROM categories ORDER BY id", CATEGORY_COLUMNS);
        Ok(sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_roots(&self) -> AppResult<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE parent_id IS NULL ORDER BY id",
            CATEGORY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_children(&self, parent_id: i32) -> AppResult<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE parent_id = $1 ORDER BY id",
            CATEGORY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create(&self, category: NewCategory) -> AppResult<Category> {
        let sql = format!(
            "INSERT INTO categories (name, image, parent_id) VALUES ($1, $2, $3) RETURNING {}",
            CATEGORY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(&category.name)
            .bind(&category.image)
            .bind(category.parent_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update(&self, category: &Category) -> AppResult<Category> {
        let sql = format!(
            r#"
            UPDATE categories SET name = $2, image = $3, parent_id = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.image)
            .bind(category.parent_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Category with ID {} not found", category.id)))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
