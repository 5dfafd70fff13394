use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::category::{
    Category, CategoryDetail, CreateCategoryRequest, UpdateCategoryRequest,
};
use crate::repositories::{CategoryRepository, NewCategory};

fn not_found(id: i32) -> AppError {
    AppError::not_found(format!("Category with ID {} not found", id))
}

pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    async fn require(&self, id: i32) -> AppResult<Category> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, req: CreateCategoryRequest) -> AppResult<Category> {
        if let Some(parent_id) = req.parent_id {
            self.require(parent_id).await?;
        }
        let category = self
            .categories
            .create(NewCategory {
                name: req.name,
                image: req.image,
                parent_id: req.parent_id,
            })
            .await?;
        tracing::info!("category created: id={} parent={:?}", category.id, category.parent_id);
        Ok(category)
    }

    pub async fn find_all(&self) -> AppResult<Vec<Category>> {
        self.categories.find_all().await
    }

    pub async fn find_one(&self, id: i32) -> AppResult<CategoryDetail> {
        let category = self.require(id).await?;
        let parent = match category.parent_id {
            Some(parent_id) => self.categories.find_by_id(parent_id).await?,
            None => None,
        };
        let children = self.categories.find_children(id).await?;
        Ok(CategoryDetail {
            category,
            parent,
            children,
        })
    }

    pub async fn find_roots(&self) -> AppResult<Vec<Category>> {
        self.categories.find_roots().await
    }

    pub async fn find_subcategories(&self, parent_id: i32) -> AppResult<Vec<Category>> {
        self.require(parent_id).await?;
        self.categories.find_children(parent_id).await
    }

    pub async fn update(&self, id: i32, req: UpdateCategoryRequest) -> AppResult<CategoryDetail> {
        let mut category = self.require(id).await?;
        if let Some(name) = req.name {
            category.name = name;
        }
        if let Some(image) = req.image {
            category.image = image;
        }
        if let Some(parent_id) = req.parent_id {
            if let Some(pid) = parent_id {
                if pid == id {
                    return Err(AppError::bad_request("A category cannot be its own parent"));
                }
                self.require(pid).await?;
            }
            category.parent_id = parent_id;
        }
        self.categories.update(&category).await?;
        self.find_one(id).await
    }

    pub async fn remove(&self, id: i32) -> AppResult<Category> {
        let category = self.require(id).await?;
        if !self.categories.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("category deleted: id={}", id);
        Ok(category)
    }
}
