use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 3, max = 50, message = "Category name must be between 3 and 50 characters"))]
    pub name: String,
    #[validate(url(message = "Please provide a valid image URL"))]
    pub image: String,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 3, max = 50, message = "Category name must be between 3 and 50 characters"))]
    pub name: Option<String>,
    #[validate(url(message = "Please provide a valid image URL"))]
    pub image: Option<String>,
    /// `Some(None)` detaches the category from its parent.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i32>>,
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i32>::deserialize(deserializer).map(Some)
}

/// A category with its parent and direct children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub parent: Option<Category>,
    pub children: Vec<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_parent_from_absent() {
        let absent: UpdateCategoryRequest = serde_json::from_str(r#"{"name":"Shoes"}"#).unwrap();
        assert_eq!(absent.parent_id, None);

        let detach: UpdateCategoryRequest = serde_json::from_str(r#"{"parentId":null}"#).unwrap();
        assert_eq!(detach.parent_id, Some(None));

        let attach: UpdateCategoryRequest = serde_json::from_str(r#"{"parentId":7}"#).unwrap();
        assert_eq!(attach.parent_id, Some(Some(7)));
    }

    #[test]
    fn create_requires_valid_image_url() {
        let req = CreateCategoryRequest {
            name: "Shoes".into(),
            image: "not a url".into(),
            parent_id: None,
        };
        assert!(req.validate().is_err());

        let req = CreateCategoryRequest {
            image: "https://cdn.example.com/shoes.png".into(),
            ..req
        };
        assert!(req.validate().is_ok());
    }
}
