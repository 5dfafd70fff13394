use axum::{
    async_trait,
    extract::{FromRequest, Path, Query, Request},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body that has been deserialised and passed its `validator` rules.
/// Malformed bodies and rule violations both come back as 400 `AppError`s.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Path parameters with rejections rendered as `AppError`.
pub type ApiPath<T> = WithRejection<Path<T>, AppError>;

/// Query string with rejections rendered as `AppError`.
pub type ApiQuery<T> = WithRejection<Query<T>, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header, http::StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct NameForm {
        #[validate(length(min = 3, message = "name must be between 3 and 20 characters"))]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn valid_body_is_extracted() {
        let ValidatedJson(form) =
            ValidatedJson::<NameForm>::from_request(json_request(r#"{"name":"Ada"}"#), &())
                .await
                .unwrap();
        assert_eq!(form.name, "Ada");
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let err = ValidatedJson::<NameForm>::from_request(json_request("{}"), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rule_violation_is_bad_request() {
        let err = ValidatedJson::<NameForm>::from_request(json_request(r#"{"name":"Al"}"#), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_content_type_is_bad_request() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(r#"{"name":"Ada"}"#))
            .unwrap();
        let err = ValidatedJson::<NameForm>::from_request(req, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
