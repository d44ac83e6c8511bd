//! Validated JSON extractor for automatic request validation.
//!
//! `ValidatedJson<T>` deserializes the body and runs the `validator` rules on
//! it before the handler sees it. Malformed JSON answers 400; a body that
//! parses but fails validation answers 422 with field-level details.

use crate::responses::ApiResponse;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cairn_core::{field_errors, ErrorResponse};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::{Validate, ValidationErrors};

/// JSON extractor that validates the deserialized value.
///
/// ```ignore
/// async fn create_user(ValidatedJson(request): ValidatedJson<CreateUserRequest>) {
///     // request is valid here
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rejection type for validated JSON extraction.
#[derive(Debug)]
pub enum ValidatedJsonRejection {
    /// JSON parsing/deserialization error.
    JsonError(JsonRejection),
    /// Validation error with field-level details.
    ValidationError(ValidationErrors),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            Self::JsonError(rejection) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    code: "INVALID_JSON".to_string(),
                    message: format!("Invalid JSON: {rejection}"),
                    details: None,
                },
            ),
            Self::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    code: "VALIDATION_ERROR".to_string(),
                    message: "Request validation failed".to_string(),
                    details: Some(field_errors(&errors)),
                },
            ),
        };

        (status, Json(ApiResponse::error(error_response))).into_response()
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value.validate().map_err(|errors| {
            debug!(fields = errors.field_errors().len(), "Request body failed validation");
            ValidatedJsonRejection::ValidationError(errors)
        })?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct TestRequest {
        #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
        name: String,
        #[validate(email(message = "Invalid email format"))]
        email: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_valid_request_passes() {
        let request = json_request(r#"{"name":"Valid Name","email":"valid@example.com"}"#);
        let ValidatedJson(value) = ValidatedJson::<TestRequest>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(value.name, "Valid Name");
    }

    #[tokio::test]
    async fn test_invalid_fields_answer_422_with_details() {
        let request = json_request(r#"{"name":"ab","email":"invalid"}"#);
        let rejection = ValidatedJson::<TestRequest>::from_request(request, &())
            .await
            .unwrap_err();

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        let fields: Vec<&str> = json["error"]["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|detail| detail["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["email", "name"]);
    }

    #[tokio::test]
    async fn test_malformed_json_answers_400() {
        let request = json_request(r#"{"name":"#);
        let rejection = ValidatedJson::<TestRequest>::from_request(request, &())
            .await
            .unwrap_err();

        assert_eq!(rejection.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
