use axum::{
    async_trait,
    body::{Bytes, HttpBody},
    extract::{FromRequest, Query},
    http::{header::CONTENT_TYPE, Request},
    BoxError, Form,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

// Body of /register and /login
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct CredentialsSchema {
    pub username: Option<String>,
    pub password: Option<String>,
}

// Body of POST /todos
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct CreateTodoSchema {
    pub body: Option<String>,
}

// Body of PUT /todo/:id
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct UpdateTodoSchema {
    pub status: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

// Empty strings count as missing.
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// Request parameters taken from a JSON body, a urlencoded form body, or the
// query string when the request carries neither. An empty JSON body also
// falls back to the query string.
#[derive(Debug)]
pub struct Params<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for Params<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = AppError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        if content_type.starts_with("application/json") {
            let uri = req.uri().clone();
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                let Query(value) = Query::<T>::try_from_uri(&uri)
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                return Ok(Self(value));
            }
            let value = serde_json::from_slice(&bytes)
                .map_err(|e| AppError::Validation(format!("Failed to parse the request body as JSON: {e}")))?;
            Ok(Self(value))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Query(value) = Query::<T>::try_from_uri(req.uri())
                .map_err(|e| AppError::Validation(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    async fn extract(request: Request<Body>) -> Result<CredentialsSchema, AppError> {
        Params::<CredentialsSchema>::from_request(request, &())
            .await
            .map(|Params(p)| p)
    }

    #[tokio::test]
    async fn reads_json_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"username":"alice","password":"pw1"}"#))
            .unwrap();
        let params = extract(request).await.unwrap();
        assert_eq!(params.username.as_deref(), Some("alice"));
        assert_eq!(params.password.as_deref(), Some("pw1"));
    }

    #[tokio::test]
    async fn reads_form_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("username=alice&password=pw1"))
            .unwrap();
        let params = extract(request).await.unwrap();
        assert_eq!(params.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn falls_back_to_query_string() {
        let request = Request::builder()
            .method("POST")
            .uri("/login?username=alice")
            .body(Body::empty())
            .unwrap();
        let params = extract(request).await.unwrap();
        assert_eq!(params.username.as_deref(), Some("alice"));
        assert!(params.password.is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from("{"))
            .unwrap();
        assert!(matches!(extract(request).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn empty_json_body_reads_query_string() {
        let request = Request::builder()
            .method("POST")
            .uri("/login?username=alice")
            .header("content-type", "application/json")
            .body(Body::empty())
            .unwrap();
        let params = extract(request).await.unwrap();
        assert_eq!(params.username.as_deref(), Some("alice"));
        assert!(params.password.is_none());
    }

    #[test]
    fn empty_strings_are_missing() {
        assert_eq!(present(Some(String::new())), None);
        assert_eq!(present(None), None);
        assert_eq!(present(Some("x".into())).as_deref(), Some("x"));
    }
}
