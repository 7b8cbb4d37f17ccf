use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use tracing::warn;

use crate::error::ApiError;

/// `Json<T>` whose rejections (bad syntax, wrong field types, missing
/// content type) come back as a 400 `{ "message": ... }` body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                warn!(status = %rejection.status(), "rejected request body");
                Err(ApiError::BadRequest(rejection.body_text()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;
    use crate::error::Message;

    #[derive(Deserialize)]
    struct Login {
        email: String,
    }

    async fn echo(JsonBody(body): JsonBody<Login>) -> String {
        body.email
    }

    async fn call(content_type: Option<&str>, body: &str) -> (StatusCode, Vec<u8>) {
        let app = Router::new().route("/", post(echo));
        let mut req = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            req = req.header(header::CONTENT_TYPE, ct);
        }
        let resp = app
            .oneshot(req.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let (status, body) = call(Some("application/json"), r#"{"email":"a@x.com"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"a@x.com");
    }

    #[tokio::test]
    async fn broken_bodies_become_json_bad_requests() {
        for (ct, body) in [
            (Some("application/json"), "{not json"),
            (Some("application/json"), r#"{"email":5}"#),
            (None, r#"{"email":"a@x.com"}"#),
        ] {
            let (status, raw) = call(ct, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
            let msg: Message = serde_json::from_slice(&raw).unwrap();
            assert!(!msg.message.is_empty());
        }
    }
}
