use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            normalize_email, ForgotPasswordRequest, LoginRequest, LoginResponse, PublicUser,
            RegisterRequest, ResetPasswordRequest, VerifyQuery,
        },
        jwt::AuthUser,
        services::{AccountService, AuthError},
    },
    error::Message,
    extractors::JsonBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/verify", get(verify))
        .route("/users/login", post(login))
        .route("/users/forgot-password", post(forgot_password))
        .route("/users/reset-password/:token", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

#[instrument(skip(accounts, payload))]
pub async fn register(
    State(accounts): State<AccountService>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<Json<Message>, AuthError> {
    let email = normalize_email(&payload.email);
    accounts
        .register(&payload.username, &email, &payload.password)
        .await?;
    Ok(Json(Message::new(
        "Verification email sent! Please check your inbox.",
    )))
}

#[instrument(skip_all)]
pub async fn verify(
    State(accounts): State<AccountService>,
    Query(q): Query<VerifyQuery>,
) -> Result<Json<Message>, AuthError> {
    accounts.verify(&q.token).await?;
    Ok(Json(Message::new("User verified and saved successfully!")))
}

#[instrument(skip(accounts, payload))]
pub async fn login(
    State(accounts): State<AccountService>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let email = normalize_email(&payload.email);
    let token = accounts.login(&email, &payload.password).await?;
    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
    }))
}

#[instrument(skip(accounts, payload))]
pub async fn forgot_password(
    State(accounts): State<AccountService>,
    JsonBody(payload): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<Message>, AuthError> {
    let email = normalize_email(&payload.email);
    accounts.forgot_password(&email).await?;
    Ok(Json(Message::new(
        "Password reset link has been sent to your email",
    )))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(accounts): State<AccountService>,
    Path(token): Path<String>,
    JsonBody(payload): JsonBody<ResetPasswordRequest>,
) -> Result<Json<Message>, AuthError> {
    accounts.reset_password(&token, &payload.password).await?;
    Ok(Json(Message::new("Password has been reset successfully!")))
}

#[instrument(skip_all, fields(user_id = %session.user_id))]
pub async fn get_me(
    State(accounts): State<AccountService>,
    AuthUser(session): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = accounts.find_user(session.user_id).await?;
    Ok(Json(PublicUser::from(user)))
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn test_public_user_serialization_hides_hash() {
        let now = time::OffsetDateTime::now_utc();
        let user = crate::auth::repo_types::User {
            id: uuid::Uuid::new_v4(),
            username: "alice".into(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$secret".into(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("alice"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}
