use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    Json,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::{
    claims::{Claims, PendingRegistration, ResetGrant, SessionIdentity, TokenPayload},
    repo_types::User,
};
use crate::{config::JwtConfig, error::Message, state::AppState};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid or expired token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("expected a {expected} token, got {found}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
}

/// Signing material and lifetimes for every token the service hands out.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    pub session_ttl: Duration,
    pub registration_ttl: Duration,
    pub reset_ttl: Duration,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        TokenKeys::new(&state.config.jwt)
    }
}

impl TokenKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            session_ttl: Duration::minutes(cfg.session_ttl_minutes),
            registration_ttl: Duration::minutes(cfg.registration_ttl_minutes),
            reset_ttl: Duration::minutes(cfg.reset_ttl_minutes),
        }
    }

    pub fn issue(&self, payload: TokenPayload, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = (now + ttl).unix_timestamp().max(0);
        let kind = payload.kind();
        let claims = Claims {
            payload,
            iat: now.unix_timestamp() as usize,
            exp: exp as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(kind, "token issued");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(kind = data.claims.payload.kind(), "token verified");
        Ok(data.claims.payload)
    }

    pub fn issue_registration(&self, pending: PendingRegistration) -> anyhow::Result<String> {
        self.issue(TokenPayload::Registration(pending), self.registration_ttl)
    }

    pub fn issue_session(&self, user: &User) -> anyhow::Result<String> {
        let identity = SessionIdentity {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        };
        self.issue(TokenPayload::Session(identity), self.session_ttl)
    }

    pub fn issue_reset(&self, user: &User) -> anyhow::Result<String> {
        let grant = ResetGrant {
            user_id: user.id,
            email: user.email.clone(),
        };
        self.issue(TokenPayload::Reset(grant), self.reset_ttl)
    }

    pub fn verify_registration(&self, token: &str) -> Result<PendingRegistration, TokenError> {
        match self.verify(token)? {
            TokenPayload::Registration(p) => Ok(p),
            other => Err(wrong_kind("registration", &other)),
        }
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionIdentity, TokenError> {
        match self.verify(token)? {
            TokenPayload::Session(s) => Ok(s),
            other => Err(wrong_kind("session", &other)),
        }
    }

    pub fn verify_reset(&self, token: &str) -> Result<ResetGrant, TokenError> {
        match self.verify(token)? {
            TokenPayload::Reset(r) => Ok(r),
            other => Err(wrong_kind("reset", &other)),
        }
    }
}

fn wrong_kind(expected: &'static str, found: &TokenPayload) -> TokenError {
    TokenError::WrongKind {
        expected,
        found: found.kind(),
    }
}

/// Identity of the caller, taken from an `Authorization: Bearer` session token.
pub struct AuthUser(pub SessionIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = (StatusCode, Json<Message>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = TokenKeys::from_ref(state);
        let unauthorized = |msg: &str| (StatusCode::UNAUTHORIZED, Json(Message::new(msg)));

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| unauthorized("Invalid Authorization header"))?;

        match keys.verify_session(token) {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(e) => {
                warn!(error = %e, "rejected bearer token");
                Err(unauthorized("Invalid or expired token"))
            }
        }
    }
}
