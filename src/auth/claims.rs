use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account data waiting for its email address to be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub username: String,
    pub email: String,
    pub password: String, // plaintext until verification hashes it
}

/// Identity carried by a login token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

/// Permission to replace one user's password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetGrant {
    pub user_id: Uuid,
    pub email: String,
}

/// The three things a token can stand for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TokenPayload {
    Registration(PendingRegistration),
    Session(SessionIdentity),
    Reset(ResetGrant),
}

impl TokenPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            TokenPayload::Registration(_) => "registration",
            TokenPayload::Session(_) => "session",
            TokenPayload::Reset(_) => "reset",
        }
    }
}

/// JWT body: the payload plus the registered claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub payload: TokenPayload,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}
