use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub session_ttl_minutes: i64,
    pub registration_ttl_minutes: i64,
    pub reset_ttl_minutes: i64,
}

/// Outbound mail settings. Without `smtp_host` mail is only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub from: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base of the URLs handed out for stored objects, without trailing slash.
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub frontend_origin: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub s3: S3Config,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let frontend_origin = std::env::var("FRONTEND_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "safar".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "safar-users".into()),
            session_ttl_minutes: ttl_minutes("JWT_SESSION_TTL_MINUTES", 60)?,
            registration_ttl_minutes: ttl_minutes("JWT_REGISTRATION_TTL_MINUTES", 60 * 24)?,
            reset_ttl_minutes: ttl_minutes("JWT_RESET_TTL_MINUTES", 60)?,
        };

        let mail = MailConfig {
            from: std::env::var("EMAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".into()),
            smtp_host: std::env::var("SMTP_HOST").ok().filter(|v| !v.is_empty()),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            smtp_tls: std::env::var("SMTP_TLS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        };

        let bucket = std::env::var("S3_BUCKET_NAME")?;
        let region = std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into());
        let public_url = std::env::var("S3_PUBLIC_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.{}.amazonaws.com", bucket, region))
            .trim_end_matches('/')
            .to_string();
        let s3 = S3Config {
            endpoint: std::env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            bucket,
            region,
            access_key: std::env::var("S3_ACCESS_KEY_ID")?,
            secret_key: std::env::var("S3_SECRET_ACCESS_KEY")?,
            public_url,
        };

        Ok(Self {
            database_url,
            frontend_origin,
            jwt,
            mail,
            s3,
        })
    }
}

/// Upper bound for any token lifetime: 30 days.
const MAX_TTL_MINUTES: i64 = 30 * 24 * 60;

fn ttl_minutes(key: &str, default: i64) -> anyhow::Result<i64> {
    parse_ttl(key, std::env::var(key).ok().as_deref(), default)
}

fn parse_ttl(key: &str, raw: Option<&str>, default: i64) -> anyhow::Result<i64> {
    let minutes = match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse::<i64>()
            .with_context(|| format!("{} must be a whole number of minutes", key))?,
        None => default,
    };
    anyhow::ensure!(
        (1..=MAX_TTL_MINUTES).contains(&minutes),
        "{} must be between 1 and {} minutes, got {}",
        key,
        MAX_TTL_MINUTES,
        minutes
    );
    Ok(minutes)
}
