//! Outbound transactional mail.

mod smtp;
mod templates;

pub use smtp::SmtpMailer;
pub use templates::MailContent;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use crate::config::MailConfig;

/// Sends one plain-text message. Failures are surfaced, never retried.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Writes messages to the log instead of delivering them. Used when no SMTP
/// relay is configured. Link tokens are masked: a registration token holds
/// the plaintext password.
pub struct LogMailer;

/// Replaces every `token=` query value in `body` with a fixed marker.
pub(crate) fn redact_tokens(body: &str) -> String {
    lazy_static! {
        static ref TOKEN_RE: Regex = Regex::new(r"token=[^\s&]+").unwrap();
    }
    TOKEN_RE.replace_all(body, "token=[redacted]").into_owned()
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let body = redact_tokens(body);
        info!(%to, %subject, %body, "mail not delivered (no smtp relay configured)");
        Ok(())
    }
}

pub fn create_mailer(cfg: &MailConfig) -> anyhow::Result<Box<dyn Mailer>> {
    match &cfg.smtp_host {
        Some(host) => Ok(Box::new(SmtpMailer::new(cfg, host)?)),
        None => Ok(Box::new(LogMailer)),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use super::*;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn cfg(host: Option<&str>) -> MailConfig {
        MailConfig {
            from: "Safar <no-reply@safar.test>".into(),
            smtp_host: host.map(str::to_string),
            smtp_port: 25,
            smtp_username: None,
            smtp_password: None,
            smtp_tls: false,
        }
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        LogMailer
            .send_mail("a@x.com", "Email Verification", "link")
            .await
            .unwrap();
    }

    #[test]
    fn redact_tokens_masks_every_link_value() {
        let body = "verify: http://x/verify?token=aaa.bbb.ccc\nor http://x/r?token=ddd&lang=en";
        let out = redact_tokens(body);
        assert_eq!(
            out,
            "verify: http://x/verify?token=[redacted]\nor http://x/r?token=[redacted]&lang=en"
        );
        assert_eq!(redact_tokens("no link here"), "no link here");
    }

    #[tokio::test]
    async fn log_mailer_keeps_link_tokens_out_of_the_log() {
        let buf = LogBuffer::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let token = "eyJhbGciOiJIUzI1NiJ9.eyJwYXNzd29yZCI6IlMzY3JldFB3ISJ9.c2ln";
        let mail = MailContent::verification("http://localhost:3000", token);
        LogMailer
            .send_mail("a@x.com", &mail.subject, &mail.body)
            .await
            .unwrap();

        let logged = buf.contents();
        assert!(logged.contains("a@x.com"));
        assert!(logged.contains("verify?token=[redacted]"));
        assert!(!logged.contains(token));
        assert!(!logged.contains("eyJwYXNzd29yZCI6"));
    }

    #[test]
    fn create_mailer_builds_both_flavours() {
        assert!(create_mailer(&cfg(None)).is_ok());
        assert!(create_mailer(&cfg(Some("localhost"))).is_ok());
    }
}
