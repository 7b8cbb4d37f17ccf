use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use super::Mailer;
use crate::config::MailConfig;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig, host: &str) -> anyhow::Result<Self> {
        let mut builder = if cfg.smtp_tls {
            let tls = TlsParameters::new(host.to_string()).context("smtp tls parameters")?;
            // 465 is implicit TLS, everything else negotiates STARTTLS
            if cfg.smtp_port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                    .context("smtp relay")?
                    .port(cfg.smtp_port)
                    .tls(Tls::Wrapper(tls))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .context("smtp starttls relay")?
                    .port(cfg.smtp_port)
                    .tls(Tls::Required(tls))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(cfg.smtp_port)
        };

        if let (Some(user), Some(pass)) = (&cfg.smtp_username, &cfg.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = cfg
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid EMAIL_FROM {:?}", cfg.from))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let to = to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient {:?}", to))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build mail")?;

        self.transport.send(message).await.context("smtp send")?;
        debug!(%subject, "mail sent");
        Ok(())
    }
}
