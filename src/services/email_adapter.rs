//! services/email_adapter.rs
//! Adapter de email real vía SMTP (lettre).

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::app_config::SmtpConfig;
use crate::services::channel_registry::ChannelAdapter;

const SEND_TIMEOUT_SECS: u64 = 30;

pub struct SmtpEmailAdapter {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    subject: String,
}

impl SmtpEmailAdapter {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from: Mailbox = config.from.parse().context("Invalid from address")?;

        let tls_params = TlsParameters::new(config.host.clone())?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .tls(Tls::Required(tls_params))
            .build();

        Ok(Self {
            mailer,
            from,
            subject: config.subject.clone(),
        })
    }
}

#[async_trait]
impl ChannelAdapter for SmtpEmailAdapter {
    fn name(&self) -> &str {
        "email"
    }

    fn supports(&self, channel: &str) -> bool {
        channel == "email"
    }

    async fn send(&self, recipient_id: &str, message: &str) -> Result<()> {
        log::info!("(send) [EMAIL] Preparando correo para '{}'", recipient_id);

        let to: Mailbox = recipient_id.parse().context("Invalid recipient address")?;

        // Cuerpo en HTML, igual que el resto de correos del servicio
        let html_part = SinglePart::builder()
            .header(ContentType::parse("text/html; charset=utf-8")?)
            .body(message.to_string());

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&self.subject)
            .singlepart(html_part)?;

        tokio::time::timeout(
            std::time::Duration::from_secs(SEND_TIMEOUT_SECS),
            self.mailer.send(email),
        )
        .await
        .context("(send) Timeout enviando correo")?
        .context("(send) Fallo en el transporte SMTP")?;

        log::info!("(send) [EMAIL] -> Correo enviado a '{}'", recipient_id);
        Ok(())
    }
}
