//! SMTP delivery using Lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Email, Notifier, NotifyError};
use crate::config::SmtpConfig;

#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("invalid from address: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Transport(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    fn build_message(&self, email: &Email) -> Result<Message, NotifyError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("invalid to address: {e}")))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone());

        let html = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone());

        let message = match &email.inline_image {
            Some(image) => {
                let png = ContentType::parse("image/png")
                    .map_err(|e| NotifyError::Build(e.to_string()))?;
                builder.multipart(
                    MultiPart::related()
                        .singlepart(html)
                        .singlepart(
                            Attachment::new_inline(image.content_id.clone())
                                .body(image.png.clone(), png),
                        ),
                )
            }
            None => builder.singlepart(html),
        };

        message.map_err(|e| NotifyError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let message = self.build_message(email)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::Transport(e.to_string()))
    }
}
