//! Amazon SES through its SMTP interface.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use faultmail_config::{MailCredentials, TransportConfig};
use hmac::{Hmac, Mac};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use sha2::Sha256;

use super::{
    check_credentials, BodyFormat, MailTransport, OutboundMail, TransportError, TransportFactory,
};

type HmacSha256 = Hmac<Sha256>;

const SIGNING_DATE: &str = "11111111";
const SERVICE: &str = "ses";
const TERMINAL: &str = "aws4_request";
const MESSAGE: &str = "SendRawEmail";
const VERSION: u8 = 0x04;

/// SMTP password for an IAM secret access key, scoped to `region`.
pub fn derive_smtp_password(secret_key: &str, region: &str) -> Result<String, TransportError> {
    let mut signature = sign(format!("AWS4{secret_key}").as_bytes(), SIGNING_DATE)?;
    for part in [region, SERVICE, TERMINAL, MESSAGE] {
        signature = sign(&signature, part)?;
    }

    let mut password = Vec::with_capacity(signature.len() + 1);
    password.push(VERSION);
    password.extend_from_slice(&signature);
    Ok(STANDARD.encode(password))
}

fn sign(key: &[u8], message: &str) -> Result<Vec<u8>, TransportError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| TransportError::Signing(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Opens STARTTLS sessions against the regional SES endpoint.
#[derive(Debug, Clone, Default)]
pub struct SesSmtpFactory {
    config: TransportConfig,
}

impl SesSmtpFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl TransportFactory for SesSmtpFactory {
    fn connect(
        &self,
        credentials: &MailCredentials,
    ) -> Result<Box<dyn MailTransport>, TransportError> {
        check_credentials(credentials)?;

        let password = if self.config.derive_smtp_password {
            derive_smtp_password(&credentials.secret_key, &credentials.region)?
        } else {
            credentials.secret_key.clone()
        };
        let host = self.config.host_for(&credentials.region);
        tracing::debug!(host = %host, port = self.config.port, "Opening SES SMTP transport");

        let mailer = SmtpTransport::starttls_relay(&host)
            .map_err(|e| TransportError::Smtp(e.to_string()))?
            .port(self.config.port)
            .credentials(Credentials::new(credentials.access_key.clone(), password))
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
            .build();

        Ok(Box::new(SesSmtpTransport { mailer }))
    }
}

struct SesSmtpTransport {
    mailer: SmtpTransport,
}

impl MailTransport for SesSmtpTransport {
    fn send(&self, mail: &OutboundMail<'_>) -> Result<String, TransportError> {
        let email = build_message(mail)?;
        let response = self
            .mailer
            .send(&email)
            .map_err(|e| TransportError::Smtp(e.to_string()))?;
        Ok(response
            .first_line()
            .map(str::to_string)
            .unwrap_or_else(|| response.code().to_string()))
    }
}

fn build_message(mail: &OutboundMail<'_>) -> Result<Message, TransportError> {
    let content_type = match mail.format {
        BodyFormat::Html => ContentType::TEXT_HTML,
        BodyFormat::Text => ContentType::TEXT_PLAIN,
    };

    Message::builder()
        .from(parse_mailbox(mail.source)?)
        .to(parse_mailbox(mail.destination)?)
        .subject(mail.subject)
        .header(content_type)
        .body(mail.body.to_string())
        .map_err(|e| TransportError::Message(e.to_string()))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address.parse().map_err(|e: lettre::address::AddressError| TransportError::Address {
        address: address.to_string(),
        message: e.to_string(),
    })
}
