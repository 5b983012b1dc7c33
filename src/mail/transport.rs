//! Mail transports: SMTP delivery and a filesystem outbox.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lettre::transport::smtp::authentication::Credentials;
use lettre::{FileTransport, SmtpTransport, Transport};
use tracing::info;

use crate::config::{Config, MailConfig, TlsMode, TransportKind};
use crate::error::{FileMailerError, Result};
use crate::model::message::OutboundMessage;

use super::compose::compose;

/// Delivers a fully composed message. Success means the message was handed
/// off; anything else is an error.
pub trait MailTransport: Send + Sync {
    fn send(&self, message: &OutboundMessage) -> Result<()>;
}

/// Delivery over SMTP with a bounded per-exchange timeout.
pub struct SmtpMailer {
    host: String,
    port: u16,
    transport: SmtpTransport,
}

impl SmtpMailer {
    /// Build an SMTP mailer. `password` is the decoded password.
    pub fn new(mail: &MailConfig, password: String) -> Result<Self> {
        let builder = match mail.tls {
            TlsMode::Starttls => SmtpTransport::starttls_relay(&mail.host)
                .map_err(|e| FileMailerError::Transport(e.to_string()))?,
            TlsMode::Tls => SmtpTransport::relay(&mail.host)
                .map_err(|e| FileMailerError::Transport(e.to_string()))?,
            TlsMode::None => SmtpTransport::builder_dangerous(&mail.host),
        };

        let mut builder = builder
            .port(mail.port)
            .timeout(Some(Duration::from_secs(mail.timeout_secs)));
        if !mail.username.is_empty() {
            builder = builder.credentials(Credentials::new(mail.username.clone(), password));
        }

        Ok(Self {
            host: mail.host.clone(),
            port: mail.port,
            transport: builder.build(),
        })
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, message: &OutboundMessage) -> Result<()> {
        let email = compose(message)?;
        self.transport
            .send(&email)
            .map_err(|e| FileMailerError::Transport(format!("{}:{}: {e}", self.host, self.port)))?;
        info!(host = %self.host, port = self.port, to = %message.to, "Message sent");
        Ok(())
    }
}

/// Writes each message as an `.eml` file into a directory instead of sending it.
pub struct OutboxMailer {
    dir: PathBuf,
    transport: FileTransport,
}

impl OutboxMailer {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            transport: FileTransport::new(&dir),
            dir,
        }
    }
}

impl MailTransport for OutboxMailer {
    fn send(&self, message: &OutboundMessage) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| FileMailerError::io(&self.dir, e))?;
        let email = compose(message)?;
        let id = self
            .transport
            .send(&email)
            .map_err(|e| FileMailerError::Transport(e.to_string()))?;
        info!(
            path = %self.dir.join(format!("{id}.eml")).display(),
            to = %message.to,
            "Message written to outbox"
        );
        Ok(())
    }
}

/// Create the transport selected by `mail.transport`.
pub fn from_config(config: &Config) -> Result<Box<dyn MailTransport>> {
    match config.mail.transport {
        TransportKind::Smtp => {
            let password = config.smtp_password()?;
            Ok(Box::new(SmtpMailer::new(&config.mail, password)?))
        }
        TransportKind::Outbox => Ok(Box::new(OutboxMailer::new(&config.mail.outbox_dir))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::compose::ZIP_CONTENT_TYPE;
    use crate::model::message::MessageAttachment;

    #[test]
    fn test_outbox_writes_eml() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_path = tmp.path().join("backup.zip");
        std::fs::write(&zip_path, b"PK\x05\x06").unwrap();
        let outbox = tmp.path().join("outbox");

        let mailer = OutboxMailer::new(&outbox);
        mailer
            .send(&OutboundMessage {
                from: "backups@example.com".to_string(),
                to: "user@example.com".to_string(),
                subject: "Backup delivery".to_string(),
                html_body: "<p>backup.zip</p>".to_string(),
                attachment: MessageAttachment {
                    file_name: "backup.zip".to_string(),
                    path: zip_path,
                    content_type: ZIP_CONTENT_TYPE.to_string(),
                },
            })
            .unwrap();

        let files: Vec<_> = std::fs::read_dir(&outbox)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].extension().and_then(|e| e.to_str()), Some("eml"));
        let raw = std::fs::read_to_string(&files[0]).unwrap();
        assert!(raw.contains("user@example.com"));
    }

    #[test]
    fn test_smtp_mailer_builds_without_connecting() {
        let mut cfg = Config::default();
        cfg.mail.tls = TlsMode::None;
        cfg.mail.username = "robot".to_string();
        cfg.mail.password = "c2VjcmV0".to_string();
        assert!(from_config(&cfg).is_ok());
    }

    #[test]
    fn test_outbox_selected_by_config() {
        let mut cfg = Config::default();
        cfg.mail.transport = TransportKind::Outbox;
        assert!(from_config(&cfg).is_ok());
    }
}
