//! Turn an [`OutboundMessage`] into a MIME message.
//!
//! Layout: `multipart/mixed` with an HTML body part followed by the single
//! file attachment.

use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;

use crate::error::{FileMailerError, Result};
use crate::model::message::OutboundMessage;

/// MIME type used for ZIP attachments.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Check that a recipient is a bare, syntactically valid address.
pub fn validate_recipient(address: &str) -> Result<()> {
    if email_address::EmailAddress::is_valid(address) {
        Ok(())
    } else {
        Err(FileMailerError::InvalidAddress(address.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| FileMailerError::InvalidAddress(format!("{address}: {e}")))
}

/// Check everything [`compose`] needs without reading the attachment.
pub fn preflight(message: &OutboundMessage) -> Result<()> {
    validate_recipient(&message.to)?;
    parse_mailbox(&message.from)?;
    ContentType::parse(&message.attachment.content_type)
        .map_err(|e| FileMailerError::MessageBuild(format!("content type: {e}")))?;
    let path = &message.attachment.path;
    let meta = std::fs::metadata(path).map_err(|e| FileMailerError::io(path, e))?;
    if !meta.is_file() {
        return Err(FileMailerError::MessageBuild(format!(
            "attachment is not a file: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Build the MIME message, reading the attachment from disk.
pub fn compose(message: &OutboundMessage) -> Result<Message> {
    validate_recipient(&message.to)?;
    let from = parse_mailbox(&message.from)?;
    let to = parse_mailbox(&message.to)?;

    let content_type = ContentType::parse(&message.attachment.content_type)
        .map_err(|e| FileMailerError::MessageBuild(format!("content type: {e}")))?;
    let path = &message.attachment.path;
    let data = std::fs::read(path).map_err(|e| FileMailerError::io(path, e))?;
    let attachment = Attachment::new(message.attachment.file_name.clone()).body(data, content_type);

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.as_str())
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::html(message.html_body.clone()))
                .singlepart(attachment),
        )
        .map_err(|e| FileMailerError::MessageBuild(e.to_string()))
}
