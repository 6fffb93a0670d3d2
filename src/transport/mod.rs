//! The boundary interface to the actual mail-sending engine
//!
//! A builder populates a [`MailTransport`] one capability at a time and then
//! triggers delivery through it. Engine-specific failures are mapped to a
//! [`TransportError`] at the adapter boundary and reported as boolean results
//! plus an inspectable last error, never as raw engine values.
//!
//! The crate ships a single concrete adapter, [`stub::StubTransport`], which
//! records every capability call instead of transmitting. Adapters for real
//! delivery engines implement the same trait downstream.

use serde::Serialize;
use thiserror::Error;

use crate::message::attachment::Attachment;
use crate::message::contact::{linearize_contacts, Contact};
use crate::message::params::{ContentType, Encoding};

pub mod stub;

/// Delivery-side failures, mapped from the underlying engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No sender address has been set.
    #[error("no sender address has been set")]
    MissingSender,
    /// The message has no recipients at all.
    #[error("the message has no recipients")]
    NoRecipients,
    /// Any other engine failure, with the engine's own message.
    #[error("mail engine error: {0}")]
    Engine(String),
}

/// Serializable snapshot of a populated transport, used for the queue
/// payload and for round-trip inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportSnapshot {
    /// Message sender.
    pub from: Option<Contact>,
    /// Recipients.
    pub to: Vec<Contact>,
    /// Carbon copy recipients.
    pub cc: Vec<Contact>,
    /// Blind carbon copy recipients.
    pub bcc: Vec<Contact>,
    /// Reply-to contacts.
    #[serde(rename = "reply-to")]
    pub reply_to: Vec<Contact>,
    /// Resolved attachments.
    pub attachments: Vec<Attachment>,
    /// Charset of the message.
    pub charset: String,
    /// Content transfer encoding.
    pub encoding: Option<Encoding>,
    /// Content type of the message.
    pub content_type: ContentType,
    /// Synthesized header lines.
    pub headers: Vec<String>,
    /// Subject of the message.
    pub subject: String,
    /// HTML variant, empty when the content type carries none.
    pub html: String,
    /// Plain text variant, empty when the content type carries none.
    pub text: String,
}

/// Capability set a message builder requires from a delivery engine.
///
/// Setters mirror the population phase of the build pipeline; accessors
/// mirror every setter so views and diagnostics can read the populated
/// state back. `prepare` validates addressing without transmitting and
/// `send` performs the delivery, both reporting success as a boolean with
/// the failure cause parked in [`error`](MailTransport::error).
pub trait MailTransport {
    /// Sets the sender of the message.
    fn set_from(&mut self, contact: Contact);
    /// Adds one recipient.
    fn add_to(&mut self, contact: Contact);
    /// Adds one carbon copy recipient.
    fn add_cc(&mut self, contact: Contact);
    /// Adds one blind carbon copy recipient.
    fn add_bcc(&mut self, contact: Contact);
    /// Adds one reply-to contact.
    fn add_reply_to(&mut self, contact: Contact);
    /// Adds one attachment.
    fn add_attachment(&mut self, attachment: Attachment);
    /// Sets the charset of the message.
    fn set_charset(&mut self, charset: &str);
    /// Sets the content transfer encoding.
    fn set_encoding(&mut self, encoding: Encoding);
    /// Sets the content type of the message.
    fn set_content_type(&mut self, content_type: ContentType);
    /// Sets the subject of the message.
    fn set_subject(&mut self, subject: &str);
    /// Sets the HTML variant of the body.
    fn set_html(&mut self, html: &str);
    /// Sets the plain text variant of the body.
    fn set_text(&mut self, text: &str);

    /// The sender of the message.
    fn from(&self) -> Option<&Contact>;
    /// The recipients of the message.
    fn to(&self) -> &[Contact];
    /// The carbon copy recipients of the message.
    fn cc(&self) -> &[Contact];
    /// The blind carbon copy recipients of the message.
    fn bcc(&self) -> &[Contact];
    /// The reply-to contacts of the message.
    fn reply_to(&self) -> &[Contact];
    /// The attachments of the message.
    fn attachments(&self) -> &[Attachment];
    /// The charset of the message.
    fn charset(&self) -> &str;
    /// The content transfer encoding, when one was set.
    fn encoding(&self) -> Option<Encoding>;
    /// The content type of the message.
    fn content_type(&self) -> ContentType;
    /// The subject of the message.
    fn subject(&self) -> &str;
    /// The HTML variant; empty when the content type carries none.
    fn html(&self) -> &str;
    /// The plain text variant; empty when the content type carries none.
    fn text(&self) -> &str;

    /// Validates addressing without transmitting anything. Returns `false`
    /// and parks the cause in [`error`](MailTransport::error) on failure.
    fn prepare(&mut self) -> bool;
    /// Delivers the message. Returns `false` and parks the cause in
    /// [`error`](MailTransport::error) on failure.
    fn send(&mut self) -> bool;
    /// Last delivery-side failure, for diagnostics only.
    fn error(&self) -> Option<&TransportError>;

    /// Whether the content type carries an HTML variant.
    fn has_html(&self) -> bool {
        matches!(
            self.content_type(),
            ContentType::TextHtml | ContentType::MultipartAlternative
        )
    }

    /// Whether the content type carries a plain text variant.
    fn has_text(&self) -> bool {
        matches!(
            self.content_type(),
            ContentType::TextPlain | ContentType::MultipartAlternative
        )
    }

    /// The resolved message body: the HTML variant when present, the plain
    /// text variant otherwise.
    fn message(&self) -> &str {
        let html = self.html();
        if html.is_empty() {
            self.text()
        } else {
            html
        }
    }

    /// Synthesized header lines of the populated message.
    fn headers(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(from) = self.from() {
            out.push(format!("From: {from}"));
        }
        if !self.to().is_empty() {
            out.push(format!("To: {}", linearize_contacts(self.to())));
        }
        if !self.cc().is_empty() {
            out.push(format!("Cc: {}", linearize_contacts(self.cc())));
        }
        if !self.bcc().is_empty() {
            out.push(format!("Bcc: {}", linearize_contacts(self.bcc())));
        }
        if !self.reply_to().is_empty() {
            out.push(format!("Reply-To: {}", linearize_contacts(self.reply_to())));
        }
        if !self.subject().is_empty() {
            out.push(format!("Subject: {}", self.subject()));
        }
        out.push(format!(
            "Content-Type: {}; charset={}",
            self.content_type(),
            self.charset()
        ));
        if let Some(encoding) = self.encoding() {
            out.push(format!("Content-Transfer-Encoding: {encoding}"));
        }
        for attachment in self.attachments() {
            out.push(format!(
                "Content-Disposition: attachment; filename=\"{}\"",
                attachment.file_name()
            ));
        }
        out
    }

    /// Prepares the message and captures the populated state.
    fn snapshot(&mut self) -> TransportSnapshot {
        self.prepare();

        TransportSnapshot {
            from: self.from().cloned(),
            to: self.to().to_vec(),
            cc: self.cc().to_vec(),
            bcc: self.bcc().to_vec(),
            reply_to: self.reply_to().to_vec(),
            attachments: self.attachments().to_vec(),
            charset: self.charset().to_string(),
            encoding: self.encoding(),
            content_type: self.content_type(),
            headers: self.headers(),
            subject: self.subject().to_string(),
            html: self.html().to_string(),
            text: self.text().to_string(),
        }
    }
}
