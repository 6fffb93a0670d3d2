//! The stub transport records the populated message and returns the given
//! response instead of transmitting. It is the default engine and can be
//! useful for testing purposes.

use tracing::info;

use crate::message::attachment::Attachment;
use crate::message::contact::Contact;
use crate::message::params::{ContentType, Encoding};
use crate::transport::{MailTransport, TransportError};

/// This transport records every capability call and returns the configured
/// response from `send`.
#[derive(Debug, Clone, PartialEq)]
pub struct StubTransport {
    response: bool,
    error: Option<TransportError>,
    from: Option<Contact>,
    to: Vec<Contact>,
    cc: Vec<Contact>,
    bcc: Vec<Contact>,
    reply_to: Vec<Contact>,
    attachments: Vec<Attachment>,
    charset: String,
    encoding: Option<Encoding>,
    content_type: ContentType,
    subject: String,
    body_html: String,
    body_text: String,
}

impl StubTransport {
    /// Creates a new transport that always returns the given response.
    pub fn new(response: bool) -> StubTransport {
        StubTransport {
            response,
            error: None,
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            attachments: Vec::new(),
            charset: "utf-8".to_string(),
            encoding: None,
            content_type: ContentType::MultipartAlternative,
            subject: String::new(),
            body_html: String::new(),
            body_text: String::new(),
        }
    }

    /// Creates a new transport that always reports a successful delivery.
    pub fn new_positive() -> StubTransport {
        Self::new(true)
    }
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new_positive()
    }
}

impl MailTransport for StubTransport {
    fn set_from(&mut self, contact: Contact) {
        self.from = Some(contact);
    }

    fn add_to(&mut self, contact: Contact) {
        self.to.push(contact);
    }

    fn add_cc(&mut self, contact: Contact) {
        self.cc.push(contact);
    }

    fn add_bcc(&mut self, contact: Contact) {
        self.bcc.push(contact);
    }

    fn add_reply_to(&mut self, contact: Contact) {
        self.reply_to.push(contact);
    }

    fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    fn set_charset(&mut self, charset: &str) {
        self.charset = charset.to_string();
    }

    fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = Some(encoding);
    }

    fn set_content_type(&mut self, content_type: ContentType) {
        self.content_type = content_type;
    }

    fn set_subject(&mut self, subject: &str) {
        self.subject = subject.to_string();
    }

    fn set_html(&mut self, html: &str) {
        self.body_html = html.to_string();
    }

    fn set_text(&mut self, text: &str) {
        self.body_text = text.to_string();
    }

    fn from(&self) -> Option<&Contact> {
        self.from.as_ref()
    }

    fn to(&self) -> &[Contact] {
        &self.to
    }

    fn cc(&self) -> &[Contact] {
        &self.cc
    }

    fn bcc(&self) -> &[Contact] {
        &self.bcc
    }

    fn reply_to(&self) -> &[Contact] {
        &self.reply_to
    }

    fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    fn charset(&self) -> &str {
        &self.charset
    }

    fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    fn content_type(&self) -> ContentType {
        self.content_type
    }

    fn subject(&self) -> &str {
        &self.subject
    }

    fn html(&self) -> &str {
        if self.has_html() {
            &self.body_html
        } else {
            ""
        }
    }

    fn text(&self) -> &str {
        if self.has_text() {
            &self.body_text
        } else {
            ""
        }
    }

    fn prepare(&mut self) -> bool {
        if self.from.is_none() {
            self.error = Some(TransportError::MissingSender);
            return false;
        }
        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            self.error = Some(TransportError::NoRecipients);
            return false;
        }
        self.error = None;
        true
    }

    fn send(&mut self) -> bool {
        if !self.prepare() {
            return false;
        }

        info!(
            from = %self.from.as_ref().map(ToString::to_string).unwrap_or_default(),
            recipients = self.to.len() + self.cc.len() + self.bcc.len(),
            "stub transport dropping message"
        );

        if !self.response {
            self.error = Some(TransportError::Engine(
                "stub transport configured to fail".to_string(),
            ));
        }
        self.response
    }

    fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> StubTransport {
        let mut transport = StubTransport::new_positive();
        transport.set_from(Contact::new("sender@example.com", None));
        transport.add_to(Contact::new("recipient@example.com", Some("Recipient".to_string())));
        transport.set_subject("Hello");
        transport
    }

    #[test]
    fn prepare_requires_a_sender() {
        let mut transport = StubTransport::new_positive();
        transport.add_to(Contact::new("recipient@example.com", None));
        assert!(!transport.prepare());
        assert_eq!(transport.error(), Some(&TransportError::MissingSender));
    }

    #[test]
    fn prepare_requires_recipients() {
        let mut transport = StubTransport::new_positive();
        transport.set_from(Contact::new("sender@example.com", None));
        assert!(!transport.prepare());
        assert_eq!(transport.error(), Some(&TransportError::NoRecipients));
    }

    #[test]
    fn send_returns_the_configured_response() {
        assert!(populated().send());

        let mut negative = populated();
        negative.response = false;
        assert!(!negative.send());
        assert!(matches!(negative.error(), Some(TransportError::Engine(_))));
    }

    #[test]
    fn body_accessors_follow_the_content_type() {
        let mut transport = populated();
        transport.set_html("<p>Hi</p>");
        transport.set_text("Hi");

        transport.set_content_type(ContentType::MultipartAlternative);
        assert_eq!(transport.html(), "<p>Hi</p>");
        assert_eq!(transport.text(), "Hi");

        transport.set_content_type(ContentType::TextPlain);
        assert_eq!(transport.html(), "");
        assert_eq!(transport.text(), "Hi");
        assert_eq!(transport.message(), "Hi");

        transport.set_content_type(ContentType::TextHtml);
        assert_eq!(transport.html(), "<p>Hi</p>");
        assert_eq!(transport.text(), "");
    }

    #[test]
    fn headers_cover_the_populated_state() {
        let mut transport = populated();
        transport.add_cc(Contact::new("cc@example.com", None));
        transport.set_encoding(Encoding::QuotedPrintable);

        let headers = transport.headers();
        assert!(headers.contains(&"From: sender@example.com".to_string()));
        assert!(headers.contains(&"To: Recipient <recipient@example.com>".to_string()));
        assert!(headers.contains(&"Cc: cc@example.com".to_string()));
        assert!(headers.contains(&"Subject: Hello".to_string()));
        assert!(headers.contains(&"Content-Type: multipart/alternative; charset=utf-8".to_string()));
        assert!(headers.contains(&"Content-Transfer-Encoding: quoted-printable".to_string()));
    }
}
