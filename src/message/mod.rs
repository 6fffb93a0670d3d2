//! Provides the message-building pipeline
//!
//! This is the core of the crate: a declarative [`MessageParams`] bag is
//! normalized into a fully-formed, transport-ready message. The pipeline
//! parses loosely shaped contact lists into validated [`Contact`]s, resolves
//! attachment specs against the filesystem, reconciles the HTML and plain
//! text variants (including document-head wrapping and CSS inlining) and
//! populates the transport adapter.
//!
//! ## Usage
//!
//! ```rust
//! use courriel::{MessageBuilder, MessageParams};
//!
//! # fn main() -> Result<(), courriel::Error> {
//! let params: MessageParams = serde_json::from_value(serde_json::json!({
//!     "from": "Jane <jane@example.com>",
//!     "to": "john@example.com",
//!     "subject": "Hello",
//!     "html": "<p>Hi John.</p>",
//! }))
//! .expect("well-formed parameter bag");
//!
//! let mut builder = MessageBuilder::new(params);
//! let sent = builder.send()?;
//! assert!(sent);
//! # Ok(())
//! # }
//! ```

pub mod attachment;
pub(crate) mod body;
pub mod builder;
pub mod contact;
pub mod params;

pub use self::attachment::{parse_attachments, Attachment, AttachmentInput};
pub use self::builder::{HttpResponse, MessageBuilder};
pub use self::contact::{linearize_contacts, parse_contacts, Contact, ContactInput};
pub use self::params::{
    ContentType, CssParam, Encoding, HtmlParam, HtmlSections, MessageParams, SectionParam,
    TextParam, ViewParams,
};
