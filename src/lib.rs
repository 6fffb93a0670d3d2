//! courriel is a mail-composition and dispatch library. It builds an
//! outgoing email from declarative parameters and delegates delivery to a
//! pluggable transport.
//!
//! A message starts as a loosely shaped parameter bag ([`MessageParams`]):
//! recipients in any accepted form, an HTML body request that may be a flag,
//! a literal or independent header/body/footer sections, optional CSS to
//! inline, attachments to resolve against the filesystem. A
//! [`MessageBuilder`] normalizes the bag exactly once into a populated
//! [`MailTransport`], and the [`MailRegistry`] keeps the in-flight builders
//! addressable by name alongside process-wide default parameters.
//!
//! Data-shape problems never fail a build: invalid addresses and missing
//! attachment files are dropped, a broken stylesheet leaves the HTML
//! uninlined. Only static misconfiguration (an inaccessible view directory,
//! an unknown message name) is reported through [`Error`].
//!
//! ## Usage
//!
//! ```rust
//! use courriel::{MailRegistry, MessageParams};
//!
//! # fn main() -> Result<(), courriel::Error> {
//! let mut mail = MailRegistry::new();
//! mail.defaults_mut().from = Some("Service <service@example.com>".into());
//!
//! let params: MessageParams = serde_json::from_value(serde_json::json!({
//!     "name": "welcome",
//!     "to": ["jane@example.com", "Jane"],
//!     "subject": "Welcome aboard",
//!     "html": { "body": "<p>Glad to have you with us.</p>", "footer": false },
//! }))
//! .expect("well-formed parameter bag");
//!
//! let sent = mail.send(params)?;
//! assert!(sent);
//! # Ok(())
//! # }
//! ```
//!
//! Delivery goes through the stub transport unless a real engine adapter is
//! installed with
//! [`set_transport_factory`](MailRegistry::set_transport_factory).

#![doc(html_root_url = "https://docs.rs/courriel/0.1.0")]
#![deny(
    missing_docs,
    missing_debug_implementations,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]

pub mod error;
pub mod message;
pub mod queue;
pub mod registry;
pub mod template;
pub mod transport;

pub use crate::error::Error;
pub use crate::message::{
    Contact, ContactInput, ContentType, Encoding, HttpResponse, MessageBuilder, MessageParams,
};
pub use crate::queue::{MailQueue, NullQueue, QueuedMessage};
pub use crate::registry::{MailRegistry, MailableDef};
pub use crate::template::{BundledTemplates, MailTemplates, TemplateView};
pub use crate::transport::{stub::StubTransport, MailTransport, TransportError, TransportSnapshot};
