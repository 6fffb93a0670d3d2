//! The declarative parameter schema consumed by a message builder
//!
//! A [`MessageParams`] value is the typed form of the loosely shaped
//! configuration bag a caller supplies for one message. Every field is
//! optional; unset fields fall back to the registry defaults bag and finally
//! to the hardcoded values of [`fallback`]. The loosely typed fields (`html`,
//! `text`, `css`) use small untagged enums so a JSON bag maps onto the schema
//! without any runtime type inspection.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::attachment::AttachmentInput;
use super::contact::ContactInput;

/// Hardcoded fallback values applied when neither the caller bag nor the
/// registry defaults supply a field.
pub mod fallback {
    /// Subject used when none is configured.
    pub const SUBJECT: &str = "Mail test";
    /// Locale used when none is configured.
    pub const LOCALE: &str = "en";
    /// Charset used when none is configured.
    pub const CHARSET: &str = "utf-8";
}

/// Content transfer encoding accepted by mail engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    /// 8bit encoding
    #[serde(rename = "8bit")]
    EightBit,
    /// 7bit encoding
    #[serde(rename = "7bit")]
    SevenBit,
    /// Binary encoding
    #[serde(rename = "binary")]
    Binary,
    /// Base64 encoding
    #[serde(rename = "base64")]
    Base64,
    /// Quoted-printable encoding
    #[serde(rename = "quoted-printable")]
    QuotedPrintable,
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::EightBit => "8bit",
            Encoding::SevenBit => "7bit",
            Encoding::Binary => "binary",
            Encoding::Base64 => "base64",
            Encoding::QuotedPrintable => "quoted-printable",
        })
    }
}

/// Content type of the outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    /// Both an HTML and a plain text variant
    #[serde(rename = "multipart/alternative")]
    MultipartAlternative,
    /// HTML only
    #[serde(rename = "text/html")]
    TextHtml,
    /// Plain text only
    #[serde(rename = "text/plain")]
    TextPlain,
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentType::MultipartAlternative => "multipart/alternative",
            ContentType::TextHtml => "text/html",
            ContentType::TextPlain => "text/plain",
        })
    }
}

/// The HTML body request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HtmlParam {
    /// `false` disables the HTML variant, `true` renders the default view.
    Toggle(bool),
    /// A literal HTML body.
    Literal(String),
    /// Independent header/body/footer parts composed via the layout view.
    Sections(HtmlSections),
}

/// Independent parts of a sectioned HTML body. A missing part falls back to
/// its default view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct HtmlSections {
    /// The header part.
    pub header: Option<SectionParam>,
    /// The main body part.
    pub body: Option<SectionParam>,
    /// The footer part.
    pub footer: Option<SectionParam>,
}

/// One part of a sectioned HTML body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SectionParam {
    /// `false` omits the part, `true` renders its default view.
    Toggle(bool),
    /// A literal HTML fragment.
    Literal(String),
}

/// The plain text body request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextParam {
    /// `false` disables the text variant, `true` derives it from the HTML.
    Toggle(bool),
    /// A literal plain text body.
    Literal(String),
}

/// The stylesheet request for the HTML variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CssParam {
    /// `false` skips styling, `true` loads the bundled default stylesheet.
    Toggle(bool),
    /// Literal CSS properties.
    Literal(String),
}

/// View engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ViewParams {
    /// Directory holding per-view overrides (`html/message.hbs`, ...). A
    /// configured directory that does not exist is a fatal error.
    pub directory: Option<PathBuf>,
}

/// Declared intent for one message: a flat bag of optional fields with a
/// fixed schema.
///
/// ```
/// use courriel::MessageParams;
///
/// let params: MessageParams = serde_json::from_value(serde_json::json!({
///     "from": "Jane <jane@example.com>",
///     "to": ["john@example.com", "John"],
///     "subject": "Hello",
///     "html": { "body": "<p>Hi John.</p>", "footer": false },
/// }))
/// .expect("well-formed parameter bag");
/// assert_eq!(params.subject.as_deref(), Some("Hello"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MessageParams {
    /// Name identifier in the registry.
    pub name: Option<String>,
    /// Recipients of the message.
    pub to: Option<ContactInput>,
    /// Message sender.
    pub from: Option<ContactInput>,
    /// Reply-to contacts of the message.
    #[serde(rename = "reply-to", alias = "reply_to")]
    pub reply_to: Option<ContactInput>,
    /// Blind carbon copy recipients.
    pub bcc: Option<ContactInput>,
    /// Carbon copy recipients.
    pub cc: Option<ContactInput>,
    /// Attachments of the message.
    pub attachments: Option<AttachmentInput>,
    /// HTML body request. Unset behaves like `true` (default view).
    pub html: Option<HtmlParam>,
    /// Plain text body request. Unset derives the text from the HTML.
    pub text: Option<TextParam>,
    /// Data bag handed to the views.
    pub datas: Map<String, Value>,
    /// Subject of the message.
    pub subject: Option<String>,
    /// Locale of the message.
    pub locale: Option<String>,
    /// Charset of the message.
    pub charset: Option<String>,
    /// Content transfer encoding.
    pub encoding: Option<Encoding>,
    /// Content type of the message.
    pub content_type: Option<ContentType>,
    /// Stylesheet request. Unset behaves like `true` (bundled stylesheet).
    pub css: Option<CssParam>,
    /// Whether CSS properties are inlined into element style attributes.
    pub inline_css: Option<bool>,
    /// View engine configuration.
    pub view: ViewParams,
}

/// Resolves one builder field through the uniform precedence chain:
/// explicit in-memory override, then the caller-supplied bag, then the
/// registry defaults bag, then the hardcoded fallback.
pub(crate) fn resolve_field<T: Clone>(
    explicit: Option<&T>,
    supplied: Option<&T>,
    default: Option<&T>,
    fallback: Option<T>,
) -> Option<T> {
    explicit.or(supplied).or(default).cloned().or(fallback)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn explicit_wins_over_everything() {
        assert_eq!(
            resolve_field(Some(&"explicit"), Some(&"supplied"), Some(&"default"), Some("fallback")),
            Some("explicit")
        );
    }

    #[test]
    fn supplied_wins_over_defaults() {
        assert_eq!(
            resolve_field(None, Some(&"supplied"), Some(&"default"), Some("fallback")),
            Some("supplied")
        );
    }

    #[test]
    fn defaults_win_over_the_fallback() {
        assert_eq!(
            resolve_field::<&str>(None, None, Some(&"default"), Some("fallback")),
            Some("default")
        );
    }

    #[test]
    fn fallback_is_last() {
        assert_eq!(resolve_field::<&str>(None, None, None, Some("fallback")), Some("fallback"));
        assert_eq!(resolve_field::<&str>(None, None, None, None), None);
    }

    #[test]
    fn loosely_typed_fields_deserialize() {
        let params: MessageParams = serde_json::from_value(serde_json::json!({
            "html": { "header": false, "body": "<p>Hi</p>" },
            "text": false,
            "css": "p { color: #333; }",
            "inline_css": true,
            "content_type": "multipart/alternative",
            "encoding": "quoted-printable",
        }))
        .unwrap();

        assert_eq!(
            params.html,
            Some(HtmlParam::Sections(HtmlSections {
                header: Some(SectionParam::Toggle(false)),
                body: Some(SectionParam::Literal("<p>Hi</p>".to_string())),
                footer: None,
            }))
        );
        assert_eq!(params.text, Some(TextParam::Toggle(false)));
        assert_eq!(params.css, Some(CssParam::Literal("p { color: #333; }".to_string())));
        assert_eq!(params.inline_css, Some(true));
        assert_eq!(params.content_type, Some(ContentType::MultipartAlternative));
        assert_eq!(params.encoding, Some(Encoding::QuotedPrintable));
    }

    #[test]
    fn html_toggle_and_literal_shapes() {
        let off: MessageParams = serde_json::from_value(serde_json::json!({ "html": false })).unwrap();
        assert_eq!(off.html, Some(HtmlParam::Toggle(false)));

        let literal: MessageParams =
            serde_json::from_value(serde_json::json!({ "html": "<html></html>" })).unwrap();
        assert_eq!(literal.html, Some(HtmlParam::Literal("<html></html>".to_string())));
    }

    #[test]
    fn reply_to_accepts_both_spellings() {
        let dashed: MessageParams =
            serde_json::from_value(serde_json::json!({ "reply-to": "jane@example.com" })).unwrap();
        let underscored: MessageParams =
            serde_json::from_value(serde_json::json!({ "reply_to": "jane@example.com" })).unwrap();
        assert_eq!(dashed.reply_to, underscored.reply_to);
    }
}
