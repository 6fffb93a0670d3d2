use std::fs;

use courriel::{
    Contact, ContentType, Encoding, MailTransport, MessageBuilder, MessageParams, TransportError,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn params(value: serde_json::Value) -> MessageParams {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    serde_json::from_value(value).expect("well-formed parameter bag")
}

fn addressed(mut value: serde_json::Value) -> MessageParams {
    let map = value.as_object_mut().unwrap();
    map.entry("from").or_insert(json!("Jane <jane@example.com>"));
    map.entry("to").or_insert(json!("john@example.com"));
    params(value)
}

#[test]
fn multipart_build_produces_both_bodies() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "content_type": "multipart/alternative",
    })));
    builder.build().unwrap();

    assert!(!builder.html().unwrap().is_empty());
    assert!(!builder.text().unwrap().is_empty());
    assert!(!builder.transport().html().is_empty());
    assert!(!builder.transport().text().is_empty());
}

#[test]
fn sectioned_html_keeps_the_fragment_and_gains_a_head() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "html": { "header": false, "footer": false, "body": "<p>Hi</p>" },
        "css": false,
    })));
    builder.build().unwrap();

    let html = builder.html().unwrap();
    assert!(html.contains("<p>Hi</p>"));
    assert!(html.contains("<head>"));
    // the default body section was replaced by the literal fragment
    assert!(!html.contains("rowBodyContent"));
}

#[test]
fn headless_literal_html_is_wrapped_into_a_document() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "html": "<p>Hello</p>",
        "css": false,
    })));
    builder.build().unwrap();

    let html = builder.html().unwrap();
    assert!(html.contains("<head>"));
    assert!(html.contains("<p>Hello</p>"));
}

#[test]
fn complete_literal_html_is_kept_untouched() {
    let document =
        "<!DOCTYPE html><html><head><title>t</title></head><body><p>x</p></body></html>";
    let mut builder = MessageBuilder::new(addressed(json!({
        "html": document,
        "css": false,
    })));
    builder.build().unwrap();

    assert_eq!(builder.html(), Some(document));
}

#[test]
fn text_is_derived_from_the_html() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "html": "<p>Hello <b>world</b></p>",
        "css": false,
    })));
    builder.build().unwrap();

    let text = builder.text().unwrap();
    assert!(text.contains("Hello"));
    assert!(text.contains("world"));
    assert!(!text.contains('<'));
}

#[test]
fn explicit_text_wins_over_derivation() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "html": "<p>Hello</p>",
        "text": "explicit text",
    })));
    builder.build().unwrap();

    assert_eq!(builder.text(), Some("explicit text"));
}

#[test]
fn disabled_text_leaves_the_slot_empty() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "text": false,
        "content_type": "text/plain",
    })));
    builder.build().unwrap();

    assert_eq!(builder.text(), None);
    assert_eq!(builder.transport().text(), "");
}

#[test]
fn disabled_html_falls_back_to_the_text_view() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "html": false,
        "content_type": "text/plain",
    })));
    builder.build().unwrap();

    assert_eq!(builder.html(), None);
    let text = builder.text().unwrap();
    assert!(text.contains("Mail test"));
    assert_eq!(builder.transport().text(), text);
}

#[test]
fn html_only_content_type_forwards_the_text_variant() {
    // long-standing dispatch behavior: the html-only branch feeds the
    // plain text rendition into the HTML slot
    let mut builder = MessageBuilder::new(addressed(json!({
        "content_type": "text/html",
        "html": "<p>Hi</p>",
        "text": "plain variant",
        "css": false,
    })));
    builder.build().unwrap();

    assert_eq!(builder.transport().html(), "plain variant");
    assert_eq!(builder.transport().text(), "");
}

#[test]
fn build_is_idempotent() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "cc": "cc@example.com",
        "subject": "Once",
        "content_type": "multipart/alternative",
    })));

    builder.build().unwrap();
    let first = builder.snapshot().unwrap();
    builder.build().unwrap();
    let second = builder.snapshot().unwrap();

    assert_eq!(first, second);
    assert_eq!(second.cc.len(), 1);
}

#[test]
fn snapshot_round_trips_the_declared_fields() {
    let mut builder = MessageBuilder::new(params(json!({
        "from": "Jane <jane@example.com>",
        "to": ["john@example.com", "John"],
        "cc": "cc@example.com",
        "bcc": "bcc@example.com",
        "reply-to": "reply@example.com",
        "subject": "Round trip",
        "charset": "iso-8859-1",
        "encoding": "base64",
        "content_type": "multipart/alternative",
    })));
    let snapshot = builder.snapshot().unwrap();

    assert_eq!(
        snapshot.from,
        Some(Contact::new("jane@example.com", Some("Jane".to_string())))
    );
    assert_eq!(
        snapshot.to,
        vec![Contact::new("john@example.com", Some("John".to_string()))]
    );
    assert_eq!(snapshot.cc, vec![Contact::new("cc@example.com", None)]);
    assert_eq!(snapshot.bcc, vec![Contact::new("bcc@example.com", None)]);
    assert_eq!(snapshot.reply_to, vec![Contact::new("reply@example.com", None)]);
    assert_eq!(snapshot.subject, "Round trip");
    assert_eq!(snapshot.charset, "iso-8859-1");
    assert_eq!(snapshot.encoding, Some(Encoding::Base64));
    assert_eq!(snapshot.content_type, ContentType::MultipartAlternative);
}

#[test]
fn invalid_recipients_are_dropped_not_fatal() {
    let mut builder = MessageBuilder::new(params(json!({
        "from": "jane@example.com",
        "to": ["john@example.com", "not-an-address", ["also broken"]],
    })));
    builder.build().unwrap();

    assert_eq!(
        builder.transport().to(),
        &[Contact::new("john@example.com", None)]
    );
}

#[test]
fn css_properties_are_inlined_into_the_elements() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "html": "<p>Hi</p>",
        "css": "p { color: #123456; }",
    })));
    builder.build().unwrap();

    let html = builder.html().unwrap();
    assert!(html.contains("style="), "expected inlined styles in {html}");
    assert!(html.contains("#123456"));
}

#[test]
fn styles_travel_in_a_style_tag_when_inlining_is_off() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "inline_css": false,
        "css": "p { color: #123456; }",
    })));
    builder.build().unwrap();

    let html = builder.html().unwrap();
    assert!(html.contains("<style>p { color: #123456; }</style>"));
}

#[test]
fn attachments_are_resolved_against_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("a.txt");
    fs::write(&existing, "a").unwrap();
    let missing = dir.path().join("missing.txt");

    let mut builder = MessageBuilder::new(addressed(json!({
        "attachments": [
            existing.to_string_lossy(),
            missing.to_string_lossy(),
        ],
    })));
    builder.build().unwrap();

    let attachments = builder.transport().attachments();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].path(), existing.as_path());
}

#[test]
fn send_reports_addressing_problems_as_a_refusal() {
    let mut builder = MessageBuilder::new(params(json!({})));
    let sent = builder.send().unwrap();

    assert!(!sent);
    assert_eq!(
        builder.transport().error(),
        Some(&TransportError::MissingSender)
    );
}

#[test]
fn defaulted_message_uses_the_fallback_subject() {
    let mut builder = MessageBuilder::new(addressed(json!({})));
    builder.build().unwrap();

    assert_eq!(builder.transport().subject(), "Mail test");
    assert_eq!(builder.transport().charset(), "utf-8");
}

#[test]
fn render_message_returns_the_resolved_body() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "html": "<p>Body</p>",
        "css": false,
    })));
    let body = builder.render_message().unwrap();

    assert!(body.contains("<p>Body</p>"));
    assert_eq!(body, builder.transport().html());
}

#[test]
fn http_response_wraps_the_rendered_message() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "charset": "utf-8",
    })));
    let response = builder.to_http_response().unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "text/html; charset=utf-8");
    assert_eq!(response.body, builder.transport().message());
}

#[test]
fn debug_view_shows_recipients_and_both_variants() {
    let mut builder = MessageBuilder::new(addressed(json!({
        "subject": "Diagnostics",
        "content_type": "multipart/alternative",
    })));
    let page = builder.debug().unwrap();

    assert!(page.contains("Diagnostics"));
    assert!(page.contains("To: john@example.com"));
    assert!(page.contains("HTML VERSION"));
    assert!(page.contains("TEXT VERSION"));
}
