//! Body reconciliation helpers: document head detection, HTML to text
//! conversion and CSS inlining.

use css_inline::{CSSInliner, InlineError};

/// Stylesheet applied when the CSS request is `true`.
pub(crate) const DEFAULT_CSS: &str = include_str!("../../resources/css/default.css");

/// Column the derived plain text variant is wrapped at.
const TEXT_WRAP_WIDTH: usize = 78;

/// Checks whether an HTML content carries a document head.
///
/// A cheap structural scan: looks for an opening `head` tag, case
/// insensitively. Headless content gets wrapped into the layout view so that
/// every outgoing HTML body is a complete document.
pub(crate) fn has_html_head(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    let mut rest = lower.as_str();
    while let Some(pos) = rest.find("<head") {
        match rest.as_bytes().get(pos + 5) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') | Some(b'/') => {
                return true
            }
            _ => rest = &rest[pos + 5..],
        }
    }
    false
}

/// Converts an HTML content to its plain text rendition.
pub(crate) fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), TEXT_WRAP_WIDTH)
}

/// Rewrites an HTML content with the given CSS properties applied directly
/// to the matching elements.
pub(crate) fn inline_css(html: &str, css: &str) -> Result<String, InlineError> {
    let inliner = CSSInliner::options()
        .extra_css(Some(css.into()))
        .load_remote_stylesheets(false)
        .build();
    inliner.inline(html)
}
