//! The view engine seam
//!
//! The builder renders its bodies through the [`MailTemplates`] trait, so the
//! actual template engine stays an external collaborator. The crate ships
//! [`BundledTemplates`], a Handlebars implementation carrying default views
//! for every hook; any view can be overridden by dropping an `.hbs` file with
//! the same relative name into a configured directory.

use std::path::Path;
use std::sync::Arc;

use handlebars::Handlebars;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Error;

/// The view hooks a builder invokes while reconciling bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateView {
    /// Diagnostic page showing headers, recipients and both body variants.
    Debug,
    /// The layout document wrapping every HTML body.
    HtmlMessage,
    /// Default header section of an HTML body.
    HtmlHeader,
    /// Default main section of an HTML body.
    HtmlBody,
    /// Default footer section of an HTML body.
    HtmlFooter,
    /// Default plain text body.
    TextMessage,
}

impl TemplateView {
    /// Every view hook, in registration order.
    pub const ALL: [TemplateView; 6] = [
        TemplateView::Debug,
        TemplateView::HtmlMessage,
        TemplateView::HtmlHeader,
        TemplateView::HtmlBody,
        TemplateView::HtmlFooter,
        TemplateView::TextMessage,
    ];

    /// Relative name of the view, also used as the override file stem.
    pub fn name(self) -> &'static str {
        match self {
            TemplateView::Debug => "debug",
            TemplateView::HtmlMessage => "html/message",
            TemplateView::HtmlHeader => "html/header",
            TemplateView::HtmlBody => "html/body",
            TemplateView::HtmlFooter => "html/footer",
            TemplateView::TextMessage => "text/message",
        }
    }

    fn bundled_source(self) -> &'static str {
        match self {
            TemplateView::Debug => include_str!("../templates/debug.hbs"),
            TemplateView::HtmlMessage => include_str!("../templates/html/message.hbs"),
            TemplateView::HtmlHeader => include_str!("../templates/html/header.hbs"),
            TemplateView::HtmlBody => include_str!("../templates/html/body.hbs"),
            TemplateView::HtmlFooter => include_str!("../templates/html/footer.hbs"),
            TemplateView::TextMessage => include_str!("../templates/text/message.hbs"),
        }
    }
}

/// Renders the view hooks for a message builder.
///
/// Implementations receive the merged data bag of the message, extended with
/// the accessor values of the current message (subject, locale, charset,
/// linearized contact lists, body parts).
pub trait MailTemplates {
    /// Renders one view against the given data.
    fn render(&self, view: TemplateView, data: &Map<String, Value>) -> Result<String, Error>;
}

/// The default view engine: Handlebars with bundled templates.
#[derive(Debug)]
pub struct BundledTemplates {
    registry: Handlebars<'static>,
}

impl BundledTemplates {
    /// Creates the engine with the bundled default views only.
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        for view in TemplateView::ALL {
            registry
                .register_template_string(view.name(), view.bundled_source())
                .expect("bundled views are well-formed");
        }
        BundledTemplates { registry }
    }

    /// Creates the engine with per-view overrides loaded from a directory.
    ///
    /// An override is looked up at `<dir>/<view name>.hbs`; views without an
    /// override keep their bundled source. A directory that does not exist
    /// is a fatal configuration error.
    pub fn with_directory<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::ViewDirectory(dir.to_path_buf()));
        }

        let mut engine = Self::new();
        for view in TemplateView::ALL {
            let candidate = dir.join(format!("{}.hbs", view.name()));
            if candidate.is_file() {
                debug!(view = view.name(), path = %candidate.display(), "loading view override");
                engine
                    .registry
                    .register_template_file(view.name(), &candidate)
                    .map_err(|source| Error::ViewSyntax {
                        view: view.name(),
                        source,
                    })?;
            }
        }
        Ok(engine)
    }

    /// Wraps the engine for sharing with builders.
    pub fn shared(self) -> Arc<dyn MailTemplates> {
        Arc::new(self)
    }
}

impl Default for BundledTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl MailTemplates for BundledTemplates {
    fn render(&self, view: TemplateView, data: &Map<String, Value>) -> Result<String, Error> {
        self.registry
            .render(view.name(), data)
            .map_err(|source| Error::ViewRender {
                view: view.name(),
                source,
            })
    }
}
