//! The message builder
//!
//! A [`MessageBuilder`] turns a declarative parameter bag into a populated,
//! transport-ready message. Construction runs exactly once per builder
//! through three ordered phases: parameter resolution, transport population
//! and body reconciliation. Repeated [`build`](MessageBuilder::build) calls
//! are no-ops.
//!
//! Contact fields and attachments are stored raw until build time and
//! resolved through the contact parser and the attachment resolver exactly
//! once. All data-shape problems in caller-supplied values degrade silently
//! to omission; only static misconfiguration is fatal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::Error;
use crate::queue::{MailQueue, QueuedMessage};
use crate::template::{BundledTemplates, MailTemplates, TemplateView};
use crate::transport::stub::StubTransport;
use crate::transport::{MailTransport, TransportSnapshot};

use super::attachment::{parse_attachments, AttachmentInput};
use super::body::{has_html_head, html_to_text, inline_css, DEFAULT_CSS};
use super::contact::{linearize_contacts, parse_contacts, ContactInput};
use super::params::{
    fallback, resolve_field, ContentType, CssParam, Encoding, HtmlParam, HtmlSections,
    MessageParams, SectionParam, TextParam,
};

/// Minimal response envelope for previewing a built message in a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Response status code.
    pub status: u16,
    /// Value of the `Content-Type` header.
    pub content_type: String,
    /// The resolved message body.
    pub body: String,
}

/// Per-message orchestrator turning declarative parameters into a populated
/// transport.
///
/// Every field resolves through the same precedence chain: an explicit
/// in-memory override set on the builder, then the caller-supplied parameter
/// bag, then the registry defaults snapshot, then a hardcoded fallback.
pub struct MessageBuilder {
    name: Option<String>,
    built: bool,
    params: MessageParams,
    defaults: MessageParams,
    locale: Option<String>,
    from: Option<ContactInput>,
    to: Option<ContactInput>,
    cc: Option<ContactInput>,
    bcc: Option<ContactInput>,
    reply_to: Option<ContactInput>,
    attachments: Option<AttachmentInput>,
    charset: Option<String>,
    encoding: Option<Encoding>,
    content_type: Option<ContentType>,
    subject: Option<String>,
    html: Option<String>,
    text: Option<String>,
    inline_css: Option<bool>,
    css: Option<String>,
    datas: Map<String, Value>,
    templates: Option<Arc<dyn MailTemplates>>,
    transport: Box<dyn MailTransport>,
}

impl std::fmt::Debug for MessageBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBuilder")
            .field("name", &self.name)
            .field("built", &self.built)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new(MessageParams::default())
    }
}

impl MessageBuilder {
    /// Creates a builder for the given parameter bag, backed by the stub
    /// transport and the bundled views until the registry installs others.
    pub fn new(params: MessageParams) -> Self {
        MessageBuilder {
            name: params.name.clone(),
            built: false,
            params,
            defaults: MessageParams::default(),
            locale: None,
            from: None,
            to: None,
            cc: None,
            bcc: None,
            reply_to: None,
            attachments: None,
            charset: None,
            encoding: None,
            content_type: None,
            subject: None,
            html: None,
            text: None,
            inline_css: None,
            css: None,
            datas: Map::new(),
            templates: None,
            transport: Box::new(StubTransport::new_positive()),
        }
    }

    /// Name identifier of the message in the registry.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Renames the message. Renaming an already-registered builder through
    /// its parameter bag moves the registry entry at build time instead.
    pub fn set_name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Whether construction already ran.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// The caller-supplied parameter bag.
    pub fn params(&self) -> &MessageParams {
        &self.params
    }

    /// Mutable access to the parameter bag. Mutations after
    /// [`build`](MessageBuilder::build) have no effect on the message.
    pub fn params_mut(&mut self) -> &mut MessageParams {
        &mut self.params
    }

    /// Replaces the registry defaults snapshot used as the fallback source
    /// during parameter resolution.
    pub fn set_defaults(&mut self, defaults: MessageParams) -> &mut Self {
        self.defaults = defaults;
        self
    }

    /// Installs the view engine.
    pub fn set_templates(&mut self, templates: Arc<dyn MailTemplates>) -> &mut Self {
        self.templates = Some(templates);
        self
    }

    /// Installs the delivery engine.
    pub fn set_transport(&mut self, transport: Box<dyn MailTransport>) -> &mut Self {
        self.transport = transport;
        self
    }

    /// The populated delivery engine.
    pub fn transport(&self) -> &dyn MailTransport {
        self.transport.as_ref()
    }

    /// Mutable access to the delivery engine.
    pub fn transport_mut(&mut self) -> &mut dyn MailTransport {
        self.transport.as_mut()
    }

    /// Overrides the message sender.
    pub fn set_from<C: Into<ContactInput>>(&mut self, from: C) -> &mut Self {
        self.from = Some(from.into());
        self
    }

    /// Overrides the recipients of the message.
    pub fn set_to<C: Into<ContactInput>>(&mut self, to: C) -> &mut Self {
        self.to = Some(to.into());
        self
    }

    /// Overrides the carbon copy recipients.
    pub fn set_cc<C: Into<ContactInput>>(&mut self, cc: C) -> &mut Self {
        self.cc = Some(cc.into());
        self
    }

    /// Overrides the blind carbon copy recipients.
    pub fn set_bcc<C: Into<ContactInput>>(&mut self, bcc: C) -> &mut Self {
        self.bcc = Some(bcc.into());
        self
    }

    /// Overrides the reply-to contacts.
    pub fn set_reply_to<C: Into<ContactInput>>(&mut self, reply_to: C) -> &mut Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Overrides the attachments of the message.
    pub fn set_attachments<A: Into<AttachmentInput>>(&mut self, attachments: A) -> &mut Self {
        self.attachments = Some(attachments.into());
        self
    }

    /// Overrides the locale of the message.
    pub fn set_locale<S: Into<String>>(&mut self, locale: S) -> &mut Self {
        self.locale = Some(locale.into());
        self
    }

    /// Locale of the message.
    pub fn locale(&self) -> &str {
        self.locale.as_deref().unwrap_or(fallback::LOCALE)
    }

    /// Overrides the charset of the message.
    pub fn set_charset<S: Into<String>>(&mut self, charset: S) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    /// Overrides the content transfer encoding.
    pub fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = Some(encoding);
        self
    }

    /// Overrides the content type of the message.
    pub fn set_content_type(&mut self, content_type: ContentType) -> &mut Self {
        self.content_type = Some(content_type);
        self
    }

    /// Overrides the subject of the message.
    pub fn set_subject<S: Into<String>>(&mut self, subject: S) -> &mut Self {
        self.subject = Some(subject.into());
        self
    }

    /// Overrides the HTML variant with a literal body.
    pub fn set_html<S: Into<String>>(&mut self, html: S) -> &mut Self {
        self.html = Some(html.into());
        self
    }

    /// The resolved HTML variant, available after build.
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    /// Overrides the plain text variant with a literal body.
    pub fn set_text<S: Into<String>>(&mut self, text: S) -> &mut Self {
        self.text = Some(text.into());
        self
    }

    /// The resolved plain text variant, available after build.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Overrides the CSS inlining flag.
    pub fn set_inline_css(&mut self, inline_css: bool) -> &mut Self {
        self.inline_css = Some(inline_css);
        self
    }

    /// Overrides the CSS properties of the HTML variant.
    pub fn set_css<S: Into<String>>(&mut self, css: S) -> &mut Self {
        self.css = Some(css.into());
        self
    }

    /// Adds one entry to the view data bag.
    pub fn data<S: Into<String>, V: Into<Value>>(&mut self, key: S, value: V) -> &mut Self {
        self.datas.insert(key.into(), value.into());
        self
    }

    /// The view data bag.
    pub fn datas(&self) -> &Map<String, Value> {
        &self.datas
    }

    /// Runs the one-time construction: parameter resolution, transport
    /// population and body reconciliation. Subsequent calls are no-ops.
    ///
    /// Only static misconfiguration fails the build; malformed data in the
    /// parameter bag degrades to omission.
    pub fn build(&mut self) -> Result<(), Error> {
        if self.built {
            return Ok(());
        }

        self.build_params();
        self.build_transport();
        self.build_render()?;

        self.built = true;
        Ok(())
    }

    /// Builds the message, then delivers it through the transport. The
    /// boolean mirrors the transport's verdict; the cause of a refusal is
    /// available from the transport's error accessor.
    pub fn send(&mut self) -> Result<bool, Error> {
        self.build()?;

        let sent = self.transport.send();
        if sent {
            info!(name = self.name.as_deref().unwrap_or_default(), "message sent");
        } else {
            warn!(
                name = self.name.as_deref().unwrap_or_default(),
                error = %self
                    .transport
                    .error()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                "message delivery refused"
            );
        }
        Ok(sent)
    }

    /// Builds the message, then hands it to the queue for deferred delivery
    /// at the given instant. Returns the queue identifier; `0` means the
    /// message was not queued.
    pub fn queue(
        &mut self,
        queue: &mut dyn MailQueue,
        when: DateTime<Utc>,
        context: Map<String, Value>,
    ) -> Result<u64, Error> {
        self.build()?;

        let message = QueuedMessage {
            name: self.name.clone().unwrap_or_default(),
            snapshot: self.transport.snapshot(),
            when,
            context,
        };
        Ok(queue.push(message))
    }

    /// Builds the message, validates its addressing and renders the
    /// diagnostic view showing headers, recipients and both body variants.
    pub fn debug(&mut self) -> Result<String, Error> {
        self.build()?;
        self.transport.prepare();

        let templates = self.resolve_templates()?;
        let mut ctx = self.render_context();
        ctx.insert("headers".to_string(), self.transport.headers().into());
        ctx.insert("has_html".to_string(), self.transport.has_html().into());
        ctx.insert("has_text".to_string(), self.transport.has_text().into());
        ctx.insert("html".to_string(), self.transport.html().into());
        ctx.insert("text".to_string(), self.transport.text().into());
        templates.render(TemplateView::Debug, &ctx)
    }

    /// Builds the message and returns the resolved body content only.
    pub fn render_message(&mut self) -> Result<String, Error> {
        self.build()?;
        Ok(self.transport.message().to_string())
    }

    /// Builds the message and wraps the resolved body for inspection in a
    /// browser.
    pub fn to_http_response(&mut self) -> Result<HttpResponse, Error> {
        let body = self.render_message()?;
        Ok(HttpResponse {
            status: 200,
            content_type: format!(
                "text/html; charset={}",
                self.charset.as_deref().unwrap_or(fallback::CHARSET)
            ),
            body,
        })
    }

    /// Builds the message and captures the populated transport state.
    pub fn snapshot(&mut self) -> Result<TransportSnapshot, Error> {
        self.build()?;
        Ok(self.transport.snapshot())
    }

    /// Phase 1: resolve every unset field through the precedence chain.
    fn build_params(&mut self) {
        if let Some(new_name) = &self.params.name {
            if self.name.as_deref() != Some(new_name.as_str()) {
                self.name = Some(new_name.clone());
            }
        }

        self.from = resolve_field(self.from.as_ref(), self.params.from.as_ref(), self.defaults.from.as_ref(), None);
        self.to = resolve_field(self.to.as_ref(), self.params.to.as_ref(), self.defaults.to.as_ref(), None);
        self.reply_to = resolve_field(
            self.reply_to.as_ref(),
            self.params.reply_to.as_ref(),
            self.defaults.reply_to.as_ref(),
            None,
        );
        self.bcc = resolve_field(self.bcc.as_ref(), self.params.bcc.as_ref(), self.defaults.bcc.as_ref(), None);
        self.cc = resolve_field(self.cc.as_ref(), self.params.cc.as_ref(), self.defaults.cc.as_ref(), None);
        self.attachments = resolve_field(
            self.attachments.as_ref(),
            self.params.attachments.as_ref(),
            self.defaults.attachments.as_ref(),
            None,
        );
        self.locale = resolve_field(
            self.locale.as_ref(),
            self.params.locale.as_ref(),
            self.defaults.locale.as_ref(),
            Some(fallback::LOCALE.to_string()),
        );
        self.charset = resolve_field(
            self.charset.as_ref(),
            self.params.charset.as_ref(),
            self.defaults.charset.as_ref(),
            Some(fallback::CHARSET.to_string()),
        );
        self.encoding = resolve_field(
            self.encoding.as_ref(),
            self.params.encoding.as_ref(),
            self.defaults.encoding.as_ref(),
            None,
        );
        self.content_type = resolve_field(
            self.content_type.as_ref(),
            self.params.content_type.as_ref(),
            self.defaults.content_type.as_ref(),
            None,
        );
        self.subject = resolve_field(
            self.subject.as_ref(),
            self.params.subject.as_ref(),
            self.defaults.subject.as_ref(),
            Some(fallback::SUBJECT.to_string()),
        );
    }

    /// Phase 2: resolve contact and attachment inputs and populate the
    /// transport with them.
    fn build_transport(&mut self) {
        if let Some(from) = &self.from {
            if let Some(contact) = parse_contacts(from).into_iter().next() {
                self.transport.set_from(contact);
            }
        }
        if let Some(to) = &self.to {
            for contact in parse_contacts(to) {
                self.transport.add_to(contact);
            }
        }
        if let Some(reply_to) = &self.reply_to {
            for contact in parse_contacts(reply_to) {
                self.transport.add_reply_to(contact);
            }
        }
        if let Some(bcc) = &self.bcc {
            for contact in parse_contacts(bcc) {
                self.transport.add_bcc(contact);
            }
        }
        if let Some(cc) = &self.cc {
            for contact in parse_contacts(cc) {
                self.transport.add_cc(contact);
            }
        }
        if let Some(attachments) = &self.attachments {
            for attachment in parse_attachments(attachments) {
                self.transport.add_attachment(attachment);
            }
        }

        if let Some(charset) = &self.charset {
            self.transport.set_charset(charset);
        }
        if let Some(encoding) = self.encoding {
            self.transport.set_encoding(encoding);
        }
        if let Some(content_type) = self.content_type {
            self.transport.set_content_type(content_type);
        }
        if let Some(subject) = &self.subject {
            self.transport.set_subject(subject);
        }
    }

    /// Phase 3: reconcile the HTML and plain text variants, inline the CSS
    /// and dispatch the bodies to the transport.
    fn build_render(&mut self) -> Result<(), Error> {
        let templates = self.resolve_templates()?;

        let mut datas = self.defaults.datas.clone();
        for (key, value) in &self.datas {
            datas.insert(key.clone(), value.clone());
        }
        for (key, value) in &self.params.datas {
            datas.insert(key.clone(), value.clone());
        }
        self.datas = datas;

        self.inline_css = resolve_field(
            self.inline_css.as_ref(),
            self.params.inline_css.as_ref(),
            self.defaults.inline_css.as_ref(),
            Some(true),
        );

        if self.css.is_none() {
            let css = resolve_field(
                None,
                self.params.css.as_ref(),
                self.defaults.css.as_ref(),
                Some(CssParam::Toggle(true)),
            );
            self.css = match css {
                Some(CssParam::Literal(css)) => Some(css),
                Some(CssParam::Toggle(true)) => Some(DEFAULT_CSS.to_string()),
                _ => None,
            };
        }

        let ctx = self.render_context();

        let resolved_html = match &self.html {
            Some(explicit) => Some(explicit.clone()),
            None => {
                let request = resolve_field(
                    None,
                    self.params.html.as_ref(),
                    self.defaults.html.as_ref(),
                    Some(HtmlParam::Toggle(true)),
                )
                .unwrap_or(HtmlParam::Toggle(true));
                match request {
                    HtmlParam::Toggle(false) => None,
                    HtmlParam::Toggle(true) => {
                        Some(compose_sections(templates.as_ref(), &ctx, &HtmlSections::default())?)
                    }
                    HtmlParam::Literal(html) => Some(html),
                    HtmlParam::Sections(sections) => {
                        Some(compose_sections(templates.as_ref(), &ctx, &sections)?)
                    }
                }
            }
        };

        // Headless content is wrapped into the layout so every outgoing HTML
        // body is a complete document.
        let resolved_html = match resolved_html {
            Some(html) if !has_html_head(&html) => {
                let header = resolve_section(templates.as_ref(), &ctx, None, TemplateView::HtmlHeader)?;
                let footer = resolve_section(templates.as_ref(), &ctx, None, TemplateView::HtmlFooter)?;
                Some(compose_page(templates.as_ref(), &ctx, header, Some(html), footer)?)
            }
            other => other,
        };

        if self.text.is_none() {
            let request = resolve_field(None, self.params.text.as_ref(), self.defaults.text.as_ref(), None);
            match request {
                Some(TextParam::Literal(text)) => self.text = Some(text),
                Some(TextParam::Toggle(false)) => {}
                Some(TextParam::Toggle(true)) | None => {
                    let source = match &resolved_html {
                        Some(html) if !html.is_empty() => html.clone(),
                        _ => templates.render(TemplateView::TextMessage, &ctx)?,
                    };
                    self.text = Some(html_to_text(&source));
                }
            }
        }

        if let Some(mut html) = resolved_html {
            if self.inline_css == Some(true) {
                if let Some(css) = &self.css {
                    match inline_css(&html, css) {
                        Ok(inlined) => html = inlined,
                        Err(error) => {
                            warn!(%error, "CSS inlining failed, keeping the uninlined HTML")
                        }
                    }
                }
            }
            self.html = Some(html);
        }

        match self.content_type {
            None | Some(ContentType::MultipartAlternative) => {
                self.transport.set_html(self.html.as_deref().unwrap_or_default());
                self.transport.set_text(self.text.as_deref().unwrap_or_default());
            }
            Some(ContentType::TextHtml) => {
                // TODO: confirm which variant belongs here; the html-only
                // branch has always forwarded the plain text rendition into
                // the HTML slot.
                self.transport.set_html(self.text.as_deref().unwrap_or_default());
            }
            Some(ContentType::TextPlain) => {
                self.transport.set_text(self.text.as_deref().unwrap_or_default());
            }
        }

        Ok(())
    }

    fn resolve_templates(&mut self) -> Result<Arc<dyn MailTemplates>, Error> {
        if let Some(templates) = &self.templates {
            return Ok(templates.clone());
        }

        let directory = self
            .params
            .view
            .directory
            .as_ref()
            .or(self.defaults.view.directory.as_ref());
        let engine = match directory {
            Some(dir) => BundledTemplates::with_directory(dir)?,
            None => BundledTemplates::new(),
        };
        let shared: Arc<dyn MailTemplates> = Arc::new(engine);
        self.templates = Some(shared.clone());
        Ok(shared)
    }

    /// Assembles the view data: the merged data bag extended with the
    /// accessor values of the current message.
    fn render_context(&self) -> Map<String, Value> {
        let mut ctx = self.datas.clone();
        ctx.insert(
            "subject".to_string(),
            self.subject.clone().unwrap_or_default().into(),
        );
        ctx.insert("locale".to_string(), self.locale().into());
        ctx.insert(
            "charset".to_string(),
            self.charset.as_deref().unwrap_or(fallback::CHARSET).into(),
        );

        // Styles travel in a style tag only when they are not inlined into
        // the elements.
        if self.inline_css != Some(true) {
            if let Some(css) = &self.css {
                ctx.insert("css".to_string(), css.clone().into());
            }
        }

        if let Some(from) = self.transport.from() {
            ctx.insert("from".to_string(), from.to_string().into());
            ctx.insert("from_email".to_string(), from.email.clone().into());
            if let Some(name) = &from.name {
                ctx.insert("from_name".to_string(), name.clone().into());
            }
        }
        for (key, contacts) in [
            ("to", self.transport.to()),
            ("cc", self.transport.cc()),
            ("bcc", self.transport.bcc()),
            ("reply_to", self.transport.reply_to()),
        ] {
            if !contacts.is_empty() {
                ctx.insert(key.to_string(), linearize_contacts(contacts).into());
            }
        }

        ctx
    }
}

fn resolve_section(
    templates: &dyn MailTemplates,
    ctx: &Map<String, Value>,
    part: Option<&SectionParam>,
    view: TemplateView,
) -> Result<Option<String>, Error> {
    match part {
        Some(SectionParam::Toggle(false)) => Ok(None),
        Some(SectionParam::Literal(fragment)) => Ok(Some(fragment.clone())),
        Some(SectionParam::Toggle(true)) | None => Ok(Some(templates.render(view, ctx)?)),
    }
}

fn compose_sections(
    templates: &dyn MailTemplates,
    ctx: &Map<String, Value>,
    sections: &HtmlSections,
) -> Result<String, Error> {
    let header = resolve_section(templates, ctx, sections.header.as_ref(), TemplateView::HtmlHeader)?;
    let body = resolve_section(templates, ctx, sections.body.as_ref(), TemplateView::HtmlBody)?;
    let footer = resolve_section(templates, ctx, sections.footer.as_ref(), TemplateView::HtmlFooter)?;
    compose_page(templates, ctx, header, body, footer)
}

fn compose_page(
    templates: &dyn MailTemplates,
    ctx: &Map<String, Value>,
    header: Option<String>,
    body: Option<String>,
    footer: Option<String>,
) -> Result<String, Error> {
    let mut page = ctx.clone();
    if let Some(header) = header {
        page.insert("header".to_string(), header.into());
    }
    if let Some(body) = body {
        page.insert("body".to_string(), body.into());
    }
    if let Some(footer) = footer {
        page.insert("footer".to_string(), footer.into());
    }
    templates.render(TemplateView::HtmlMessage, &page)
}
