//! Error types for message building

use std::path::PathBuf;

use thiserror::Error;

/// An enum of all fatal configuration error kinds.
///
/// Only static misconfiguration surfaces through this type. Malformed
/// caller-supplied data (invalid addresses, missing attachment files, broken
/// stylesheets) is recovered locally by dropping the offending entry, and
/// transport failures are reported as boolean results with an inspectable
/// last-error value instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured view directory does not exist or is not readable
    #[error("view directory {0:?} is not accessible")]
    ViewDirectory(PathBuf),
    /// A view override failed to compile
    #[error("failed to compile view {view}")]
    ViewSyntax {
        /// Name of the view that failed to compile
        view: &'static str,
        /// Underlying template engine error
        #[source]
        source: handlebars::TemplateError,
    },
    /// A view failed to render
    #[error("failed to render view {view}")]
    ViewRender {
        /// Name of the view that failed to render
        view: &'static str,
        /// Underlying template engine error
        #[source]
        source: handlebars::RenderError,
    },
    /// Lookup of a message by a name that was never registered
    #[error("no message is registered under the name {0:?}")]
    UnknownMessage(String),
}
