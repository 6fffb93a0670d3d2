//! Attachment resolution
//!
//! Attachment specs arrive as paths, `(path, display name)` pairs or nested
//! lists of both. [`parse_attachments`] keeps only the entries whose path
//! names an existing file, mirroring the drop-don't-fail behavior of contact
//! parsing.

use std::path::{Path, PathBuf};

use mime::Mime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::contact::MAX_NESTING;

/// A filesystem-backed attachment reference validated at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    path: PathBuf,
    label: Option<String>,
}

impl Attachment {
    /// Path of the attached file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name the recipient should see, when one was supplied.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Name shown for the attachment: the supplied label, or the file name.
    pub fn file_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Content type guessed from the file extension.
    pub fn mime_type(&self) -> Mime {
        mime_guess::from_path(&self.path).first_or_octet_stream()
    }
}

/// The accepted input shapes for the attachments field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttachmentInput {
    /// A single file path.
    Path(String),
    /// A `(path, display name)` pair.
    Labeled(String, String),
    /// A collection of attachment inputs, walked recursively.
    List(Vec<AttachmentInput>),
}

impl From<&str> for AttachmentInput {
    fn from(path: &str) -> Self {
        AttachmentInput::Path(path.to_string())
    }
}

impl From<String> for AttachmentInput {
    fn from(path: String) -> Self {
        AttachmentInput::Path(path)
    }
}

impl<S: Into<String>, T: Into<String>> From<(S, T)> for AttachmentInput {
    fn from((path, label): (S, T)) -> Self {
        AttachmentInput::Labeled(path.into(), label.into())
    }
}

/// Resolves an attachment input into the list of entries that name existing
/// files. Unusable entries are omitted; the function never fails.
pub fn parse_attachments(input: &AttachmentInput) -> Vec<Attachment> {
    let mut out = Vec::new();
    collect(input, 0, &mut out);
    out
}

fn collect(input: &AttachmentInput, depth: usize, out: &mut Vec<Attachment>) {
    if depth > MAX_NESTING {
        debug!(depth, "attachment list nested too deeply, dropping the branch");
        return;
    }

    match input {
        AttachmentInput::Path(path) => push_existing(path, None, out),
        AttachmentInput::Labeled(path, label) => push_existing(path, Some(label.clone()), out),
        AttachmentInput::List(items) => {
            for item in items {
                collect(item, depth + 1, out);
            }
        }
    }
}

fn push_existing(path: &str, label: Option<String>, out: &mut Vec<Attachment>) {
    let path = PathBuf::from(path);
    if path.is_file() {
        out.push(Attachment { path, label });
    } else {
        debug!(path = %path.display(), "dropping attachment without a backing file");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn existing_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.txt");
        fs::write(&file, "contents").unwrap();

        let input: AttachmentInput = file.to_string_lossy().to_string().into();
        let parsed = parse_attachments(&input);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].path(), file.as_path());
        assert_eq!(parsed[0].file_name(), "report.txt");
    }

    #[test]
    fn missing_file_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("a.txt");
        fs::write(&existing, "a").unwrap();
        let missing = dir.path().join("missing.txt");

        let input = AttachmentInput::List(vec![
            existing.to_string_lossy().to_string().into(),
            missing.to_string_lossy().to_string().into(),
        ]);
        let parsed = parse_attachments(&input);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].path(), existing.as_path());
    }

    #[test]
    fn labeled_pair_keeps_the_display_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f8a91.pdf");
        fs::write(&file, "pdf").unwrap();

        let input = AttachmentInput::List(vec![
            (file.to_string_lossy().to_string(), "Invoice.pdf".to_string()).into(),
        ]);
        let parsed = parse_attachments(&input);
        assert_eq!(parsed[0].label(), Some("Invoice.pdf"));
        assert_eq!(parsed[0].file_name(), "Invoice.pdf");
    }

    #[test]
    fn labeled_pair_with_missing_file_is_dropped() {
        let input: AttachmentInput = ("/nonexistent/f.pdf", "Invoice.pdf").into();
        assert!(parse_attachments(&input).is_empty());
    }

    #[test]
    fn mime_type_is_guessed_from_the_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.png");
        fs::write(&file, "png").unwrap();

        let parsed = parse_attachments(&file.to_string_lossy().to_string().into());
        assert_eq!(parsed[0].mime_type(), mime::IMAGE_PNG);
    }
}
