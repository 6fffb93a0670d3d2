//! Contact parsing and linearization
//!
//! Recipient and sender lists reach the builder in loosely shaped
//! configuration values: a bare address, a `"Name <address>"` string, an
//! `(address, name)` pair, a keyed entry, or arbitrarily nested lists of any
//! of those. [`parse_contacts`] normalizes every accepted shape into a flat
//! list of validated [`Contact`]s and never fails: entries that do not carry
//! a syntactically valid address are dropped.

use std::fmt::{self, Display, Formatter};

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum list nesting accepted while walking contact or attachment inputs.
/// Anything deeper is dropped rather than recursed into.
pub(crate) const MAX_NESTING: usize = 8;

/// A validated email address with an optional display name.
///
/// Instances are normally produced by [`parse_contacts`], which guarantees
/// the address passed syntactic validation. The `Display` implementation
/// linearizes back to the `"Name <address>"` wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Contact {
    /// The email address itself.
    pub email: String,
    /// The display name associated with the address.
    pub name: Option<String>,
}

impl Contact {
    /// Creates a new `Contact` from an address and an optional display name.
    pub fn new<S: Into<String>>(email: S, name: Option<String>) -> Self {
        Contact {
            email: email.into(),
            name,
        }
    }
}

impl Display for Contact {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            let name = name.trim();
            if !name.is_empty() {
                return write!(f, "{} <{}>", name, self.email);
            }
        }
        f.write_str(&self.email)
    }
}

/// Joins a contact list into one comma-separated header-style value.
pub fn linearize_contacts(contacts: &[Contact]) -> String {
    contacts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The accepted input shapes for a contact field.
///
/// Deserializes untagged, so a JSON configuration bag maps onto it directly:
/// a string becomes [`Single`](ContactInput::Single), a `{"email": ...}`
/// object becomes [`Entry`](ContactInput::Entry), a two-string array becomes
/// [`Pair`](ContactInput::Pair) and any other array becomes
/// [`List`](ContactInput::List).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ContactInput {
    /// A bare address or a `"Name <address>"` string.
    Single(String),
    /// A keyed entry with an address and an optional display name.
    Entry {
        /// The email address.
        email: String,
        /// The display name, if any.
        name: Option<String>,
    },
    /// An `(address, name)` pair. When the second element is itself a valid
    /// address the pair is reinterpreted as a two-entry collection.
    Pair(String, String),
    /// A collection of contact inputs, parsed recursively.
    List(Vec<ContactInput>),
}

impl From<&str> for ContactInput {
    fn from(raw: &str) -> Self {
        ContactInput::Single(raw.to_string())
    }
}

impl From<String> for ContactInput {
    fn from(raw: String) -> Self {
        ContactInput::Single(raw)
    }
}

impl<S: Into<String>, T: Into<String>> From<(S, T)> for ContactInput {
    fn from((email, name): (S, T)) -> Self {
        ContactInput::Pair(email.into(), name.into())
    }
}

impl From<Vec<ContactInput>> for ContactInput {
    fn from(items: Vec<ContactInput>) -> Self {
        ContactInput::List(items)
    }
}

/// Parses a contact input of any accepted shape into a flat list of
/// validated contacts.
///
/// Entries that fail address validation are dropped silently; the function
/// never fails and may return an empty list.
pub fn parse_contacts(input: &ContactInput) -> Vec<Contact> {
    let mut out = Vec::new();
    collect(input, 0, &mut out);
    out
}

fn collect(input: &ContactInput, depth: usize, out: &mut Vec<Contact>) {
    if depth > MAX_NESTING {
        debug!(depth, "contact list nested too deeply, dropping the branch");
        return;
    }

    match input {
        ContactInput::Single(raw) => {
            if let Some(contact) = parse_single(raw) {
                out.push(contact);
            }
        }
        ContactInput::Entry { email, name } => {
            if is_valid_email(email) {
                out.push(Contact::new(email.clone(), non_empty(name.as_deref())));
            } else {
                debug!(email = email.as_str(), "dropping contact entry with invalid address");
            }
        }
        ContactInput::Pair(email, name) => collect_pair(email, name, depth, out),
        ContactInput::List(items) => {
            // A two-string list where only the first element is an address
            // is one (address, name) pair, not a collection.
            if let [ContactInput::Single(first), ContactInput::Single(second)] = items.as_slice() {
                collect_pair(first, second, depth, out);
                return;
            }
            for item in items {
                collect(item, depth + 1, out);
            }
        }
    }
}

fn collect_pair(email: &str, name: &str, depth: usize, out: &mut Vec<Contact>) {
    if is_valid_email(email) && !is_valid_email(name) {
        out.push(Contact::new(email, non_empty(Some(name))));
    } else {
        // Two addresses, or a leading non-address: fall back to parsing each
        // element on its own.
        collect(&ContactInput::Single(email.to_string()), depth + 1, out);
        collect(&ContactInput::Single(name.to_string()), depth + 1, out);
    }
}

/// Splits one raw contact string into its name and address parts.
///
/// Text before an opening angle bracket becomes the display name (trimmed,
/// quotes stripped); text between the brackets becomes the address. Without
/// brackets the whole string is taken as a bare address.
fn parse_single(raw: &str) -> Option<Contact> {
    let (name, email) = match raw.find('<') {
        Some(pos) => {
            let name = raw[..pos].replace('"', "");
            let email = raw[pos + 1..].replace('>', "");
            (non_empty(Some(name.trim())), email.trim().to_string())
        }
        None => (None, raw.trim().to_string()),
    };

    if email.is_empty() || !is_valid_email(&email) {
        debug!(contact = raw, "dropping contact with invalid address");
        return None;
    }

    Some(Contact { email, name })
}

fn is_valid_email(candidate: &str) -> bool {
    candidate.parse::<EmailAddress>().is_ok()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn contact(email: &str, name: Option<&str>) -> Contact {
        Contact::new(email, name.map(str::to_string))
    }

    #[test]
    fn named_bracket_form() {
        let parsed = parse_contacts(&"\"Jane Doe\" <jane@example.com>".into());
        assert_eq!(parsed, vec![contact("jane@example.com", Some("Jane Doe"))]);
    }

    #[test]
    fn bare_address() {
        let parsed = parse_contacts(&"jane@example.com".into());
        assert_eq!(parsed, vec![contact("jane@example.com", None)]);
    }

    #[test]
    fn invalid_address_is_dropped() {
        assert!(parse_contacts(&"not-an-address".into()).is_empty());
        assert!(parse_contacts(&"Jane <not-an-address>".into()).is_empty());
    }

    #[test]
    fn pair_is_one_contact() {
        let parsed = parse_contacts(&("jane@example.com", "Jane").into());
        assert_eq!(parsed, vec![contact("jane@example.com", Some("Jane"))]);
    }

    #[test]
    fn pair_of_two_addresses_is_a_collection() {
        let parsed = parse_contacts(&("jane@example.com", "john@example.com").into());
        assert_eq!(
            parsed,
            vec![
                contact("jane@example.com", None),
                contact("john@example.com", None),
            ]
        );
    }

    #[test]
    fn two_string_list_uses_the_pair_rule() {
        let input = ContactInput::List(vec!["jane@example.com".into(), "Jane".into()]);
        assert_eq!(
            parse_contacts(&input),
            vec![contact("jane@example.com", Some("Jane"))]
        );
    }

    #[test]
    fn nested_mix_flattens() {
        let input = ContactInput::List(vec![
            "Jane <jane@example.com>".into(),
            ContactInput::List(vec![
                ContactInput::Entry {
                    email: "john@example.com".to_string(),
                    name: Some("John".to_string()),
                },
                "broken".into(),
            ]),
            "mary@example.com".into(),
        ]);
        assert_eq!(
            parse_contacts(&input),
            vec![
                contact("jane@example.com", Some("Jane")),
                contact("john@example.com", Some("John")),
                contact("mary@example.com", None),
            ]
        );
    }

    #[test]
    fn mixed_validity_keeps_only_the_valid_entry() {
        let input = ContactInput::List(vec!["jane@example.com".into(), "oops".into(), ContactInput::List(vec![])]);
        assert_eq!(parse_contacts(&input), vec![contact("jane@example.com", None)]);
    }

    #[test]
    fn nesting_beyond_the_bound_is_dropped() {
        let mut input: ContactInput = "jane@example.com".into();
        for _ in 0..=MAX_NESTING {
            input = ContactInput::List(vec![input]);
        }
        assert!(parse_contacts(&input).is_empty());
    }

    #[test]
    fn untagged_deserialization_covers_every_shape() {
        let input: ContactInput = serde_json::from_value(serde_json::json!([
            "Jane <jane@example.com>",
            ["john@example.com", "John"],
            { "email": "mary@example.com", "name": null },
        ]))
        .unwrap();
        assert_eq!(
            parse_contacts(&input),
            vec![
                contact("jane@example.com", Some("Jane")),
                contact("john@example.com", Some("John")),
                contact("mary@example.com", None),
            ]
        );
    }

    #[test]
    fn linearization() {
        let contacts = vec![
            contact("jane@example.com", Some("Jane")),
            contact("john@example.com", None),
        ];
        assert_eq!(
            linearize_contacts(&contacts),
            "Jane <jane@example.com>, john@example.com"
        );
    }
}
