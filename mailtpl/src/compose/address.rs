//! # Address module
//!
//! Envelope address fields accept two forms: a single address with
//! an optional display name given by the `name` attribute, or a list
//! of bare addresses separated by semicolons.

use mail_builder::headers::address::Address;

use super::document::Element;

pub(crate) const SEPARATOR: char = ';';
pub(crate) const NAME: &str = "name";

/// A single mailbox: an email address and an optional display name.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Mailbox {
    pub name: Option<String>,
    pub email: String,
}

impl Mailbox {
    pub fn new(email: impl ToString) -> Self {
        Self {
            name: None,
            email: email.to_string(),
        }
    }

    pub fn new_named(name: impl ToString, email: impl ToString) -> Self {
        Self {
            name: Some(name.to_string()),
            email: email.to_string(),
        }
    }

    pub(crate) fn to_address(&self) -> Address<'_> {
        Address::new_address(self.name.as_deref(), self.email.as_str())
    }

    pub(crate) fn to_address_list(mailboxes: &[Mailbox]) -> Address<'_> {
        Address::new_list(mailboxes.iter().map(Mailbox::to_address).collect())
    }
}

impl From<&str> for Mailbox {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Mailbox {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

/// Parse the mailboxes of the given address element.
///
/// A blank element gives no mailbox. An element containing the
/// separator gives a list of bare mailboxes. Otherwise the element
/// gives one mailbox, named after the `name` attribute or after the
/// address itself.
pub fn parse_mailboxes(element: &Element) -> Vec<Mailbox> {
    let text = element.text.trim();

    if text.is_empty() {
        return Vec::new();
    }

    if text.contains(SEPARATOR) {
        return text
            .split(SEPARATOR)
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(Mailbox::new)
            .collect();
    }

    let name = element.attr(NAME).unwrap_or(text);
    vec![Mailbox::new_named(name, text)]
}

#[cfg(test)]
mod tests {
    use crate::compose::document::Element;

    use super::Mailbox;

    fn element(text: &str, name: Option<&str>) -> Element {
        Element {
            name: "to".into(),
            attrs: name
                .map(|name| vec![("name".to_owned(), name.to_owned())])
                .unwrap_or_default(),
            text: text.into(),
        }
    }

    #[test]
    fn parse_list() {
        let mailboxes = super::parse_mailboxes(&element("a@x.com;b@x.com", Some("ignored")));

        assert_eq!(
            mailboxes,
            vec![Mailbox::new("a@x.com"), Mailbox::new("b@x.com")]
        );
    }

    #[test]
    fn parse_list_with_blanks() {
        let mailboxes = super::parse_mailboxes(&element(" a@x.com ; ;b@x.com;", None));

        assert_eq!(
            mailboxes,
            vec![Mailbox::new("a@x.com"), Mailbox::new("b@x.com")]
        );
    }

    #[test]
    fn parse_single_named() {
        let mailboxes = super::parse_mailboxes(&element("a@x.com", Some("Alice")));

        assert_eq!(mailboxes, vec![Mailbox::new_named("Alice", "a@x.com")]);
    }

    #[test]
    fn parse_single_unnamed() {
        let mailboxes = super::parse_mailboxes(&element("\n  a@x.com\n", None));

        assert_eq!(mailboxes, vec![Mailbox::new_named("a@x.com", "a@x.com")]);
    }

    #[test]
    fn parse_blank() {
        assert!(super::parse_mailboxes(&element("  ", Some("Alice"))).is_empty());
    }
}
