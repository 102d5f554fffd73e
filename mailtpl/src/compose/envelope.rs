//! # Rendered envelope module
//!
//! Module dedicated to the extraction of message parts, attachment
//! references and envelope fields out of a [`RenderedDocument`].

use std::fmt;

use super::{
    address::{self, Mailbox},
    document::RenderedDocument,
    Error, Result,
};

const MESSAGE: &str = "message";
const ATTACHMENT: &str = "attachment";
const SUBJECT: &str = "subject";
const FROM: &str = "from";
const TO: &str = "to";
const CC: &str = "cc";
const BCC: &str = "bcc";
const REPLY_TO: &str = "replyTo";

const TYPE: &str = "type";
const HTML: &str = "html";
const NAME: &str = "name";
const DESCRIPTION: &str = "description";
const PATH: &str = "path";

/// The kind of a message part.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MessageKind {
    Plain,
    Html,
}

impl MessageKind {
    fn from_type(ty: Option<&str>) -> Self {
        match ty {
            Some(HTML) => Self::Html,
            _ => Self::Plain,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Html => write!(f, "html"),
        }
    }
}

/// A reference to a file to attach, as declared by the rendered
/// document.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttachmentRef {
    pub name: String,
    pub description: String,
    pub path: Option<String>,
}

/// The rendered envelope.
///
/// Holds everything the message assembler needs, except the file
/// contents.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RenderedEnvelope {
    pub plain: Option<String>,
    pub html: Option<String>,
    pub attachments: Vec<AttachmentRef>,
    pub subject: Option<String>,
    pub from: Option<Mailbox>,
    pub to: Vec<Mailbox>,
    pub cc: Vec<Mailbox>,
    pub bcc: Vec<Mailbox>,
    pub reply_to: Vec<Mailbox>,
}

impl RenderedEnvelope {
    /// Return `true` if the envelope holds at least one message part.
    pub fn has_message(&self) -> bool {
        self.plain.is_some() || self.html.is_some()
    }

    fn mailboxes(doc: &RenderedDocument, name: &str) -> Vec<Mailbox> {
        doc.child(name)
            .map(address::parse_mailboxes)
            .unwrap_or_default()
    }
}

impl TryFrom<&RenderedDocument> for RenderedEnvelope {
    type Error = Error;

    fn try_from(doc: &RenderedDocument) -> Result<Self> {
        let mut envelope = RenderedEnvelope::default();

        for message in doc.children(MESSAGE) {
            let kind = MessageKind::from_type(message.attr(TYPE));
            let part = match kind {
                MessageKind::Plain => &mut envelope.plain,
                MessageKind::Html => &mut envelope.html,
            };

            if part.is_some() {
                return Err(Error::DuplicateMessagePartError(kind));
            }

            *part = Some(message.text.clone());
        }

        for attachment in doc.children(ATTACHMENT) {
            envelope.attachments.push(AttachmentRef {
                name: attachment.attr(NAME).unwrap_or_default().to_owned(),
                description: attachment.attr(DESCRIPTION).unwrap_or_default().to_owned(),
                path: attachment.attr(PATH).map(ToOwned::to_owned),
            });
        }

        envelope.subject = doc.child(SUBJECT).map(|subject| subject.text.clone());

        envelope.from = doc.child(FROM).and_then(|from| {
            let email = from.text.trim();
            if email.is_empty() {
                None
            } else {
                let name = from.attr(NAME).unwrap_or(email);
                Some(Mailbox::new_named(name, email))
            }
        });

        envelope.to = Self::mailboxes(doc, TO);
        envelope.cc = Self::mailboxes(doc, CC);
        envelope.bcc = Self::mailboxes(doc, BCC);
        envelope.reply_to = Self::mailboxes(doc, REPLY_TO);

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use concat_with::concat_line;

    use crate::compose::{address::Mailbox, document::RenderedDocument, Error};

    use super::{AttachmentRef, MessageKind, RenderedEnvelope};

    fn envelope(xml: &str) -> Result<RenderedEnvelope, Error> {
        RenderedEnvelope::try_from(&RenderedDocument::parse(xml).unwrap())
    }

    #[test]
    fn full_envelope() {
        let envelope = envelope(concat_line!(
            "<mail>",
            "  <subject>Hello</subject>",
            "  <from name=\"Alice\">alice@localhost</from>",
            "  <to>bob@localhost;carol@localhost</to>",
            "  <cc name=\"Dave\">dave@localhost</cc>",
            "  <bcc>eve@localhost</bcc>",
            "  <replyTo>noreply@localhost</replyTo>",
            "  <message type=\"plain\">Hello!</message>",
            "  <message type=\"html\">&lt;p&gt;Hello!&lt;/p&gt;</message>",
            "  <attachment path=\"doc.pdf\" description=\"Doc\"/>",
            "</mail>",
        ))
        .unwrap();

        assert_eq!(envelope.subject.as_deref(), Some("Hello"));
        assert_eq!(envelope.from, Some(Mailbox::new_named("Alice", "alice@localhost")));
        assert_eq!(
            envelope.to,
            vec![Mailbox::new("bob@localhost"), Mailbox::new("carol@localhost")]
        );
        assert_eq!(envelope.cc, vec![Mailbox::new_named("Dave", "dave@localhost")]);
        assert_eq!(envelope.bcc, vec![Mailbox::new_named("eve@localhost", "eve@localhost")]);
        assert_eq!(
            envelope.reply_to,
            vec![Mailbox::new_named("noreply@localhost", "noreply@localhost")]
        );
        assert_eq!(envelope.plain.as_deref(), Some("Hello!"));
        assert_eq!(envelope.html.as_deref(), Some("<p>Hello!</p>"));
        assert_eq!(
            envelope.attachments,
            vec![AttachmentRef {
                name: String::new(),
                description: "Doc".into(),
                path: Some("doc.pdf".into()),
            }]
        );
    }

    #[test]
    fn unknown_type_is_plain() {
        let envelope = envelope("<mail><message type=\"markdown\">*hi*</message></mail>").unwrap();

        assert_eq!(envelope.plain.as_deref(), Some("*hi*"));
        assert!(envelope.html.is_none());
    }

    #[test]
    fn duplicate_message_type() {
        let err = envelope("<mail><message>a</message><message type=\"text\">b</message></mail>")
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateMessagePartError(MessageKind::Plain)));
    }

    #[test]
    fn from_defaults_name_to_address() {
        let envelope = envelope("<mail><from>alice@localhost</from></mail>").unwrap();

        assert_eq!(
            envelope.from,
            Some(Mailbox::new_named("alice@localhost", "alice@localhost"))
        );
        assert!(!envelope.has_message());
    }
}
