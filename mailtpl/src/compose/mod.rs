//! # Message composition module
//!
//! Module dedicated to the assembly of a deliverable [`Email`] out of
//! the rendered body of a resolved template. See [`assemble`].

pub mod address;
pub mod assembler;
pub mod document;
pub mod envelope;

use std::{io, path::PathBuf};

use indexmap::IndexSet;
use mail_builder::{
    headers::{content_type::ContentType, text::Text},
    mime::MimePart,
    MessageBuilder,
};
use thiserror::Error;

#[doc(inline)]
pub use self::{
    address::Mailbox,
    assembler::assemble,
    document::RenderedDocument,
    envelope::{MessageKind, RenderedEnvelope},
};

/// Errors related to message composition.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse rendered template")]
    ParseDocumentError(#[source] quick_xml::Error),
    #[error("cannot parse rendered template: multiple root elements")]
    MultipleRootsError,
    #[error("cannot parse rendered template: unclosed element")]
    UnclosedDocumentError,
    #[error("cannot parse rendered template: empty document")]
    EmptyDocumentError,

    #[error("cannot find any message in rendered template")]
    MissingMessagePartError,
    #[error("cannot assemble message: two {0} messages were defined")]
    DuplicateMessagePartError(MessageKind),
    #[error("cannot attach file: attachment path was not set")]
    MissingAttachmentPathError,
    #[error("cannot assemble message: missing sender")]
    MissingSenderError,

    #[error("cannot find resource at {0}")]
    MissingResourceError(PathBuf),
    #[error("cannot read resource at {1}")]
    ReadResourceError(#[source] io::Error, PathBuf),

    #[error("cannot build message")]
    BuildMessageError(#[source] io::Error),
}

/// The message composition `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;

/// The sub-type of a multipart message.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum MultipartKind {
    /// Parts are alternative versions of the same content.
    #[default]
    Alternative,

    /// Parts reference each other, for example an HTML body and its
    /// inline images.
    Related,
}

impl MultipartKind {
    pub fn as_content_type(&self) -> &'static str {
        match self {
            Self::Alternative => "multipart/alternative",
            Self::Related => "multipart/related",
        }
    }
}

/// A file embedded inline, referenced by its content id.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InlinePart {
    pub cid: String,
    pub name: String,
    pub mime: String,
    pub contents: Vec<u8>,
}

impl InlinePart {
    fn to_mime_part(&self) -> MimePart<'_> {
        let ctype = ContentType::new(self.mime.as_str()).attribute("name", self.name.as_str());
        MimePart::new(ctype, self.contents.as_slice())
            .inline()
            .cid(self.cid.as_str())
    }
}

/// A file attached to the message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttachedFile {
    pub name: String,
    pub description: String,
    pub mime: String,
    pub contents: Vec<u8>,
}

impl AttachedFile {
    fn to_mime_part(&self) -> MimePart<'_> {
        let ctype = ContentType::new(self.mime.as_str()).attribute("name", self.name.as_str());
        let mut part =
            MimePart::new(ctype, self.contents.as_slice()).attachment(self.name.as_str());

        if !self.description.is_empty() {
            part = part.header("Content-Description", Text::new(self.description.as_str()));
        }

        part
    }
}

/// The multipart message body.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Multipart {
    pub kind: MultipartKind,
    pub text: Option<String>,
    pub html: Option<String>,
    pub inlines: Vec<InlinePart>,
    pub attachments: Vec<AttachedFile>,
}

impl Multipart {
    fn to_mime_part(&self) -> MimePart<'_> {
        let text = self
            .text
            .as_deref()
            .map(|text| MimePart::new("text/plain", text));
        let html = self
            .html
            .as_deref()
            .map(|html| MimePart::new("text/html", html));

        let mut parts = Vec::new();

        match (self.kind, text, html) {
            (MultipartKind::Related, Some(text), Some(html)) => {
                parts.push(MimePart::new("multipart/alternative", vec![text, html]));
            }
            (_, text, html) => {
                parts.extend(text);
                parts.extend(html);
            }
        }

        parts.extend(self.inlines.iter().map(InlinePart::to_mime_part));
        parts.extend(self.attachments.iter().map(AttachedFile::to_mime_part));

        MimePart::new(self.kind.as_content_type(), parts)
    }
}

/// The message body, shaped after the rendered message parts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Body {
    /// A single plain text part.
    Plain(String),

    /// HTML, alternative plain text, inline parts and attachments.
    Multipart(Multipart),
}

/// The message envelope.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Envelope {
    pub subject: Option<String>,
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub cc: Vec<Mailbox>,
    pub bcc: Vec<Mailbox>,
    pub reply_to: Vec<Mailbox>,
}

impl Envelope {
    /// Return the distinct delivery addresses, blind copies included,
    /// in `to`, `cc` then `bcc` order.
    pub fn recipients(&self) -> Vec<&str> {
        let mut recipients = IndexSet::new();

        for mailbox in self.to.iter().chain(&self.cc).chain(&self.bcc) {
            let email = mailbox.email.trim();
            if !email.is_empty() {
                recipients.insert(email);
            }
        }

        recipients.into_iter().collect()
    }
}

/// The assembled, deliverable email message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Email {
    pub envelope: Envelope,
    pub body: Body,
}

impl Email {
    /// Add a recipient to the message.
    pub fn add_to(&mut self, mailbox: impl Into<Mailbox>) {
        self.envelope.to.push(mailbox.into());
    }

    /// Build the MIME message.
    ///
    /// Blind copies are never written to the message: they only take
    /// part in the delivery, see [`Envelope::recipients`].
    pub fn to_msg_builder(&self) -> MessageBuilder<'_> {
        let envelope = &self.envelope;
        let mut builder = MessageBuilder::new().from(envelope.from.to_address());

        if !envelope.to.is_empty() {
            builder = builder.to(Mailbox::to_address_list(&envelope.to));
        }

        if !envelope.cc.is_empty() {
            builder = builder.cc(Mailbox::to_address_list(&envelope.cc));
        }

        if !envelope.reply_to.is_empty() {
            builder = builder.reply_to(Mailbox::to_address_list(&envelope.reply_to));
        }

        if let Some(subject) = &envelope.subject {
            builder = builder.subject(subject.as_str());
        }

        match &self.body {
            Body::Plain(text) => builder.text_body(text.as_str()),
            Body::Multipart(multipart) => builder.body(multipart.to_mime_part()),
        }
    }

    /// Write the MIME message to a [Vec].
    pub fn write_to_vec(&self) -> Result<Vec<u8>> {
        self.to_msg_builder()
            .write_to_vec()
            .map_err(Error::BuildMessageError)
    }

    /// Write the MIME message to a [String].
    pub fn write_to_string(&self) -> Result<String> {
        self.to_msg_builder()
            .write_to_string()
            .map_err(Error::BuildMessageError)
    }
}
