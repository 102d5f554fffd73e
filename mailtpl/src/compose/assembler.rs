//! # Message assembler module
//!
//! Turns the rendered body of a resolved template into an [`Email`],
//! pulling inline parts from the [`Embedder`] used during the render
//! and attached files from a [`ResourceProvider`].

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::{
    embed::{self, Embedder},
    resource::ResourceProvider,
};

use super::{
    document::RenderedDocument,
    envelope::{AttachmentRef, RenderedEnvelope},
    AttachedFile, Body, Email, Envelope, Error, InlinePart, Multipart, MultipartKind, Result,
};

/// Assemble an email from the given rendered template body.
///
/// The body is plain text only when the document declares a single
/// plain message and no attachment. Otherwise the message is a
/// multipart: `related` when there is anything to embed or attach,
/// `alternative` otherwise.
pub fn assemble(
    xml: &str,
    embedder: &Embedder,
    resources: &dyn ResourceProvider,
) -> Result<Email> {
    let doc = RenderedDocument::parse(xml)?;
    let rendered = RenderedEnvelope::try_from(&doc)?;

    if !rendered.has_message() {
        return Err(Error::MissingMessagePartError);
    }

    let RenderedEnvelope {
        plain,
        html,
        attachments,
        subject,
        from,
        to,
        cc,
        bcc,
        reply_to,
    } = rendered;

    let body = if html.is_some() || !attachments.is_empty() {
        let kind = if embedder.has_embeddings() || !attachments.is_empty() {
            MultipartKind::Related
        } else {
            MultipartKind::Alternative
        };
        debug!("assembling multipart/{kind:?} message");

        let inlines = embedder
            .embeddings()
            .into_iter()
            .map(|(path, cid)| inline_part(embedder, resources, &path, cid))
            .collect::<Result<Vec<_>>>()?;

        let attachments = attachments
            .iter()
            .map(|attachment| attached_file(resources, attachment))
            .collect::<Result<Vec<_>>>()?;

        Body::Multipart(Multipart {
            kind,
            text: plain,
            html,
            inlines,
            attachments,
        })
    } else if let Some(text) = plain {
        debug!("assembling plain text message");
        if embedder.has_embeddings() {
            debug!("plain text message cannot hold inline parts, ignoring embeddings");
        }
        Body::Plain(text)
    } else {
        return Err(Error::MissingMessagePartError);
    };

    let from = from.ok_or(Error::MissingSenderError)?;

    Ok(Email {
        envelope: Envelope {
            subject,
            from,
            to,
            cc,
            bcc,
            reply_to,
        },
        body,
    })
}

fn read(resources: &dyn ResourceProvider, path: &Path) -> Result<Vec<u8>> {
    if !resources.exists(path) {
        return Err(Error::MissingResourceError(path.to_owned()));
    }

    resources
        .read(path)
        .map_err(|err| Error::ReadResourceError(err, path.to_owned()))
}

fn guess_mime(contents: &[u8]) -> String {
    let mime = tree_magic_mini::from_u8(contents);
    trace!("guessed content type from contents: {mime}");
    mime.to_owned()
}

fn inline_part(
    embedder: &Embedder,
    resources: &dyn ResourceProvider,
    path: &str,
    cid: String,
) -> Result<InlinePart> {
    let fpath = resources.locate(path);
    debug!("embedding {} as cid:{cid}", fpath.display());

    let contents = read(resources, &fpath)?;

    Ok(InlinePart {
        cid,
        name: embedder.name(path),
        mime: guess_mime(&contents),
        contents,
    })
}

fn attached_file(resources: &dyn ResourceProvider, attachment: &AttachmentRef) -> Result<AttachedFile> {
    let path = attachment
        .path
        .as_deref()
        .ok_or(Error::MissingAttachmentPathError)?;

    // the path is tried as it is first, then under the resource root
    let mut fpath = PathBuf::from(path);
    if !resources.exists(&fpath) {
        fpath = resources.root().join(path);
    }
    debug!("attaching {}", fpath.display());

    let contents = read(resources, &fpath)?;

    let name = if attachment.name.is_empty() {
        embed::filename(path).to_owned()
    } else {
        attachment.name.clone()
    };

    Ok(AttachedFile {
        name,
        description: attachment.description.clone(),
        mime: guess_mime(&contents),
        contents,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use concat_with::concat_line;
    use mail_parser::{MessageParser, MimeHeaders};
    use tempfile::{tempdir, TempDir};

    use crate::{
        compose::{Body, Error, Mailbox, MultipartKind},
        embed::Embedder,
        resource::FsResourceProvider,
    };

    fn resources() -> (TempDir, FsResourceProvider) {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images/logo.png"), b"\x89PNG\r\n\x1a\n").unwrap();
        fs::write(dir.path().join("terms.txt"), "terms and conditions").unwrap();
        let resources = FsResourceProvider::new(dir.path());
        (dir, resources)
    }

    #[test]
    fn plain_only() {
        let (_dir, resources) = resources();
        let embedder = Embedder::new();

        let email = super::assemble(
            concat_line!(
                "<mail>",
                "  <from>alice@localhost</from>",
                "  <to>bob@localhost</to>",
                "  <subject>Hi</subject>",
                "  <message>Hello!</message>",
                "</mail>",
            ),
            &embedder,
            &resources,
        )
        .unwrap();

        assert_eq!(email.body, Body::Plain("Hello!".into()));
        assert_eq!(email.envelope.subject.as_deref(), Some("Hi"));
        assert_eq!(
            email.envelope.from,
            Mailbox::new_named("alice@localhost", "alice@localhost")
        );
    }

    #[test]
    fn alternative() {
        let (_dir, resources) = resources();
        let embedder = Embedder::new();

        let email = super::assemble(
            concat_line!(
                "<mail>",
                "  <from>alice@localhost</from>",
                "  <message>Hello!</message>",
                "  <message type=\"html\"><![CDATA[<p>Hello!</p>]]></message>",
                "</mail>",
            ),
            &embedder,
            &resources,
        )
        .unwrap();

        let Body::Multipart(multipart) = &email.body else {
            panic!("expected multipart body");
        };
        assert_eq!(multipart.kind, MultipartKind::Alternative);
        assert_eq!(multipart.text.as_deref(), Some("Hello!"));
        assert_eq!(multipart.html.as_deref(), Some("<p>Hello!</p>"));
        assert!(multipart.inlines.is_empty());
    }

    #[test]
    fn html_only_is_alternative() {
        let (_dir, resources) = resources();
        let embedder = Embedder::new();

        let email = super::assemble(
            "<mail><from>a@localhost</from><message type=\"html\">&lt;p&gt;hi&lt;/p&gt;</message></mail>",
            &embedder,
            &resources,
        )
        .unwrap();

        let Body::Multipart(multipart) = &email.body else {
            panic!("expected multipart body");
        };
        assert_eq!(multipart.kind, MultipartKind::Alternative);
        assert_eq!(multipart.text, None);
        assert_eq!(multipart.html.as_deref(), Some("<p>hi</p>"));
        assert!(multipart.inlines.is_empty());
        assert!(multipart.attachments.is_empty());

        let msg = email.write_to_vec().unwrap();
        let msg = MessageParser::new().parse(&msg).unwrap();
        assert_eq!(msg.content_type().unwrap().subtype(), Some("alternative"));
    }

    #[test]
    fn plain_only_ignores_embeddings() {
        let (_dir, resources) = resources();
        let embedder = Embedder::new();
        embedder.embed("images/logo.png").unwrap();

        let email = super::assemble(
            "<mail><from>a@localhost</from><message>hi</message></mail>",
            &embedder,
            &resources,
        )
        .unwrap();

        assert_eq!(email.body, Body::Plain("hi".into()));
    }

    #[test]
    fn embedding_with_absolute_path() {
        let (_dir, resources) = resources();
        let other = tempdir().unwrap();
        let path = other.path().join("banner.png");
        fs::write(&path, b"\x89PNG\r\n\x1a\nbanner").unwrap();

        let embedder = Embedder::new();
        let path = path.to_string_lossy().to_string();
        let cid = embedder.embed(&path).unwrap();

        let email = super::assemble(
            "<mail><from>a@localhost</from><message type=\"html\">hi</message></mail>",
            &embedder,
            &resources,
        )
        .unwrap();

        let Body::Multipart(multipart) = &email.body else {
            panic!("expected multipart body");
        };
        assert_eq!(multipart.kind, MultipartKind::Related);
        assert_eq!(multipart.inlines.len(), 1);
        assert_eq!(multipart.inlines[0].cid, cid);
        assert_eq!(multipart.inlines[0].name, "banner.png");
        assert_eq!(multipart.inlines[0].contents, b"\x89PNG\r\n\x1a\nbanner");
    }

    #[test]
    fn related_with_embedding_and_attachment() {
        let (_dir, resources) = resources();
        let embedder = Embedder::new();
        let cid = embedder.embed("images/logo.png").unwrap();

        let xml = format!(
            concat_line!(
                "<mail>",
                "  <from name=\"Alice\">alice@localhost</from>",
                "  <to>bob@localhost;carol@localhost</to>",
                "  <message type=\"html\"><![CDATA[<img src=\"cid:{}\">]]></message>",
                "  <attachment path=\"terms.txt\" description=\"Terms\"/>",
                "</mail>",
            ),
            cid
        );

        let email = super::assemble(&xml, &embedder, &resources).unwrap();

        let Body::Multipart(multipart) = &email.body else {
            panic!("expected multipart body");
        };
        assert_eq!(multipart.kind, MultipartKind::Related);
        assert_eq!(multipart.inlines.len(), 1);
        assert_eq!(multipart.inlines[0].cid, cid);
        assert_eq!(multipart.inlines[0].name, "logo.png");
        assert_eq!(multipart.attachments.len(), 1);
        assert_eq!(multipart.attachments[0].name, "terms.txt");
        assert_eq!(multipart.attachments[0].description, "Terms");
        assert_eq!(multipart.attachments[0].contents, b"terms and conditions");

        let msg = email.write_to_vec().unwrap();
        let msg = MessageParser::new().parse(&msg).unwrap();
        assert_eq!(msg.content_type().unwrap().subtype(), Some("related"));
        assert_eq!(msg.to().unwrap().iter().count(), 2);

        let raw = String::from_utf8_lossy(msg.raw_message()).to_string();
        assert!(raw.contains(&format!("Content-ID: <{cid}>")));
        assert!(raw.contains("Content-Description: Terms"));
    }

    #[test]
    fn attachment_with_absolute_path() {
        let (dir, resources) = resources();
        let embedder = Embedder::new();
        let path = dir.path().join("terms.txt");

        let xml = format!(
            "<mail><from>a@localhost</from><message>hi</message><attachment name=\"cgu.txt\" path=\"{}\"/></mail>",
            path.display()
        );

        let email = super::assemble(&xml, &embedder, &resources).unwrap();

        let Body::Multipart(multipart) = &email.body else {
            panic!("expected multipart body");
        };
        assert_eq!(multipart.kind, MultipartKind::Related);
        assert_eq!(multipart.text.as_deref(), Some("hi"));
        assert_eq!(multipart.attachments[0].name, "cgu.txt");
    }

    #[test]
    fn missing_attachment() {
        let (_dir, resources) = resources();
        let embedder = Embedder::new();

        let err = super::assemble(
            "<mail><from>a@localhost</from><message>hi</message><attachment path=\"nope.pdf\"/></mail>",
            &embedder,
            &resources,
        )
        .unwrap_err();

        assert!(matches!(err, Error::MissingResourceError(path) if path.ends_with("nope.pdf")));
    }

    #[test]
    fn missing_attachment_path() {
        let (_dir, resources) = resources();
        let embedder = Embedder::new();

        let err = super::assemble(
            "<mail><from>a@localhost</from><message>hi</message><attachment name=\"x\"/></mail>",
            &embedder,
            &resources,
        )
        .unwrap_err();

        assert!(matches!(err, Error::MissingAttachmentPathError));
    }

    #[test]
    fn missing_embedding() {
        let (_dir, resources) = resources();
        let embedder = Embedder::new();
        embedder.embed("images/missing.png").unwrap();

        let err = super::assemble(
            "<mail><from>a@localhost</from><message type=\"html\">hi</message></mail>",
            &embedder,
            &resources,
        )
        .unwrap_err();

        assert!(matches!(err, Error::MissingResourceError(_)));
    }

    #[test]
    fn missing_message() {
        let (_dir, resources) = resources();
        let embedder = Embedder::new();

        let err = super::assemble(
            "<mail><from>a@localhost</from><subject>hi</subject></mail>",
            &embedder,
            &resources,
        )
        .unwrap_err();

        assert!(matches!(err, Error::MissingMessagePartError));
    }

    #[test]
    fn missing_sender() {
        let (_dir, resources) = resources();
        let embedder = Embedder::new();

        let err = super::assemble("<mail><message>hi</message></mail>", &embedder, &resources)
            .unwrap_err();

        assert!(matches!(err, Error::MissingSenderError));
    }
}
