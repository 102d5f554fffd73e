//! # Rendered document module
//!
//! The body of a resolved template is a small XML document. Only the
//! direct children of its root element matter, together with their
//! attributes and their own text content.

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use tracing::trace;

use super::{Error, Result};

/// A direct child element of the rendered document root.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
}

impl Element {
    /// Return the value of the given attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, val)| val.as_str())
    }

    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let mut attrs = Vec::new();

        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::ParseDocumentError(err.into()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let val = attr
                .unescape_value()
                .map_err(|err| Error::ParseDocumentError(err.into()))?;
            attrs.push((key, val.into_owned()));
        }

        Ok(Self {
            name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
            attrs,
            text: String::new(),
        })
    }
}

/// The rendered document.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RenderedDocument {
    pub root: String,
    pub children: Vec<Element>,
}

impl RenderedDocument {
    /// Parse the given rendered template body.
    ///
    /// Text nested in grand-children is ignored: HTML content must be
    /// either encoded or wrapped into a CDATA section.
    pub fn parse(xml: &str) -> Result<Self> {
        trace!("parsing rendered document: {xml}");

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        let mut root: Option<String> = None;
        let mut children = Vec::new();
        let mut current: Option<Element> = None;
        let mut depth = 0usize;
        let mut closed = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    depth += 1;
                    match depth {
                        1 if closed || root.is_some() => return Err(Error::MultipleRootsError),
                        1 => root = Some(String::from_utf8_lossy(e.name().as_ref()).to_string()),
                        2 => current = Some(Element::from_start(&e)?),
                        _ => (),
                    }
                }
                Ok(Event::Empty(e)) => match depth {
                    0 if closed || root.is_some() => return Err(Error::MultipleRootsError),
                    0 => {
                        root = Some(String::from_utf8_lossy(e.name().as_ref()).to_string());
                        closed = true;
                    }
                    1 => children.push(Element::from_start(&e)?),
                    _ => (),
                },
                Ok(Event::End(_)) => {
                    match depth {
                        1 => closed = true,
                        2 => children.extend(current.take()),
                        _ => (),
                    }
                    depth = depth.saturating_sub(1);
                }
                Ok(Event::Text(e)) => {
                    if depth == 2 {
                        let text = e
                            .unescape()
                            .map_err(|err| Error::ParseDocumentError(err.into()))?;
                        if let Some(element) = current.as_mut() {
                            element.text.push_str(&text);
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    if depth == 2 {
                        if let Some(element) = current.as_mut() {
                            element.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => (),
                Err(err) => return Err(Error::ParseDocumentError(err)),
            }
        }

        if depth > 0 {
            return Err(Error::UnclosedDocumentError);
        }

        let root = root.ok_or(Error::EmptyDocumentError)?;

        Ok(Self { root, children })
    }

    /// Iterate over the children with the given name.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |e| e.name == name)
    }

    /// Return the first child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|e| e.name == name)
    }
}
