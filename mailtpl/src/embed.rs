//! # Inline attachment embedding module
//!
//! Module dedicated to inline attachments (mostly images) referenced
//! from within templates. A template asks the [`Embedder`] for a
//! content id, and the message assembler later embeds every
//! registered path as an inline MIME part using that content id.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use indexmap::IndexMap;
use minijinja::{
    value::{from_args, Object},
    ErrorKind, State, Value,
};
use thiserror::Error;
use tracing::debug;

/// Errors related to inline attachments.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot embed {path}: {filename} was already embedded from {other}")]
    AmbiguousAttachmentError {
        filename: String,
        path: String,
        other: String,
    },
}

/// The inline attachments `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Extract the display filename of the given path, which is its
/// final segment.
pub(crate) fn filename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The path embedding table.
///
/// Maps resource paths to generated content ids. A display filename
/// can only be claimed by one path: embedding `a/logo.png` then
/// `b/logo.png` is ambiguous and fails.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathEmbeddingTable {
    /// Mapping path → content id, in embedding order.
    embeddings: IndexMap<String, String>,

    /// Mapping filename → path, derived from the embeddings.
    filenames: HashMap<String, String>,

    /// Number of content ids generated so far.
    count: u64,
}

impl PathEmbeddingTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_cid(&mut self) -> String {
        self.count += 1;
        format!("{}{}", Utc::now().timestamp_millis(), self.count)
    }

    /// Embed the resource at the given path and return its content
    /// id.
    ///
    /// Embedding the same path twice returns the same content id.
    pub fn embed(&mut self, path: impl AsRef<str>) -> Result<String> {
        let path = path.as_ref();

        if let Some(cid) = self.embeddings.get(path) {
            debug!("reusing inline image {path} with cid {cid}");
            return Ok(cid.clone());
        }

        let cid = self.generate_cid();
        self.register(path, cid.clone())?;
        debug!("creating inline image {path} with cid {cid}");

        Ok(cid)
    }

    /// Register the given content id for the given path.
    pub fn register(&mut self, path: impl ToString, cid: impl ToString) -> Result<()> {
        let path = path.to_string();
        let name = filename(&path).to_owned();

        match self.filenames.get(&name) {
            Some(other) if *other != path => {
                return Err(Error::AmbiguousAttachmentError {
                    filename: name,
                    path,
                    other: other.clone(),
                });
            }
            _ => (),
        }

        self.filenames.insert(name, path.clone());
        self.embeddings.insert(path, cid.to_string());

        Ok(())
    }

    /// Return the display filename of the given path if it is
    /// embedded, otherwise return the path unchanged.
    pub fn name<'a>(&self, path: &'a str) -> &'a str {
        if self.embeddings.contains_key(path) {
            filename(path)
        } else {
            debug!("image {path} not embedded");
            path
        }
    }

    /// Return `true` if at least one path has been embedded.
    pub fn has_embeddings(&self) -> bool {
        !self.embeddings.is_empty()
    }

    /// Iterate over the embedded paths and their content ids, in
    /// embedding order.
    pub fn embeddings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.embeddings
            .iter()
            .map(|(path, cid)| (path.as_str(), cid.as_str()))
    }
}

/// The template-facing inline attachment embedder.
///
/// This is a cheap, cloneable handle around a shared
/// [`PathEmbeddingTable`]: one clone lives in the template context
/// under the `embed` key, the other one is kept by the caller for the
/// message assembly. An embedder must not outlive a single render.
///
/// From a template:
///
/// ```text
/// <img src="cid:{{ embed.image("images/logo.png") }}" alt="{{ embed.name("images/logo.png") }}">
/// ```
#[derive(Clone, Default)]
pub struct Embedder {
    table: Arc<Mutex<PathEmbeddingTable>>,
}

impl Embedder {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, PathEmbeddingTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Embed the resource at the given path and return its content
    /// id. See [`PathEmbeddingTable::embed`].
    pub fn embed(&self, path: impl AsRef<str>) -> Result<String> {
        self.table().embed(path)
    }

    /// See [`PathEmbeddingTable::register`].
    pub fn register(&self, path: impl ToString, cid: impl ToString) -> Result<()> {
        self.table().register(path, cid)
    }

    /// See [`PathEmbeddingTable::name`].
    pub fn name(&self, path: &str) -> String {
        self.table().name(path).to_owned()
    }

    pub fn has_embeddings(&self) -> bool {
        self.table().has_embeddings()
    }

    /// Take a snapshot of the embedded paths and their content ids.
    pub fn embeddings(&self) -> Vec<(String, String)> {
        self.table()
            .embeddings()
            .map(|(path, cid)| (path.to_owned(), cid.to_owned()))
            .collect()
    }

    /// Wrap this embedder into a template value.
    pub fn to_value(&self) -> Value {
        Value::from_object(self.clone())
    }
}

impl fmt::Debug for Embedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Embedder").field(&*self.table()).finish()
    }
}

impl Object for Embedder {
    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> std::result::Result<Value, minijinja::Error> {
        match method {
            "image" | "embed" => {
                let (path,): (&str,) = from_args(args)?;
                let cid = self.embed(path).map_err(|err| {
                    minijinja::Error::new(ErrorKind::InvalidOperation, "cannot embed image")
                        .with_source(err)
                })?;
                Ok(Value::from(cid))
            }
            "name" => {
                let (path,): (&str,) = from_args(args)?;
                Ok(Value::from(self.name(path)))
            }
            "has_embeddings" => {
                from_args::<()>(args)?;
                Ok(Value::from(self.has_embeddings()))
            }
            _ => Err(minijinja::Error::from(ErrorKind::UnknownMethod)),
        }
    }
}
