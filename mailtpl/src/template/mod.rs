//! # Template module
//!
//! A mail template is made of independently resolvable fragments: a
//! subject, a body, named snippets, and named embedded or attached
//! resource descriptors. Fragments are registered into the
//! [`TemplateEngine`], then resolved against [`Variables`] into a
//! [`ResolvedTemplate`].

pub mod catalog;
pub mod engine;
pub mod resolved;
pub mod variables;

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[doc(inline)]
pub use self::{
    catalog::TemplateCatalog,
    engine::{EngineConfig, TemplateEngine},
    resolved::ResolvedTemplate,
    variables::Variables,
};

pub(crate) const SUBJECT: &str = "subject";
pub(crate) const BODY: &str = "body";
pub(crate) const SNIPPETS: &str = "snippets";
pub(crate) const EMBEDDED: &str = "embedded";
pub(crate) const ATTACHMENTS: &str = "attachments";

/// The template engine selector.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateEngineKind {
    /// Jinja-like syntax, rendered by `minijinja`.
    #[default]
    Jinja,
}

/// The kind of provider an attachment is loaded from.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentSource {
    /// The attachment is a file on the local file system.
    #[default]
    File,

    /// The attachment is bundled with the application resources.
    #[serde(alias = "classpath")]
    Resource,
}

/// The attachment descriptor.
///
/// Describes an embedded or attached resource: its name, the kind of
/// provider it comes from and a free-form configuration. Names and
/// configuration values are template fragments.
#[derive(
    Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub struct AttachmentTemplate {
    pub name: String,

    #[serde(default)]
    pub source: AttachmentSource,

    #[serde(default, alias = "config")]
    pub configuration: BTreeMap<String, String>,
}

impl AttachmentTemplate {
    pub fn new(name: impl ToString, source: AttachmentSource) -> Self {
        Self {
            name: name.to_string(),
            source,
            configuration: BTreeMap::new(),
        }
    }

    pub fn with_config(mut self, key: impl ToString, val: impl ToString) -> Self {
        self.configuration.insert(key.to_string(), val.to_string());
        self
    }
}

/// The unresolved mail template.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MailTemplate {
    /// The template name, used as fragments prefix.
    #[serde(default)]
    pub name: String,

    pub subject: String,

    pub body: String,

    /// Snippets, resolved in insertion order.
    #[serde(default)]
    pub snippets: IndexMap<String, String>,

    #[serde(default)]
    pub embedded: BTreeSet<AttachmentTemplate>,

    #[serde(default)]
    pub attachments: BTreeSet<AttachmentTemplate>,

    #[serde(default)]
    pub engine: TemplateEngineKind,
}

impl MailTemplate {
    pub fn new(name: impl ToString, subject: impl ToString, body: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            ..Default::default()
        }
    }

    pub fn with_snippet(mut self, name: impl ToString, snippet: impl ToString) -> Self {
        self.snippets.insert(name.to_string(), snippet.to_string());
        self
    }

    pub fn with_embedded(mut self, embedded: AttachmentTemplate) -> Self {
        self.embedded.insert(embedded);
        self
    }

    pub fn with_attachment(mut self, attachment: AttachmentTemplate) -> Self {
        self.attachments.insert(attachment);
        self
    }

    /// Return the prefix the fragments of this template are
    /// registered under.
    pub fn prefix(&self) -> String {
        format!("/{}", self.name.trim_matches('/'))
    }
}

/// Build the path of a template fragment.
pub(crate) fn fragment_path(prefix: &str, keys: &[&str]) -> String {
    let mut path = prefix.trim_end_matches('/').to_owned();
    for key in keys {
        path.push('/');
        path.push_str(key);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::{AttachmentSource, MailTemplate};

    #[test]
    fn prefix() {
        assert_eq!(MailTemplate::new("welcome", "", "").prefix(), "/welcome");
        assert_eq!(MailTemplate::new("de/welcome", "", "").prefix(), "/de/welcome");
    }

    #[test]
    fn fragment_path() {
        assert_eq!(super::fragment_path("/welcome", &["subject"]), "/welcome/subject");
        assert_eq!(
            super::fragment_path("/welcome/", &["embedded", "logo", "path"]),
            "/welcome/embedded/logo/path"
        );
    }

    #[test]
    fn deserialize_classpath_alias() {
        let tpl: MailTemplate = toml::from_str(concat!(
            "subject = \"s\"\n",
            "body = \"b\"\n",
            "[[embedded]]\n",
            "name = \"logo\"\n",
            "source = \"classpath\"\n",
        ))
        .unwrap();

        let embedded = tpl.embedded.into_iter().next().unwrap();
        assert_eq!(embedded.source, AttachmentSource::Resource);
    }
}
