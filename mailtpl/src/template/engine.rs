//! # Template engine module
//!
//! Module dedicated to the registration and the resolution of
//! template fragments, using [minijinja].

use std::collections::{BTreeMap, BTreeSet};

use minijinja::{Environment, UndefinedBehavior, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::entity;

use super::{
    fragment_path, AttachmentTemplate, MailTemplate, ResolvedTemplate, Variables, ATTACHMENTS,
    BODY, EMBEDDED, SNIPPETS, SUBJECT,
};

/// Errors related to the template engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot register template fragment {1}")]
    RegisterFragmentError(#[source] minijinja::Error, String),
    #[error("cannot resolve template fragment {1}")]
    ResolveFragmentError(#[source] minijinja::Error, String),
}

/// The template engine `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;

/// The template engine configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Fail the resolution when a fragment uses an undefined
    /// variable, instead of rendering it as an empty string.
    #[serde(default)]
    pub strict_undefined: bool,
}

/// The template engine.
///
/// Holds the registered fragments of every template. Registration
/// needs exclusive access, resolution does not.
#[derive(Clone, Debug)]
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl TemplateEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);

        if config.strict_undefined {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }

        env.add_filter("entity", |source: String| entity::encode(&source));

        Self { env }
    }

    fn add_fragment(&mut self, path: String, source: impl ToString) -> Result<()> {
        trace!("registering fragment {path}");
        self.env
            .add_template_owned(path.clone(), source.to_string())
            .map_err(|err| Error::RegisterFragmentError(err, path))
    }

    fn add_attachment_fragments(
        &mut self,
        prefix: &str,
        kind: &str,
        attachment: &AttachmentTemplate,
    ) -> Result<()> {
        let name = attachment.name.as_str();
        self.add_fragment(fragment_path(prefix, &[kind, name]), name)?;

        for (key, val) in &attachment.configuration {
            self.add_fragment(fragment_path(prefix, &[kind, name, key]), val)?;
        }

        Ok(())
    }

    /// Register all the fragments of the given template under the
    /// given prefix.
    pub fn register(&mut self, prefix: &str, tpl: &MailTemplate) -> Result<()> {
        debug!("registering template {} under {prefix}", tpl.name);

        self.add_fragment(fragment_path(prefix, &[SUBJECT]), &tpl.subject)?;
        self.add_fragment(fragment_path(prefix, &[BODY]), &tpl.body)?;

        for (name, snippet) in &tpl.snippets {
            self.add_fragment(fragment_path(prefix, &[SNIPPETS, name]), snippet)?;
        }

        for embedded in &tpl.embedded {
            self.add_attachment_fragments(prefix, EMBEDDED, embedded)?;
        }

        for attachment in &tpl.attachments {
            self.add_attachment_fragments(prefix, ATTACHMENTS, attachment)?;
        }

        Ok(())
    }

    /// Return `true` if the fragment at the given path is registered.
    pub fn contains_fragment(&self, path: &str) -> bool {
        self.env.get_template(path).is_ok()
    }

    /// Resolve the fragment at the given path against the given
    /// variables.
    pub fn resolve_fragment(&self, path: &str, vars: &Variables) -> Result<String> {
        trace!("resolving fragment {path}");

        let resolved = self
            .env
            .get_template(path)
            .and_then(|tpl| tpl.render(vars))
            .map_err(|err| Error::ResolveFragmentError(err, path.to_owned()))?;

        Ok(resolved)
    }

    /// Resolve the first registered fragment among the given
    /// namespaces.
    fn resolve_first(
        &self,
        prefix: &str,
        kinds: &[&str],
        segments: &[&str],
        vars: &Variables,
    ) -> Result<String> {
        let paths: Vec<_> = kinds
            .iter()
            .map(|kind| {
                let mut path = vec![*kind];
                path.extend_from_slice(segments);
                fragment_path(prefix, &path)
            })
            .collect();

        // when nothing is registered, the last lookup reports the error
        let path = paths
            .iter()
            .find(|path| self.contains_fragment(path))
            .or(paths.last())
            .cloned()
            .unwrap_or_else(|| fragment_path(prefix, segments));

        self.resolve_fragment(&path, vars)
    }

    fn resolve_attachment(
        &self,
        prefix: &str,
        kinds: &[&str],
        attachment: &AttachmentTemplate,
        vars: &Variables,
    ) -> Result<AttachmentTemplate> {
        let name = attachment.name.as_str();
        let mut configuration = BTreeMap::new();

        for key in attachment.configuration.keys() {
            let val = self.resolve_first(prefix, kinds, &[name, key.as_str()], vars)?;
            configuration.insert(key.clone(), val);
        }

        Ok(AttachmentTemplate {
            name: self.resolve_first(prefix, kinds, &[name], vars)?,
            source: attachment.source,
            configuration,
        })
    }

    /// Resolve the given template, whose fragments were registered
    /// under the given prefix, against the given variables.
    ///
    /// Snippets are resolved first, in order, and each one is made
    /// available to the following fragments as a variable named after
    /// the snippet. The given variables are left untouched.
    ///
    /// Attachment descriptors are looked up from the `embedded`
    /// namespace first, then from their own namespace, and end up in
    /// the embedded set of the resolved template, next to the
    /// embedded descriptors. An attachment sharing its name with an
    /// embedded descriptor thus resolves to the embedded one.
    pub fn resolve(
        &self,
        prefix: &str,
        tpl: &MailTemplate,
        vars: &Variables,
    ) -> Result<ResolvedTemplate> {
        debug!("resolving template {} from {prefix}", tpl.name);

        let mut vars = vars.clone();

        for name in tpl.snippets.keys() {
            let snippet = self.resolve_fragment(&fragment_path(prefix, &[SNIPPETS, name]), &vars)?;
            vars.insert(name, Value::from(snippet));
        }

        let subject = self.resolve_fragment(&fragment_path(prefix, &[SUBJECT]), &vars)?;
        let body = self.resolve_fragment(&fragment_path(prefix, &[BODY]), &vars)?;

        let mut embedded = BTreeSet::new();

        for e in &tpl.embedded {
            embedded.insert(self.resolve_attachment(prefix, &[EMBEDDED], e, &vars)?);
        }

        for a in &tpl.attachments {
            embedded.insert(self.resolve_attachment(prefix, &[EMBEDDED, ATTACHMENTS], a, &vars)?);
        }

        Ok(ResolvedTemplate {
            name: tpl.name.clone(),
            subject,
            body,
            snippets: tpl.snippets.clone(),
            embedded,
            attachments: BTreeSet::new(),
            engine: tpl.engine,
        })
    }

    /// Register then resolve the given template under its own prefix.
    pub fn generate(&mut self, tpl: &MailTemplate, vars: &Variables) -> Result<ResolvedTemplate> {
        let prefix = tpl.prefix();
        self.register(&prefix, tpl)?;
        self.resolve(&prefix, tpl, vars)
    }
}
