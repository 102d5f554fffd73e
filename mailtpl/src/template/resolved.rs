//! # Resolved template module

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::{AttachmentTemplate, TemplateEngineKind};

/// The fully resolved mail template.
///
/// Built once by the [`TemplateEngine`](super::TemplateEngine), then
/// only read: it can be cached and shared between concurrent sends of
/// the same template and variables.
///
/// Snippets are kept unresolved: they are only resolved for their
/// effect on the variables of the later fragments.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResolvedTemplate {
    pub(super) name: String,
    pub(super) subject: String,
    pub(super) body: String,
    pub(super) snippets: IndexMap<String, String>,
    pub(super) embedded: BTreeSet<AttachmentTemplate>,
    pub(super) attachments: BTreeSet<AttachmentTemplate>,
    pub(super) engine: TemplateEngineKind,
}

impl ResolvedTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn snippets(&self) -> &IndexMap<String, String> {
        &self.snippets
    }

    pub fn embedded(&self) -> &BTreeSet<AttachmentTemplate> {
        &self.embedded
    }

    pub fn attachments(&self) -> &BTreeSet<AttachmentTemplate> {
        &self.attachments
    }

    pub fn engine(&self) -> TemplateEngineKind {
        self.engine
    }
}
