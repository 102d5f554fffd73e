//! # Mail service module
//!
//! Module dedicated to the [`MailService`], which ties the template
//! catalog, the template engine, the message assembler and the sender
//! together.

use std::{
    fmt,
    sync::{PoisonError, RwLock},
};

use thiserror::Error;
use tracing::{debug, info};

#[cfg(feature = "smtp")]
use crate::sender::SmtpSender;
use crate::{
    compose::{self, Email, Mailbox},
    config::MailConfig,
    embed::Embedder,
    entity::EntityEncoder,
    resource::{FsResourceProvider, ResourceProvider},
    sender::SendMessage,
    template::{ResolvedTemplate, TemplateCatalog, TemplateEngine, Variables},
    Result,
};

/// The context key of the inline attachment embedder.
pub const EMBED: &str = "embed";

/// The context key of the XML entity encoder.
pub const ENTITY: &str = "entity";

/// Errors related to the mail service.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot send message: no sender configured")]
    SenderNotConfiguredError,
}

/// The mail service.
///
/// Renders catalog templates into [`Email`]s and optionally sends
/// them. The service can be shared between threads: every render
/// gets its own [`Embedder`].
pub struct MailService {
    config: MailConfig,
    catalog: TemplateCatalog,
    engine: RwLock<TemplateEngine>,
    resources: Box<dyn ResourceProvider>,
    sender: Option<Box<dyn SendMessage>>,
}

impl MailService {
    /// Build a new service out of the given configuration.
    ///
    /// Resources are read from the file system, and an SMTP sender is
    /// set up when the configuration holds an SMTP section.
    pub fn new(config: MailConfig) -> Self {
        let catalog = TemplateCatalog::new(config.templates_dir.clone());
        let engine = RwLock::new(TemplateEngine::new(&config.engine));
        let resources = Box::new(FsResourceProvider::new(config.resource_dir.clone()));

        #[cfg(feature = "smtp")]
        let sender = config
            .smtp
            .clone()
            .map(|smtp| Box::new(SmtpSender::new(smtp)) as Box<dyn SendMessage>);
        #[cfg(not(feature = "smtp"))]
        let sender = None;

        Self {
            config,
            catalog,
            engine,
            resources,
            sender,
        }
    }

    pub fn with_resources(mut self, resources: impl ResourceProvider + 'static) -> Self {
        self.resources = Box::new(resources);
        self
    }

    pub fn with_sender(mut self, sender: impl SendMessage + 'static) -> Self {
        self.sender = Some(Box::new(sender));
        self
    }

    pub fn config(&self) -> &MailConfig {
        &self.config
    }

    /// Load, register then resolve the given template.
    ///
    /// The template is loaded from the catalog at every call, so
    /// changes made to template files are picked up.
    pub fn resolve(
        &self,
        name: &str,
        lang: Option<&str>,
        vars: &Variables,
    ) -> Result<ResolvedTemplate> {
        let tpl = self.catalog.load(name, lang)?;
        let prefix = tpl.prefix();

        self.engine
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(&prefix, &tpl)?;

        let resolved = self
            .engine
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(&prefix, &tpl, vars)?;

        Ok(resolved)
    }

    /// Render the given template into an email.
    ///
    /// The embedder and the entity encoder are made available to the
    /// template as `embed` and `entity`. When the rendered body does
    /// not define any subject, the resolved subject is used instead.
    pub fn render(&self, name: &str, lang: Option<&str>, vars: Variables) -> Result<Email> {
        let embedder = Embedder::new();

        let vars = vars
            .with(EMBED, embedder.to_value())
            .with(ENTITY, EntityEncoder.to_value());

        let resolved = self.resolve(name, lang, &vars)?;
        let mut email = compose::assemble(resolved.body(), &embedder, self.resources.as_ref())?;

        if email.envelope.subject.is_none() {
            debug!("no subject found in rendered body, using resolved subject");
            email.envelope.subject = Some(resolved.subject().to_owned());
        }

        Ok(email)
    }

    /// Render the given template, add the given recipients, then send
    /// the message using the configured sender.
    ///
    /// Blind copies are delivered without appearing in the message.
    pub async fn send(
        &self,
        name: &str,
        lang: Option<&str>,
        vars: Variables,
        to: impl IntoIterator<Item = Mailbox>,
    ) -> Result<Email> {
        let sender = self
            .sender
            .as_ref()
            .ok_or(Error::SenderNotConfiguredError)?;

        let mut email = self.render(name, lang, vars)?;

        for mailbox in to {
            email.add_to(mailbox);
        }

        let msg = email.write_to_vec()?;

        info!("sending message rendered from template {name}");
        sender.send_message(&email.envelope, &msg).await?;

        Ok(email)
    }
}

impl fmt::Debug for MailService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailService")
            .field("config", &self.config)
            .field("resources", &self.resources)
            .field("sender", &self.sender.is_some())
            .finish()
    }
}
