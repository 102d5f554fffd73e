#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![doc = include_str!("../README.md")]

pub mod compose;
pub mod config;
pub mod embed;
pub mod entity;
pub mod resource;
pub mod sender;
pub mod service;
pub mod template;

#[doc(inline)]
pub use self::{
    compose::{assemble, Body, Email, Envelope, Mailbox},
    config::MailConfig,
    embed::Embedder,
    entity::EntityEncoder,
    resource::{FsResourceProvider, ResourceProvider},
    sender::SendMessage,
    service::MailService,
    template::{
        EngineConfig, MailTemplate, ResolvedTemplate, TemplateCatalog, TemplateEngine, Variables,
    },
};

/// The global `Error` enum of the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    CatalogError(#[from] template::catalog::Error),

    #[error(transparent)]
    EngineError(#[from] template::engine::Error),

    #[error(transparent)]
    EmbedError(#[from] embed::Error),

    #[error(transparent)]
    ComposeError(#[from] compose::Error),

    #[error(transparent)]
    ConfigError(#[from] config::Error),

    #[error(transparent)]
    ServiceError(#[from] service::Error),

    #[cfg(feature = "smtp")]
    #[error(transparent)]
    SmtpError(#[from] sender::smtp::Error),
}

/// The global `Result` alias of the library.
pub type Result<T> = std::result::Result<T, Error>;
