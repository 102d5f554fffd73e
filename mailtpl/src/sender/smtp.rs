//! # SMTP sender module
//!
//! Module dedicated to the delivery of messages through an SMTP
//! server, using [`mail_send`].

use std::fmt;

use async_trait::async_trait;
use mail_send::{
    smtp::message::{Address as SmtpAddress, Message as SmtpMessage},
    SmtpClientBuilder,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{compose::Envelope, Result};

use super::SendMessage;

/// Errors related to the SMTP sender.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot send message without a sender")]
    SendMessageMissingSenderError,
    #[error("cannot send message without a recipient")]
    SendMessageMissingRecipientError,
    #[error("cannot send message")]
    SendMessageError(#[source] mail_send::Error),
    #[error("cannot connect to smtp server using tcp")]
    ConnectTcpError(#[source] mail_send::Error),
    #[error("cannot connect to smtp server using tls")]
    ConnectTlsError(#[source] mail_send::Error),
}

/// The SMTP encryption kind.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmtpEncryptionKind {
    #[default]
    #[serde(alias = "ssl")]
    Tls,
    #[serde(alias = "starttls")]
    StartTls,
    None,
}

impl fmt::Display for SmtpEncryptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tls => write!(f, "SSL/TLS"),
            Self::StartTls => write!(f, "StartTLS"),
            Self::None => write!(f, "None"),
        }
    }
}

impl From<bool> for SmtpEncryptionKind {
    fn from(value: bool) -> Self {
        if value {
            Self::Tls
        } else {
            Self::None
        }
    }
}

/// The SMTP sender configuration.
#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SmtpConfig {
    /// The SMTP server host name.
    pub host: String,

    /// The SMTP server host port.
    pub port: u16,

    /// The SMTP encryption protocol to use.
    ///
    /// Defaults to SSL/TLS when omitted.
    #[serde(default)]
    pub encryption: Option<SmtpEncryptionKind>,

    /// The SMTP server login. Authentication is skipped when empty.
    #[serde(default)]
    pub login: String,

    /// The SMTP server password.
    #[serde(default)]
    pub password: String,
}

impl SmtpConfig {
    pub fn is_encryption_enabled(&self) -> bool {
        !self.is_encryption_disabled()
    }

    pub fn is_start_tls_encryption_enabled(&self) -> bool {
        matches!(self.encryption, Some(SmtpEncryptionKind::StartTls))
    }

    pub fn is_encryption_disabled(&self) -> bool {
        matches!(self.encryption, Some(SmtpEncryptionKind::None))
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("encryption", &self.encryption)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The SMTP sender.
///
/// A new connection is opened for every message.
#[derive(Clone, Debug)]
pub struct SmtpSender {
    config: SmtpConfig,
}

impl SmtpSender {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    fn client_builder(&self) -> SmtpClientBuilder<String> {
        let config = &self.config;

        let mut builder = SmtpClientBuilder::new(config.host.clone(), config.port)
            .implicit_tls(!config.is_start_tls_encryption_enabled());

        if !config.login.is_empty() {
            builder = builder.credentials((config.login.clone(), config.password.clone()));
        }

        if config.is_encryption_disabled() {
            builder = builder.allow_invalid_certs();
        }

        builder
    }
}

#[async_trait]
impl SendMessage for SmtpSender {
    async fn send_message(&self, envelope: &Envelope, msg: &[u8]) -> Result<()> {
        let msg = into_smtp_msg(envelope, msg)?;
        let builder = self.client_builder();
        let config = &self.config;

        info!(
            "sending message to {} recipient(s) via {}:{}",
            msg.rcpt_to.len(),
            config.host,
            config.port
        );

        if config.is_encryption_enabled() {
            let mut client = builder.connect().await.map_err(Error::ConnectTlsError)?;
            client.send(msg).await.map_err(Error::SendMessageError)?;
        } else {
            let mut client = builder
                .connect_plain()
                .await
                .map_err(Error::ConnectTcpError)?;
            client.send(msg).await.map_err(Error::SendMessageError)?;
        }

        Ok(())
    }
}

/// Build the SMTP message out of the given envelope and raw
/// message.
///
/// The sender is the envelope `from` address. Recipients are every
/// distinct `to`, `cc` and `bcc` address.
pub(crate) fn into_smtp_msg<'a>(
    envelope: &Envelope,
    msg: &'a [u8],
) -> std::result::Result<SmtpMessage<'a>, Error> {
    let mail_from = envelope.from.email.trim();

    if mail_from.is_empty() {
        return Err(Error::SendMessageMissingSenderError);
    }

    let rcpt_to = envelope.recipients();

    if rcpt_to.is_empty() {
        return Err(Error::SendMessageMissingRecipientError);
    }

    Ok(SmtpMessage {
        mail_from: mail_from.to_owned().into(),
        rcpt_to: rcpt_to
            .into_iter()
            .map(|email| SmtpAddress {
                email: email.to_owned().into(),
                ..Default::default()
            })
            .collect(),
        body: msg.into(),
    })
}
