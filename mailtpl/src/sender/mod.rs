//! # Sender module
//!
//! Module dedicated to the delivery of assembled messages.

#[cfg(feature = "smtp")]
pub mod smtp;

use async_trait::async_trait;

use crate::{compose::Envelope, Result};

#[cfg(feature = "smtp")]
#[doc(inline)]
pub use self::smtp::{SmtpConfig, SmtpEncryptionKind, SmtpSender};

/// Feature to send raw messages.
#[async_trait]
pub trait SendMessage: Send + Sync {
    /// Send the given raw email message.
    ///
    /// The delivery addresses come from the given envelope, not from
    /// the message headers, so blind copies are delivered too.
    async fn send_message(&self, envelope: &Envelope, msg: &[u8]) -> Result<()>;
}
