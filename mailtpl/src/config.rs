//! # Configuration module
//!
//! Module dedicated to the mail service configuration, usually read
//! from a TOML file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[cfg(feature = "smtp")]
use crate::sender::SmtpConfig;
use crate::template::EngineConfig;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read configuration file at {1}")]
    ReadConfigError(#[source] io::Error, PathBuf),
    #[error("cannot parse configuration")]
    ParseConfigError(#[source] toml::de::Error),
}

/// The configuration `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;

/// The mail service configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MailConfig {
    /// The directory containing the template files.
    pub templates_dir: PathBuf,

    /// The root directory of the resources embedded in or attached
    /// to messages.
    pub resource_dir: PathBuf,

    /// The template engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// The SMTP configuration used to send messages.
    #[cfg(feature = "smtp")]
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

impl MailConfig {
    /// Parse the configuration from the given TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(Error::ParseConfigError)
    }

    /// Read then parse the configuration from the given TOML file.
    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading configuration at {}", path.display());

        let toml =
            fs::read_to_string(path).map_err(|err| Error::ReadConfigError(err, path.to_owned()))?;

        Self::from_toml_str(&toml)
    }
}
