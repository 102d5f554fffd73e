//! # Template catalog module
//!
//! Module dedicated to loading localized templates from the file
//! system. A template named `welcome` in the `de` language is looked
//! up at `{dir}/de/welcome.toml`, then at `{dir}/welcome.toml`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, trace};

use super::MailTemplate;

const EXTENSION: &str = "toml";

/// Errors related to the template catalog.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find template {0} (language: {1:?})")]
    FindTemplateError(String, Option<String>),
    #[error("cannot read template at {1}")]
    ReadTemplateError(#[source] io::Error, PathBuf),
    #[error("cannot parse template at {1}")]
    ParseTemplateError(#[source] toml::de::Error, PathBuf),
}

/// The template catalog `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;

/// The template catalog.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TemplateCatalog {
    dir: PathBuf,
}

impl TemplateCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }

    /// Find the path of the given template, together with the name it
    /// should be registered under.
    fn find(&self, name: &str, lang: Option<&str>) -> Option<(String, PathBuf)> {
        let lang = lang.map(str::trim).filter(|lang| !lang.is_empty());

        if let Some(lang) = lang {
            let localized_name = format!("{lang}/{name}");
            let path = self.path(&localized_name);
            if path.is_file() {
                return Some((localized_name, path));
            }
            debug!("cannot find template {name} for language {lang}, falling back to default");
        }

        let path = self.path(name);
        path.is_file().then(|| (name.to_owned(), path))
    }

    /// Load the given template, localized in the given language if
    /// available.
    pub fn load(&self, name: &str, lang: Option<&str>) -> Result<MailTemplate> {
        let (name, path) = self
            .find(name, lang)
            .ok_or_else(|| Error::FindTemplateError(name.to_owned(), lang.map(ToOwned::to_owned)))?;

        debug!("loading template {name} from {}", path.display());

        let content =
            fs::read_to_string(&path).map_err(|err| Error::ReadTemplateError(err, path.clone()))?;
        trace!("template content: {content}");

        let mut tpl: MailTemplate =
            toml::from_str(&content).map_err(|err| Error::ParseTemplateError(err, path))?;
        tpl.name = name;

        Ok(tpl)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{Error, TemplateCatalog};

    #[test]
    fn load_localized_with_fallback() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("de")).unwrap();
        fs::write(
            dir.path().join("welcome.toml"),
            "subject = \"Welcome\"\nbody = \"<mail/>\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("de").join("welcome.toml"),
            "subject = \"Willkommen\"\nbody = \"<mail/>\"\n[snippets]\nb = \"2\"\na = \"1\"\n",
        )
        .unwrap();

        let catalog = TemplateCatalog::new(dir.path());

        let tpl = catalog.load("welcome", Some("de")).unwrap();
        assert_eq!(tpl.name, "de/welcome");
        assert_eq!(tpl.subject, "Willkommen");
        assert_eq!(tpl.snippets.keys().collect::<Vec<_>>(), vec!["b", "a"]);

        let tpl = catalog.load("welcome", Some("fr")).unwrap();
        assert_eq!(tpl.name, "welcome");
        assert_eq!(tpl.subject, "Welcome");

        let tpl = catalog.load("welcome", Some(" ")).unwrap();
        assert_eq!(tpl.name, "welcome");

        let tpl = catalog.load("welcome", None).unwrap();
        assert_eq!(tpl.name, "welcome");
    }

    #[test]
    fn load_missing() {
        let dir = tempdir().unwrap();
        let catalog = TemplateCatalog::new(dir.path());

        let err = catalog.load("welcome", Some("de")).unwrap_err();

        assert!(matches!(err, Error::FindTemplateError(ref name, Some(ref lang)) if name == "welcome" && lang == "de"));
    }

    #[test]
    fn load_invalid() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("welcome.toml"), "subject = ").unwrap();
        let catalog = TemplateCatalog::new(dir.path());

        let err = catalog.load("welcome", None).unwrap_err();

        assert!(matches!(err, Error::ParseTemplateError(..)));
    }
}
