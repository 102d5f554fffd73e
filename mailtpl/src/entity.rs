//! # XML entity module
//!
//! Rendered templates are parsed as XML documents, so any value
//! coming from the outside world should be encoded before being
//! rendered, either with `{{ entity.encode(value) }}` or with the
//! `entity` filter: `{{ value | entity }}`.

use std::sync::Arc;

use minijinja::{
    value::{from_args, Object},
    ErrorKind, State, Value,
};

/// Encode XML entities of the given source string.
pub fn encode(source: &str) -> String {
    source
        .replace('&', "&amp;")
        .replace('>', "&gt;")
        .replace('<', "&lt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
        .replace('%', "&#37;")
}

/// The template-facing XML entity encoder.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EntityEncoder;

impl EntityEncoder {
    /// Wrap the encoder into a template value.
    pub fn to_value(self) -> Value {
        Value::from_object(self)
    }
}

impl Object for EntityEncoder {
    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, minijinja::Error> {
        match method {
            "encode" => {
                let (source,): (Option<&str>,) = from_args(args)?;
                Ok(Value::from(encode(source.unwrap_or_default())))
            }
            _ => Err(minijinja::Error::from(ErrorKind::UnknownMethod)),
        }
    }
}
