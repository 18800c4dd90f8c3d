//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid render configuration, symbolizer property resolution failures, malformed transform
//! expressions, marker asset loading, IO, and generic errors.
//!
//! Missing markers and degenerate geometry are *not* errors: they are skipped silently by the
//! renderer. Everything that surfaces here aborts the current rendering pass.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("property '{key}': {message}")]
    Property { key: String, message: String },

    #[error("transform expression error: {0}")]
    Transform(String),

    #[error("marker asset '{id}': {message}")]
    Asset { id: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn property(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Property {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        matches!(err, Error::Other(_))
            .then_some(())
            .expect("expected Other variant");
    }

    #[test]
    fn property_error_mentions_key() {
        let err = Error::property("offset", "expected a number");
        assert_eq!(err.to_string(), "property 'offset': expected a number");
    }

    #[test]
    fn asset_error_formats_identifier() {
        let err = Error::Asset {
            id: "icons/pin.svg".into(),
            message: "not found".into(),
        };
        assert!(err.to_string().contains("icons/pin.svg"));
    }
}
