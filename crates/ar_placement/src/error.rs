//! Error types and result alias for the crate.
//!
//! Placement itself never fails: misses and gate rejections are ordinary
//! outcomes. [`enum@crate::error::Error`] covers the fatal start-up cases, such
//! as a configuration that cannot describe a working placement setup.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
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
        assert!(matches!(err, Error::Other(ref msg) if msg == "boom"));
    }

    #[test]
    fn invalid_config_message_is_prefixed() {
        let err = Error::InvalidConfig("max_count must be > 0".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: max_count must be > 0"
        );
    }
}
