use figment::Error as ConfigError;
use thiserror::Error;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum MulticonfError {
    /// A required key resolved to nothing in any configuration tier.
    #[error("missing required configuration key `{key}`")]
    MissingKey { key: String },

    #[error("Configuration Error: {source:#?}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },
}

impl MulticonfError {
    pub(crate) fn missing_key(key: &str) -> Self {
        Self::MissingKey {
            key: key.to_string(),
        }
    }
}
