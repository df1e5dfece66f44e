use thiserror::Error;

/// Process-level failures: configuration and I/O, kept distinct from
/// [`emm_core::EmmError`] so a config typo and a protocol-level error never
/// collapse into one variant.
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("failed to parse config file: {0}")]
    ConfigFileParsingError(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind status server: {0}")]
    ServerBindError(std::io::Error),
}
