use thiserror::Error;

#[derive(Error, Debug)]
pub enum FtprError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, FtprError>;
