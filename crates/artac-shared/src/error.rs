use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtacError {
    #[error("Unknown channel kind: {0}")]
    InvalidChannelKind(String),

    #[error("Unknown presence status: {0}")]
    InvalidPresence(String),

    #[error("Unknown memo priority: {0}")]
    InvalidPriority(String),
}

pub type Result<T> = std::result::Result<T, ArtacError>;
