use std::io;

/// Sticky failure kind recorded on an [`Encoder`](crate::encoder::Encoder) once it has failed.
///
/// Unlike [`EncodeError`], this carries no payload — it exists so a poisoned
/// handle can report *what kind* of failure froze it without owning a second
/// copy of (for example) an `io::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Invalid,
    Index,
    Alloc,
    Write,
    Close,
    Encode,
}

/// Errors produced by the encoder.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("invalid configuration or call sequence: {0}")]
    Invalid(String),

    #[error("pixel index {0} is out of range for the active palette")]
    Index(u16),

    #[error("allocation failed: {0}")]
    Alloc(String),

    #[error("write to sink failed: {0}")]
    Write(#[source] io::Error),

    #[error("failed to close sink: {0}")]
    Close(#[source] io::Error),

    #[error("LZW encoding failed: {0}")]
    Encode(String),

    #[error("encoder already failed with {0:?}; call close() to release it")]
    Poisoned(ErrorKind),
}

impl EncodeError {
    /// The [`ErrorKind`] an encoder should remember once this error occurs.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EncodeError::Invalid(_) => ErrorKind::Invalid,
            EncodeError::Index(_) => ErrorKind::Index,
            EncodeError::Alloc(_) => ErrorKind::Alloc,
            EncodeError::Write(_) => ErrorKind::Write,
            EncodeError::Close(_) => ErrorKind::Close,
            EncodeError::Encode(_) => ErrorKind::Encode,
            EncodeError::Poisoned(kind) => *kind,
        }
    }
}

pub type Result<T> = std::result::Result<T, EncodeError>;
