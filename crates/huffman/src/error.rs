use thiserror::Error;

/// Everything that can abort an encoding run.
///
/// An empty input or an input made of a single repeated byte is not an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("byte {0:#04x} has no code in the table")]
    UnknownSymbol(u8),

    #[error("source changed between passes: counted {expected} bytes, encoded {actual}")]
    SourceChanged { expected: u64, actual: u64 },

    #[error("invalid container header: {0}")]
    InvalidHeader(String),
}

pub type Result<T> = std::result::Result<T, Error>;
