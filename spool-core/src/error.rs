use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpoolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Writer is closed")]
    Closed,

    #[error("Thread error: {0}")]
    Thread(String),
}

pub type Result<T> = std::result::Result<T, SpoolError>;
