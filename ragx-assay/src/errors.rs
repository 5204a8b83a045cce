use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssayError {
    #[error("Invalid bins: {0}")]
    InvalidBins(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type AssayResult<T> = std::result::Result<T, AssayError>;
