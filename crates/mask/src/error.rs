use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaskError {
    #[error("Mask dimensions differ: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Buffer length {actual} does not match {expected} pixels")]
    BufferLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, MaskError>;
