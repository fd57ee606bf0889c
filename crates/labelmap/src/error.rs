use mask::MaskError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabelmapError {
    #[error(transparent)]
    Mask(#[from] MaskError),

    #[error("Volume dimensions differ: expected {expected:?}, got {actual:?}")]
    DimensionMismatch { expected: [u32; 3], actual: [u32; 3] },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Slice {slice} is outside a volume of depth {depth}")]
    SliceOutOfRange { slice: u32, depth: u32 },
}

pub type Result<T> = std::result::Result<T, LabelmapError>;
