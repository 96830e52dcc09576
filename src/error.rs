#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Read of {count} items at index {first} exceeds the {available} items available")]
    OutOfRange {
        first: usize,
        count: usize,
        available: usize,
    },
    #[error("UV channel index {0} is outside 0..8")]
    ChannelOutOfRange(usize),
    #[error("Length mismatch: {what} ({left} vs {right})")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },
    #[error("Not supported: {0}")]
    NotSupported(&'static str),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CodecError {
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::ChannelOutOfRange(_))
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
