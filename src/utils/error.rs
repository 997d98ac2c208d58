use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;

#[derive(Debug)]
pub enum VexelError {
    IoError(io::Error),
    BadSignature,
    MissingHeader,
    InvalidHeaderField { field: &'static str, value: u32 },
    InvalidFilterType { row: usize, filter: u8 },
    CorruptStream(String),
    MissingPalette,
    MissingAnimationControl,
}

impl Error for VexelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            VexelError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for VexelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VexelError::IoError(err) => write!(f, "I/O error: {}", err),
            VexelError::BadSignature => write!(f, "Bad PNG signature, not a png"),
            VexelError::MissingHeader => write!(f, "First chunk after the signature is not IHDR"),
            VexelError::InvalidHeaderField { field, value } => {
                write!(f, "Invalid IHDR field {}: {}", field, value)
            }
            VexelError::InvalidFilterType { row, filter } => {
                write!(f, "Invalid filter type {} on scanline {}", filter, row)
            }
            VexelError::CorruptStream(msg) => write!(f, "Corrupt image data: {}", msg),
            VexelError::MissingPalette => write!(f, "Indexed image without a PLTE chunk"),
            VexelError::MissingAnimationControl => write!(f, "Animated image without a valid acTL chunk"),
        }
    }
}

impl From<io::Error> for VexelError {
    fn from(error: io::Error) -> Self {
        VexelError::IoError(error)
    }
}

// Result type alias for Vexel operations
pub type VexelResult<T> = Result<T, VexelError>;
