use std::fmt;

/// Failure conditions of the colorimetry pipeline.
#[derive(Debug)]
pub enum ColorError {
    /// The observer dataset could not be read at all.
    DataUnavailable(std::io::Error),
    /// A row of the observer dataset is malformed.
    DataFormat { line: usize, reason: String },
    /// The caller supplied a value outside the accepted domain.
    InvalidParameter(String),
    /// An internal computation produced NaN or infinity.
    Numerical(String),
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::DataUnavailable(e) => write!(f, "Observer data unavailable: {}", e),
            ColorError::DataFormat { line, reason } => {
                write!(f, "Bad observer data on line {}: {}", line, reason)
            }
            ColorError::InvalidParameter(what) => write!(f, "Invalid parameter: {}", what),
            ColorError::Numerical(what) => write!(f, "Numerical error: {}", what),
        }
    }
}

impl std::error::Error for ColorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ColorError::DataUnavailable(e) => Some(e),
            _ => None,
        }
    }
}
