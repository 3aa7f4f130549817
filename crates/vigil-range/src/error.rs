//! Range-map error types.

use std::error::Error;
use std::fmt;

use vigil_core::{InputError, Subrange};

/// Errors from range-map queries and updates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RangeError {
    /// The requested subrange covers no addresses.
    Empty {
        /// The rejected range.
        range: Subrange,
    },
    /// The requested subrange reaches past the map's declared extent.
    OutOfExtent {
        /// The rejected range.
        range: Subrange,
        /// The declared extent.
        extent: u64,
    },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { range } => write!(f, "empty range {range}"),
            Self::OutOfExtent { range, extent } => {
                write!(f, "range {range} exceeds extent {extent}")
            }
        }
    }
}

impl Error for RangeError {}

impl From<RangeError> for InputError {
    fn from(e: RangeError) -> Self {
        match e {
            RangeError::Empty { range } => InputError::EmptyRange { subrange: range },
            RangeError::OutOfExtent { range, extent } => InputError::OutOfExtent {
                subrange: range,
                extent,
            },
        }
    }
}
