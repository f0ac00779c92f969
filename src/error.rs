//! Error types for the windowed [`Reader`](crate::Reader) façade.

#[cfg(feature = "alloc")]
use thiserror::Error;

/// Errors produced by the windowed [`Reader`](crate::Reader) façade and the
/// [`RowView`](crate::RowView) it hands out.
#[cfg(feature = "alloc")]
#[derive(Error, Debug)]
pub enum Error {
    /// Refilling the underlying byte-stream cursor failed.
    /// Fatal: the reader will return this same error on every subsequent
    /// call.
    #[cfg(feature = "std")]
    #[error("I/O error while refilling input: {0}")]
    Io(#[from] std::io::Error),

    /// A logical row exceeded the cursor's window capacity. Fatal, for the
    /// same reason as [`Error::Io`].
    #[error("row exceeds the {window} byte window")]
    RowTooLarge {
        /// The configured window size, in bytes.
        window: usize,
    },

    /// Positional cell access beyond the row's length.
    #[error("cell index {index} out of range for a row of {len} cells")]
    IndexOutOfRange {
        /// The index that was requested.
        index: isize,
        /// The number of cells in the row.
        len: usize,
    },

    /// Keyed cell access for a column name absent from the header.
    #[error("no such column: {0:?}")]
    UnknownColumn(alloc::boxed::Box<[u8]>),

    /// Keyed cell access on a reader constructed without `header: true`.
    #[error("keyed access requires the reader to be constructed with a header")]
    HeaderRequired,

    /// Construction-time configuration conflict, e.g. `delimiter == quote`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

#[cfg(feature = "alloc")]
impl Error {
    /// True for the two fatal kinds that poison the reader ([`Error::Io`] and
    /// [`Error::RowTooLarge`]); false for the per-call access errors.
    pub fn is_fatal(&self) -> bool {
        match self {
            #[cfg(feature = "std")]
            Error::Io(_) => true,
            Error::RowTooLarge { .. } => true,
            Error::IndexOutOfRange { .. }
            | Error::UnknownColumn(_)
            | Error::HeaderRequired
            | Error::InvalidConfig(_) => false,
        }
    }
}

/// A `Copy` stand-in for the fatal error kinds, stored by the reader so that
/// every call after the first failure can hand back an equivalent error
/// without cloning the original `std::io::Error` (which isn't `Clone`).
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Copy)]
pub(crate) enum FatalError {
    #[cfg(feature = "std")]
    Io(std::io::ErrorKind),
    RowTooLarge { window: usize },
}

#[cfg(feature = "alloc")]
impl FatalError {
    pub(crate) fn into_error(self) -> Error {
        match self {
            #[cfg(feature = "std")]
            FatalError::Io(kind) => Error::Io(std::io::Error::from(kind)),
            FatalError::RowTooLarge { window } => Error::RowTooLarge { window },
        }
    }

    /// Captures the fatal kinds of `err` for replay on later calls, or
    /// `None` if `err` isn't one of the sticky fatal variants.
    pub(crate) fn from_error(err: &Error) -> Option<Self> {
        match err {
            #[cfg(feature = "std")]
            Error::Io(io) => Some(FatalError::Io(io.kind())),
            Error::RowTooLarge { window } => Some(FatalError::RowTooLarge { window: *window }),
            Error::IndexOutOfRange { .. }
            | Error::UnknownColumn(_)
            | Error::HeaderRequired
            | Error::InvalidConfig(_) => None,
        }
    }
}

/// Result alias for the windowed [`Reader`](crate::Reader) façade.
#[cfg(feature = "alloc")]
pub type Result<T> = core::result::Result<T, Error>;
