//! Error types for archive construction.

use thiserror::Error;

/// Errors that can occur while building a STORE archive.
#[derive(Debug, Error)]
pub enum ZipError {
    /// No entries were supplied.
    #[error("Cannot create ZIP archive without files")]
    EmptyArchive,

    /// An entry was keyed by the empty string.
    #[error("Filename cannot be empty")]
    EmptyEntryName,

    /// An entry name failed the naming rules of [`crate::naming::validate_entry_name`].
    #[error("invalid entry name {name:?}: {reason}")]
    InvalidEntryName { name: String, reason: String },

    /// More entries than the configured limit.
    #[error("too many files: {count} > {limit}")]
    TooManyFiles { count: usize, limit: usize },

    /// An entry is larger than the configured limit.
    #[error("file {name:?} exceeds maximum size: {size} > {limit} bytes")]
    EntryTooLarge { name: String, size: u64, limit: u64 },

    /// Payload does not start with a known media signature.
    #[error("file {0:?} is not recognized media data")]
    UnrecognizedMedia(String),

    /// The UTF-8 name does not fit the 16-bit length field.
    #[error("entry name is {len} bytes, ZIP headers allow at most 65535")]
    NameTooLong { len: usize },

    /// Entry count does not fit the 16-bit EOCD fields.
    #[error("{0} entries exceed the 65535 entry limit of non-ZIP64 archives")]
    TooManyEntries(usize),

    /// A size or offset does not fit a 32-bit header field.
    #[error("archive data exceeds the 4 GiB limit of non-ZIP64 archives")]
    ArchiveTooLarge,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ZipError {
    /// Whether the error is a caller precondition violation rather than a
    /// format limit or an unexpected failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ZipError::EmptyArchive
                | ZipError::EmptyEntryName
                | ZipError::InvalidEntryName { .. }
                | ZipError::TooManyFiles { .. }
                | ZipError::EntryTooLarge { .. }
                | ZipError::UnrecognizedMedia(_)
        )
    }
}

/// Result type for archive construction.
pub type Result<T> = std::result::Result<T, ZipError>;
