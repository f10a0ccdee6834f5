//! ZIP archive writing and read-back.
//!
//! This module produces single-disk ZIP archives using the STORE method and
//! can read such archives back to verify them.
//!
//! ## Architecture
//!
//! - [`crc32`]: table-driven CRC-32 checksum
//! - [`dos_time`]: packed DOS date/time encoding
//! - [`structures`]: ZIP format records (local header, central header, EOCD)
//! - [`writer`]: header builders and the archive assembler
//! - [`parser`]: low-level parsing of ZIP structures from a [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: CRC-verified extraction of stored entries
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Limitations
//!
//! - STORE method only; nothing is compressed
//! - No ZIP64: at most 65535 entries and 4 GiB of data
//! - No encryption or multi-disk archives
//! - Every name is flagged UTF-8 (bit 11) while "version needed" stays 2.0;
//!   very old readers that predate the flag may show mangled non-ASCII names

pub mod crc32;
pub mod dos_time;
mod extractor;
mod parser;
mod structures;
pub mod writer;

pub use crc32::{Crc32, crc32};
pub use dos_time::DosDateTime;
pub use extractor::{EntryCheck, ZipExtractor};
pub use parser::ZipParser;
pub use structures::*;
pub use writer::{LocalSegment, ZipSegments, assemble_zip, build_zip_segments};
