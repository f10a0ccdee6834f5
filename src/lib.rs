//! # storezip
//!
//! Byte-exact STORE (uncompressed) ZIP writer for bundling media downloads.
//!
//! Media files such as JPEG, PNG and MP4 are already compressed, so this crate
//! stores them as-is. It writes a single-disk ZIP archive that any conforming
//! reader (`unzip`, Explorer, 7-Zip) opens, with UTF-8 entry names and CRC-32
//! checksums.
//!
//! ## Features
//!
//! - Insertion-ordered [`FileMap`] of owned or borrowed buffers
//! - Raw byte output ([`create_store_zip`]) or a MIME-tagged [`ZipBlob`]
//! - Optional limits, name validation and media sniffing ([`ArchiveOptions`])
//! - Read-back and CRC verification of STORE archives ([`ZipExtractor`])
//!
//! ## Example
//!
//! ```no_run
//! use storezip::{FileMap, create_store_zip_blob};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut files = FileMap::new();
//!     files.insert("photo1.jpg", std::fs::read("photo1.jpg")?);
//!     files.insert("clips/video.mp4", std::fs::read("video.mp4")?);
//!
//!     let blob = create_store_zip_blob(&files).await?;
//!     std::fs::write("download.zip", blob.bytes())?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod io;
pub mod media;
pub mod naming;
pub mod options;
pub mod zip;

pub use archive::{
    FileMap, ZIP_MIME_TYPE, ZipBlob, create_store_zip, create_store_zip_at, create_store_zip_blob,
    create_store_zip_with,
};
pub use cli::Cli;
pub use error::ZipError;
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use media::MediaKind;
pub use options::{ArchiveLimits, ArchiveOptions, ArchiveStats};
pub use zip::{DosDateTime, ZipExtractor, ZipFileEntry, crc32};
