use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::crc32::crc32;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Outcome of checking one entry with [`ZipExtractor::verify_all`].
#[derive(Debug, Clone)]
pub struct EntryCheck {
    pub file_name: String,
    pub size: u64,
    /// `None` when the entry read back intact, otherwise the failure reason.
    pub error: Option<String>,
}

impl EntryCheck {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Reads entries back out of a STORE archive.
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Extract file data to memory, verifying its CRC-32
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.compression_method != CompressionMethod::Stored {
            bail!(
                "Unsupported compression method: {} (only STORED/uncompressed is supported)",
                entry.compression_method.as_u16()
            );
        }
        if entry.compressed_size != entry.uncompressed_size {
            bail!(
                "{}: stored entry sizes disagree ({} != {})",
                entry.file_name,
                entry.compressed_size,
                entry.uncompressed_size
            );
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        let available = self.parser.reader().size().saturating_sub(data_offset);
        if entry.uncompressed_size > available {
            bail!(
                "{}: entry claims {} bytes but only {} remain in the archive",
                entry.file_name,
                entry.uncompressed_size,
                available
            );
        }

        let mut buf = vec![0u8; entry.uncompressed_size as usize];
        let read = self.parser.reader().read_at(data_offset, &mut buf).await?;
        if read != buf.len() {
            bail!("{}: truncated entry data", entry.file_name);
        }

        let actual = crc32(&buf);
        if actual != entry.crc32 {
            bail!(
                "{}: CRC mismatch (expected {:#010x}, got {:#010x})",
                entry.file_name,
                entry.crc32,
                actual
            );
        }

        Ok(buf)
    }

    /// Read every entry back and check its CRC.
    ///
    /// Archive-level failures (no EOCD, bad central directory) are returned
    /// as errors; per-entry failures are reported in the result.
    pub async fn verify_all(&self) -> Result<Vec<EntryCheck>> {
        let entries = self.list_files().await?;
        let mut checks = Vec::with_capacity(entries.len());

        for entry in &entries {
            let error = match self.extract_to_memory(entry).await {
                Ok(_) => None,
                Err(e) => Some(e.to_string()),
            };
            checks.push(EntryCheck {
                file_name: entry.file_name.clone(),
                size: entry.uncompressed_size,
                error,
            });
        }

        Ok(checks)
    }
}
