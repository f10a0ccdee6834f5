//! Limits applied to a file set before it is archived.

use crate::archive::FileMap;
use crate::error::{Result, ZipError};
use crate::media::MediaKind;
use crate::naming::{self, MAX_NAME_LEN};
use crate::zip::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};

/// Caps on the size and shape of a download bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    pub max_entries: usize,
    pub max_entry_size: u64,
    /// In characters.
    pub max_name_len: usize,
}

impl ArchiveLimits {
    pub const DEFAULT_MAX_ENTRIES: usize = 1000;
    pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 100 * 1024 * 1024;

    /// No caps beyond what the ZIP format itself imposes.
    pub fn unbounded() -> Self {
        Self {
            max_entries: usize::MAX,
            max_entry_size: u64::MAX,
            max_name_len: usize::MAX,
        }
    }
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_entries: Self::DEFAULT_MAX_ENTRIES,
            max_entry_size: Self::DEFAULT_MAX_ENTRY_SIZE,
            max_name_len: MAX_NAME_LEN,
        }
    }
}

/// Checks run by [`create_store_zip_with`](crate::create_store_zip_with).
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    pub limits: ArchiveLimits,
    /// Reject file entries whose bytes are not a recognized [`MediaKind`].
    pub require_media: bool,
}

impl ArchiveOptions {
    /// Run every configured check against `files`.
    pub fn validate(&self, files: &FileMap<'_>) -> Result<()> {
        validate_file_set(files, &self.limits)?;
        if self.require_media {
            validate_media(files)?;
        }
        Ok(())
    }
}

/// Check `files` against `limits`.
pub fn validate_file_set(files: &FileMap<'_>, limits: &ArchiveLimits) -> Result<()> {
    if files.len() > limits.max_entries {
        return Err(ZipError::TooManyFiles {
            count: files.len(),
            limit: limits.max_entries,
        });
    }

    for (name, data) in files.iter() {
        naming::validate_entry_name(name, limits.max_name_len).map_err(|reason| {
            ZipError::InvalidEntryName {
                name: name.to_string(),
                reason,
            }
        })?;

        let size = data.len() as u64;
        if size > limits.max_entry_size {
            return Err(ZipError::EntryTooLarge {
                name: name.to_string(),
                size,
                limit: limits.max_entry_size,
            });
        }
    }

    Ok(())
}

/// Check that every file entry carries media bytes. Directory entries are skipped.
pub fn validate_media(files: &FileMap<'_>) -> Result<()> {
    for (name, data) in files.iter() {
        if name.ends_with('/') {
            continue;
        }
        if MediaKind::sniff(data).is_none() {
            return Err(ZipError::UnrecognizedMedia(name.to_string()));
        }
    }
    Ok(())
}

/// Totals for a file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveStats {
    pub total_files: usize,
    pub directories: usize,
    pub uncompressed_size: u64,
    /// Exact length of the archive the STORE writer produces for the set.
    pub archive_size: u64,
}

impl ArchiveStats {
    pub fn of(files: &FileMap<'_>) -> Self {
        let mut stats = ArchiveStats {
            archive_size: EndOfCentralDirectory::SIZE as u64,
            ..Default::default()
        };

        for (name, data) in files.iter() {
            if name.ends_with('/') {
                stats.directories += 1;
            } else {
                stats.total_files += 1;
            }
            let name_len = name.len() as u64;
            let size = data.len() as u64;
            stats.uncompressed_size += size;
            stats.archive_size += LocalFileHeader::SIZE as u64 + name_len + size;
            stats.archive_size += CentralDirectoryHeader::SIZE as u64 + name_len;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ArchiveLimits::default();
        assert_eq!(limits.max_entries, 1000);
        assert_eq!(limits.max_entry_size, 100 * 1024 * 1024);
        assert_eq!(limits.max_name_len, 255);
    }

    #[test]
    fn test_too_many_files() {
        let mut files = FileMap::new();
        files.insert("a.jpg", vec![1u8]);
        files.insert("b.jpg", vec![2u8]);
        let limits = ArchiveLimits {
            max_entries: 1,
            ..Default::default()
        };
        let err = validate_file_set(&files, &limits).unwrap_err();
        assert!(matches!(err, ZipError::TooManyFiles { count: 2, limit: 1 }));
        assert!(err.is_validation());
    }

    #[test]
    fn test_entry_too_large() {
        let mut files = FileMap::new();
        files.insert("big.mp4", vec![0u8; 16]);
        let limits = ArchiveLimits {
            max_entry_size: 15,
            ..Default::default()
        };
        let err = validate_file_set(&files, &limits).unwrap_err();
        assert!(matches!(err, ZipError::EntryTooLarge { size: 16, limit: 15, .. }));
    }

    #[test]
    fn test_invalid_name() {
        let mut files = FileMap::new();
        files.insert("what?.jpg", vec![1u8]);
        let err = validate_file_set(&files, &ArchiveLimits::default()).unwrap_err();
        assert!(matches!(err, ZipError::InvalidEntryName { .. }));
        assert!(validate_file_set(&files, &ArchiveLimits::unbounded()).is_err());
    }

    #[test]
    fn test_validate_media() {
        let mut files = FileMap::new();
        files.insert("photo.jpg", vec![0xFFu8, 0xD8, 0xFF, 0xE0]);
        files.insert_directory("photos");
        assert!(validate_media(&files).is_ok());

        files.insert("notes.txt", b"plain text".to_vec());
        let err = validate_media(&files).unwrap_err();
        assert!(matches!(err, ZipError::UnrecognizedMedia(name) if name == "notes.txt"));
    }

    #[test]
    fn test_stats() {
        let mut files = FileMap::new();
        files.insert("a.txt", b"hi".to_vec());
        files.insert("b.txt", b"yo".to_vec());
        files.insert_directory("dir");

        let stats = ArchiveStats::of(&files);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.directories, 1);
        assert_eq!(stats.uncompressed_size, 4);
        assert_eq!(stats.archive_size, 2 * (30 + 5 + 2) + 2 * (46 + 5) + (30 + 4) + (46 + 4) + 22);
    }
}
