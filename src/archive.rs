//! Public entry points for turning a set of named buffers into a ZIP archive.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::error::{Result, ZipError};
use crate::io::MemoryReader;
use crate::naming;
use crate::options::ArchiveOptions;
use crate::zip::{DosDateTime, assemble_zip, build_zip_segments};

/// MIME type attached to [`ZipBlob`]s.
pub const ZIP_MIME_TYPE: &str = "application/zip";

/// Insertion-ordered mapping from entry name to entry bytes.
///
/// Bytes may be owned or borrowed; borrowed buffers are never copied until
/// they are written into the final archive. Inserting an existing name
/// replaces its bytes but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct FileMap<'a> {
    entries: Vec<(String, Cow<'a, [u8]>)>,
    index: HashMap<String, usize>,
}

impl<'a> FileMap<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Add or replace an entry. Returns the replaced bytes, if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        data: impl Into<Cow<'a, [u8]>>,
    ) -> Option<Cow<'a, [u8]>> {
        let name = name.into();
        let data = data.into();
        match self.index.get(&name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, data)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, data));
                None
            }
        }
    }

    /// Add an empty directory entry for `path`. Returns the entry name used,
    /// or `None` if the path normalizes to nothing.
    pub fn insert_directory(&mut self, path: &str) -> Option<String> {
        let name = naming::directory_entry_name(path)?;
        self.insert(name.clone(), Vec::<u8>::new());
        Some(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Cow<'a, [u8]>> {
        let i = self.index.remove(name)?;
        let (_, data) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(data)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.index.get(name).map(|&i| self.entries[i].1.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> + '_ {
        self.entries
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_ref()))
    }
}

impl<'a, K, V> FromIterator<(K, V)> for FileMap<'a>
where
    K: Into<String>,
    V: Into<Cow<'a, [u8]>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FileMap::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V> Extend<(K, V)> for FileMap<'a>
where
    K: Into<String>,
    V: Into<Cow<'a, [u8]>>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, data) in iter {
            self.insert(name, data);
        }
    }
}

/// A finished archive with its MIME type, ready to hand to a save step.
#[derive(Debug, Clone)]
pub struct ZipBlob {
    bytes: Arc<[u8]>,
    mime_type: &'static str,
}

impl ZipBlob {
    /// Wrap a copy of `bytes`.
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: Arc::from(bytes),
            mime_type: ZIP_MIME_TYPE,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Random access reader over the blob, sharing its bytes.
    pub fn reader(&self) -> MemoryReader {
        MemoryReader::new(self.bytes.clone())
    }
}

/// Build a STORE archive from `files`, stamping every entry with the current
/// wall-clock time.
///
/// # Errors
///
/// [`ZipError::EmptyArchive`] when `files` is empty, [`ZipError::EmptyEntryName`]
/// when a name is empty, and the format-limit errors when the set does not fit
/// a non-ZIP64 archive. No bytes are returned on any error.
pub fn create_store_zip(files: &FileMap<'_>) -> Result<Vec<u8>> {
    create_store_zip_at(files, DosDateTime::now())
}

/// Same as [`create_store_zip`], with an explicit timestamp.
///
/// Two calls with the same files and timestamp return identical bytes.
pub fn create_store_zip_at(files: &FileMap<'_>, timestamp: DosDateTime) -> Result<Vec<u8>> {
    if files.is_empty() {
        return Err(ZipError::EmptyArchive);
    }

    debug!("creating STORE ZIP with {} entries", files.len());

    let result = build_zip_segments(files.iter(), timestamp).and_then(|s| assemble_zip(&s));
    match result {
        Ok(bytes) => {
            debug!("ZIP created: {} entries, {} bytes", files.len(), bytes.len());
            Ok(bytes)
        }
        Err(e) => {
            debug!(
                "ZIP creation failed ({} entries, last entry {:?}): {}",
                files.len(),
                files.names().last().unwrap_or_default(),
                e
            );
            Err(e)
        }
    }
}

/// Validate `files` against `options`, then build as [`create_store_zip`].
pub fn create_store_zip_with(files: &FileMap<'_>, options: &ArchiveOptions) -> Result<Vec<u8>> {
    if files.is_empty() {
        return Err(ZipError::EmptyArchive);
    }
    options.validate(files)?;
    create_store_zip(files)
}

/// Build a STORE archive and wrap a copy of it as a [`ZipBlob`].
///
/// Performs no I/O; it is `async` so it slots into flows that await the
/// save step.
pub async fn create_store_zip_blob(files: &FileMap<'_>) -> Result<ZipBlob> {
    let bytes = create_store_zip(files)?;
    Ok(ZipBlob::new(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ArchiveLimits, ArchiveStats};

    fn fixed_time() -> DosDateTime {
        DosDateTime::from_calendar(2025, 1, 2, 3, 4, 5)
    }

    #[test]
    fn test_empty_archive_rejected() {
        let files = FileMap::new();
        let err = create_store_zip(&files).unwrap_err();
        assert!(matches!(err, ZipError::EmptyArchive));
        assert_eq!(err.to_string(), "Cannot create ZIP archive without files");
        assert!(err.is_validation());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut files = FileMap::new();
        files.insert("", b"bytes".to_vec());
        let err = create_store_zip(&files).unwrap_err();
        assert!(matches!(err, ZipError::EmptyEntryName));
    }

    #[test]
    fn test_two_file_scenario() {
        let mut files = FileMap::new();
        files.insert("a.txt", vec![0x68u8, 0x69]);
        files.insert("b.txt", vec![0x79u8, 0x6F]);

        let zip = create_store_zip(&files).unwrap();
        assert_eq!(zip.len(), 2 * (30 + 5 + 2) + 2 * (46 + 5) + 22);
        let eocd = zip.len() - 22;
        assert_eq!(&zip[eocd..eocd + 4], &[0x50, 0x4B, 0x05, 0x06]);
        assert_eq!(&zip[0..4], &[0x50, 0x4B, 0x03, 0x04]);
    }

    #[test]
    fn test_deterministic_for_fixed_time() {
        let files: FileMap = [("x.jpg", vec![1u8, 2, 3]), ("y.jpg", vec![4u8])]
            .into_iter()
            .collect();
        let first = create_store_zip_at(&files, fixed_time()).unwrap();
        let second = create_store_zip_at(&files, fixed_time()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_timestamp_written_to_headers() {
        let mut files = FileMap::new();
        files.insert("t.bin", vec![0u8]);
        let ts = fixed_time();
        let zip = create_store_zip_at(&files, ts).unwrap();
        assert_eq!(&zip[10..12], &ts.time.to_le_bytes());
        assert_eq!(&zip[12..14], &ts.date.to_le_bytes());
    }

    #[test]
    fn test_borrowed_and_owned_inputs() {
        let borrowed = [9u8; 10];
        let mut files = FileMap::new();
        files.insert("borrowed.bin", &borrowed[..]);
        files.insert("owned.bin", vec![1u8, 2]);
        assert!(matches!(
            files.insert("owned.bin", vec![3u8]),
            Some(Cow::Owned(old)) if old == vec![1u8, 2]
        ));
        assert_eq!(files.get("owned.bin"), Some(&[3u8][..]));
        assert_eq!(files.names().collect::<Vec<_>>(), vec!["borrowed.bin", "owned.bin"]);
    }

    #[test]
    fn test_replace_keeps_position_and_remove_reindexes() {
        let mut files = FileMap::new();
        files.insert("1", vec![1u8]);
        files.insert("2", vec![2u8]);
        files.insert("3", vec![3u8]);
        files.insert("1", vec![10u8]);
        assert_eq!(files.names().collect::<Vec<_>>(), vec!["1", "2", "3"]);

        assert!(files.remove("2").is_some());
        assert!(!files.contains("2"));
        assert_eq!(files.get("3"), Some(&[3u8][..]));
        assert_eq!(files.len(), 2);
        assert!(files.remove("2").is_none());
    }

    #[test]
    fn test_directory_names_drop_relative_segments() {
        let mut files = FileMap::new();
        assert_eq!(files.insert_directory("../x").as_deref(), Some("x/"));
        assert_eq!(files.insert_directory("./a/../b").as_deref(), Some("a/b/"));
        assert_eq!(files.insert_directory("../.."), None);
        assert_eq!(files.names().collect::<Vec<_>>(), vec!["x/", "a/b/"]);
    }

    #[test]
    fn test_stats_match_output_length() {
        let mut files = FileMap::new();
        files.insert("photo.jpg", vec![0xFFu8; 1234]);
        files.insert("video/clip.mp4", vec![0u8; 77]);
        files.insert_directory("empty");

        let zip = create_store_zip(&files).unwrap();
        assert_eq!(ArchiveStats::of(&files).archive_size, zip.len() as u64);
    }

    #[test]
    fn test_create_with_options() {
        let mut files = FileMap::new();
        files.insert("photo.jpg", vec![0xFFu8, 0xD8, 0xFF, 0xDB]);
        files.insert("readme.txt", b"not media".to_vec());

        let options = ArchiveOptions {
            require_media: true,
            ..Default::default()
        };
        assert!(matches!(
            create_store_zip_with(&files, &options),
            Err(ZipError::UnrecognizedMedia(_))
        ));

        let options = ArchiveOptions {
            limits: ArchiveLimits::unbounded(),
            require_media: false,
        };
        assert!(create_store_zip_with(&files, &options).is_ok());
        assert!(matches!(
            create_store_zip_with(&FileMap::new(), &options),
            Err(ZipError::EmptyArchive)
        ));
    }

    #[tokio::test]
    async fn test_blob_is_independent_copy() {
        let mut files = FileMap::new();
        files.insert("a.txt", b"original".to_vec());

        let blob = create_store_zip_blob(&files).await.unwrap();
        let snapshot = blob.bytes().to_vec();

        files.insert("a.txt", b"changed!".to_vec());
        assert_eq!(blob.bytes(), snapshot.as_slice());
        assert_eq!(blob.mime_type(), "application/zip");
        assert_eq!(blob.len(), snapshot.len());
    }

    #[tokio::test]
    async fn test_blob_empty_rejected() {
        let err = create_store_zip_blob(&FileMap::new()).await.unwrap_err();
        assert!(matches!(err, ZipError::EmptyArchive));
    }
}
