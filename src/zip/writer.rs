//! STORE archive assembly.
//!
//! Building happens in two passes over fully resident buffers:
//!
//! 1. [`build_zip_segments`] walks the entries in order, producing one local
//!    segment (header + borrowed data) and one central directory header per
//!    entry while tracking the running byte offset.
//! 2. [`assemble_zip`] appends the End of Central Directory record and copies
//!    everything into a single buffer of exactly the final size.
//!
//! Every local header offset recorded in the central directory equals the sum
//! of the lengths of all local segments before it, and the final offset is the
//! start of the central directory.

use log::{error, trace};

use super::crc32::crc32;
use super::dos_time::DosDateTime;
use super::structures::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};
use crate::error::{Result, ZipError};

/// Highest entry count the 16-bit EOCD fields can express.
pub const MAX_ENTRIES: usize = u16::MAX as usize;

/// Local header plus the entry's data.
///
/// The data is borrowed from the caller's buffer and only copied once, into
/// the final archive.
#[derive(Debug, Clone)]
pub struct LocalSegment<'a> {
    pub header: Vec<u8>,
    pub data: &'a [u8],
}

impl LocalSegment<'_> {
    pub fn len(&self) -> usize {
        self.header.len() + self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of [`build_zip_segments`].
#[derive(Debug, Clone)]
pub struct ZipSegments<'a> {
    pub local: Vec<LocalSegment<'a>>,
    pub central: Vec<Vec<u8>>,
    /// Where the central directory begins; the total length of `local`.
    pub cd_offset: u32,
}

/// Build the local header block (fixed header + UTF-8 name) for one entry.
pub fn build_local_header(header: &LocalFileHeader, name: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(LocalFileHeader::SIZE + name.len());
    header.write_to(&mut buf)?;
    buf.extend_from_slice(name);
    Ok(buf)
}

/// Build the central directory block (fixed header + UTF-8 name) for one entry.
pub fn build_central_header(header: &CentralDirectoryHeader, name: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(CentralDirectoryHeader::SIZE + name.len());
    header.write_to(&mut buf)?;
    buf.extend_from_slice(name);
    Ok(buf)
}

fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| ZipError::ArchiveTooLarge)
}

/// Lay out every entry, in iteration order, stamping each with `timestamp`.
pub fn build_zip_segments<'a, I>(entries: I, timestamp: DosDateTime) -> Result<ZipSegments<'a>>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let entries = entries.into_iter();
    let (lower, _) = entries.size_hint();
    let mut local = Vec::with_capacity(lower);
    let mut central = Vec::with_capacity(lower);
    let mut offset: u64 = 0;

    for (index, (name, data)) in entries.enumerate() {
        if index >= MAX_ENTRIES {
            return Err(ZipError::TooManyEntries(index + 1));
        }

        let entry_offset = offset;
        let built = build_entry(name, data, entry_offset, timestamp);
        let (local_header, central_header) = match built {
            Ok(headers) => headers,
            Err(e) => {
                error!(
                    "failed to add ZIP entry #{} {:?} ({} bytes): {}",
                    index,
                    name,
                    data.len(),
                    e
                );
                return Err(e);
            }
        };

        offset += (local_header.len() + data.len()) as u64;
        local.push(LocalSegment {
            header: local_header,
            data,
        });
        central.push(central_header);
    }

    Ok(ZipSegments {
        local,
        central,
        cd_offset: to_u32(offset)?,
    })
}

fn build_entry(
    name: &str,
    data: &[u8],
    offset: u64,
    timestamp: DosDateTime,
) -> Result<(Vec<u8>, Vec<u8>)> {
    if name.is_empty() {
        return Err(ZipError::EmptyEntryName);
    }

    let name_bytes = name.as_bytes();
    let name_len =
        u16::try_from(name_bytes.len()).map_err(|_| ZipError::NameTooLong { len: name_bytes.len() })?;
    let size = to_u32(data.len() as u64)?;
    let lfh_offset = to_u32(offset)?;
    let checksum = crc32(data);

    trace!(
        "entry {:?}: {} bytes at offset {}, crc32 {:#010x}",
        name, size, lfh_offset, checksum
    );

    let local = LocalFileHeader::stored(checksum, size, name_len, timestamp);
    let central = CentralDirectoryHeader::for_local(&local, lfh_offset);

    Ok((
        build_local_header(&local, name_bytes)?,
        build_central_header(&central, name_bytes)?,
    ))
}

/// Concatenate local segments, central headers and the EOCD record.
pub fn assemble_zip(segments: &ZipSegments<'_>) -> Result<Vec<u8>> {
    let entries = u16::try_from(segments.central.len())
        .map_err(|_| ZipError::TooManyEntries(segments.central.len()))?;
    let cd_size: u64 = segments.central.iter().map(|c| c.len() as u64).sum();
    let cd_offset = segments.cd_offset;

    let total = cd_offset as u64 + cd_size + EndOfCentralDirectory::SIZE as u64;
    let eocd = EndOfCentralDirectory::single_disk(entries, to_u32(cd_size)?, cd_offset);

    let mut buf = Vec::with_capacity(usize::try_from(total).map_err(|_| ZipError::ArchiveTooLarge)?);
    for segment in &segments.local {
        buf.extend_from_slice(&segment.header);
        buf.extend_from_slice(segment.data);
    }
    debug_assert_eq!(buf.len() as u64, cd_offset as u64);

    for header in &segments.central {
        buf.extend_from_slice(header);
    }
    eocd.write_to(&mut buf)?;
    debug_assert_eq!(buf.len() as u64, total);

    Ok(buf)
}
