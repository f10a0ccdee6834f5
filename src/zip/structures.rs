use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};

use anyhow::{Result, bail};

use super::dos_time::DosDateTime;

/// "Version needed to extract": 2.0, the minimum for STORE entries.
pub const VERSION_NEEDED: u16 = 20;

/// "Version made by": UNIX host (3) in the high byte, APPNOTE version 2.0 in the low byte.
pub const VERSION_MADE_BY: u16 = (3 << 8) | 20;

/// General purpose bit 11: file name is UTF-8 encoded.
pub const FLAG_UTF8: u16 = 0x0800;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Local File Header (LFH) - 30 bytes, followed by the file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    pub const SIGNATURE: &'static [u8] = b"PK\x03\x04";
    pub const SIZE: usize = 30;

    /// Header for a STORE entry: both sizes equal the data length.
    pub fn stored(crc32: u32, size: u32, file_name_length: u16, last_modified: DosDateTime) -> Self {
        Self {
            version_needed: VERSION_NEEDED,
            flags: FLAG_UTF8,
            compression_method: CompressionMethod::Stored,
            last_modified,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            file_name_length,
            extra_field_length: 0,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid Local File Header");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            version_needed: cursor.read_u16::<LittleEndian>()?,
            flags: cursor.read_u16::<LittleEndian>()?,
            compression_method: CompressionMethod::from_u16(cursor.read_u16::<LittleEndian>()?),
            last_modified: DosDateTime {
                time: cursor.read_u16::<LittleEndian>()?,
                date: cursor.read_u16::<LittleEndian>()?,
            },
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            file_name_length: cursor.read_u16::<LittleEndian>()?,
            extra_field_length: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Write the fixed 30-byte portion. The file name follows it on disk.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(self.version_needed)?;
        w.write_u16::<LittleEndian>(self.flags)?;
        w.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        w.write_u16::<LittleEndian>(self.last_modified.time)?;
        w.write_u16::<LittleEndian>(self.last_modified.date)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(self.compressed_size)?;
        w.write_u32::<LittleEndian>(self.uncompressed_size)?;
        w.write_u16::<LittleEndian>(self.file_name_length)?;
        w.write_u16::<LittleEndian>(self.extra_field_length)?;
        Ok(())
    }
}

/// Central Directory File Header (CDFH) - 46 bytes, followed by the file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub disk_number_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub lfh_offset: u32,
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: &'static [u8] = b"PK\x01\x02";
    pub const SIZE: usize = 46;

    /// Central record mirroring `local`, pointing back at `lfh_offset`.
    pub fn for_local(local: &LocalFileHeader, lfh_offset: u32) -> Self {
        Self {
            version_made_by: VERSION_MADE_BY,
            version_needed: local.version_needed,
            flags: local.flags,
            compression_method: local.compression_method,
            last_modified: local.last_modified,
            crc32: local.crc32,
            compressed_size: local.compressed_size,
            uncompressed_size: local.uncompressed_size,
            file_name_length: local.file_name_length,
            extra_field_length: 0,
            file_comment_length: 0,
            disk_number_start: 0,
            internal_attrs: 0,
            external_attrs: 0,
            lfh_offset,
        }
    }

    /// Read the fixed portion from a cursor positioned at the signature.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut sig = [0u8; 4];
        r.read_exact(&mut sig)?;
        if sig != Self::SIGNATURE {
            bail!("Invalid Central Directory File Header");
        }

        Ok(Self {
            version_made_by: r.read_u16::<LittleEndian>()?,
            version_needed: r.read_u16::<LittleEndian>()?,
            flags: r.read_u16::<LittleEndian>()?,
            compression_method: CompressionMethod::from_u16(r.read_u16::<LittleEndian>()?),
            last_modified: DosDateTime {
                time: r.read_u16::<LittleEndian>()?,
                date: r.read_u16::<LittleEndian>()?,
            },
            crc32: r.read_u32::<LittleEndian>()?,
            compressed_size: r.read_u32::<LittleEndian>()?,
            uncompressed_size: r.read_u32::<LittleEndian>()?,
            file_name_length: r.read_u16::<LittleEndian>()?,
            extra_field_length: r.read_u16::<LittleEndian>()?,
            file_comment_length: r.read_u16::<LittleEndian>()?,
            disk_number_start: r.read_u16::<LittleEndian>()?,
            internal_attrs: r.read_u16::<LittleEndian>()?,
            external_attrs: r.read_u32::<LittleEndian>()?,
            lfh_offset: r.read_u32::<LittleEndian>()?,
        })
    }

    /// Write the fixed 46-byte portion. The file name follows it on disk.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(self.version_made_by)?;
        w.write_u16::<LittleEndian>(self.version_needed)?;
        w.write_u16::<LittleEndian>(self.flags)?;
        w.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        w.write_u16::<LittleEndian>(self.last_modified.time)?;
        w.write_u16::<LittleEndian>(self.last_modified.date)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(self.compressed_size)?;
        w.write_u32::<LittleEndian>(self.uncompressed_size)?;
        w.write_u16::<LittleEndian>(self.file_name_length)?;
        w.write_u16::<LittleEndian>(self.extra_field_length)?;
        w.write_u16::<LittleEndian>(self.file_comment_length)?;
        w.write_u16::<LittleEndian>(self.disk_number_start)?;
        w.write_u16::<LittleEndian>(self.internal_attrs)?;
        w.write_u32::<LittleEndian>(self.external_attrs)?;
        w.write_u32::<LittleEndian>(self.lfh_offset)?;
        Ok(())
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Single-disk record without a comment.
    pub fn single_disk(entries: u16, cd_size: u32, cd_offset: u32) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            bail!("Invalid End of Central Directory");
        }

        // Verify signature
        if &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(self.disk_number)?;
        w.write_u16::<LittleEndian>(self.disk_with_cd)?;
        w.write_u16::<LittleEndian>(self.disk_entries)?;
        w.write_u16::<LittleEndian>(self.total_entries)?;
        w.write_u32::<LittleEndian>(self.cd_size)?;
        w.write_u32::<LittleEndian>(self.cd_offset)?;
        w.write_u16::<LittleEndian>(self.comment_len)?;
        Ok(())
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_modified: DosDateTime,
    pub version_made_by: u16,
    pub flags: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    pub fn is_utf8(&self) -> bool {
        self.flags & FLAG_UTF8 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_local() -> LocalFileHeader {
        LocalFileHeader::stored(0xCBF4_3926, 9, 5, DosDateTime::from_calendar(2024, 3, 15, 13, 45, 30))
    }

    #[test]
    fn test_local_header_layout() {
        let header = sample_local();
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();

        assert_eq!(buf.len(), LocalFileHeader::SIZE);
        assert_eq!(&buf[0..4], &[0x50, 0x4B, 0x03, 0x04]);
        assert_eq!(&buf[4..6], &[20, 0]);
        assert_eq!(&buf[6..8], &[0x00, 0x08]);
        assert_eq!(&buf[8..10], &[0, 0]);
        assert_eq!(&buf[14..18], &0xCBF4_3926u32.to_le_bytes());
        assert_eq!(&buf[18..22], &9u32.to_le_bytes());
        assert_eq!(&buf[22..26], &9u32.to_le_bytes());
        assert_eq!(&buf[26..28], &[5, 0]);
        assert_eq!(&buf[28..30], &[0, 0]);

        assert_eq!(LocalFileHeader::from_bytes(&buf).unwrap(), header);
    }

    #[test]
    fn test_central_header_layout() {
        let local = sample_local();
        let central = CentralDirectoryHeader::for_local(&local, 0x0102_0304);
        let mut buf = Vec::new();
        central.write_to(&mut buf).unwrap();

        assert_eq!(buf.len(), CentralDirectoryHeader::SIZE);
        assert_eq!(&buf[0..4], &[0x50, 0x4B, 0x01, 0x02]);
        assert_eq!(&buf[4..6], &[20, 3]);
        assert_eq!(&buf[6..8], &[20, 0]);
        assert_eq!(&buf[8..10], &[0x00, 0x08]);
        assert_eq!(&buf[12..14], &local.last_modified.time.to_le_bytes());
        assert_eq!(&buf[14..16], &local.last_modified.date.to_le_bytes());
        assert_eq!(&buf[30..46], &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x04, 0x03, 0x02, 0x01][..]);

        let parsed = CentralDirectoryHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(parsed, central);
    }

    #[test]
    fn test_eocd_layout() {
        let eocd = EndOfCentralDirectory::single_disk(2, 102, 74);
        let mut buf = Vec::new();
        eocd.write_to(&mut buf).unwrap();

        assert_eq!(buf.len(), EndOfCentralDirectory::SIZE);
        assert_eq!(&buf[0..4], &[0x50, 0x4B, 0x05, 0x06]);
        assert_eq!(&buf[8..10], &[2, 0]);
        assert_eq!(&buf[10..12], &[2, 0]);
        assert_eq!(&buf[12..16], &102u32.to_le_bytes());
        assert_eq!(&buf[16..20], &74u32.to_le_bytes());
        assert!(!eocd.is_zip64());

        assert_eq!(EndOfCentralDirectory::from_bytes(&buf).unwrap(), eocd);
    }

    #[test]
    fn test_rejects_bad_signature() {
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        buf[0..4].copy_from_slice(b"PK\x01\x02");
        assert!(EndOfCentralDirectory::from_bytes(&buf).is_err());
        assert!(LocalFileHeader::from_bytes(&buf[..10]).is_err());
    }
}
