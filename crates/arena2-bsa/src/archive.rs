//! BSA archive reader.
//!
//! The directory is parsed once at load time; record contents are read on
//! demand from the underlying [`ByteSource`].

use std::path::Path;

use arena2_common::{BinaryReader, ByteSource, SourceOptions};
use rustc_hash::FxHashMap;

use crate::directory::{
    encode_directory, parse_directory, BsaHeader, DirectoryEntry, DirectoryType,
};
use crate::{Error, Result};

/// One record of a BSA archive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BsaRecord {
    /// Position in the directory.
    pub index: usize,
    /// Record name. Number-indexed records use their decimal id.
    pub name: String,
    /// Numeric id for number-indexed archives.
    pub id: Option<u32>,
    /// Size in bytes.
    pub size: u32,
    /// Offset of the record data in the archive.
    pub offset: u64,
    /// Compressed flag from the directory.
    pub compressed: bool,
}

/// A BSA archive.
pub struct BsaArchive {
    source: ByteSource,
    directory_type: DirectoryType,
    records: Vec<BsaRecord>,
    entries: Vec<DirectoryEntry>,
    by_name: FxHashMap<String, usize>,
}

impl BsaArchive {
    /// Open an archive from disk.
    pub fn load<P: AsRef<Path>>(path: P, options: SourceOptions) -> Result<Self> {
        let source = ByteSource::open(path, options)?;
        Self::from_source(source)
    }

    /// Parse an archive held in memory.
    pub fn from_bytes(bytes: Vec<u8>, name: impl Into<String>) -> Result<Self> {
        Self::from_source(ByteSource::from_bytes(bytes, name))
    }

    /// Parse an archive from an opened byte source.
    pub fn from_source(source: ByteSource) -> Result<Self> {
        let len = source.len();
        let header_bytes = source.read_bytes_at(0, BsaHeader::SIZE as usize)?;
        let header: BsaHeader = BinaryReader::new(&header_bytes).read_struct()?;

        let directory_type = DirectoryType::try_from(header.directory_type)?;
        let count = header.record_count as usize;

        let directory_size = (count * directory_type.entry_size()) as u64;
        if BsaHeader::SIZE + directory_size > len {
            return Err(Error::DirectoryOutOfBounds {
                records: count,
                needed: BsaHeader::SIZE + directory_size,
                len,
            });
        }

        let directory_offset = len - directory_size;
        let directory_bytes = source.read_bytes_at(directory_offset, directory_size as usize)?;
        let entries = parse_directory(&directory_bytes, count, directory_type)?;

        let records = build_records(&entries);
        let data_end = data_end(&records);
        if data_end > directory_offset {
            return Err(Error::DataOverrunsDirectory {
                data_end,
                directory_offset,
            });
        }

        let mut by_name = FxHashMap::default();
        for record in &records {
            by_name
                .entry(record.name.to_ascii_uppercase())
                .or_insert(record.index);
        }

        tracing::debug!(
            archive = %source.name(),
            records = count,
            directory = directory_type.label(),
            "loaded BSA directory"
        );

        Ok(Self {
            source,
            directory_type,
            records,
            entries,
            by_name,
        })
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Get the number of records.
    #[inline]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Get the directory type.
    #[inline]
    pub fn directory_type(&self) -> DirectoryType {
        self.directory_type
    }

    /// All records in directory order.
    #[inline]
    pub fn records(&self) -> &[BsaRecord] {
        &self.records
    }

    /// Iterate over records.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &BsaRecord> + '_ {
        self.records.iter()
    }

    /// Get a record by index.
    pub fn record(&self, index: usize) -> Result<&BsaRecord> {
        self.records.get(index).ok_or(Error::IndexOutOfRange {
            index,
            count: self.records.len(),
        })
    }

    /// Find a record index by name (ASCII case-insensitive).
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name.to_ascii_uppercase()).copied()
    }

    /// Find a record index by numeric id.
    pub fn index_of_id(&self, id: u32) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.id == Some(id))
    }

    /// Get the name of a record.
    pub fn name_of(&self, index: usize) -> Result<&str> {
        self.record(index).map(|record| record.name.as_str())
    }

    /// Read the contents of a record.
    pub fn record_bytes(&self, index: usize) -> Result<Vec<u8>> {
        let record = self.record(index)?;
        Ok(self
            .source
            .read_bytes_at(record.offset, record.size as usize)?)
    }

    /// Read a record by name.
    pub fn record_bytes_by_name(&self, name: &str) -> Result<Vec<u8>> {
        let index = self
            .index_of(name)
            .ok_or_else(|| Error::RecordNotFound(name.to_string()))?;
        self.record_bytes(index)
    }

    /// View a record as its own in-memory byte source.
    pub fn record_source(&self, index: usize) -> Result<ByteSource> {
        let bytes = self.record_bytes(index)?;
        Ok(ByteSource::from_bytes(bytes, self.records[index].name.clone()))
    }

    /// Replace the contents of a record.
    ///
    /// The archive is rebuilt around the record: later record data shifts by
    /// the size difference and the directory is written again at the new end
    /// of the file. Indices, names and the contents of every other record are
    /// unchanged.
    pub fn rewrite_record(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        let record = self.record(index)?.clone();
        if self.source.is_read_only() {
            return Err(arena2_common::Error::ReadOnly(self.name().to_string()).into());
        }
        let new_size = u32::try_from(bytes.len()).map_err(|_| Error::RecordTooLarge(bytes.len()))?;

        if new_size == record.size {
            self.source.writer_at(record.offset)?.write_bytes(bytes)?;
            self.source.flush()?;
            return Ok(());
        }

        let tail_start = record.offset + record.size as u64;
        let old_data_end = data_end(&self.records);
        let tail = self
            .source
            .read_bytes_at(tail_start, (old_data_end - tail_start) as usize)?;

        self.entries[index].set_size(new_size);
        let directory = encode_directory(&self.entries);

        {
            let mut writer = self.source.writer_at(record.offset)?;
            writer.write_bytes(bytes)?;
            writer.write_bytes(&tail)?;
            writer.write_bytes(&directory)?;
        }

        let new_len = old_data_end - record.size as u64 + new_size as u64 + directory.len() as u64;
        self.source.set_len(new_len)?;
        self.source.flush()?;

        self.records = build_records(&self.entries);

        tracing::debug!(
            archive = %self.source.name(),
            index,
            old_size = record.size,
            new_size,
            "rewrote BSA record"
        );

        Ok(())
    }

    /// Release the underlying source.
    pub fn close(&mut self) -> Result<()> {
        Ok(self.source.close()?)
    }

    /// Borrow the underlying source.
    pub fn source(&self) -> &ByteSource {
        &self.source
    }
}

impl std::fmt::Debug for BsaArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BsaArchive")
            .field("name", &self.name())
            .field("directory_type", &self.directory_type)
            .field("records", &self.records.len())
            .finish()
    }
}

fn build_records(entries: &[DirectoryEntry]) -> Vec<BsaRecord> {
    let mut offset = BsaHeader::SIZE;
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let (name, id) = match entry {
                DirectoryEntry::Name(entry) => (entry.name(), None),
                DirectoryEntry::Number(entry) => {
                    let id = entry.id as u32;
                    (id.to_string(), Some(id))
                }
            };

            let record = BsaRecord {
                index,
                name,
                id,
                size: entry.size(),
                offset,
                compressed: entry.is_compressed(),
            };
            offset += record.size as u64;
            record
        })
        .collect()
}

fn data_end(records: &[BsaRecord]) -> u64 {
    records
        .last()
        .map(|record| record.offset + record.size as u64)
        .unwrap_or(BsaHeader::SIZE)
}

#[cfg(test)]
mod tests {
    use arena2_common::Usage;

    use super::*;
    use crate::BsaBuilder;

    fn abc_archive() -> Vec<u8> {
        let mut builder = BsaBuilder::new(DirectoryType::Name);
        builder.add_named("A", vec![b'a'; 10]).unwrap();
        builder.add_named("B", vec![b'b'; 20]).unwrap();
        builder.add_named("C", vec![b'c'; 30]).unwrap();
        builder.build()
    }

    #[test]
    fn test_lookup_by_name_and_index() {
        let archive = BsaArchive::from_bytes(abc_archive(), "abc.bsa").unwrap();

        assert_eq!(archive.count(), 3);
        assert_eq!(archive.index_of("B"), Some(1));
        assert_eq!(archive.index_of("b"), Some(1));
        assert_eq!(archive.name_of(1).unwrap(), "B");
        assert_eq!(archive.record_bytes(1).unwrap().len(), 20);
        assert_eq!(archive.record(2).unwrap().offset, 4 + 10 + 20);
        assert_eq!(archive.index_of("D"), None);
    }

    #[test]
    fn test_index_out_of_range() {
        let archive = BsaArchive::from_bytes(abc_archive(), "abc.bsa").unwrap();
        assert!(matches!(
            archive.record_bytes(3),
            Err(Error::IndexOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn test_number_directory() {
        let mut builder = BsaBuilder::new(DirectoryType::Number);
        builder.add_numbered(456, vec![1, 2, 3]).unwrap();
        builder.add_numbered(123, vec![4, 5]).unwrap();
        let archive = BsaArchive::from_bytes(builder.build(), "arch3d.bsa").unwrap();

        assert_eq!(archive.index_of_id(123), Some(1));
        assert_eq!(archive.index_of("456"), Some(0));
        assert_eq!(archive.record_bytes(1).unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_rewrite_record_changes_length() {
        let mut archive = BsaArchive::from_bytes(abc_archive(), "abc.bsa").unwrap();
        let before: Vec<Vec<u8>> = (0..3).map(|i| archive.record_bytes(i).unwrap()).collect();

        let longer = vec![b'X'; 45];
        archive.rewrite_record(1, &longer).unwrap();
        assert_eq!(archive.record_bytes(1).unwrap(), longer);
        assert_eq!(archive.record_bytes(0).unwrap(), before[0]);
        assert_eq!(archive.record_bytes(2).unwrap(), before[2]);
        assert_eq!(archive.index_of("C"), Some(2));

        let shorter = vec![b'Y'; 3];
        archive.rewrite_record(1, &shorter).unwrap();
        assert_eq!(archive.record_bytes(1).unwrap(), shorter);
        assert_eq!(archive.record_bytes(2).unwrap(), before[2]);

        // The rebuilt container must parse on its own.
        let bytes = archive.source().read_all().unwrap();
        let reparsed = BsaArchive::from_bytes(bytes, "abc.bsa").unwrap();
        assert_eq!(reparsed.record_bytes(1).unwrap(), shorter);
        assert_eq!(reparsed.record_bytes(2).unwrap(), before[2]);
        assert_eq!(reparsed.source().len(), 4 + 10 + 3 + 30 + 3 * 18);
    }

    #[test]
    fn test_rewrite_same_length_in_place() {
        let mut archive = BsaArchive::from_bytes(abc_archive(), "abc.bsa").unwrap();
        archive.rewrite_record(0, b"0123456789").unwrap();

        assert_eq!(archive.record_bytes(0).unwrap(), b"0123456789");
        assert_eq!(archive.record_bytes(1).unwrap(), vec![b'b'; 20]);
    }

    #[test]
    fn test_rewrite_on_disk() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), abc_archive()).unwrap();

        for usage in [Usage::Disk, Usage::Memory] {
            let mut archive =
                BsaArchive::load(file.path(), SourceOptions::read_write(usage)).unwrap();
            archive.rewrite_record(0, &[7u8; 64]).unwrap();
            archive.close().unwrap();

            let reopened =
                BsaArchive::load(file.path(), SourceOptions::read_only(Usage::Mapped)).unwrap();
            assert_eq!(reopened.record_bytes(0).unwrap(), vec![7u8; 64]);
            assert_eq!(reopened.record_bytes(2).unwrap(), vec![b'c'; 30]);
        }
    }

    #[test]
    fn test_rewrite_read_only_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), abc_archive()).unwrap();

        let mut archive =
            BsaArchive::load(file.path(), SourceOptions::read_only(Usage::Disk)).unwrap();
        assert!(matches!(
            archive.rewrite_record(0, b"x"),
            Err(Error::Common(arena2_common::Error::ReadOnly(_)))
        ));
    }

    #[test]
    fn test_record_source() {
        let archive = BsaArchive::from_bytes(abc_archive(), "abc.bsa").unwrap();
        let source = archive.record_source(2).unwrap();

        assert_eq!(source.name(), "C");
        assert_eq!(source.len(), 30);
        assert_eq!(source.reader_at(0).unwrap().read_u8().unwrap(), b'c');
    }

    #[test]
    fn test_parallel_reads_from_disk() {
        let mut builder = BsaBuilder::new(DirectoryType::Number);
        for t in 0..8u8 {
            builder.add_numbered(t as u16, vec![t; 128 + t as usize]).unwrap();
        }
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), builder.build()).unwrap();

        let archive =
            BsaArchive::load(file.path(), SourceOptions::read_only(Usage::Disk)).unwrap();
        std::thread::scope(|scope| {
            for t in 0..8u8 {
                let archive = &archive;
                scope.spawn(move || {
                    for _ in 0..1000 {
                        let bytes = archive.record_bytes(t as usize).unwrap();
                        assert_eq!(bytes.len(), 128 + t as usize);
                        assert!(bytes.iter().all(|&b| b == t));
                    }
                });
            }
        });
    }

    #[test]
    fn test_truncated_directory() {
        let mut bytes = abc_archive();
        bytes.truncate(40);
        assert!(BsaArchive::from_bytes(bytes, "bad.bsa").is_err());
    }
}
