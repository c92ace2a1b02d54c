//! Byte sources: one read/write interface over files, mappings and buffers.
//!
//! A [`ByteSource`] is opened explicitly and released by [`ByteSource::close`]
//! (or on drop). Readers and writers borrow the source, so a writer holds
//! exclusive access for as long as it is alive.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use parking_lot::Mutex;

use crate::cursor::{SourceReader, SourceWriter};
use crate::{Error, Result};

/// How a source keeps its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Usage {
    /// Keep an open file handle and read on demand.
    Disk,
    /// Memory-map the file. Always read-only.
    Mapped,
    /// Read the whole file into a buffer.
    #[default]
    Memory,
}

/// Options used when opening a source from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceOptions {
    /// Storage strategy.
    pub usage: Usage,
    /// Reject writes when set.
    pub read_only: bool,
}

impl SourceOptions {
    /// Read-only options with the given usage.
    pub const fn read_only(usage: Usage) -> Self {
        Self {
            usage,
            read_only: true,
        }
    }

    /// Writable options with the given usage.
    pub const fn read_write(usage: Usage) -> Self {
        Self {
            usage,
            read_only: false,
        }
    }
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self::read_only(Usage::Memory)
    }
}

pub(crate) enum Backing {
    /// The lock pairs each seek with its read.
    Disk(Mutex<File>),
    Mapped(Mmap),
    Memory(Vec<u8>),
    Closed,
}

/// Mutable bookkeeping shared with writers.
#[derive(Debug, Default)]
pub(crate) struct SourceState {
    pub(crate) len: u64,
    pub(crate) dirty: bool,
}

/// An opened binary resource.
pub struct ByteSource {
    backing: Backing,
    state: SourceState,
    name: String,
    path: Option<PathBuf>,
    usage: Usage,
    read_only: bool,
}

impl ByteSource {
    /// Open a file with the given options.
    pub fn open<P: AsRef<Path>>(path: P, options: SourceOptions) -> Result<Self> {
        let path = path.as_ref();

        let mut backing = match options.usage {
            Usage::Disk => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(!options.read_only)
                    .open(path)?;
                Backing::Disk(Mutex::new(file))
            }
            Usage::Mapped => {
                if !options.read_only {
                    return Err(Error::InvalidUsage("memory-mapped sources are read-only"));
                }
                let file = File::open(path)?;
                let mmap = unsafe { Mmap::map(&file)? };
                Backing::Mapped(mmap)
            }
            Usage::Memory => Backing::Memory(fs::read(path)?),
        };

        let len = match &mut backing {
            Backing::Disk(file) => file.get_mut().metadata()?.len(),
            Backing::Mapped(mmap) => mmap.len() as u64,
            Backing::Memory(data) => data.len() as u64,
            Backing::Closed => 0,
        };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        tracing::debug!(
            name = %name,
            len,
            usage = ?options.usage,
            read_only = options.read_only,
            "opened byte source"
        );

        Ok(Self {
            backing,
            state: SourceState { len, dirty: false },
            name,
            path: Some(path.to_path_buf()),
            usage: options.usage,
            read_only: options.read_only,
        })
    }

    /// Wrap an in-memory buffer. No disk I/O is performed.
    pub fn from_bytes(bytes: Vec<u8>, name: impl Into<String>) -> Self {
        Self {
            state: SourceState {
                len: bytes.len() as u64,
                dirty: false,
            },
            backing: Backing::Memory(bytes),
            name: name.into(),
            path: None,
            usage: Usage::Memory,
            read_only: false,
        }
    }

    /// Logical name (file name, or the name given to [`from_bytes`](Self::from_bytes)).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path on disk, if any.
    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Storage strategy.
    #[inline]
    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.state.len
    }

    /// Check whether the source holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.state.len == 0
    }

    /// Check whether writes are rejected.
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Check whether [`close`](Self::close) has been called.
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self.backing, Backing::Closed)
    }

    /// Zero-copy view of the bytes for memory and mapped sources.
    pub fn as_slice(&self) -> Option<&[u8]> {
        match &self.backing {
            Backing::Mapped(mmap) => Some(&mmap[..]),
            Backing::Memory(data) => Some(data),
            Backing::Disk(_) | Backing::Closed => None,
        }
    }

    /// Get a reader positioned at `position`.
    pub fn reader_at(&self, position: u64) -> Result<SourceReader<'_>> {
        self.check_position(position)?;

        match &self.backing {
            Backing::Disk(file) => Ok(SourceReader::from_file(file, position, self.state.len)),
            Backing::Mapped(mmap) => Ok(SourceReader::from_slice(&mmap[..], position)),
            Backing::Memory(data) => Ok(SourceReader::from_slice(data, position)),
            Backing::Closed => Err(Error::Closed(self.name.clone())),
        }
    }

    /// Get a writer positioned at `position`.
    pub fn writer_at(&mut self, position: u64) -> Result<SourceWriter<'_>> {
        self.check_writable()?;
        self.check_position(position)?;

        let Self { backing, state, .. } = self;
        match backing {
            Backing::Disk(file) => Ok(SourceWriter::from_file(file.get_mut(), position, state)),
            Backing::Memory(data) => Ok(SourceWriter::from_vec(data, position, state)),
            Backing::Mapped(_) | Backing::Closed => {
                Err(Error::InvalidUsage("source cannot be written"))
            }
        }
    }

    /// Read `len` bytes starting at `position`.
    pub fn read_bytes_at(&self, position: u64, len: usize) -> Result<Vec<u8>> {
        let end = position.saturating_add(len as u64);
        if end > self.state.len {
            return Err(Error::UnexpectedEof {
                needed: len,
                available: self.state.len.saturating_sub(position) as usize,
            });
        }

        match &self.backing {
            Backing::Disk(file) => {
                let mut file = file.lock();
                let mut out = vec![0u8; len];
                file.seek(SeekFrom::Start(position))?;
                file.read_exact(&mut out)?;
                Ok(out)
            }
            Backing::Mapped(mmap) => Ok(mmap[position as usize..end as usize].to_vec()),
            Backing::Memory(data) => Ok(data[position as usize..end as usize].to_vec()),
            Backing::Closed => Err(Error::Closed(self.name.clone())),
        }
    }

    /// Read the whole source.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        self.read_bytes_at(0, self.state.len as usize)
    }

    /// Truncate or extend the source.
    pub fn set_len(&mut self, len: u64) -> Result<()> {
        self.check_writable()?;

        match &mut self.backing {
            Backing::Disk(file) => file.get_mut().set_len(len)?,
            Backing::Memory(data) => data.resize(len as usize, 0),
            Backing::Mapped(_) | Backing::Closed => {
                return Err(Error::InvalidUsage("source cannot be resized"))
            }
        }

        self.state.len = len;
        self.state.dirty = true;
        Ok(())
    }

    /// Persist pending writes.
    ///
    /// Disk sources flush their handle; memory sources opened from a path
    /// write their buffer back when modified.
    pub fn flush(&mut self) -> Result<()> {
        match &mut self.backing {
            Backing::Disk(file) => file.get_mut().sync_data()?,
            Backing::Memory(data) => {
                if let (Some(path), true, false) = (&self.path, self.state.dirty, self.read_only) {
                    fs::write(path, &data[..])?;
                }
            }
            Backing::Mapped(_) | Backing::Closed => {}
        }
        self.state.dirty = false;
        Ok(())
    }

    /// Release the handle or buffer. Calling this more than once is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        let flushed = self.flush();
        self.backing = Backing::Closed;
        self.state = SourceState::default();
        tracing::debug!(name = %self.name, "closed byte source");
        flushed
    }

    fn check_position(&self, position: u64) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed(self.name.clone()));
        }
        if position > self.state.len {
            return Err(Error::PositionOutOfRange {
                position,
                len: self.state.len,
            });
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed(self.name.clone()));
        }
        if self.read_only {
            return Err(Error::ReadOnly(self.name.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteSource")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("len", &self.state.len)
            .field("read_only", &self.read_only)
            .field("closed", &self.is_closed())
            .finish()
    }
}
