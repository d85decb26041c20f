//! # Key log
//!
//! The `.gik` file: a log of fixed-header key records that pins every live
//! key to a slot in the value heap. Records are appended on create and on
//! delete; an overwrite rewrites the existing record in place, so a key's
//! record offset is stable for its whole life.
//!
//! ## Record layout
//!
//! ```text
//! ┌─────────┬────┬──────────┬──────────┬───────────┬─────────┬───────────┐
//! │ version │ op │ val_seek │ val_size │ timestamp │ key_len │ key bytes │
//! │   u8    │ u8 │   u32    │   u32    │    u32    │   u16   │  key_len  │
//! └─────────┴────┴──────────┴──────────┴───────────┴─────────┴───────────┘
//! ```
//!
//! All integers big-endian. `op` is 0 for a put, 1 for a tombstone; a
//! tombstone carries zero `val_seek`/`val_size`. The timestamp is seconds
//! since the Unix epoch at write time and is informational only. There is no
//! file header, footer, or magic — the log is nothing but records.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::warn;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Size of the fixed record header preceding the key bytes.
pub const HEADER_BYTES: usize = 16;

/// On-disk format version written into every record.
pub const FORMAT_VERSION: u8 = 0;

const OP_PUT: u8 = 0;
const OP_TOMBSTONE: u8 = 1;

/// A single record in the key log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRecord {
    /// A live key pointing at `[val_seek, val_seek + val_size)` in the
    /// value heap.
    Put {
        val_seek: u32,
        val_size: u32,
        key: Vec<u8>,
    },
    /// A deletion marker. The value fields are written as zero.
    Tombstone { key: Vec<u8> },
}

impl KeyRecord {
    /// The key bytes this record is about.
    pub fn key(&self) -> &[u8] {
        match self {
            KeyRecord::Put { key, .. } => key,
            KeyRecord::Tombstone { key } => key,
        }
    }

    /// Number of bytes this record occupies on disk.
    pub fn encoded_len(&self) -> usize {
        HEADER_BYTES + self.key().len()
    }

    fn encode(&self) -> Result<Vec<u8>, LogError> {
        let (op, val_seek, val_size, key) = match self {
            KeyRecord::Put {
                val_seek,
                val_size,
                key,
            } => (OP_PUT, *val_seek, *val_size, key),
            KeyRecord::Tombstone { key } => (OP_TOMBSTONE, 0, 0, key),
        };

        let mut buf = Vec::with_capacity(HEADER_BYTES + key.len());
        buf.write_u8(FORMAT_VERSION)?;
        buf.write_u8(op)?;
        buf.write_u32::<BigEndian>(val_seek)?;
        buf.write_u32::<BigEndian>(val_size)?;
        buf.write_u32::<BigEndian>(unix_now())?;
        buf.write_u16::<BigEndian>(key.len() as u16)?;
        buf.extend_from_slice(key);
        Ok(buf)
    }
}

/// Seconds since the Unix epoch, saturating at zero if the clock is before it.
fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unreadable key record at offset {0}")]
    Corrupt(u64),
}

/// Writer over the key log file. Appends new records and rewrites existing
/// ones in place; never truncates.
pub struct LogWriter {
    file: File,
}

impl LogWriter {
    /// Opens (or creates) the key log at `path` for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Appends `record` at the end of the log and returns the offset it was
    /// written at. The write is not fsynced; call [`sync`](LogWriter::sync)
    /// before acknowledging it as durable.
    pub fn append(&mut self, record: &KeyRecord) -> Result<u64, LogError> {
        let buf = record.encode()?;
        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&buf)?;
        Ok(offset)
    }

    /// Rewrites the record at `offset` in place.
    ///
    /// The caller must pass a record for the same key that already lives at
    /// `offset` — the key bytes are what keep the record length identical,
    /// so only the value fields and timestamp actually change.
    pub fn rewrite(&mut self, offset: u64, record: &KeyRecord) -> Result<(), LogError> {
        let buf = record.encode()?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&buf)?;
        Ok(())
    }

    /// Flushes the log to stable storage.
    pub fn sync(&mut self) -> Result<(), LogError> {
        self.file.sync_all()?;
        Ok(())
    }
}

/// Replay reader over a key log.
pub struct LogReader<R: Read> {
    rdr: BufReader<R>,
}

impl LogReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LogReader<File>, LogError> {
        let f = File::open(path)?;
        Ok(LogReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> LogReader<R> {
    pub fn from_reader(reader: R) -> Self {
        LogReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Replays the log from the start, calling `apply(offset, record)` for
    /// each record in write order.
    ///
    /// A record that cannot be read whole — a short tail from an interrupted
    /// append, or an op byte this version does not know — ends the replay.
    /// With `strict` false the tail is skipped with a warning and the call
    /// succeeds; with `strict` true it is reported as [`LogError::Corrupt`]
    /// carrying the offending record's offset.
    pub fn replay<F>(&mut self, strict: bool, mut apply: F) -> Result<(), LogError>
    where
        F: FnMut(u64, KeyRecord),
    {
        let mut offset: u64 = 0;
        loop {
            // A clean end of log is EOF on the first header byte.
            match self.rdr.read_u8() {
                Ok(_version) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(LogError::Io(e)),
            }

            let body = match self.read_body() {
                Ok(body) => body,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    if strict {
                        return Err(LogError::Corrupt(offset));
                    }
                    warn!("key log ends with a truncated record at offset {offset}, ignoring tail");
                    return Ok(());
                }
                Err(e) => return Err(LogError::Io(e)),
            };

            let (op, val_seek, val_size, key) = body;
            let len = (HEADER_BYTES + key.len()) as u64;
            let record = match op {
                OP_PUT => KeyRecord::Put {
                    val_seek,
                    val_size,
                    key,
                },
                OP_TOMBSTONE => KeyRecord::Tombstone { key },
                other => {
                    if strict {
                        return Err(LogError::Corrupt(offset));
                    }
                    warn!("unknown op {other} in key log at offset {offset}, ignoring tail");
                    return Ok(());
                }
            };

            apply(offset, record);
            offset += len;
        }
    }

    /// Reads everything after the version byte: op, value fields, timestamp
    /// (discarded), key length, key bytes.
    fn read_body(&mut self) -> io::Result<(u8, u32, u32, Vec<u8>)> {
        let op = self.rdr.read_u8()?;
        let val_seek = self.rdr.read_u32::<BigEndian>()?;
        let val_size = self.rdr.read_u32::<BigEndian>()?;
        let _timestamp = self.rdr.read_u32::<BigEndian>()?;
        let key_len = self.rdr.read_u16::<BigEndian>()? as usize;
        let mut key = vec![0u8; key_len];
        self.rdr.read_exact(&mut key)?;
        Ok((op, val_seek, val_size, key))
    }
}
