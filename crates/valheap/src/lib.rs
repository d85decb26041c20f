//! # Value heap
//!
//! The `.giv` file: an opaque byte heap holding values at the offsets the
//! key log records. A value occupies a contiguous slot and never moves.
//! Overwriting a key reuses its slot when the new value fits; otherwise the
//! new value is appended and the old slot becomes dead space. Nothing is
//! ever reclaimed — that is the deal this store makes for append-speed
//! writes.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A contiguous region of the heap holding one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub seek: u32,
    pub size: u32,
}

/// Writer/reader over the value heap file.
pub struct ValueHeap {
    file: File,
}

impl ValueHeap {
    /// Opens (or creates) the heap file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Appends `value` at the end of the heap and returns its slot.
    pub fn append(&mut self, value: &[u8]) -> io::Result<Slot> {
        let seek = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(value)?;
        Ok(Slot {
            seek: seek as u32,
            size: value.len() as u32,
        })
    }

    /// Stores `value`, reusing `prior` when it is big enough to hold the new
    /// bytes. Returns the slot the value now lives in; when the prior slot is
    /// reused its `seek` is kept and only `size` shrinks.
    pub fn store(&mut self, value: &[u8], prior: Option<Slot>) -> io::Result<Slot> {
        match prior {
            Some(slot) if slot.size as usize >= value.len() => {
                self.file.seek(SeekFrom::Start(slot.seek as u64))?;
                self.file.write_all(value)?;
                Ok(Slot {
                    seek: slot.seek,
                    size: value.len() as u32,
                })
            }
            _ => self.append(value),
        }
    }

    /// Reads the value occupying `slot`.
    pub fn read(&mut self, slot: Slot) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; slot.size as usize];
        self.file.seek(SeekFrom::Start(slot.seek as u64))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Flushes the heap to stable storage.
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }

    /// Current size of the heap file in bytes.
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}
