//! The store handle: the client side of one engine.
//!
//! Opening a store replays its key log into a fresh [`Keyspace`], then hands
//! everything — both file handles, the keyspace, the counter table — to a
//! dedicated worker thread. The handle keeps only the channel endpoints;
//! every operation is a message round-trip.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use byteorder::{BigEndian, ByteOrder};
use crossbeam::channel::{bounded, Sender};
use keylog::{KeyRecord, LogReader, LogWriter};
use keyspace::{Keyspace, Locator, ScanQuery};
use log::debug;
use valheap::ValueHeap;

use crate::actor::Actor;
use crate::error::{Result, StoreError};
use crate::request::Request;
use crate::{data_file, Options, KEY_FILE_EXT, VAL_FILE_EXT};

/// One open store. Cheap to clone behind the `Arc` the registry hands out;
/// all clones talk to the same worker.
pub struct Store {
    inbox: Sender<Request>,
    shutdown: Sender<()>,
    path: PathBuf,
}

impl Store {
    /// Opens the store at `path`, creating missing parent directories and
    /// the two data files, and replaying the key log to rebuild the
    /// in-memory state. Called through the registry, which guarantees one
    /// store per path.
    pub(crate) fn open(path: &Path, options: Options) -> Result<Store> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let log_path = data_file(path, KEY_FILE_EXT);
        let log = LogWriter::open(&log_path)?;
        let heap = ValueHeap::open(data_file(path, VAL_FILE_EXT))?;

        let mut keyspace = Keyspace::new();
        let mut reader = LogReader::open(&log_path)?;
        reader.replay(options.strict_replay, |offset, record| match record {
            KeyRecord::Put {
                val_seek,
                val_size,
                key,
            } => {
                keyspace.insert(
                    key,
                    Locator {
                        val_seek,
                        val_size,
                        key_seek: offset,
                    },
                );
            }
            KeyRecord::Tombstone { key } => {
                keyspace.remove(&key);
            }
        })?;
        debug!(
            "opened store at {} with {} live keys",
            path.display(),
            keyspace.len()
        );

        let actor = Actor::new(log, heap, keyspace, path.display().to_string());

        // Rendezvous inbox: a submitter blocks until the worker takes its
        // message, which is the store's only backpressure.
        let (inbox, inbox_rx) = bounded(0);
        let (shutdown, shutdown_rx) = bounded(1);
        let worker = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        thread::Builder::new()
            .name(format!("driftkv-{worker}"))
            .spawn(move || actor.run(inbox_rx, shutdown_rx))?;

        Ok(Store {
            inbox,
            shutdown,
            path: path.to_path_buf(),
        })
    }

    /// The base path this store was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn call<T>(&self, build: impl FnOnce(Sender<T>) -> Request) -> Result<T> {
        let (reply, response) = bounded(1);
        self.inbox
            .send(build(reply))
            .map_err(|_| StoreError::Closed)?;
        response.recv().map_err(|_| StoreError::Closed)
    }

    /// Stores `value` under `key`; both files are fsynced before return.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.call(|reply| Request::Put {
            key: key.to_vec(),
            value: value.to_vec(),
            reply,
        })?
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.call(|reply| Request::Get {
            key: key.to_vec(),
            reply,
        })?
    }

    /// Whether `key` is currently in the store.
    pub fn has(&self, key: &[u8]) -> Result<bool> {
        self.call(|reply| Request::Has {
            key: key.to_vec(),
            reply,
        })
    }

    /// Deletes `key`. Returns `true` whether or not the key existed; the
    /// tombstone is on disk either way.
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        self.call(|reply| Request::Delete {
            key: key.to_vec(),
            reply,
        })??;
        Ok(true)
    }

    /// Batch write with a single fsync of each file at the end. Aborts at
    /// the first failure; the completed prefix may or may not be durable.
    pub fn set_many(&self, pairs: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        self.call(|reply| Request::PutMany { pairs, reply })?
    }

    /// Batch read in input order. Missing keys are omitted, not errors.
    pub fn get_many(&self, keys: Vec<Vec<u8>>) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.call(|reply| Request::GetMany { keys, reply })
    }

    /// Ordered key scan. `from` of `None` scans from one end; a `from`
    /// ending in `*` selects keys by prefix (matches included); any other
    /// `from` is an anchor that must exist and is itself excluded. `limit`
    /// of 0 means unlimited; `offset` skips results in scan direction.
    pub fn keys(
        &self,
        from: Option<&[u8]>,
        limit: u32,
        offset: u32,
        ascending: bool,
    ) -> Result<Vec<Vec<u8>>> {
        self.call(|reply| Request::Scan {
            query: ScanQuery {
                from: from.map(|f| f.to_vec()),
                limit,
                offset,
                ascending,
            },
            reply,
        })
    }

    /// Number of live keys.
    pub fn count(&self) -> Result<u64> {
        self.call(|reply| Request::CounterNext {
            name: crate::COUNT_KEYS_NAME.to_vec(),
            reply,
        })
    }

    /// Increments the named in-memory counter and returns the new value.
    /// This is a ticket dispenser, not an accessor — every call mutates.
    /// The table is lost on close unless [`persist_counters`] ran.
    ///
    /// [`persist_counters`]: Store::persist_counters
    pub fn counter_next(&self, name: &[u8]) -> Result<u64> {
        self.call(|reply| Request::CounterNext {
            name: name.to_vec(),
            reply,
        })
    }

    /// Sets the named in-memory counter.
    pub fn counter_set(&self, name: &[u8], value: u64) -> Result<()> {
        self.call(|reply| Request::CounterSet {
            name: name.to_vec(),
            value,
            persist: false,
            reply,
        })?
    }

    /// Writes every positive in-memory counter into the store as an 8-byte
    /// big-endian value under the counter's name.
    pub fn persist_counters(&self) -> Result<()> {
        self.call(|reply| Request::CounterSet {
            name: Vec::new(),
            value: 0,
            persist: true,
            reply,
        })?
    }

    /// Persistent monotonic counter: reads the 8-byte big-endian value
    /// stored under `name`, increments it, stores it back, and returns the
    /// new value. Starts at 1 for an absent key. A present value that is
    /// not exactly 8 bytes is reported as [`StoreError::KeyNotFound`].
    pub fn counter(&self, name: &[u8]) -> Result<u64> {
        match self.get(name) {
            Ok(value) => {
                if value.len() != 8 {
                    return Err(StoreError::KeyNotFound);
                }
                let next = BigEndian::read_u64(&value) + 1;
                let mut buf = [0u8; 8];
                BigEndian::write_u64(&mut buf, next);
                self.set(name, &buf)?;
                Ok(next)
            }
            Err(StoreError::KeyNotFound) => {
                let mut buf = [0u8; 8];
                BigEndian::write_u64(&mut buf, 1);
                self.set(name, &buf)?;
                Ok(1)
            }
            Err(e) => Err(e),
        }
    }

    /// Fires the worker's shutdown signal. Idempotent; in-flight requests
    /// may be abandoned without a reply.
    pub(crate) fn shut_down(&self) {
        let _ = self.shutdown.try_send(());
    }
}

/// A store dropped without an explicit close still cancels its worker, so
/// leaking the handle cannot leak the thread or the file handles.
impl Drop for Store {
    fn drop(&mut self) {
        self.shut_down();
    }
}
