//! Typed request messages consumed by a store's worker.
//!
//! Every variant carries a one-shot reply sender; the submitting side blocks
//! on the matching receiver. A reply may never arrive if the worker shuts
//! down first — submitters translate the closed channel into
//! [`StoreError::Closed`](crate::StoreError::Closed).

use crossbeam::channel::Sender;
use keyspace::ScanQuery;

use crate::error::Result;

pub(crate) enum Request {
    /// Point read: the value bytes, or `KeyNotFound`.
    Get {
        key: Vec<u8>,
        reply: Sender<Result<Vec<u8>>>,
    },
    /// Synchronous point write; both files are fsynced before the reply.
    Put {
        key: Vec<u8>,
        value: Vec<u8>,
        reply: Sender<Result<()>>,
    },
    /// Remove a key and append a tombstone. Absent keys still get a
    /// tombstone, matching the log-everything discipline.
    Delete {
        key: Vec<u8>,
        reply: Sender<Result<()>>,
    },
    /// Ordered key scan; see [`ScanQuery`].
    Scan {
        query: ScanQuery,
        reply: Sender<Vec<Vec<u8>>>,
    },
    /// Batch write: appends every pair, then fsyncs each file once.
    /// Aborts at the first I/O error, leaving the batch prefix unsynced.
    PutMany {
        pairs: Vec<(Vec<u8>, Vec<u8>)>,
        reply: Sender<Result<()>>,
    },
    /// Batch read in input order; missing keys are silently skipped.
    GetMany {
        keys: Vec<Vec<u8>>,
        reply: Sender<Vec<(Vec<u8>, Vec<u8>)>>,
    },
    /// Existence check.
    Has { key: Vec<u8>, reply: Sender<bool> },
    /// Ticket dispenser: increments the named in-memory counter and returns
    /// the new value. The reserved live-key-count name is read-only and
    /// returns the current key count instead.
    CounterNext {
        name: Vec<u8>,
        reply: Sender<u64>,
    },
    /// Sets a counter, or — with `persist` — writes every positive counter
    /// into the store as an 8-byte big-endian value under the counter's
    /// name (`name` and `value` are ignored in that branch).
    CounterSet {
        name: Vec<u8>,
        value: u64,
        persist: bool,
        reply: Sender<Result<()>>,
    },
}
