//! # DriftKV
//!
//! An embeddable, persistent key-value store that keeps every key in memory
//! and every value in an append-friendly heap file on disk. Lookups never
//! touch disk for the key; values cost one positioned read.
//!
//! ## Architecture
//!
//! ```text
//!  set/get/keys/...          ┌──────────────────────────────────┐
//!  ──────────────► registry │ path → store, one worker per path │
//!                            └───────────────┬──────────────────┘
//!                                            │ rendezvous inbox
//!                            ┌───────────────▼──────────────────┐
//!                            │  worker: keyspace + counters     │
//!                            │  <base>.gik  key log             │
//!                            │  <base>.giv  value heap          │
//!                            └──────────────────────────────────┘
//! ```
//!
//! Each store is owned by a single worker thread that consumes typed
//! requests one at a time — no locks, no interleaving. Durability is fsync
//! of both files before a synchronous write replies; batch writes fsync
//! once at the end.
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> driftkv::Result<()> {
//! driftkv::set("data/mydb", b"ab1", b"first")?;
//! driftkv::set("data/mydb", b"ab2", b"second")?;
//!
//! assert_eq!(driftkv::get("data/mydb", b"ab1")?, b"first");
//! assert_eq!(driftkv::keys("data/mydb", Some(b"ab*"), 0, 0, true)?.len(), 2);
//!
//! driftkv::close("data/mydb")?;
//! # Ok(())
//! # }
//! ```

mod actor;
mod error;
mod options;
mod registry;
mod request;
mod store;


pub use error::{Result, StoreError};
pub use options::Options;
pub use registry::{close, close_all, delete_file, open, open_with};
pub use store::Store;

use std::path::{Path, PathBuf};

/// Extension of the key-log file, appended to the base path.
pub const KEY_FILE_EXT: &str = ".gik";
/// Extension of the value-heap file, appended to the base path.
pub const VAL_FILE_EXT: &str = ".giv";

/// Reserved counter name that reads as the current live key count. It is a
/// read-only sentinel: asking for it never touches the counter table.
pub const COUNT_KEYS_NAME: &[u8] = b"_LEN_KEYS_";

/// `<base>` + extension, keeping whatever extension the base path already
/// carries.
pub(crate) fn data_file(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(ext);
    PathBuf::from(name)
}

/// Stores `value` under `key`, opening the store if needed. Synchronous:
/// both files are fsynced before return.
pub fn set<P: AsRef<Path>>(path: P, key: &[u8], value: &[u8]) -> Result<()> {
    open(path)?.set(key, value)
}

/// Alias of [`set`].
pub fn put<P: AsRef<Path>>(path: P, key: &[u8], value: &[u8]) -> Result<()> {
    set(path, key, value)
}

/// Returns the value stored under `key`, or [`StoreError::KeyNotFound`].
pub fn get<P: AsRef<Path>>(path: P, key: &[u8]) -> Result<Vec<u8>> {
    open(path)?.get(key)
}

/// Whether `key` is currently in the store.
pub fn has<P: AsRef<Path>>(path: P, key: &[u8]) -> Result<bool> {
    open(path)?.has(key)
}

/// Deletes `key`; returns `true` even when the key was absent.
pub fn delete<P: AsRef<Path>>(path: P, key: &[u8]) -> Result<bool> {
    open(path)?.delete(key)
}

/// Batch write for mass insertion: every pair is appended, then each file
/// is fsynced once.
pub fn set_many<P: AsRef<Path>>(path: P, pairs: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
    open(path)?.set_many(pairs)
}

/// Batch read in input order; missing keys are omitted.
pub fn get_many<P: AsRef<Path>>(path: P, keys: Vec<Vec<u8>>) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    open(path)?.get_many(keys)
}

/// Ordered key scan; see [`Store::keys`] for the anchor semantics.
pub fn keys<P: AsRef<Path>>(
    path: P,
    from: Option<&[u8]>,
    limit: u32,
    offset: u32,
    ascending: bool,
) -> Result<Vec<Vec<u8>>> {
    open(path)?.keys(from, limit, offset, ascending)
}

/// Number of live keys in the store.
pub fn count<P: AsRef<Path>>(path: P) -> Result<u64> {
    open(path)?.count()
}

/// Persistent monotonic counter stored under the regular key `name` as an
/// 8-byte big-endian value. Every call returns the next value, starting
/// at 1; the value survives close and reopen.
pub fn counter<P: AsRef<Path>>(path: P, name: &[u8]) -> Result<u64> {
    open(path)?.counter(name)
}
