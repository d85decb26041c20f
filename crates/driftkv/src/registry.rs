//! Process-wide registry mapping base paths to open stores.
//!
//! The registry is the one piece of shared mutable state in the crate and
//! the reason a path never has two workers: `open` hands out a clone of the
//! existing store or creates exactly one.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::error::{Result, StoreError};
use crate::store::Store;
use crate::{data_file, Options, KEY_FILE_EXT, VAL_FILE_EXT};

lazy_static! {
    static ref STORES: RwLock<HashMap<PathBuf, Arc<Store>>> = RwLock::new(HashMap::new());
}

/// Returns the open store for `path`, opening it (and replaying its key
/// log) if this is the first request against the path.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Store>> {
    open_with(path, Options::default())
}

/// As [`open`], with explicit [`Options`]. The options only apply when the
/// call actually opens the store; a store that is already open is returned
/// as-is.
pub fn open_with<P: AsRef<Path>>(path: P, options: Options) -> Result<Arc<Store>> {
    let path = path.as_ref();
    {
        let stores = STORES.read();
        if let Some(store) = stores.get(path) {
            return Ok(Arc::clone(store));
        }
    }

    let mut stores = STORES.write();
    // Lost the race to another opener? Use theirs.
    if let Some(store) = stores.get(path) {
        return Ok(Arc::clone(store));
    }
    let store = Arc::new(Store::open(path, options)?);
    stores.insert(path.to_path_buf(), Arc::clone(&store));
    Ok(store)
}

/// Closes the store for `path`: removes it from the registry and cancels
/// its worker. Returns [`StoreError::DbNotOpen`] if the path has no open
/// store.
pub fn close<P: AsRef<Path>>(path: P) -> Result<()> {
    match STORES.write().remove(path.as_ref()) {
        Some(store) => {
            store.shut_down();
            Ok(())
        }
        None => Err(StoreError::DbNotOpen),
    }
}

/// Closes every open store.
pub fn close_all() -> Result<()> {
    let mut stores = STORES.write();
    for (_, store) in stores.drain() {
        store.shut_down();
    }
    Ok(())
}

/// Closes the store for `path` (if open) and deletes both its files from
/// disk. All data is lost.
pub fn delete_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let _ = close(path);
    fs::remove_file(data_file(path, KEY_FILE_EXT))?;
    fs::remove_file(data_file(path, VAL_FILE_EXT))?;
    Ok(())
}
