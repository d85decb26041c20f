//! The per-store worker: sole owner of the file handles, the keyspace, and
//! the counter table.
//!
//! All mutations and reads flow through [`Actor::run`], one request at a
//! time. There is no locking and no interleaving inside a store; submitters
//! queue on the rendezvous inbox and block until the worker picks their
//! message up.

use std::collections::HashMap;

use crossbeam::channel::Receiver;
use crossbeam::select;
use keylog::{KeyRecord, LogWriter};
use keyspace::{Keyspace, Locator};
use log::debug;
use valheap::{Slot, ValueHeap};

use crate::error::Result;
use crate::request::Request;
use crate::COUNT_KEYS_NAME;
use crate::StoreError;

pub(crate) struct Actor {
    log: LogWriter,
    heap: ValueHeap,
    keyspace: Keyspace,
    counters: HashMap<Vec<u8>, u64>,
    name: String,
}

impl Actor {
    pub(crate) fn new(log: LogWriter, heap: ValueHeap, keyspace: Keyspace, name: String) -> Self {
        Self {
            log,
            heap,
            keyspace,
            counters: HashMap::new(),
            name,
        }
    }

    /// Consumes requests until the shutdown signal fires or every handle to
    /// the inbox is gone. Both files close when the actor is dropped on the
    /// way out.
    pub(crate) fn run(mut self, inbox: Receiver<Request>, shutdown: Receiver<()>) {
        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(inbox) -> msg => match msg {
                    Ok(request) => self.handle(request),
                    Err(_) => break,
                },
            }
        }
        debug!("store worker for {} stopped", self.name);
    }

    /// Replies to departed submitters are discarded, never panicked on.
    fn handle(&mut self, request: Request) {
        match request {
            Request::Get { key, reply } => {
                let _ = reply.send(self.get(&key));
            }
            Request::Put { key, value, reply } => {
                let _ = reply.send(self.put(&key, &value, true));
            }
            Request::Delete { key, reply } => {
                let _ = reply.send(self.delete(&key));
            }
            Request::Scan { query, reply } => {
                let _ = reply.send(self.keyspace.scan(&query));
            }
            Request::PutMany { pairs, reply } => {
                let _ = reply.send(self.put_many(pairs));
            }
            Request::GetMany { keys, reply } => {
                let _ = reply.send(self.get_many(&keys));
            }
            Request::Has { key, reply } => {
                let _ = reply.send(self.keyspace.contains(&key));
            }
            Request::CounterNext { name, reply } => {
                let _ = reply.send(self.counter_next(&name));
            }
            Request::CounterSet {
                name,
                value,
                persist,
                reply,
            } => {
                let _ = reply.send(self.counter_set(name, value, persist));
            }
        }
    }

    fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        let locator = self.keyspace.get(key).ok_or(StoreError::KeyNotFound)?;
        let value = self.heap.read(Slot {
            seek: locator.val_seek,
            size: locator.val_size,
        })?;
        Ok(value)
    }

    /// Applies the overwrite-vs-append policy: an existing key reuses its
    /// value slot when the new value fits and always keeps its key-record
    /// offset; a new key appends both the value and the record. Nothing is
    /// visible in the keyspace until both writes succeeded.
    fn put(&mut self, key: &[u8], value: &[u8], sync: bool) -> Result<()> {
        let prior = self.keyspace.get(key);
        let slot = self.heap.store(
            value,
            prior.map(|l| Slot {
                seek: l.val_seek,
                size: l.val_size,
            }),
        )?;
        let record = KeyRecord::Put {
            val_seek: slot.seek,
            val_size: slot.size,
            key: key.to_vec(),
        };
        let key_seek = match prior {
            Some(locator) => {
                self.log.rewrite(locator.key_seek, &record)?;
                locator.key_seek
            }
            None => self.log.append(&record)?,
        };
        if sync {
            self.heap.sync()?;
            self.log.sync()?;
        }
        self.keyspace.insert(
            key.to_vec(),
            Locator {
                val_seek: slot.seek,
                val_size: slot.size,
                key_seek,
            },
        );
        Ok(())
    }

    /// The batch-write path never reuses slots: value and key record are
    /// both appended, and fsync is the caller's problem. Replay order makes
    /// the newest record win for a key written twice in one batch.
    fn put_append(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let slot = self.heap.append(value)?;
        let key_seek = self.log.append(&KeyRecord::Put {
            val_seek: slot.seek,
            val_size: slot.size,
            key: key.to_vec(),
        })?;
        self.keyspace.insert(
            key.to_vec(),
            Locator {
                val_seek: slot.seek,
                val_size: slot.size,
                key_seek,
            },
        );
        Ok(())
    }

    fn put_many(&mut self, pairs: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        for (key, value) in &pairs {
            self.put_append(key, value)?;
        }
        self.log.sync()?;
        self.heap.sync()?;
        Ok(())
    }

    fn get_many(&mut self, keys: &[Vec<u8>]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut result = Vec::new();
        for key in keys {
            if let Ok(value) = self.get(key) {
                result.push((key.clone(), value));
            }
        }
        result
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.keyspace.remove(key);
        self.log.append(&KeyRecord::Tombstone { key: key.to_vec() })?;
        self.heap.sync()?;
        self.log.sync()?;
        Ok(())
    }

    fn counter_next(&mut self, name: &[u8]) -> u64 {
        if name == COUNT_KEYS_NAME {
            return self.keyspace.len() as u64;
        }
        let counter = self.counters.entry(name.to_vec()).or_insert(0);
        *counter += 1;
        *counter
    }

    fn counter_set(&mut self, name: Vec<u8>, value: u64, persist: bool) -> Result<()> {
        if persist {
            let live: Vec<(Vec<u8>, u64)> = self
                .counters
                .iter()
                .filter(|(_, v)| **v > 0)
                .map(|(k, v)| (k.clone(), *v))
                .collect();
            for (counter, value) in live {
                self.put(&counter, &value.to_be_bytes(), true)?;
            }
        } else {
            self.counters.insert(name, value);
        }
        Ok(())
    }
}
