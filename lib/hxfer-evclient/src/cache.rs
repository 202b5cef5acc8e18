/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

//! Process-wide idle connection cache.
//!
//! One bucket per (host, port). The registry lock only guards bucket
//! lookup and creation; per-bucket locks guard the idle list. Neither is
//! ever held across I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use foldhash::fast::FixedState;
use log::debug;
use tokio::net::TcpStream;

const DEFAULT_MAX_IDLE: usize = 4;

struct Bucket {
    max_idle: AtomicUsize,
    idle: Mutex<Vec<TcpStream>>,
}

impl Bucket {
    fn new(max_idle: usize) -> Self {
        Bucket {
            max_idle: AtomicUsize::new(max_idle),
            idle: Mutex::new(Vec::new()),
        }
    }
}

pub(crate) struct ConnectionCache {
    registry: Mutex<HashMap<(String, u16), Arc<Bucket>, FixedState>>,
}

static CACHE: OnceLock<ConnectionCache> = OnceLock::new();

impl ConnectionCache {
    pub(crate) fn global() -> &'static ConnectionCache {
        CACHE.get_or_init(|| ConnectionCache {
            registry: Mutex::new(HashMap::with_hasher(FixedState::default())),
        })
    }

    fn bucket(&self, host: &str, port: u16) -> Arc<Bucket> {
        let mut registry = match self.registry.lock() {
            Ok(r) => r,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(bucket) = registry.get(&(host.to_string(), port)) {
            return bucket.clone();
        }
        let bucket = Arc::new(Bucket::new(DEFAULT_MAX_IDLE));
        registry.insert((host.to_string(), port), bucket.clone());
        bucket
    }

    /// Cap the idle list of one bucket, shedding surplus connections.
    pub(crate) fn configure(&self, host: &str, port: u16, max_idle: usize) {
        let bucket = self.bucket(host, port);
        bucket.max_idle.store(max_idle, Ordering::Relaxed);
        let mut idle = match bucket.idle.lock() {
            Ok(i) => i,
            Err(poisoned) => poisoned.into_inner(),
        };
        idle.truncate(max_idle);
    }

    /// Take one idle connection, most recently returned first.
    pub(crate) fn checkout(&self, host: &str, port: u16) -> Option<TcpStream> {
        let bucket = self.bucket(host, port);
        let mut idle = match bucket.idle.lock() {
            Ok(i) => i,
            Err(poisoned) => poisoned.into_inner(),
        };
        idle.pop()
    }

    /// Return a reusable connection, dropping it if the bucket is full.
    pub(crate) fn checkin(&self, host: &str, port: u16, stream: TcpStream) {
        let bucket = self.bucket(host, port);
        let max_idle = bucket.max_idle.load(Ordering::Relaxed);
        let mut idle = match bucket.idle.lock() {
            Ok(i) => i,
            Err(poisoned) => poisoned.into_inner(),
        };
        if idle.len() < max_idle {
            idle.push(stream);
        } else {
            debug!("idle bucket {host}:{port} full, dropping connection");
        }
    }

    #[cfg(test)]
    pub(crate) fn idle_count(&self, host: &str, port: u16) -> usize {
        let bucket = self.bucket(host, port);
        let idle = bucket.idle.lock().unwrap();
        idle.len()
    }
}
